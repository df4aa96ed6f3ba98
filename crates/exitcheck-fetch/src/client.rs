//! Exit-list publisher client

use async_trait::async_trait;
use exitcheck_types::AddressSet;
use reqwest::{Client, Response};
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::FetchError;
use crate::source::{AddressResolver, ListFetcher};

/// Bulk exit-list document published by the Tor Project
pub const DEFAULT_LIST_URL: &str = "https://check.torproject.org/torbulkexitlist";

/// Public echo service returning `{"ip": "..."}`
pub const DEFAULT_ADDRESS_URL: &str = "https://api.ipify.org?format=json";

pub const DEFAULT_TIMEOUT_SECS: u64 = 10;

/// Exit-list client configuration
#[derive(Clone, Debug)]
pub struct ExitListClientConfig {
    /// URL of the plain-text exit list
    pub list_url: String,
    /// URL of the own-address echo service
    pub address_url: String,
    /// Bound on every request, connect to last body byte
    pub timeout: Duration,
}

impl Default for ExitListClientConfig {
    fn default() -> Self {
        Self {
            list_url: DEFAULT_LIST_URL.to_string(),
            address_url: DEFAULT_ADDRESS_URL.to_string(),
            timeout: Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        }
    }
}

/// Echo service response
#[derive(Debug, Deserialize)]
struct AddressResponse {
    #[serde(alias = "IP")]
    ip: String,
}

/// HTTP client for the exit-list publisher
pub struct ExitListClient {
    config: ExitListClientConfig,
    client: Client,
}

impl ExitListClient {
    /// Create a new client
    pub fn new(config: ExitListClientConfig) -> Result<Self, FetchError> {
        parse_http_url(&config.list_url)?;
        parse_http_url(&config.address_url)?;

        let client = Client::builder()
            .timeout(config.timeout)
            .user_agent(concat!("exitcheck/", env!("CARGO_PKG_VERSION")))
            .build()?;

        info!(
            "Created exit-list client for {} (timeout: {:?})",
            config.list_url, config.timeout
        );

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ExitListClientConfig {
        &self.config
    }

    /// Issue a GET and reject non-success statuses
    async fn get(&self, url: Url) -> Result<Response, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| self.classify(e))?;
        let status = response.status();

        if !status.is_success() {
            return Err(FetchError::UpstreamError {
                status: status.as_u16(),
                message: response.text().await.unwrap_or_default(),
            });
        }

        Ok(response)
    }

    async fn body_text(&self, response: Response) -> Result<String, FetchError> {
        response.text().await.map_err(|e| self.classify(e))
    }

    fn classify(&self, error: reqwest::Error) -> FetchError {
        if error.is_timeout() {
            FetchError::Timeout(self.config.timeout)
        } else {
            FetchError::Http(error)
        }
    }
}

#[async_trait]
impl ListFetcher for ExitListClient {
    async fn fetch_latest(&self) -> Result<AddressSet, FetchError> {
        let url = parse_http_url(&self.config.list_url)?;
        debug!("Fetching exit list: {}", url);

        let response = self.get(url).await?;
        let body = self.body_text(response).await?;

        let parsed = AddressSet::parse_lines(&body);
        for line in &parsed.rejected {
            debug!("Skipping malformed exit-list line: {:?}", line);
        }
        if !parsed.rejected.is_empty() {
            warn!(
                "Skipped {} malformed lines in exit list from {}",
                parsed.rejected.len(),
                self.config.list_url
            );
        }

        if parsed.addresses.is_empty() {
            return Err(FetchError::EmptyList);
        }

        info!("Fetched {} exit addresses", parsed.addresses.len());
        Ok(parsed.addresses)
    }
}

#[async_trait]
impl AddressResolver for ExitListClient {
    async fn current_address(&self, override_url: Option<&str>) -> Result<String, FetchError> {
        let url = parse_http_url(override_url.unwrap_or(&self.config.address_url))?;
        debug!("Resolving own address via {}", url);

        let response = self.get(url).await?;
        let body = self.body_text(response).await?;

        let parsed: AddressResponse = serde_json::from_str(&body)
            .map_err(|e| FetchError::InvalidResponse(format!("Malformed address document: {}", e)))?;

        let address = parsed.ip.trim();
        if address.parse::<IpAddr>().is_err() {
            return Err(FetchError::InvalidResponse(format!(
                "Not an IP address: {:?}",
                address
            )));
        }

        Ok(address.to_string())
    }
}

/// Parse an absolute http(s) URL
fn parse_http_url(raw: &str) -> Result<Url, FetchError> {
    let url = Url::parse(raw).map_err(|e| FetchError::InvalidUrl(format!("{}: {}", raw, e)))?;

    match url.scheme() {
        "http" | "https" => Ok(url),
        scheme => Err(FetchError::InvalidUrl(format!(
            "{}: unsupported scheme {}",
            raw, scheme
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn client_for(server: &MockServer, timeout: Duration) -> ExitListClient {
        ExitListClient::new(ExitListClientConfig {
            list_url: format!("{}/torbulkexitlist", server.uri()),
            address_url: format!("{}/ip", server.uri()),
            timeout,
        })
        .unwrap()
    }

    async fn serve_list(server: &MockServer, template: ResponseTemplate) {
        Mock::given(method("GET"))
            .and(path("/torbulkexitlist"))
            .respond_with(template)
            .mount(server)
            .await;
    }

    #[test]
    fn test_parse_http_url() {
        assert!(parse_http_url("https://example.com/list").is_ok());
        assert!(parse_http_url("http://127.0.0.1:8080").is_ok());
        assert!(matches!(
            parse_http_url("not a url"),
            Err(FetchError::InvalidUrl(_))
        ));
        assert!(matches!(
            parse_http_url("ftp://example.com/list"),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_new_rejects_bad_urls() {
        let config = ExitListClientConfig {
            list_url: "::nope::".to_string(),
            ..Default::default()
        };
        assert!(matches!(
            ExitListClient::new(config),
            Err(FetchError::InvalidUrl(_))
        ));
    }

    #[tokio::test]
    async fn test_fetch_latest_skips_malformed_lines() {
        let server = MockServer::start().await;
        serve_list(
            &server,
            ResponseTemplate::new(200)
                .set_body_string("1.2.3.4\n\n  5.6.7.8 \n999.1.1.1\n1.2.3\nhello\n1.2.3.4\n"),
        )
        .await;

        let client = client_for(&server, Duration::from_secs(5));
        let addresses = client.fetch_latest().await.unwrap();

        assert_eq!(addresses.len(), 2);
        assert!(addresses.contains("1.2.3.4"));
        assert!(addresses.contains("5.6.7.8"));
        assert!(!addresses.contains("999.1.1.1"));
        assert!(!addresses.contains("1.2.3"));
    }

    #[tokio::test]
    async fn test_fetch_latest_empty_list_is_error() {
        let server = MockServer::start().await;
        serve_list(
            &server,
            ResponseTemplate::new(200).set_body_string("\n  \nnot-an-address\n"),
        )
        .await;

        let client = client_for(&server, Duration::from_secs(5));
        assert!(matches!(
            client.fetch_latest().await,
            Err(FetchError::EmptyList)
        ));
    }

    #[tokio::test]
    async fn test_fetch_latest_non_success_status() {
        let server = MockServer::start().await;
        serve_list(
            &server,
            ResponseTemplate::new(503).set_body_string("maintenance"),
        )
        .await;

        let client = client_for(&server, Duration::from_secs(5));
        match client.fetch_latest().await {
            Err(FetchError::UpstreamError { status, message }) => {
                assert_eq!(status, 503);
                assert_eq!(message, "maintenance");
            }
            other => panic!("expected upstream error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_latest_times_out() {
        let server = MockServer::start().await;
        serve_list(
            &server,
            ResponseTemplate::new(200)
                .set_body_string("1.2.3.4\n")
                .set_delay(Duration::from_secs(5)),
        )
        .await;

        let client = client_for(&server, Duration::from_millis(200));
        assert!(matches!(
            client.fetch_latest().await,
            Err(FetchError::Timeout(_))
        ));
    }

    #[tokio::test]
    async fn test_current_address() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ip":"203.0.113.7"}"#))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        assert_eq!(client.current_address(None).await.unwrap(), "203.0.113.7");
    }

    #[tokio::test]
    async fn test_current_address_override_accepts_uppercase_field() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/api/ip"))
            .respond_with(
                ResponseTemplate::new(200).set_body_string(r#"{"IsTor":false,"IP":"198.51.100.2"}"#),
            )
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));
        let override_url = format!("{}/api/ip", server.uri());
        assert_eq!(
            client.current_address(Some(&override_url)).await.unwrap(),
            "198.51.100.2"
        );
    }

    #[tokio::test]
    async fn test_current_address_failures() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ip"))
            .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"ip":"not-an-ip"}"#))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/garbage"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>"))
            .mount(&server)
            .await;

        let client = client_for(&server, Duration::from_secs(5));

        assert!(matches!(
            client.current_address(None).await,
            Err(FetchError::InvalidResponse(_))
        ));
        let garbage = format!("{}/garbage", server.uri());
        assert!(matches!(
            client.current_address(Some(&garbage)).await,
            Err(FetchError::InvalidResponse(_))
        ));
        assert!(matches!(
            client.current_address(Some("definitely not a url")).await,
            Err(FetchError::InvalidUrl(_))
        ));
    }
}
