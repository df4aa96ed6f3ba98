//! Remote source traits

use async_trait::async_trait;
use exitcheck_types::AddressSet;

use crate::error::FetchError;

/// Source of the published exit-relay list
///
/// Implementations return only validated, non-empty sets; any failure,
/// including an empty list, is an error. They never touch a store.
#[async_trait]
pub trait ListFetcher: Send + Sync {
    /// Fetch and validate the latest list
    async fn fetch_latest(&self) -> Result<AddressSet, FetchError>;
}

/// Discovery of this host's public address
#[async_trait]
pub trait AddressResolver: Send + Sync {
    /// Ask an echo service for the caller's address
    ///
    /// `override_url` replaces the configured service URL for this call.
    async fn current_address(&self, override_url: Option<&str>) -> Result<String, FetchError>;
}
