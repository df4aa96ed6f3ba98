//! Exit-list service: staleness-driven cache coordinator

use exitcheck_fetch::{AddressResolver, ExitListClient, ListFetcher};
use exitcheck_storage::{FileStore, ListStore};
use exitcheck_types::{AddressSet, RefreshTimestamp};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::cache::{ListMemo, ListState, StalenessPolicy, UpdateMode};
use crate::config::ServiceConfig;
use crate::error::CoreError;

/// Returned by [`ExitListService::current_address`] when discovery fails
pub const UNKNOWN_ADDRESS: &str = "unknown";

/// Snapshot of the stored record
#[derive(Debug, Clone, Serialize)]
pub struct ListStatus {
    pub state: ListState,
    pub count: usize,
    pub last_refresh: RefreshTimestamp,
    /// Milliseconds since the last refresh, if there was one
    pub age_ms: Option<i64>,
    pub store: String,
}

/// Answers "is this address a known exit relay?"
///
/// Serves the stored list while it is fresh and refreshes it from the
/// fetcher when the update mode and the list state call for it. Refresh
/// happens inline in the request that detects staleness; concurrent
/// refreshes are not coordinated and the last write wins.
pub struct ExitListService {
    store: Arc<dyn ListStore>,
    fetcher: Arc<dyn ListFetcher>,
    resolver: Arc<dyn AddressResolver>,
    policy: StalenessPolicy,
    memo: Option<ListMemo>,
}

impl ExitListService {
    /// Create a new service
    pub fn new(
        store: Arc<dyn ListStore>,
        fetcher: Arc<dyn ListFetcher>,
        resolver: Arc<dyn AddressResolver>,
        config: ServiceConfig,
    ) -> Self {
        info!(
            "Initializing exit-list service ({}, max_age: {:?}, memo_ttl: {:?})",
            store.describe(),
            config.max_age,
            config.memo_ttl
        );

        Self {
            store,
            fetcher,
            resolver,
            policy: StalenessPolicy::new(config.max_age),
            memo: config.memo_ttl.map(ListMemo::new),
        }
    }

    /// Create a service backed by a file store at the default paths
    pub fn with_default_store(client: Arc<ExitListClient>, config: ServiceConfig) -> Self {
        let store: Arc<dyn ListStore> = Arc::new(FileStore::with_default_paths());
        Self::new(store, client.clone(), client, config)
    }

    pub fn store(&self) -> &Arc<dyn ListStore> {
        &self.store
    }

    // ==================== List Operations ====================

    /// Get the exit list, refreshing it if `mode` and its state require
    ///
    /// Never fails. A failed refresh serves whatever the store holds,
    /// which may be empty; empty means "no data", not "no relays".
    pub async fn get_list(&self, mode: UpdateMode) -> AddressSet {
        self.get_list_at(mode, RefreshTimestamp::now()).await
    }

    async fn get_list_at(&self, mode: UpdateMode, now: RefreshTimestamp) -> AddressSet {
        if mode != UpdateMode::ForceRefresh
            && let Some(addresses) = self.memo.as_ref().and_then(ListMemo::get)
        {
            debug!("Serving {} addresses from memo", addresses.len());
            return addresses;
        }

        let addresses = self.store.read_addresses().await;
        let timestamp = self.store.read_timestamp().await;
        let state = self.policy.classify(&addresses, timestamp, now);

        debug!(
            "Stored list is {} ({} addresses, mode: {})",
            state.as_str(),
            addresses.len(),
            mode
        );

        if !mode.should_refresh(state) {
            // Only fresh lists may stand in for the store
            if state == ListState::Fresh {
                self.remember(&addresses);
            }
            return addresses;
        }

        match self.refresh_at(now).await {
            Ok(fresh) => fresh,
            Err(CoreError::Persist { addresses: fresh, source }) => {
                warn!(
                    "Serving {} freshly fetched addresses that could not be persisted: {}",
                    fresh.len(),
                    source
                );
                self.remember(&fresh);
                fresh
            }
            Err(e) => {
                warn!(
                    "Refresh failed, serving {} {} addresses: {}",
                    addresses.len(),
                    state.as_str(),
                    e
                );
                addresses
            }
        }
    }

    /// Refresh unconditionally, surfacing failures
    ///
    /// On fetch failure the store is untouched. On persistence failure
    /// the error carries the fetched list.
    pub async fn refresh(&self) -> Result<AddressSet, CoreError> {
        self.refresh_at(RefreshTimestamp::now()).await
    }

    async fn refresh_at(&self, now: RefreshTimestamp) -> Result<AddressSet, CoreError> {
        info!("Refreshing exit list into {}", self.store.describe());

        let addresses = self.fetcher.fetch_latest().await?;

        if let Err(source) = self.store.write_record(&addresses, now).await {
            return Err(CoreError::Persist { addresses, source });
        }

        info!("Stored {} exit addresses", addresses.len());
        self.remember(&addresses);
        Ok(addresses)
    }

    fn remember(&self, addresses: &AddressSet) {
        if let Some(memo) = &self.memo {
            memo.put(addresses);
        }
    }

    /// Describe the stored record without network access
    pub async fn status(&self) -> ListStatus {
        let now = RefreshTimestamp::now();
        let addresses = self.store.read_addresses().await;
        let last_refresh = self.store.read_timestamp().await;

        ListStatus {
            state: self.policy.classify(&addresses, last_refresh, now),
            count: addresses.len(),
            last_refresh,
            age_ms: (!last_refresh.is_never()).then(|| last_refresh.age_at(now)),
            store: self.store.describe(),
        }
    }

    // ==================== Lookups ====================

    /// Whether `address` is a known exit relay
    pub async fn lookup(&self, address: &str) -> bool {
        self.lookup_with(address, UpdateMode::Auto).await
    }

    /// Whether `address` is a known exit relay, under an explicit mode
    pub async fn lookup_with(&self, address: &str, mode: UpdateMode) -> bool {
        self.get_list(mode).await.contains(address.trim())
    }

    /// This host's public address, or [`UNKNOWN_ADDRESS`]
    pub async fn current_address(&self, override_url: Option<&str>) -> String {
        match self.resolver.current_address(override_url).await {
            Ok(address) => address,
            Err(e) => {
                warn!("Failed to determine own address: {}", e);
                UNKNOWN_ADDRESS.to_string()
            }
        }
    }

    /// Whether this host currently exits through a known relay
    pub async fn am_i_relay(&self) -> bool {
        let address = self.current_address(None).await;
        if address == UNKNOWN_ADDRESS {
            return false;
        }
        self.lookup(&address).await
    }
}
