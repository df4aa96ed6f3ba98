//! Service configuration

use std::time::Duration;

use crate::cache::DEFAULT_MAX_AGE;

/// Default memo TTL used by the binary
pub const DEFAULT_MEMO_TTL: Duration = Duration::from_secs(60);

/// Configuration for the exit-list service
#[derive(Debug, Clone)]
pub struct ServiceConfig {
    /// Age after which a stored list is stale
    pub max_age: Duration,
    /// TTL of the in-process memo; `None` disables it
    pub memo_ttl: Option<Duration>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            memo_ttl: None,
        }
    }
}
