//! Staleness policy and update modes

use exitcheck_types::{AddressSet, RefreshTimestamp};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// Default maximum age of a cached list (24 hours)
pub const DEFAULT_MAX_AGE: Duration = Duration::from_secs(24 * 60 * 60);

/// Error type for parsing an update mode
#[derive(Debug, Clone)]
pub struct ParseUpdateModeError(String);

impl fmt::Display for ParseUpdateModeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Invalid update mode: {} (expected auto, true or false)",
            self.0
        )
    }
}

impl std::error::Error for ParseUpdateModeError {}

/// How a list request may refresh the cache
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum UpdateMode {
    /// Refresh only when the cached list is empty or stale
    #[default]
    Auto,
    /// Always refresh
    #[serde(rename = "force", alias = "true")]
    ForceRefresh,
    /// Never refresh, serve whatever is stored
    #[serde(rename = "never", alias = "false")]
    NeverRefresh,
}

impl UpdateMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            UpdateMode::Auto => "auto",
            UpdateMode::ForceRefresh => "force",
            UpdateMode::NeverRefresh => "never",
        }
    }

    /// Whether a list in `state` must be refreshed under this mode
    pub fn should_refresh(&self, state: ListState) -> bool {
        match self {
            UpdateMode::ForceRefresh => true,
            UpdateMode::NeverRefresh => false,
            UpdateMode::Auto => state != ListState::Fresh,
        }
    }
}

impl From<bool> for UpdateMode {
    fn from(force: bool) -> Self {
        if force {
            UpdateMode::ForceRefresh
        } else {
            UpdateMode::NeverRefresh
        }
    }
}

impl FromStr for UpdateMode {
    type Err = ParseUpdateModeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "auto" => Ok(UpdateMode::Auto),
            "true" | "force" => Ok(UpdateMode::ForceRefresh),
            "false" | "never" => Ok(UpdateMode::NeverRefresh),
            _ => Err(ParseUpdateModeError(s.to_string())),
        }
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Freshness of a stored record
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ListState {
    /// Non-empty and refreshed within the maximum age
    Fresh,
    /// Non-empty but never refreshed or older than the maximum age
    Stale,
    /// No addresses stored
    Empty,
}

impl ListState {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListState::Fresh => "fresh",
            ListState::Stale => "stale",
            ListState::Empty => "empty",
        }
    }
}

/// Classifies stored records by age
#[derive(Debug, Clone, Copy)]
pub struct StalenessPolicy {
    max_age_ms: i64,
}

impl StalenessPolicy {
    pub fn new(max_age: Duration) -> Self {
        Self {
            max_age_ms: i64::try_from(max_age.as_millis()).unwrap_or(i64::MAX),
        }
    }

    pub fn max_age(&self) -> Duration {
        Duration::from_millis(self.max_age_ms as u64)
    }

    /// Classify a record as of `now`
    ///
    /// Emptiness wins over age. A record is fresh while
    /// `now - timestamp <= max_age`.
    pub fn classify(
        &self,
        addresses: &AddressSet,
        timestamp: RefreshTimestamp,
        now: RefreshTimestamp,
    ) -> ListState {
        if addresses.is_empty() {
            ListState::Empty
        } else if !timestamp.is_never() && timestamp.age_at(now) <= self.max_age_ms {
            ListState::Fresh
        } else {
            ListState::Stale
        }
    }
}

impl Default for StalenessPolicy {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_AGE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DAY_MS: i64 = 24 * 60 * 60 * 1000;
    const NOW: i64 = 1_700_000_000_000;

    fn one_address() -> AddressSet {
        AddressSet::try_from_iter(["1.2.3.4"]).unwrap()
    }

    fn classify(timestamp: i64) -> ListState {
        StalenessPolicy::default().classify(
            &one_address(),
            RefreshTimestamp::from_millis(timestamp),
            RefreshTimestamp::from_millis(NOW),
        )
    }

    #[test]
    fn test_staleness_boundary() {
        assert_eq!(classify(NOW - DAY_MS - 1), ListState::Stale);
        assert_eq!(classify(NOW - DAY_MS), ListState::Fresh);
        assert_eq!(classify(NOW - DAY_MS + 1), ListState::Fresh);
        assert_eq!(classify(NOW), ListState::Fresh);
    }

    #[test]
    fn test_never_refreshed_is_stale() {
        assert_eq!(classify(0), ListState::Stale);
    }

    #[test]
    fn test_empty_wins_over_age() {
        let state = StalenessPolicy::default().classify(
            &AddressSet::new(),
            RefreshTimestamp::from_millis(NOW),
            RefreshTimestamp::from_millis(NOW),
        );
        assert_eq!(state, ListState::Empty);
    }

    #[test]
    fn test_custom_max_age() {
        let policy = StalenessPolicy::new(Duration::from_secs(60));
        let now = RefreshTimestamp::from_millis(NOW);

        assert_eq!(
            policy.classify(&one_address(), RefreshTimestamp::from_millis(NOW - 60_000), now),
            ListState::Fresh
        );
        assert_eq!(
            policy.classify(&one_address(), RefreshTimestamp::from_millis(NOW - 60_001), now),
            ListState::Stale
        );
    }

    #[test]
    fn test_transition_table() {
        use ListState::*;
        use UpdateMode::*;

        for state in [Empty, Fresh, Stale] {
            assert!(!NeverRefresh.should_refresh(state));
            assert!(ForceRefresh.should_refresh(state));
        }
        assert!(Auto.should_refresh(Empty));
        assert!(!Auto.should_refresh(Fresh));
        assert!(Auto.should_refresh(Stale));
    }

    #[test]
    fn test_update_mode_from_str() {
        assert_eq!("auto".parse::<UpdateMode>().unwrap(), UpdateMode::Auto);
        assert_eq!("TRUE".parse::<UpdateMode>().unwrap(), UpdateMode::ForceRefresh);
        assert_eq!("force".parse::<UpdateMode>().unwrap(), UpdateMode::ForceRefresh);
        assert_eq!("false".parse::<UpdateMode>().unwrap(), UpdateMode::NeverRefresh);
        assert_eq!("never".parse::<UpdateMode>().unwrap(), UpdateMode::NeverRefresh);
        assert!("sometimes".parse::<UpdateMode>().is_err());
    }

    #[test]
    fn test_update_mode_from_bool() {
        assert_eq!(UpdateMode::from(true), UpdateMode::ForceRefresh);
        assert_eq!(UpdateMode::from(false), UpdateMode::NeverRefresh);
        assert_eq!(UpdateMode::default(), UpdateMode::Auto);
    }
}
