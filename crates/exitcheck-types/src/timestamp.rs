//! Refresh timestamp

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::num::ParseIntError;
use std::str::FromStr;

/// Milliseconds since the Unix epoch of the last successful refresh
///
/// Zero means the list was never refreshed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RefreshTimestamp(i64);

impl RefreshTimestamp {
    pub const NEVER: RefreshTimestamp = RefreshTimestamp(0);

    pub fn from_millis(millis: i64) -> Self {
        Self(millis)
    }

    pub fn now() -> Self {
        Self(Utc::now().timestamp_millis())
    }

    pub fn as_millis(&self) -> i64 {
        self.0
    }

    pub fn is_never(&self) -> bool {
        self.0 == 0
    }

    /// Milliseconds elapsed between this timestamp and `now`
    ///
    /// Negative when the timestamp lies in the future.
    pub fn age_at(&self, now: RefreshTimestamp) -> i64 {
        now.0.saturating_sub(self.0)
    }

    pub fn to_datetime(&self) -> Option<DateTime<Utc>> {
        if self.is_never() {
            return None;
        }
        DateTime::from_timestamp_millis(self.0)
    }
}

impl fmt::Display for RefreshTimestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RefreshTimestamp {
    type Err = ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse::<i64>().map(Self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_never() {
        assert!(RefreshTimestamp::NEVER.is_never());
        assert!(RefreshTimestamp::default().is_never());
        assert!(RefreshTimestamp::NEVER.to_datetime().is_none());
    }

    #[test]
    fn test_parse_trims() {
        let ts: RefreshTimestamp = " 1700000000000\n".parse().unwrap();
        assert_eq!(ts.as_millis(), 1_700_000_000_000);
        assert!("abc".parse::<RefreshTimestamp>().is_err());
    }

    #[test]
    fn test_age_at() {
        let then = RefreshTimestamp::from_millis(1_000);
        assert_eq!(then.age_at(RefreshTimestamp::from_millis(4_500)), 3_500);
        assert_eq!(then.age_at(RefreshTimestamp::from_millis(500)), -500);
    }
}
