//! Persistence store trait

use async_trait::async_trait;
use exitcheck_types::{AddressSet, RefreshTimestamp};

use crate::error::StorageError;

/// Persistence store trait
///
/// A store owns one record: the cached address set and the time it was
/// last refreshed. Reads never fail; an absent or unreadable record
/// reads as empty / [`RefreshTimestamp::NEVER`]. Reads hand out copies,
/// so callers cannot mutate the stored record through them.
#[async_trait]
pub trait ListStore: Send + Sync {
    /// Read the stored address set
    async fn read_addresses(&self) -> AddressSet;

    /// Replace the stored address set
    async fn write_addresses(&self, addresses: &AddressSet) -> Result<(), StorageError>;

    /// Read the last refresh timestamp
    async fn read_timestamp(&self) -> RefreshTimestamp;

    /// Replace the last refresh timestamp
    async fn write_timestamp(&self, timestamp: RefreshTimestamp) -> Result<(), StorageError>;

    /// Human-readable location of the record
    fn describe(&self) -> String;

    /// Write a full record after a successful refresh
    ///
    /// The set is written before the timestamp, so a failure between the
    /// two leaves the record looking stale rather than falsely fresh.
    async fn write_record(
        &self,
        addresses: &AddressSet,
        timestamp: RefreshTimestamp,
    ) -> Result<(), StorageError> {
        self.write_addresses(addresses).await?;
        self.write_timestamp(timestamp).await
    }
}
