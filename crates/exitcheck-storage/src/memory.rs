//! In-memory storage backend

use async_trait::async_trait;
use exitcheck_types::{AddressSet, RefreshTimestamp};
use parking_lot::RwLock;

use crate::backend::ListStore;
use crate::error::StorageError;

#[derive(Debug, Default)]
struct Record {
    addresses: AddressSet,
    timestamp: RefreshTimestamp,
}

/// Process-local store for ephemeral hosts and tests
///
/// Reads return clones and writes store clones, so no collection is
/// ever shared between a caller and the stored record.
#[derive(Debug, Default)]
pub struct MemoryStore {
    record: RwLock<Record>,
}

impl MemoryStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a store seeded with a record
    pub fn with_record(addresses: AddressSet, timestamp: RefreshTimestamp) -> Self {
        Self {
            record: RwLock::new(Record {
                addresses,
                timestamp,
            }),
        }
    }
}

#[async_trait]
impl ListStore for MemoryStore {
    async fn read_addresses(&self) -> AddressSet {
        self.record.read().addresses.clone()
    }

    async fn write_addresses(&self, addresses: &AddressSet) -> Result<(), StorageError> {
        self.record.write().addresses = addresses.clone();
        Ok(())
    }

    async fn read_timestamp(&self) -> RefreshTimestamp {
        self.record.read().timestamp
    }

    async fn write_timestamp(&self, timestamp: RefreshTimestamp) -> Result<(), StorageError> {
        self.record.write().timestamp = timestamp;
        Ok(())
    }

    fn describe(&self) -> String {
        "memory store".to_string()
    }
}
