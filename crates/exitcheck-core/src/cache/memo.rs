//! Short-lived in-process list memo

use exitcheck_types::AddressSet;
use parking_lot::Mutex;
use std::time::{Duration, Instant};
use tracing::debug;

#[derive(Debug)]
struct MemoEntry {
    addresses: AddressSet,
    stored_at: Instant,
}

/// Remembers the last list served for `ttl`
///
/// Sits in front of the store to absorb bursts of lookups. Each service
/// owns its own memo; there is no process-wide state.
#[derive(Debug)]
pub struct ListMemo {
    ttl: Duration,
    slot: Mutex<Option<MemoEntry>>,
}

impl ListMemo {
    pub fn new(ttl: Duration) -> Self {
        Self {
            ttl,
            slot: Mutex::new(None),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Return the memoized list if it has not expired
    pub fn get(&self) -> Option<AddressSet> {
        self.get_at(Instant::now())
    }

    fn get_at(&self, now: Instant) -> Option<AddressSet> {
        let mut slot = self.slot.lock();

        let live = slot
            .as_ref()
            .is_some_and(|entry| now.saturating_duration_since(entry.stored_at) < self.ttl);

        if live {
            return slot.as_ref().map(|entry| entry.addresses.clone());
        }

        if slot.take().is_some() {
            debug!("List memo expired");
        }
        None
    }

    /// Remember a list; empty lists are never memoized
    pub fn put(&self, addresses: &AddressSet) {
        if addresses.is_empty() {
            return;
        }

        *self.slot.lock() = Some(MemoEntry {
            addresses: addresses.clone(),
            stored_at: Instant::now(),
        });
    }

    pub fn clear(&self) {
        *self.slot.lock() = None;
    }
}
