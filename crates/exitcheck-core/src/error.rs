//! Core error types

use exitcheck_types::AddressSet;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Fetch error: {0}")]
    Fetch(#[from] exitcheck_fetch::FetchError),

    /// The list was fetched but could not be written to the store
    #[error("Fetched {} addresses but failed to persist them: {source}", .addresses.len())]
    Persist {
        addresses: AddressSet,
        source: exitcheck_storage::StorageError,
    },
}
