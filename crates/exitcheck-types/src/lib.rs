//! Exitcheck shared data model
//!
//! This crate holds the types passed between the store, the fetcher
//! and the cache coordinator: the validated address set and the
//! refresh timestamp.

pub mod address;
pub mod error;
pub mod timestamp;

pub use address::{is_ipv4, AddressSet, ParsedList};
pub use error::InvalidAddress;
pub use timestamp::RefreshTimestamp;
