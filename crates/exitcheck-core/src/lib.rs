//! Exitcheck Core Business Logic
//!
//! This crate provides the cache coordinator: the staleness policy that
//! decides when the stored exit list must be refreshed, the optional
//! in-process memo, and the lookup operations built on top of them.

pub mod cache;
pub mod config;
pub mod error;
pub mod service;

pub use cache::{DEFAULT_MAX_AGE, ListMemo, ListState, StalenessPolicy, UpdateMode};
pub use config::{DEFAULT_MEMO_TTL, ServiceConfig};
pub use error::CoreError;
pub use service::{ExitListService, ListStatus, UNKNOWN_ADDRESS};
