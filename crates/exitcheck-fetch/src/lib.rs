//! Exitcheck List Fetcher
//!
//! This crate provides the client for the remote exit-list publisher
//! and the own-address discovery service.

pub mod client;
pub mod error;
pub mod source;

pub use client::{
    ExitListClient, ExitListClientConfig, DEFAULT_ADDRESS_URL, DEFAULT_LIST_URL,
    DEFAULT_TIMEOUT_SECS,
};
pub use error::FetchError;
pub use source::{AddressResolver, ListFetcher};
