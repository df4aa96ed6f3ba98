//! Exitcheck Persistence Layer
//!
//! This crate provides the storage abstraction for the cached exit-relay
//! list, supporting durable file storage and in-process memory.

pub mod backend;
pub mod error;
pub mod local;
pub mod memory;

pub use backend::ListStore;
pub use error::StorageError;
pub use local::FileStore;
pub use memory::MemoryStore;
