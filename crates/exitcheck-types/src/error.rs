//! Model error types

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Invalid IPv4 address: {0}")]
pub struct InvalidAddress(pub String);
