//! Cache policy and memoization

mod memo;
mod policy;

pub use memo::ListMemo;
pub use policy::{DEFAULT_MAX_AGE, ListState, ParseUpdateModeError, StalenessPolicy, UpdateMode};
