//! Read-time social graph aggregations.
//!
//! Each read shape is a single pipeline executed by the store, so derived
//! counts and joins come from one snapshot with no per-row round trips.

pub mod channel;
pub mod history;

use thiserror::Error;

use crate::store::StoreError;

/// Aggregation errors.
#[derive(Debug, Error)]
pub enum GraphError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}
