//! Authentication and session logic.
//!
//! Password hashing, token minting/verification, the refresh-token
//! rotation protocol and the identity queries they depend on.

pub mod jwt;
pub mod password;
pub mod queries;
pub mod session;
pub mod tokens;

use thiserror::Error;

use crate::store::StoreError;

/// Authentication errors.
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("Invalid user credentials")]
    CredentialError,

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Invalid token: {0}")]
    InvalidToken(String),

    #[error("Token issuance failed: {0}")]
    TokenIssuance(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Internal error: {0}")]
    Internal(String),
}
