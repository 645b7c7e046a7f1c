//! Token claims and the issued token pair.

use serde::{Deserialize, Serialize};

/// Claims embedded in access tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessClaims {
    /// Identity id.
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    pub username: String,
    pub full_name: String,
    /// Expiry (unix timestamp).
    pub exp: i64,
    /// Issued at (unix timestamp).
    pub iat: i64,
    /// Unique token id, so two tokens minted in the same second differ.
    pub jti: String,
}

/// Claims embedded in refresh tokens.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RefreshClaims {
    #[serde(rename = "_id")]
    pub id: String,
    pub exp: i64,
    pub iat: i64,
    pub jti: String,
}

/// A freshly minted access/refresh token pair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}
