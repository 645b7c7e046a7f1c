//! JWT token generation and verification.
//!
//! Access and refresh tokens are both HS256 JWTs, signed with independent
//! secrets so neither class verifies under the other's key.

use std::path::PathBuf;

use chrono::{Duration, Utc};
use jsonwebtoken::{DecodingKey, EncodingKey, Header, Validation, decode, encode};
use rand::distr::Alphanumeric;
use rand::{Rng, rng};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::info;
use uuid::Uuid;

use super::AuthError;
use crate::models::auth::{AccessClaims, RefreshClaims};
use crate::models::user::UserRecord;

/// Default access token lifetime: 1 day.
pub const DEFAULT_ACCESS_TOKEN_TTL_SECS: i64 = 24 * 60 * 60;

/// Default refresh token lifetime: 10 days.
pub const DEFAULT_REFRESH_TOKEN_TTL_SECS: i64 = 10 * 24 * 60 * 60;

/// Signing secrets and lifetimes for both token classes.
#[derive(Clone)]
pub struct TokenConfig {
    pub access_secret: String,
    pub refresh_secret: String,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TokenConfig {
    /// Config with the default lifetimes.
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
            access_ttl: Duration::seconds(DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_ttl: Duration::seconds(DEFAULT_REFRESH_TOKEN_TTL_SECS),
        }
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .finish_non_exhaustive()
    }
}

fn sign<T: Serialize>(claims: &T, secret: &str) -> Result<String, AuthError> {
    encode(
        &Header::default(),
        claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| AuthError::Internal(format!("jwt encode: {e}")))
}

fn verify<T: DeserializeOwned>(token: &str, secret: &str) -> Option<T> {
    let key = DecodingKey::from_secret(secret.as_bytes());
    let mut validation = Validation::default();
    validation.validate_exp = true;
    decode::<T>(token, &key, &validation)
        .ok()
        .map(|data| data.claims)
}

/// Generate a signed access token for `user`.
pub fn generate_access_token(user: &UserRecord, config: &TokenConfig) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = AccessClaims {
        id: user.id.clone(),
        email: user.email.clone(),
        username: user.username.clone(),
        full_name: user.full_name.clone(),
        exp: (now + config.access_ttl).timestamp(),
        iat: now.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };
    sign(&claims, &config.access_secret)
}

/// Generate a signed refresh token carrying only the identity id.
pub fn generate_refresh_token(user_id: &str, config: &TokenConfig) -> Result<String, AuthError> {
    let now = Utc::now();
    let claims = RefreshClaims {
        id: user_id.to_string(),
        exp: (now + config.refresh_ttl).timestamp(),
        iat: now.timestamp(),
        jti: Uuid::new_v4().to_string(),
    };
    sign(&claims, &config.refresh_secret)
}

/// Verify an access token, returning the claims on success.
pub fn verify_access_token(token: &str, config: &TokenConfig) -> Option<AccessClaims> {
    verify(token, &config.access_secret)
}

/// Verify a refresh token, returning the claims on success.
pub fn verify_refresh_token(token: &str, config: &TokenConfig) -> Option<RefreshClaims> {
    verify(token, &config.refresh_secret)
}

/// Resolve a signing secret: env var `env_var` → persisted file `file_name`
/// → freshly generated (and persisted) random secret.
pub fn resolve_secret(env_var: &str, file_name: &str) -> String {
    if let Ok(secret) = std::env::var(env_var)
        && !secret.is_empty()
    {
        return secret;
    }
    let secret_path = secret_path(file_name);
    if let Ok(existing) = std::fs::read_to_string(&secret_path) {
        let trimmed = existing.trim();
        if !trimmed.is_empty() {
            return trimmed.to_string();
        }
    }
    let secret: String = rng()
        .sample_iter(&Alphanumeric)
        .take(64)
        .map(char::from)
        .collect();
    if let Some(parent) = secret_path.parent() {
        let _ = std::fs::create_dir_all(parent);
    }
    let _ = std::fs::write(&secret_path, &secret);
    info!(path = %secret_path.display(), env_var, "generated new signing secret");
    secret
}

/// Path to a persisted signing secret.
fn secret_path(file_name: &str) -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("vidhub")
        .join(file_name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> TokenConfig {
        TokenConfig::new("access-secret", "refresh-secret")
    }

    fn user() -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: "u1".into(),
            username: "ann".into(),
            email: "ann@example.com".into(),
            full_name: "Ann".into(),
            password: "hash".into(),
            avatar: "a".into(),
            cover_image: None,
            watch_history: vec![],
            refresh_token: None,
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn access_token_round_trip() {
        let token = generate_access_token(&user(), &config()).unwrap();
        let claims = verify_access_token(&token, &config()).unwrap();
        assert_eq!(claims.id, "u1");
        assert_eq!(claims.username, "ann");
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn token_classes_do_not_cross_verify() {
        let cfg = config();
        let access = generate_access_token(&user(), &cfg).unwrap();
        let refresh = generate_refresh_token("u1", &cfg).unwrap();
        assert!(verify_refresh_token(&access, &cfg).is_none());
        assert!(verify_access_token(&refresh, &cfg).is_none());
        assert!(verify_refresh_token(&refresh, &cfg).is_some());
    }

    #[test]
    fn tokens_minted_back_to_back_differ() {
        let cfg = config();
        let a = generate_refresh_token("u1", &cfg).unwrap();
        let b = generate_refresh_token("u1", &cfg).unwrap();
        assert_ne!(a, b);
    }

    #[test]
    fn expired_token_is_rejected() {
        let mut cfg = config();
        // Past the default 60s validation leeway.
        cfg.access_ttl = Duration::seconds(-120);
        let token = generate_access_token(&user(), &cfg).unwrap();
        assert!(verify_access_token(&token, &cfg).is_none());
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(verify_access_token("not.a.jwt", &config()).is_none());
    }
}
