//! Token pair issuance, refresh-token rotation and revocation.
//!
//! A refresh token is only honoured while it equals the value persisted on
//! its identity. Issuing a pair overwrites that value, rotation replaces it
//! with a compare-and-swap, and logout removes it.

use tracing::{info, warn};

use super::jwt::{TokenConfig, generate_access_token, generate_refresh_token, verify_refresh_token};
use super::{AuthError, queries};
use crate::models::auth::TokenPair;
use crate::models::user::UserRecord;
use crate::store::DocumentStore;

const EXPIRED_OR_USED: &str = "Refresh token is expired or used";
const INVALID_REFRESH: &str = "Invalid refresh token";

fn mint_pair(user: &UserRecord, config: &TokenConfig) -> Result<TokenPair, AuthError> {
    Ok(TokenPair {
        access_token: generate_access_token(user, config)?,
        refresh_token: generate_refresh_token(&user.id, config)?,
    })
}

/// Mint a new pair for `user_id` and persist its refresh token, replacing any
/// previous one. Fails as a whole with [`AuthError::TokenIssuance`].
pub async fn issue_pair(
    store: &dyn DocumentStore,
    config: &TokenConfig,
    user_id: &str,
) -> Result<TokenPair, AuthError> {
    issue(store, config, user_id).await.map_err(|e| {
        warn!(user_id, error = %e, "token issuance failed");
        match e {
            AuthError::TokenIssuance(_) => e,
            other => AuthError::TokenIssuance(other.to_string()),
        }
    })
}

async fn issue(
    store: &dyn DocumentStore,
    config: &TokenConfig,
    user_id: &str,
) -> Result<TokenPair, AuthError> {
    let user = queries::find_user_by_id(store, user_id)
        .await?
        .ok_or_else(|| AuthError::TokenIssuance(format!("user {user_id} not found")))?;
    let pair = mint_pair(&user, config)?;
    if queries::set_refresh_token(store, user_id, &pair.refresh_token).await? == 0 {
        return Err(AuthError::TokenIssuance(format!(
            "user {user_id} vanished before the refresh token was stored"
        )));
    }
    Ok(pair)
}

/// Exchange a presented refresh token for a new pair.
///
/// Missing token → [`AuthError::Unauthorized`]; every other failure is
/// reported as [`AuthError::InvalidToken`].
pub async fn rotate(
    store: &dyn DocumentStore,
    config: &TokenConfig,
    presented: Option<&str>,
) -> Result<TokenPair, AuthError> {
    let presented = presented
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AuthError::Unauthorized("Unauthorized request".into()))?;

    rotate_presented(store, config, presented)
        .await
        .map_err(|e| match e {
            AuthError::InvalidToken(_) => e,
            other => {
                warn!(error = %other, "refresh token rotation failed");
                AuthError::InvalidToken(INVALID_REFRESH.into())
            }
        })
}

async fn rotate_presented(
    store: &dyn DocumentStore,
    config: &TokenConfig,
    presented: &str,
) -> Result<TokenPair, AuthError> {
    let claims = verify_refresh_token(presented, config)
        .ok_or_else(|| AuthError::InvalidToken(INVALID_REFRESH.into()))?;

    let user = queries::find_user_by_id(store, &claims.id)
        .await?
        .ok_or_else(|| AuthError::InvalidToken(INVALID_REFRESH.into()))?;

    if user.refresh_token.as_deref() != Some(presented) {
        warn!(user_id = %user.id, "stale refresh token presented");
        return Err(AuthError::InvalidToken(EXPIRED_OR_USED.into()));
    }

    let pair = mint_pair(&user, config)?;
    let swapped =
        queries::swap_refresh_token(store, &user.id, presented, &pair.refresh_token).await?;
    if swapped == 0 {
        warn!(user_id = %user.id, "refresh token rotated concurrently");
        return Err(AuthError::InvalidToken(EXPIRED_OR_USED.into()));
    }

    info!(user_id = %user.id, "refresh token rotated");
    Ok(pair)
}

/// Revoke the identity's refresh token.
pub async fn logout(store: &dyn DocumentStore, user_id: &str) -> Result<(), AuthError> {
    let matched = queries::clear_refresh_token(store, user_id).await?;
    info!(user_id, matched, "refresh token cleared");
    Ok(())
}
