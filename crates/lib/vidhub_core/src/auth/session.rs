//! Access-token session gate.

use tracing::debug;

use super::jwt::{TokenConfig, verify_access_token};
use super::{AuthError, queries};
use crate::models::user::PublicUser;
use crate::store::DocumentStore;

/// Pick the access token to check: a non-empty cookie value wins over an
/// `Authorization: Bearer <token>` header.
pub fn select_access_token<'a>(
    cookie: Option<&'a str>,
    authorization: Option<&'a str>,
) -> Option<&'a str> {
    cookie.filter(|t| !t.is_empty()).or_else(|| {
        authorization
            .and_then(|h| h.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|t| !t.is_empty())
    })
}

/// Resolve the caller behind an access token.
///
/// No token → [`AuthError::Unauthorized`]; bad signature, expiry, or an
/// identity that no longer exists → [`AuthError::InvalidToken`].
pub async fn authenticate(
    store: &dyn DocumentStore,
    config: &TokenConfig,
    token: Option<&str>,
) -> Result<PublicUser, AuthError> {
    let token = token.ok_or_else(|| AuthError::Unauthorized("Unauthorized request".into()))?;

    let claims = verify_access_token(token, config)
        .ok_or_else(|| AuthError::InvalidToken("Invalid access token".into()))?;

    let user = queries::find_public_user(store, &claims.id)
        .await?
        .ok_or_else(|| AuthError::InvalidToken("Invalid access token".into()))?;

    debug!(user_id = %user.id, "request authenticated");
    Ok(user)
}
