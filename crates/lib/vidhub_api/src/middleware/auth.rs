//! Authentication middleware — access token extraction and identity resolution.

use axum::http::header::AUTHORIZATION;
use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};
use axum_extra::extract::cookie::CookieJar;
use vidhub_core::auth::session::{authenticate, select_access_token};
use vidhub_core::models::user::PublicUser;

use crate::AppState;
use crate::error::AppError;
use crate::services::cookies::ACCESS_COOKIE;

/// The caller resolved by [`require_auth`], stored in request extensions.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub PublicUser);

/// Axum middleware: takes the access token from the `accessToken` cookie or
/// `Authorization: Bearer <token>` (cookie first), resolves the identity and
/// injects [`CurrentUser`] into request extensions.
pub async fn require_auth(
    State(state): State<AppState>,
    jar: CookieJar,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|v| v.to_str().ok());
    let token = select_access_token(jar.get(ACCESS_COOKIE).map(|c| c.value()), header)
        .map(str::to_owned);

    let user = authenticate(state.store.as_ref(), &state.config.tokens, token.as_deref()).await?;

    request.extensions_mut().insert(CurrentUser(user));

    Ok(next.run(request).await)
}
