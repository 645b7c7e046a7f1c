//! Authentication request handlers.

use axum::extract::State;
use axum::extract::rejection::JsonRejection;
use axum::{Extension, Json};
use axum_extra::extract::cookie::CookieJar;
use vidhub_core::models::auth::TokenPair;
use vidhub_core::models::user::PublicUser;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::auth::CurrentUser;
use crate::models::{ChangePasswordRequest, LoginRequest, LoginResponse, RefreshRequest, RegisterRequest};
use crate::response::{ApiResponse, Empty};
use crate::services::auth;
use crate::services::cookies::{REFRESH_COOKIE, clear_token_cookies, set_token_cookies};

/// `POST /register` — create a new identity.
pub async fn register_handler(
    State(state): State<AppState>,
    AppJson(body): AppJson<RegisterRequest>,
) -> AppResult<ApiResponse<PublicUser>> {
    let user = auth::register(state.store.as_ref(), state.media.as_ref(), body).await?;
    Ok(ApiResponse::created(user, "User registered successfully"))
}

/// `POST /login` — authenticate and set both token cookies.
pub async fn login_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    AppJson(body): AppJson<LoginRequest>,
) -> AppResult<(CookieJar, ApiResponse<LoginResponse>)> {
    let resp = auth::login(state.store.as_ref(), &state.config.tokens, body).await?;
    let pair = TokenPair {
        access_token: resp.access_token.clone(),
        refresh_token: resp.refresh_token.clone(),
    };
    let jar = set_token_cookies(jar, &pair, &state.config);
    Ok((jar, ApiResponse::ok(resp, "User logged in successfully")))
}

/// `POST /logout` — revoke the refresh token and clear both cookies.
pub async fn logout_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    jar: CookieJar,
) -> AppResult<(CookieJar, ApiResponse<Empty>)> {
    auth::logout(state.store.as_ref(), &user.id).await?;
    let jar = clear_token_cookies(jar, &state.config);
    Ok((jar, ApiResponse::ok(Empty {}, "User logged out")))
}

/// `POST /refresh-token` — rotate the refresh token from the cookie or body.
pub async fn refresh_handler(
    State(state): State<AppState>,
    jar: CookieJar,
    body: Result<Option<Json<RefreshRequest>>, JsonRejection>,
) -> AppResult<(CookieJar, ApiResponse<TokenPair>)> {
    let body = body?;
    let presented = jar
        .get(REFRESH_COOKIE)
        .map(|c| c.value().to_string())
        .filter(|t| !t.is_empty())
        .or_else(|| body.and_then(|Json(b)| b.refresh_token));

    let pair = auth::refresh(state.store.as_ref(), &state.config.tokens, presented.as_deref()).await?;
    let jar = set_token_cookies(jar, &pair, &state.config);
    Ok((jar, ApiResponse::ok(pair, "Access token refreshed")))
}

/// `POST /change-password` — replace the caller's password.
pub async fn change_password_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(body): AppJson<ChangePasswordRequest>,
) -> AppResult<ApiResponse<Empty>> {
    auth::change_password(state.store.as_ref(), &user.id, body).await?;
    Ok(ApiResponse::ok(Empty {}, "Password changed successfully"))
}
