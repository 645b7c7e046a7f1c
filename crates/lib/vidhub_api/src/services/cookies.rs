//! Cookie service — set/clear the httpOnly auth cookies.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use time::Duration;
use vidhub_core::models::auth::TokenPair;

use crate::config::ApiConfig;

/// Cookie name for the access token.
pub const ACCESS_COOKIE: &str = "accessToken";
/// Cookie name for the refresh token.
pub const REFRESH_COOKIE: &str = "refreshToken";

fn auth_cookie(name: &'static str, value: String, max_age: Duration, secure: bool) -> Cookie<'static> {
    Cookie::build((name, value))
        .http_only(true)
        .secure(secure)
        .same_site(SameSite::Lax)
        .path("/")
        .max_age(max_age)
        .build()
}

/// Build the httpOnly cookie for the access token.
pub fn access_cookie(token: &str, config: &ApiConfig) -> Cookie<'static> {
    let max_age = Duration::seconds(config.tokens.access_ttl.num_seconds());
    auth_cookie(ACCESS_COOKIE, token.to_string(), max_age, config.cookie_secure)
}

/// Build the httpOnly cookie for the refresh token.
pub fn refresh_cookie(token: &str, config: &ApiConfig) -> Cookie<'static> {
    let max_age = Duration::seconds(config.tokens.refresh_ttl.num_seconds());
    auth_cookie(REFRESH_COOKIE, token.to_string(), max_age, config.cookie_secure)
}

/// Add both token cookies to the jar.
pub fn set_token_cookies(jar: CookieJar, pair: &TokenPair, config: &ApiConfig) -> CookieJar {
    jar.add(access_cookie(&pair.access_token, config))
        .add(refresh_cookie(&pair.refresh_token, config))
}

/// Overwrite both token cookies with expired, empty values.
pub fn clear_token_cookies(jar: CookieJar, config: &ApiConfig) -> CookieJar {
    jar.add(auth_cookie(ACCESS_COOKIE, String::new(), Duration::ZERO, config.cookie_secure))
        .add(auth_cookie(REFRESH_COOKIE, String::new(), Duration::ZERO, config.cookie_secure))
}
