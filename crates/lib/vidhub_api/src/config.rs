//! API server configuration.

use std::path::PathBuf;

use chrono::Duration;
use tracing::warn;
use vidhub_core::auth::jwt::{
    DEFAULT_ACCESS_TOKEN_TTL_SECS, DEFAULT_REFRESH_TOKEN_TTL_SECS, TokenConfig, resolve_secret,
};

/// Configuration for the API server.
#[derive(Clone, Debug)]
pub struct ApiConfig {
    /// Address to bind the HTTP listener (e.g. "127.0.0.1:8000").
    pub bind_addr: String,
    /// Allowed browser origin. Enables credentialed CORS when set.
    pub cors_origin: Option<String>,
    /// Token secrets and lifetimes.
    pub tokens: TokenConfig,
    /// Mark auth cookies `Secure`.
    pub cookie_secure: bool,
    /// Directory uploaded media is moved into.
    pub media_dir: PathBuf,
    /// Public URL prefix for uploaded media.
    pub media_base_url: String,
}

impl ApiConfig {
    /// Reads configuration from environment variables with sensible defaults.
    ///
    /// | Variable               | Default                               |
    /// |------------------------|---------------------------------------|
    /// | `BIND_ADDR`            | `127.0.0.1:8000`                      |
    /// | `CORS_ORIGIN`          | unset (any origin, no credentials)    |
    /// | `ACCESS_TOKEN_SECRET`  | generated & persisted to file         |
    /// | `REFRESH_TOKEN_SECRET` | generated & persisted to file         |
    /// | `ACCESS_TOKEN_EXPIRY`  | `1d`                                  |
    /// | `REFRESH_TOKEN_EXPIRY` | `10d`                                 |
    /// | `COOKIE_SECURE`        | `true`                                |
    /// | `MEDIA_DIR`            | `./public/media`                      |
    /// | `MEDIA_BASE_URL`       | `http://127.0.0.1:8000/media`         |
    pub fn from_env() -> Self {
        let access_secret = resolve_secret("ACCESS_TOKEN_SECRET", "access-token-secret");
        let refresh_secret = resolve_secret("REFRESH_TOKEN_SECRET", "refresh-token-secret");
        if access_secret == refresh_secret {
            warn!("access and refresh token secrets are identical; token classes will cross-verify");
        }
        let tokens = TokenConfig {
            access_secret,
            refresh_secret,
            access_ttl: ttl_from_env("ACCESS_TOKEN_EXPIRY", DEFAULT_ACCESS_TOKEN_TTL_SECS),
            refresh_ttl: ttl_from_env("REFRESH_TOKEN_EXPIRY", DEFAULT_REFRESH_TOKEN_TTL_SECS),
        };
        Self {
            bind_addr: std::env::var("BIND_ADDR").unwrap_or_else(|_| "127.0.0.1:8000".into()),
            cors_origin: std::env::var("CORS_ORIGIN").ok().filter(|o| !o.is_empty()),
            tokens,
            cookie_secure: std::env::var("COOKIE_SECURE")
                .map(|v| v != "false" && v != "0")
                .unwrap_or(true),
            media_dir: std::env::var("MEDIA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./public/media")),
            media_base_url: std::env::var("MEDIA_BASE_URL")
                .unwrap_or_else(|_| "http://127.0.0.1:8000/media".into()),
        }
    }
}

fn ttl_from_env(var: &str, default_secs: i64) -> Duration {
    match std::env::var(var) {
        Ok(raw) => parse_ttl(&raw).unwrap_or_else(|| {
            warn!(var, value = %raw, "unparseable token lifetime, using default");
            Duration::seconds(default_secs)
        }),
        Err(_) => Duration::seconds(default_secs),
    }
}

/// Parse a lifetime such as `900`, `15m`, `12h` or `10d`. Bare numbers are
/// seconds.
pub fn parse_ttl(raw: &str) -> Option<Duration> {
    let raw = raw.trim();
    let split = raw.find(|c: char| !c.is_ascii_digit()).unwrap_or(raw.len());
    let (digits, unit) = raw.split_at(split);
    let amount: i64 = digits.parse().ok()?;
    let secs = match unit {
        "" | "s" => amount,
        "m" => amount.checked_mul(60)?,
        "h" => amount.checked_mul(60 * 60)?,
        "d" => amount.checked_mul(24 * 60 * 60)?,
        _ => return None,
    };
    (secs > 0).then(|| Duration::seconds(secs))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_ttl_units() {
        assert_eq!(parse_ttl("900"), Some(Duration::seconds(900)));
        assert_eq!(parse_ttl("15m"), Some(Duration::minutes(15)));
        assert_eq!(parse_ttl("12h"), Some(Duration::hours(12)));
        assert_eq!(parse_ttl(" 10d "), Some(Duration::days(10)));
    }

    #[test]
    fn parse_ttl_rejects_garbage() {
        assert_eq!(parse_ttl(""), None);
        assert_eq!(parse_ttl("d"), None);
        assert_eq!(parse_ttl("10w"), None);
        assert_eq!(parse_ttl("0"), None);
        assert_eq!(parse_ttl("-5m"), None);
    }
}
