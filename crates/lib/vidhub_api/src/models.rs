//! Request and response bodies.
//!
//! Request fields are optional at the serde level so that missing input is
//! reported through the validation envelope rather than a body rejection.

use serde::{Deserialize, Serialize};
use vidhub_core::models::user::PublicUser;

/// `POST /register` body. Media fields are local paths of staged uploads.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RegisterRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
    pub avatar_local_path: Option<String>,
    pub cover_image_local_path: Option<String>,
}

/// `POST /login` body: username or email, plus password.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

/// `POST /refresh-token` body, for clients without cookie storage.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct RefreshRequest {
    pub refresh_token: Option<String>,
}

/// `POST /change-password` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ChangePasswordRequest {
    pub old_password: Option<String>,
    pub new_password: Option<String>,
}

/// `PATCH /update-account` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct UpdateAccountRequest {
    pub full_name: Option<String>,
    pub email: Option<String>,
}

/// `PATCH /avatar` and `PATCH /cover-image` body.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct MediaUpdateRequest {
    pub local_path: Option<String>,
}

/// Login result: the identity plus both tokens.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub user: PublicUser,
    pub access_token: String,
    pub refresh_token: String,
}

/// Healthcheck payload.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

/// Trimmed value, or `None` when absent or blank.
pub fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
