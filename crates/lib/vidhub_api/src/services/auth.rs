//! Authentication service — register/login/refresh/logout flows delegating
//! to `vidhub_core::auth`.

use std::path::Path;

use tracing::info;
use vidhub_core::auth::jwt::TokenConfig;
use vidhub_core::auth::{AuthError, password, queries, tokens};
use vidhub_core::media::MediaStore;
use vidhub_core::models::auth::TokenPair;
use vidhub_core::models::user::{NewUser, PublicUser};
use vidhub_core::store::DocumentStore;

use crate::error::{AppError, AppResult};
use crate::models::{ChangePasswordRequest, LoginRequest, LoginResponse, RegisterRequest, non_blank};

/// Password values are checked for blankness but stored as given.
fn password_field(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

/// Hand a staged file to the media store and return its URL.
pub(crate) async fn upload_media(
    media: &dyn MediaStore,
    local_path: &str,
    what: &str,
) -> AppResult<String> {
    let uploaded = media.upload(Path::new(local_path)).await?;
    if uploaded.url.is_empty() {
        return Err(AppError::Internal(format!(
            "media store returned no url for {what}"
        )));
    }
    Ok(uploaded.url)
}

/// Register a new identity.
pub async fn register(
    store: &dyn DocumentStore,
    media: &dyn MediaStore,
    req: RegisterRequest,
) -> AppResult<PublicUser> {
    let (Some(full_name), Some(email), Some(username), Some(password)) = (
        non_blank(req.full_name),
        non_blank(req.email),
        non_blank(req.username),
        password_field(req.password),
    ) else {
        return Err(AppError::Validation("All fields are required".into()));
    };

    if queries::user_exists(store, &username, &email).await? {
        return Err(AppError::Conflict(
            "User with email or username already exists".into(),
        ));
    }

    let avatar_path = non_blank(req.avatar_local_path)
        .ok_or_else(|| AppError::Validation("Avatar file is required".into()))?;
    let avatar = upload_media(media, &avatar_path, "avatar").await?;
    let cover_image = match non_blank(req.cover_image_local_path) {
        Some(path) => Some(upload_media(media, &path, "cover image").await?),
        None => None,
    };

    let password_hash = password::hash_password_async(password).await?;
    let user = queries::create_user(
        store,
        NewUser {
            username,
            email,
            full_name,
            password_hash,
            avatar,
            cover_image,
        },
    )
    .await?;

    info!(user_id = %user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Authenticate with username or email plus password, issuing a token pair.
pub async fn login(
    store: &dyn DocumentStore,
    config: &TokenConfig,
    req: LoginRequest,
) -> AppResult<LoginResponse> {
    let username = non_blank(req.username);
    let email = non_blank(req.email);
    if username.is_none() && email.is_none() {
        return Err(AppError::Validation("username or email is required".into()));
    }
    let password = password_field(req.password)
        .ok_or_else(|| AppError::Validation("password is required".into()))?;

    let user = queries::find_user_by_login(store, username.as_deref(), email.as_deref())
        .await?
        .ok_or_else(|| AppError::NotFound("User does not exist".into()))?;

    if !password::verify_password_async(password, user.password.clone()).await? {
        return Err(AuthError::CredentialError.into());
    }

    let pair = tokens::issue_pair(store, config, &user.id).await?;
    info!(user_id = %user.id, "user logged in");
    Ok(LoginResponse {
        user: user.into(),
        access_token: pair.access_token,
        refresh_token: pair.refresh_token,
    })
}

/// Exchange a refresh token for a new pair (single-use rotation).
pub async fn refresh(
    store: &dyn DocumentStore,
    config: &TokenConfig,
    refresh_token: Option<&str>,
) -> AppResult<TokenPair> {
    Ok(tokens::rotate(store, config, refresh_token).await?)
}

/// Logout — revoke the identity's refresh token.
pub async fn logout(store: &dyn DocumentStore, user_id: &str) -> AppResult<()> {
    Ok(tokens::logout(store, user_id).await?)
}

/// Replace the password after checking the current one.
pub async fn change_password(
    store: &dyn DocumentStore,
    user_id: &str,
    req: ChangePasswordRequest,
) -> AppResult<()> {
    let (Some(old_password), Some(new_password)) = (
        password_field(req.old_password),
        password_field(req.new_password),
    ) else {
        return Err(AppError::Validation(
            "oldPassword and newPassword are required".into(),
        ));
    };

    let user = queries::find_user_by_id(store, user_id)
        .await?
        .ok_or_else(|| AppError::NotFound("User does not exist".into()))?;

    if !password::verify_password_async(old_password, user.password).await? {
        return Err(AppError::Validation("Invalid old password".into()));
    }

    let password_hash = password::hash_password_async(new_password).await?;
    queries::update_password(store, user_id, &password_hash).await?;
    info!(user_id, "password changed");
    Ok(())
}
