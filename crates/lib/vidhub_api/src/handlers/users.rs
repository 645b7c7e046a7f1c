//! Profile request handlers.

use axum::extract::State;
use axum::Extension;
use vidhub_core::auth::queries::MediaField;
use vidhub_core::models::user::PublicUser;

use crate::AppState;
use crate::error::AppResult;
use crate::extract::AppJson;
use crate::middleware::auth::CurrentUser;
use crate::models::{MediaUpdateRequest, UpdateAccountRequest};
use crate::response::ApiResponse;
use crate::services::users;

/// `GET /current-user` — the identity resolved by the auth middleware.
pub async fn current_user_handler(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResponse<PublicUser> {
    ApiResponse::ok(user, "Current user fetched successfully")
}

/// `PATCH /update-account` — update display name and email.
pub async fn update_account_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(body): AppJson<UpdateAccountRequest>,
) -> AppResult<ApiResponse<PublicUser>> {
    let user = users::update_account(state.store.as_ref(), &user.id, body).await?;
    Ok(ApiResponse::ok(user, "Account details updated successfully"))
}

/// `PATCH /avatar` — replace the avatar.
pub async fn update_avatar_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(body): AppJson<MediaUpdateRequest>,
) -> AppResult<ApiResponse<PublicUser>> {
    let user = users::update_media(
        state.store.as_ref(),
        state.media.as_ref(),
        &user.id,
        MediaField::Avatar,
        body,
    )
    .await?;
    Ok(ApiResponse::ok(user, "Avatar updated successfully"))
}

/// `PATCH /cover-image` — replace the cover image.
pub async fn update_cover_image_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    AppJson(body): AppJson<MediaUpdateRequest>,
) -> AppResult<ApiResponse<PublicUser>> {
    let user = users::update_media(
        state.store.as_ref(),
        state.media.as_ref(),
        &user.id,
        MediaField::CoverImage,
        body,
    )
    .await?;
    Ok(ApiResponse::ok(user, "Cover image updated successfully"))
}
