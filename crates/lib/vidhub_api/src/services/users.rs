//! Profile updates for the authenticated identity.

use tracing::info;
use vidhub_core::auth::queries::{self, MediaField};
use vidhub_core::media::MediaStore;
use vidhub_core::models::user::PublicUser;
use vidhub_core::store::DocumentStore;

use super::auth::upload_media;
use crate::error::{AppError, AppResult};
use crate::models::{MediaUpdateRequest, UpdateAccountRequest, non_blank};

/// Update display name and email.
pub async fn update_account(
    store: &dyn DocumentStore,
    user_id: &str,
    req: UpdateAccountRequest,
) -> AppResult<PublicUser> {
    let (Some(full_name), Some(email)) = (non_blank(req.full_name), non_blank(req.email)) else {
        return Err(AppError::Validation("All fields are required".into()));
    };
    let user = queries::update_profile(store, user_id, &full_name, &email).await?;
    info!(user_id, "account details updated");
    Ok(user)
}

/// Upload a staged file and point `field` at it.
pub async fn update_media(
    store: &dyn DocumentStore,
    media: &dyn MediaStore,
    user_id: &str,
    field: MediaField,
    req: MediaUpdateRequest,
) -> AppResult<PublicUser> {
    let what = match field {
        MediaField::Avatar => "avatar",
        MediaField::CoverImage => "cover image",
    };
    let local_path = non_blank(req.local_path)
        .ok_or_else(|| AppError::Validation(format!("{what} file is missing")))?;
    let url = upload_media(media, &local_path, what).await?;
    let user = queries::set_media(store, user_id, field, &url).await?;
    info!(user_id, field = field.field_name(), "media updated");
    Ok(user)
}
