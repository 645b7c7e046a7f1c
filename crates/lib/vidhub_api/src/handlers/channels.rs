//! Channel graph request handlers.

use axum::Extension;
use axum::extract::{Path, State};
use vidhub_core::graph::{channel, history};
use vidhub_core::models::channel::{ChannelProfile, WatchedVideo};

use crate::AppState;
use crate::error::AppResult;
use crate::middleware::auth::CurrentUser;
use crate::response::ApiResponse;

/// `GET /c/{username}` — channel profile as seen by the caller.
pub async fn channel_profile_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(username): Path<String>,
) -> AppResult<ApiResponse<ChannelProfile>> {
    let profile = channel::channel_profile(state.store.as_ref(), &username, &user.id).await?;
    Ok(ApiResponse::ok(profile, "User channel fetched successfully"))
}

/// `GET /history` — the caller's watch history.
pub async fn watch_history_handler(
    State(state): State<AppState>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> AppResult<ApiResponse<Vec<WatchedVideo>>> {
    let videos = history::watch_history(state.store.as_ref(), &user.id).await?;
    Ok(ApiResponse::ok(videos, "Watch history fetched successfully"))
}
