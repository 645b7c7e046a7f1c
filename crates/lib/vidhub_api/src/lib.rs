//! # vidhub_api
//!
//! HTTP API library for Vidhub.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod middleware;
pub mod models;
pub mod response;
pub mod routes;
pub mod services;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::header::{AUTHORIZATION, CONTENT_TYPE};
use axum::http::{HeaderValue, Method};
use axum::routing::{get, patch, post};
use tower_http::cors::{Any, CorsLayer};
use tracing::warn;
use vidhub_core::media::MediaStore;
use vidhub_core::store::DocumentStore;

use crate::config::ApiConfig;
use crate::handlers::{auth, channels, health, users};

/// JSON request bodies above this size are rejected.
const BODY_LIMIT_BYTES: usize = 16 * 1024;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// Document store holding identities, subscriptions and videos.
    pub store: Arc<dyn DocumentStore>,
    /// Media hosting collaborator.
    pub media: Arc<dyn MediaStore>,
    /// API configuration.
    pub config: ApiConfig,
}

/// Builds the Axum router with all routes and shared state.
pub fn router(state: AppState) -> Router {
    let cors = cors_layer(state.config.cors_origin.as_deref());

    // Public routes (no auth required)
    let public = Router::new()
        .route(routes::POST_REGISTER, post(auth::register_handler))
        .route(routes::POST_LOGIN, post(auth::login_handler))
        .route(routes::POST_REFRESH_TOKEN, post(auth::refresh_handler));

    // Protected routes (require auth)
    let protected = Router::new()
        .route(routes::POST_LOGOUT, post(auth::logout_handler))
        .route(routes::POST_CHANGE_PASSWORD, post(auth::change_password_handler))
        .route(routes::GET_CURRENT_USER, get(users::current_user_handler))
        .route(routes::PATCH_UPDATE_ACCOUNT, patch(users::update_account_handler))
        .route(routes::PATCH_AVATAR, patch(users::update_avatar_handler))
        .route(routes::PATCH_COVER_IMAGE, patch(users::update_cover_image_handler))
        .route(routes::GET_CHANNEL, get(channels::channel_profile_handler))
        .route(routes::GET_HISTORY, get(channels::watch_history_handler))
        .layer(axum::middleware::from_fn_with_state(
            state.clone(),
            middleware::auth::require_auth,
        ));

    Router::new()
        .route(routes::GET_HEALTHCHECK, get(health::healthcheck_handler))
        .nest(routes::USERS_BASE, public.merge(protected))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .with_state(state)
}

/// Credentialed CORS for a configured origin, permissive otherwise.
fn cors_layer(origin: Option<&str>) -> CorsLayer {
    let Some(origin) = origin else {
        return CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any);
    };
    match HeaderValue::from_str(origin) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PATCH])
            .allow_headers([AUTHORIZATION, CONTENT_TYPE])
            .allow_credentials(true),
        Err(e) => {
            warn!(origin, error = %e, "ignoring invalid CORS origin");
            CorsLayer::new()
        }
    }
}
