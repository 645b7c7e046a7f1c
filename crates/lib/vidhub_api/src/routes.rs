//! Route paths. User routes are relative to [`USERS_BASE`].

pub const GET_HEALTHCHECK: &str = "/api/v1/healthcheck";

pub const USERS_BASE: &str = "/api/v1/users";

pub const POST_REGISTER: &str = "/register";
pub const POST_LOGIN: &str = "/login";
pub const POST_LOGOUT: &str = "/logout";
pub const POST_REFRESH_TOKEN: &str = "/refresh-token";
pub const POST_CHANGE_PASSWORD: &str = "/change-password";
pub const GET_CURRENT_USER: &str = "/current-user";
pub const PATCH_UPDATE_ACCOUNT: &str = "/update-account";
pub const PATCH_AVATAR: &str = "/avatar";
pub const PATCH_COVER_IMAGE: &str = "/cover-image";
pub const GET_CHANNEL: &str = "/c/{username}";
pub const GET_HISTORY: &str = "/history";
