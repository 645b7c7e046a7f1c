//! Identity records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Identity as stored, including the password hash and current refresh token.
/// Only [`PublicUser`] is handed to callers.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserRecord {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password: String,
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub watch_history: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl std::fmt::Debug for UserRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UserRecord")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("email", &self.email)
            .field("full_name", &self.full_name)
            .field("avatar", &self.avatar)
            .field("cover_image", &self.cover_image)
            .field("watch_history", &self.watch_history)
            .field("has_refresh_token", &self.refresh_token.is_some())
            .finish_non_exhaustive()
    }
}

/// Identity as returned to callers: no password hash, no refresh token.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PublicUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub avatar: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cover_image: Option<String>,
    #[serde(default)]
    pub watch_history: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<UserRecord> for PublicUser {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id,
            username: record.username,
            email: record.email,
            full_name: record.full_name,
            avatar: record.avatar,
            cover_image: record.cover_image,
            watch_history: record.watch_history,
            created_at: record.created_at,
            updated_at: record.updated_at,
        }
    }
}

/// Fields required to create an identity. Media references are already
/// uploaded URLs.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub full_name: String,
    pub password_hash: String,
    pub avatar: String,
    pub cover_image: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record() -> UserRecord {
        let now = Utc::now();
        UserRecord {
            id: "u1".into(),
            username: "ann".into(),
            email: "ann@example.com".into(),
            full_name: "Ann".into(),
            password: "$2b$10$hash".into(),
            avatar: "https://media/a.png".into(),
            cover_image: None,
            watch_history: vec![],
            refresh_token: Some("rt".into()),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn public_user_never_serializes_secrets() {
        let json = serde_json::to_value(PublicUser::from(record())).unwrap();
        assert!(json.get("password").is_none());
        assert!(json.get("refreshToken").is_none());
        assert_eq!(json["_id"], "u1");
        assert_eq!(json["fullName"], "Ann");
    }

    #[test]
    fn debug_output_hides_secrets() {
        let out = format!("{:?}", record());
        assert!(out.contains("ann@example.com"));
        assert!(!out.contains("$2b$10$hash"));
        assert!(!out.contains("\"rt\""));
        assert!(out.contains("has_refresh_token: true"));
    }

    #[test]
    fn stored_record_uses_document_field_names() {
        let json = serde_json::to_value(record()).unwrap();
        assert_eq!(json["refreshToken"], "rt");
        assert!(json.get("coverImage").is_none());
        assert_eq!(json["watchHistory"], serde_json::json!([]));
    }
}
