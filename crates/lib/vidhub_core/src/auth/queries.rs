//! Identity queries against the document store.

use chrono::Utc;
use serde_json::Value;

use super::AuthError;
use crate::models::user::{NewUser, PublicUser, UserRecord};
use crate::store::{DocumentStore, Filter, USERS, Update, from_document, to_document};
use crate::uuid::new_object_id;

pub const FIELD_USERNAME: &str = "username";
pub const FIELD_EMAIL: &str = "email";
pub const FIELD_FULL_NAME: &str = "fullName";
pub const FIELD_PASSWORD: &str = "password";
pub const FIELD_AVATAR: &str = "avatar";
pub const FIELD_COVER_IMAGE: &str = "coverImage";
pub const FIELD_REFRESH_TOKEN: &str = "refreshToken";
pub const FIELD_UPDATED_AT: &str = "updatedAt";

/// Media fields that can be replaced after registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaField {
    Avatar,
    CoverImage,
}

impl MediaField {
    pub fn field_name(self) -> &'static str {
        match self {
            MediaField::Avatar => FIELD_AVATAR,
            MediaField::CoverImage => FIELD_COVER_IMAGE,
        }
    }
}

fn touch(update: Update) -> Update {
    update.set(FIELD_UPDATED_AT, Value::String(Utc::now().to_rfc3339()))
}

/// Fetch the stored identity by id.
pub async fn find_user_by_id(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<Option<UserRecord>, AuthError> {
    let doc = store.find_one(USERS, &Filter::id(user_id)).await?;
    Ok(doc.map(from_document).transpose()?)
}

/// Fetch an identity by id without password hash or refresh token.
pub async fn find_public_user(
    store: &dyn DocumentStore,
    user_id: &str,
) -> Result<Option<PublicUser>, AuthError> {
    let doc = store.find_one(USERS, &Filter::id(user_id)).await?;
    Ok(doc.map(from_document).transpose()?)
}

/// Fetch an identity by username or email. At least one must be given;
/// both are compared lowercased.
pub async fn find_user_by_login(
    store: &dyn DocumentStore,
    username: Option<&str>,
    email: Option<&str>,
) -> Result<Option<UserRecord>, AuthError> {
    let filter = login_filter(username, email)
        .ok_or_else(|| AuthError::ValidationError("username or email is required".into()))?;
    let doc = store.find_one(USERS, &filter).await?;
    Ok(doc.map(from_document).transpose()?)
}

fn login_filter(username: Option<&str>, email: Option<&str>) -> Option<Filter> {
    let mut any = Vec::new();
    if let Some(username) = username {
        any.push(Filter::eq(FIELD_USERNAME, username.to_lowercase()));
    }
    if let Some(email) = email {
        any.push(Filter::eq(FIELD_EMAIL, email.to_lowercase()));
    }
    if any.is_empty() {
        None
    } else {
        Some(Filter::Or(any))
    }
}

/// Check whether the username or email is already taken.
pub async fn user_exists(
    store: &dyn DocumentStore,
    username: &str,
    email: &str,
) -> Result<bool, AuthError> {
    Ok(find_user_by_login(store, Some(username), Some(email))
        .await?
        .is_some())
}

/// Create a new identity, returning its public view.
pub async fn create_user(
    store: &dyn DocumentStore,
    new_user: NewUser,
) -> Result<PublicUser, AuthError> {
    let now = Utc::now();
    let record = UserRecord {
        id: new_object_id(),
        username: new_user.username.to_lowercase(),
        email: new_user.email.to_lowercase(),
        full_name: new_user.full_name,
        password: new_user.password_hash,
        avatar: new_user.avatar,
        cover_image: new_user.cover_image,
        watch_history: Vec::new(),
        refresh_token: None,
        created_at: now,
        updated_at: now,
    };
    store.insert_one(USERS, to_document(&record)?).await?;
    Ok(record.into())
}

/// Overwrite the persisted refresh token. Returns the matched count.
pub async fn set_refresh_token(
    store: &dyn DocumentStore,
    user_id: &str,
    token: &str,
) -> Result<u64, AuthError> {
    Ok(store
        .update_one(
            USERS,
            &Filter::id(user_id),
            &Update::new().set(FIELD_REFRESH_TOKEN, token),
        )
        .await?)
}

/// Replace the persisted refresh token only if it still equals `expected`.
/// Returns 0 when another writer got there first.
pub async fn swap_refresh_token(
    store: &dyn DocumentStore,
    user_id: &str,
    expected: &str,
    replacement: &str,
) -> Result<u64, AuthError> {
    let filter = Filter::And(vec![
        Filter::id(user_id),
        Filter::eq(FIELD_REFRESH_TOKEN, expected),
    ]);
    Ok(store
        .update_one(
            USERS,
            &filter,
            &Update::new().set(FIELD_REFRESH_TOKEN, replacement),
        )
        .await?)
}

/// Remove the persisted refresh token.
pub async fn clear_refresh_token(store: &dyn DocumentStore, user_id: &str) -> Result<u64, AuthError> {
    Ok(store
        .update_one(
            USERS,
            &Filter::id(user_id),
            &Update::new().unset(FIELD_REFRESH_TOKEN),
        )
        .await?)
}

/// Store a new password hash.
pub async fn update_password(
    store: &dyn DocumentStore,
    user_id: &str,
    password_hash: &str,
) -> Result<(), AuthError> {
    let matched = store
        .update_one(
            USERS,
            &Filter::id(user_id),
            &touch(Update::new().set(FIELD_PASSWORD, password_hash)),
        )
        .await?;
    if matched == 0 {
        return Err(AuthError::NotFound("User does not exist".into()));
    }
    Ok(())
}

/// Update display name and email, returning the updated identity.
pub async fn update_profile(
    store: &dyn DocumentStore,
    user_id: &str,
    full_name: &str,
    email: &str,
) -> Result<PublicUser, AuthError> {
    let update = Update::new()
        .set(FIELD_FULL_NAME, full_name)
        .set(FIELD_EMAIL, email.to_lowercase());
    apply_and_reload(store, user_id, touch(update)).await
}

/// Point a media field at a new URL, returning the updated identity.
pub async fn set_media(
    store: &dyn DocumentStore,
    user_id: &str,
    field: MediaField,
    url: &str,
) -> Result<PublicUser, AuthError> {
    let update = Update::new().set(field.field_name(), url);
    apply_and_reload(store, user_id, touch(update)).await
}

async fn apply_and_reload(
    store: &dyn DocumentStore,
    user_id: &str,
    update: Update,
) -> Result<PublicUser, AuthError> {
    let matched = store.update_one(USERS, &Filter::id(user_id), &update).await?;
    if matched == 0 {
        return Err(AuthError::NotFound("User does not exist".into()));
    }
    find_public_user(store, user_id)
        .await?
        .ok_or_else(|| AuthError::NotFound("User does not exist".into()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::memory::MemoryStore;

    fn new_user(username: &str, email: &str) -> NewUser {
        NewUser {
            username: username.into(),
            email: email.into(),
            full_name: "Some One".into(),
            password_hash: "hash".into(),
            avatar: "https://media/avatar.png".into(),
            cover_image: None,
        }
    }

    #[tokio::test]
    async fn create_user_lowercases_and_hides_password() {
        let store = MemoryStore::with_user_indexes();
        let user = create_user(&store, new_user("Ann", "Ann@Example.com"))
            .await
            .unwrap();
        assert_eq!(user.username, "ann");
        assert_eq!(user.email, "ann@example.com");

        let stored = find_user_by_id(&store, &user.id).await.unwrap().unwrap();
        assert_eq!(stored.password, "hash");
    }

    #[tokio::test]
    async fn find_by_login_accepts_either_key() {
        let store = MemoryStore::with_user_indexes();
        create_user(&store, new_user("ann", "ann@example.com"))
            .await
            .unwrap();
        assert!(
            find_user_by_login(&store, Some("ANN"), None)
                .await
                .unwrap()
                .is_some()
        );
        assert!(
            find_user_by_login(&store, None, Some("ann@example.com"))
                .await
                .unwrap()
                .is_some()
        );
        let err = find_user_by_login(&store, None, None).await.unwrap_err();
        assert!(matches!(err, AuthError::ValidationError(_)));
    }

    #[tokio::test]
    async fn duplicate_identity_is_rejected_by_the_store() {
        let store = MemoryStore::with_user_indexes();
        create_user(&store, new_user("ann", "ann@example.com"))
            .await
            .unwrap();
        assert!(user_exists(&store, "someone", "ann@example.com").await.unwrap());
        let err = create_user(&store, new_user("ann", "other@example.com"))
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::Store(_)));
    }

    #[tokio::test]
    async fn cover_image_is_read_back_under_the_same_field() {
        let store = MemoryStore::with_user_indexes();
        let user = create_user(&store, new_user("ann", "ann@example.com"))
            .await
            .unwrap();
        let updated = set_media(&store, &user.id, MediaField::CoverImage, "https://media/c.png")
            .await
            .unwrap();
        assert_eq!(updated.cover_image.as_deref(), Some("https://media/c.png"));
    }

    #[tokio::test]
    async fn updates_on_missing_identity_are_not_found() {
        let store = MemoryStore::with_user_indexes();
        let err = update_profile(&store, "missing", "X", "x@example.com")
            .await
            .unwrap_err();
        assert!(matches!(err, AuthError::NotFound(_)));
    }
}
