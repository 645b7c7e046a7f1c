//! Password hashing via bcrypt.

use super::AuthError;

/// bcrypt cost factor.
const BCRYPT_COST: u32 = 10;

/// Hash a password with bcrypt (cost 10).
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    bcrypt::hash(password, BCRYPT_COST)
        .map_err(|e| AuthError::Internal(format!("bcrypt hash: {e}")))
}

/// Verify a password against a bcrypt hash.
pub fn verify_password(password: &str, hash: &str) -> Result<bool, AuthError> {
    bcrypt::verify(password, hash).map_err(|e| AuthError::Internal(format!("bcrypt verify: {e}")))
}

/// [`hash_password`] on the blocking pool.
pub async fn hash_password_async(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| AuthError::Internal(format!("bcrypt task: {e}")))?
}

/// [`verify_password`] on the blocking pool.
pub async fn verify_password_async(password: String, hash: String) -> Result<bool, AuthError> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| AuthError::Internal(format!("bcrypt task: {e}")))?
}
