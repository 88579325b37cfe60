//! bcrypt hashing, run off the async executor

use super::AuthError;
use crate::models::Password;

/// Hash a validated password with the given bcrypt cost.
pub async fn hash_password(password: Password, cost: u32) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password.expose(), cost))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?
        .map_err(|e| AuthError::Hashing(e.to_string()))
}

/// Check a login attempt against a stored hash.
///
/// A malformed stored hash counts as a mismatch.
pub async fn verify_password(candidate: String, hash: String) -> Result<bool, AuthError> {
    let verified = tokio::task::spawn_blocking(move || bcrypt::verify(&candidate, &hash))
        .await
        .map_err(|e| AuthError::Hashing(e.to_string()))?;

    match verified {
        Ok(matches) => Ok(matches),
        Err(e) => {
            tracing::warn!(error = %e, "stored password hash could not be parsed");
            Ok(false)
        }
    }
}
