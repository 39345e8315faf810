//! Password hashing (bcrypt).
//!
//! bcrypt is CPU-bound, so both operations run on the blocking thread pool.

use bcrypt::{hash, verify};

use crate::AuthError;

/// Default bcrypt cost factor.
pub const BCRYPT_COST: u32 = bcrypt::DEFAULT_COST;

/// Hash a password with the given bcrypt cost.
pub async fn hash_password(password: &str, cost: u32) -> Result<String, AuthError> {
    let password = password.to_string();

    tokio::task::spawn_blocking(move || {
        hash(password, cost).map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(format!("task join error: {e}")))?
}

/// Verify a password against a bcrypt hash.
///
/// Returns `Ok(false)` on mismatch and `Err` only when the hash itself is
/// unusable.
pub async fn verify_password(password: &str, password_hash: &str) -> Result<bool, AuthError> {
    let password = password.to_string();
    let password_hash = password_hash.to_string();

    tokio::task::spawn_blocking(move || {
        verify(password, &password_hash).map_err(|e| AuthError::Hashing(e.to_string()))
    })
    .await
    .map_err(|e| AuthError::Hashing(format!("task join error: {e}")))?
}
