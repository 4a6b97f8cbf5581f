/// Password Hashing and Verification
///
/// bcrypt with a per-call random salt embedded in the digest. The digest
/// comparison inside `bcrypt::verify` is constant-time.

use bcrypt::{hash, verify};

use crate::error::AppError;

/// bcrypt work factor
pub const PASSWORD_HASH_COST: u32 = 8;

/// Hash a password using bcrypt
///
/// # Errors
/// Returns `Internal` if bcrypt fails (input is validated beforehand)
pub fn hash_password(password: &str) -> Result<String, AppError> {
    hash(password, PASSWORD_HASH_COST)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against a stored bcrypt hash
///
/// Fails closed: a malformed stored hash verifies as `false`.
pub fn verify_password(password: &str, password_hash: &str) -> bool {
    match verify(password, password_hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash could not be parsed");
            false
        }
    }
}
