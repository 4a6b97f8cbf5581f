/// Refresh Token Storage Helpers
///
/// Refresh tokens are signed JWTs handed to the client. The server keeps
/// only the SHA-256 digest of the current one on the account record, so a
/// leaked database row cannot be replayed as a token. Comparing digests is
/// equivalent to comparing the token strings exactly.

use rand::distributions::Alphanumeric;
use rand::{thread_rng, Rng};
use sha2::{Digest, Sha256};

const TOKEN_ID_LENGTH: usize = 32;

/// Random alphanumeric id for the `jti` claim
pub fn generate_token_id() -> String {
    thread_rng()
        .sample_iter(&Alphanumeric)
        .take(TOKEN_ID_LENGTH)
        .map(char::from)
        .collect()
}

/// Hash a refresh token using SHA-256 (hex)
pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// True iff `presented` is exactly the token whose digest is `stored_hash`
pub fn matches_stored(presented: &str, stored_hash: Option<&str>) -> bool {
    match stored_hash {
        Some(stored) => hash_token(presented) == stored,
        None => false,
    }
}
