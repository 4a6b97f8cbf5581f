/// Token Claims
///
/// The payload shared by access and refresh tokens: account identity plus
/// the standard JWT claims (RFC 7519).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::account::Account;
use crate::auth::refresh_token::generate_token_id;
use crate::error::AuthError;

/// Which secret and lifetime a token is bound to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            TokenKind::Access => "access",
            TokenKind::Refresh => "refresh",
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    /// Subject (account ID as UUID string)
    pub sub: String,
    pub email: String,
    pub username: String,
    #[serde(rename = "fullName")]
    pub full_name: String,
    /// Unique token id; keeps two tokens minted in the same second distinct
    pub jti: String,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    pub iss: String,
}

impl Claims {
    /// Build claims for `account` expiring `expiry_seconds` from now
    pub fn for_account(account: &Account, expiry_seconds: i64, issuer: &str) -> Self {
        let now = chrono::Utc::now().timestamp();
        Self {
            sub: account.id.to_string(),
            email: account.email.clone(),
            username: account.username.clone(),
            full_name: account.full_name.clone(),
            jti: generate_token_id(),
            exp: now + expiry_seconds,
            iat: now,
            iss: issuer.to_string(),
        }
    }

    /// Account id carried in `sub`
    ///
    /// # Errors
    /// A signed token with a non-UUID subject is treated as invalid
    pub fn account_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::TokenInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn account() -> Account {
        Account {
            id: Uuid::new_v4(),
            username: "alice".to_string(),
            email: "a@x.com".to_string(),
            full_name: "Alice".to_string(),
            avatar: "https://media.example/a.png".to_string(),
            cover_image: None,
            password_hash: "hash".to_string(),
            refresh_token_hash: None,
            watch_history: vec![],
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn test_claims_creation() {
        let account = account();
        let claims = Claims::for_account(&account, 3600, "test");

        assert_eq!(claims.sub, account.id.to_string());
        assert_eq!(claims.email, "a@x.com");
        assert_eq!(claims.username, "alice");
        assert_eq!(claims.full_name, "Alice");
        assert_eq!(claims.iss, "test");
        assert!(claims.exp > claims.iat);
        assert_eq!(claims.account_id().unwrap(), account.id);
    }

    #[test]
    fn test_token_ids_are_unique() {
        let account = account();
        let a = Claims::for_account(&account, 3600, "test");
        let b = Claims::for_account(&account, 3600, "test");
        assert_ne!(a.jti, b.jti);
    }

    #[test]
    fn test_invalid_account_id() {
        let mut claims = Claims::for_account(&account(), 3600, "test");
        claims.sub = "invalid-uuid".to_string();

        assert_eq!(claims.account_id(), Err(AuthError::TokenInvalid));
    }

    #[test]
    fn test_full_name_serialized_camel_case() {
        let claims = Claims::for_account(&account(), 3600, "test");
        let json = serde_json::to_value(&claims).unwrap();
        assert_eq!(json["fullName"], "Alice");
    }
}
