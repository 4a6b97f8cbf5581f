/// Token Issuer
///
/// Mints and verifies access and refresh tokens. Both kinds share the claim
/// shape; each kind has its own secret and lifetime. Nothing here touches
/// storage.

use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};

use crate::account::Account;
use crate::auth::claims::{Claims, TokenKind};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

#[derive(Clone)]
pub struct TokenIssuer {
    config: JwtSettings,
}

impl TokenIssuer {
    pub fn new(config: JwtSettings) -> Self {
        Self { config }
    }

    fn secret(&self, kind: TokenKind) -> &[u8] {
        match kind {
            TokenKind::Access => self.config.access_token_secret.as_bytes(),
            TokenKind::Refresh => self.config.refresh_token_secret.as_bytes(),
        }
    }

    /// Lifetime of `kind` in seconds
    pub fn expiry(&self, kind: TokenKind) -> i64 {
        match kind {
            TokenKind::Access => self.config.access_token_expiry,
            TokenKind::Refresh => self.config.refresh_token_expiry,
        }
    }

    /// Sign a new token of `kind` for `account`
    ///
    /// # Errors
    /// Returns `Internal` if encoding fails
    pub fn issue(&self, kind: TokenKind, account: &Account) -> Result<String, AppError> {
        let claims = Claims::for_account(account, self.expiry(kind), &self.config.issuer);
        self.sign(kind, &claims)
    }

    pub(crate) fn sign(&self, kind: TokenKind, claims: &Claims) -> Result<String, AppError> {
        encode(
            &Header::new(Algorithm::HS256),
            claims,
            &EncodingKey::from_secret(self.secret(kind)),
        )
        .map_err(|e| AppError::Internal(format!("{} token generation failed: {}", kind.as_str(), e)))
    }

    /// Check signature, issuer and expiry of a `kind` token
    ///
    /// # Errors
    /// `TokenExpired` when only the expiry failed, `TokenInvalid` otherwise
    pub fn verify(&self, kind: TokenKind, token: &str) -> Result<Claims, AuthError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.config.issuer]);
        validation.leeway = 0;

        decode::<Claims>(token, &DecodingKey::from_secret(self.secret(kind)), &validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::TokenExpired,
                _ => {
                    tracing::debug!(kind = kind.as_str(), error = %e, "Token validation error");
                    AuthError::TokenInvalid
                }
            })
    }
}
