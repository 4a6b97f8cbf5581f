/// Auth Gate
///
/// Resolves the account behind an access token. The token comes from the
/// `accessToken` cookie when present, otherwise from `Authorization: Bearer`.

use std::sync::Arc;

use crate::account::AccountView;
use crate::auth::claims::TokenKind;
use crate::auth::jwt::TokenIssuer;
use crate::error::AppError;
use crate::store::CredentialStore;

pub const ACCESS_TOKEN_COOKIE: &str = "accessToken";
pub const REFRESH_TOKEN_COOKIE: &str = "refreshToken";

#[derive(Clone)]
pub struct AuthGate {
    store: Arc<dyn CredentialStore>,
    tokens: TokenIssuer,
}

impl AuthGate {
    pub fn new(store: Arc<dyn CredentialStore>, tokens: TokenIssuer) -> Self {
        Self { store, tokens }
    }

    /// Account for `token`, or `Unauthorized`
    pub async fn authenticate(&self, token: Option<&str>) -> Result<AccountView, AppError> {
        let token = token.ok_or_else(|| AppError::unauthorized("access token missing"))?;

        let claims = self
            .tokens
            .verify(TokenKind::Access, token)
            .map_err(|e| AppError::unauthorized(format!("access token rejected: {}", e)))?;

        let account_id = claims
            .account_id()
            .map_err(|_| AppError::unauthorized("access token subject invalid"))?;

        let account = self
            .store
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::unauthorized("access token account missing"))?;

        Ok(account.view())
    }
}

/// Pick the access token: cookie first, then a `Bearer` header.
/// Blank values count as absent.
pub fn select_access_token<'a>(
    cookie: Option<&'a str>,
    authorization: Option<&'a str>,
) -> Option<&'a str> {
    let from_cookie = cookie.map(str::trim).filter(|c| !c.is_empty());
    let from_header = authorization
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|t| !t.is_empty());

    from_cookie.or(from_header)
}
