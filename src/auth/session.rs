/// Session Lifecycle
///
/// Register, login, logout, refresh and password change. Login is the only
/// place a refresh token is minted from a password; every refresh after
/// that must present exactly the token stored on the account, and rotating
/// it kills the previous one immediately.

use std::sync::Arc;

use serde::Serialize;
use uuid::Uuid;

use crate::account::{Account, AccountView, NewAccount};
use crate::auth::claims::TokenKind;
use crate::auth::jwt::TokenIssuer;
use crate::auth::password::{hash_password, verify_password};
use crate::auth::refresh_token::{hash_token, matches_stored};
use crate::error::{AppError, AuthError, ErrorContext, ValidationError};
use crate::store::CredentialStore;
use crate::validators::{parse_email, parse_full_name, parse_password, parse_username, required};

/// Raw registration input; normalized by [`Registration::parse`]
#[derive(Debug, Default, Clone)]
pub struct RegistrationInput {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub full_name: Option<String>,
}

/// Validated registration fields, still waiting for the avatar reference
#[derive(Debug, Clone)]
pub struct Registration {
    pub username: String,
    pub email: String,
    pub password: String,
    pub full_name: String,
    pub avatar: Option<String>,
    pub cover_image: Option<String>,
}

impl Registration {
    pub fn parse(input: RegistrationInput) -> Result<Self, ValidationError> {
        Ok(Self {
            full_name: parse_full_name(input.full_name.as_deref())?,
            email: parse_email(input.email.as_deref())?,
            username: parse_username(input.username.as_deref())?,
            password: parse_password("password", input.password.as_deref())?,
            avatar: None,
            cover_image: None,
        })
    }
}

/// Login identity: either key may be given, at least one must be
#[derive(Debug, Default, Clone)]
pub struct Credentials {
    pub username: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginOutcome {
    pub user: AccountView,
    pub access_token: String,
    pub refresh_token: String,
}

impl LoginOutcome {
    pub fn tokens(&self) -> TokenPair {
        TokenPair {
            access_token: self.access_token.clone(),
            refresh_token: self.refresh_token.clone(),
        }
    }
}

#[derive(Clone)]
pub struct SessionManager {
    store: Arc<dyn CredentialStore>,
    tokens: TokenIssuer,
    revoke_on_password_change: bool,
}

impl SessionManager {
    pub fn new(
        store: Arc<dyn CredentialStore>,
        tokens: TokenIssuer,
        revoke_on_password_change: bool,
    ) -> Self {
        Self {
            store,
            tokens,
            revoke_on_password_change,
        }
    }

    /// `Conflict` if either identity key is already in use
    pub async fn ensure_available(&self, username: &str, email: &str) -> Result<(), AppError> {
        let existing = self
            .store
            .find_by_username_or_email(Some(username), Some(email))
            .await?;

        if existing.is_some() {
            return Err(AppError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }
        Ok(())
    }

    /// Create an account from validated fields and a resolved avatar
    pub async fn register(&self, registration: Registration) -> Result<AccountView, AppError> {
        let context = ErrorContext::new("register");

        let avatar = required("avatar", registration.avatar.as_deref())?;
        self.ensure_available(&registration.username, &registration.email)
            .await?;

        let password_hash = hash_password(&registration.password)?;
        let created = self
            .store
            .create(NewAccount {
                username: registration.username,
                email: registration.email,
                full_name: registration.full_name,
                avatar,
                cover_image: registration.cover_image.filter(|c| !c.trim().is_empty()),
                password_hash,
            })
            .await?;

        let account = self.store.find_by_id(created.id).await?.ok_or_else(|| {
            context.record(AppError::Internal(
                "Something went wrong while registering the user".to_string(),
            ))
        })?;

        tracing::info!(
            request_id = %context.request_id,
            account_id = %account.id,
            "User registered successfully"
        );

        Ok(account.view())
    }

    /// Verify credentials, mint a token pair, persist the refresh token
    pub async fn login(&self, credentials: Credentials) -> Result<LoginOutcome, AppError> {
        let username = credentials
            .username
            .as_deref()
            .map(str::trim)
            .filter(|u| !u.is_empty())
            .map(str::to_lowercase);
        let email = credentials
            .email
            .as_deref()
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_lowercase);

        if username.is_none() && email.is_none() {
            return Err(ValidationError::EmptyField("username or email".to_string()).into());
        }
        let password = parse_password("password", credentials.password.as_deref())?;

        let account = self
            .store
            .find_by_username_or_email(username.as_deref(), email.as_deref())
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        let context = ErrorContext::new("login").with_account_id(account.id);

        if !verify_password(&password, &account.password_hash) {
            tracing::warn!(
                request_id = %context.request_id,
                account_id = %account.id,
                "Login rejected: password mismatch"
            );
            return Err(AuthError::InvalidCredentials.into());
        }

        let pair = self.rotate(&account).await?;

        tracing::info!(
            request_id = %context.request_id,
            account_id = %account.id,
            "User logged in successfully"
        );

        Ok(LoginOutcome {
            user: account.view(),
            access_token: pair.access_token,
            refresh_token: pair.refresh_token,
        })
    }

    /// Clear the stored refresh token. Idempotent.
    pub async fn logout(&self, account_id: Uuid) -> Result<(), AppError> {
        self.store.update_refresh_token(account_id, None).await?;
        tracing::info!(account_id = %account_id, "User logged out");
        Ok(())
    }

    /// Exchange the current refresh token for a new pair
    ///
    /// Every failure is the same `Unauthorized` to the caller; the reason is
    /// only logged.
    pub async fn refresh(&self, incoming: Option<&str>) -> Result<TokenPair, AppError> {
        let context = ErrorContext::new("token_refresh");

        let token = incoming
            .filter(|t| !t.is_empty())
            .ok_or_else(|| AppError::unauthorized("refresh token missing"))?;

        let claims = self
            .tokens
            .verify(TokenKind::Refresh, token)
            .map_err(|e| context.record(AppError::unauthorized(format!("refresh token rejected: {}", e))))?;

        let account_id = claims
            .account_id()
            .map_err(|_| context.record(AppError::unauthorized("refresh token subject invalid")))?;

        let account = self
            .store
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| context.record(AppError::unauthorized("refresh token account missing")))?;

        if !matches_stored(token, account.refresh_token_hash.as_deref()) {
            tracing::warn!(
                request_id = %context.request_id,
                account_id = %account.id,
                "Refresh token does not match the stored token; possible reuse"
            );
            return Err(AppError::unauthorized("refresh token is expired or used"));
        }

        let pair = self.rotate(&account).await?;

        tracing::info!(
            request_id = %context.request_id,
            account_id = %account.id,
            "Token refreshed successfully"
        );

        Ok(pair)
    }

    /// Verify the old password and store a hash of the new one
    pub async fn change_password(
        &self,
        account_id: Uuid,
        old_password: Option<&str>,
        new_password: Option<&str>,
    ) -> Result<(), AppError> {
        let old_password = parse_password("oldPassword", old_password)?;
        let new_password = parse_password("newPassword", new_password)?;

        let account = self
            .store
            .find_by_id(account_id)
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        if !verify_password(&old_password, &account.password_hash) {
            tracing::warn!(account_id = %account_id, "Password change rejected: old password mismatch");
            return Err(AuthError::InvalidCredentials.into());
        }

        let password_hash = hash_password(&new_password)?;
        self.store.update_password_hash(account_id, password_hash).await?;

        if self.revoke_on_password_change {
            self.store.update_refresh_token(account_id, None).await?;
        }

        tracing::info!(
            account_id = %account_id,
            sessions_revoked = self.revoke_on_password_change,
            "Password changed successfully"
        );

        Ok(())
    }

    /// Issue a fresh pair and make its refresh token the only valid one
    async fn rotate(&self, account: &Account) -> Result<TokenPair, AppError> {
        let access_token = self.tokens.issue(TokenKind::Access, account)?;
        let refresh_token = self.tokens.issue(TokenKind::Refresh, account)?;

        self.store
            .update_refresh_token(account.id, Some(hash_token(&refresh_token)))
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
        })
    }
}
