/// Persistence ports
///
/// `CredentialStore` is all the session core needs. `ChannelStore` serves the
/// read-only channel page and watch history. Every method is a single atomic
/// operation against the backing store; callers do no locking of their own.

mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::account::{Account, AccountPatch, NewAccount};
use crate::channel::{ChannelProfile, WatchedVideo};
use crate::error::AppError;

pub use memory::InMemoryStore;
pub use postgres::PgStore;

#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Account whose username equals `username` OR whose email equals `email`.
    /// Both keys are expected already normalized.
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Account>, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError>;

    /// Insert a new account.
    ///
    /// # Errors
    /// `Conflict` when username or email is already taken
    async fn create(&self, account: NewAccount) -> Result<Account, AppError>;

    /// Overwrite (or clear with `None`) the stored refresh token digest.
    /// Unknown ids are a no-op.
    async fn update_refresh_token(
        &self,
        id: Uuid,
        token_hash: Option<String>,
    ) -> Result<(), AppError>;

    async fn update_password_hash(&self, id: Uuid, password_hash: String) -> Result<(), AppError>;

    /// Apply `patch` and return the updated account, `None` if `id` is unknown.
    async fn update_profile(&self, id: Uuid, patch: AccountPatch)
        -> Result<Option<Account>, AppError>;
}

#[async_trait]
pub trait ChannelStore: Send + Sync {
    /// Channel page for `username` as seen by `viewer`
    async fn channel_profile(
        &self,
        username: &str,
        viewer: Uuid,
    ) -> Result<Option<ChannelProfile>, AppError>;

    /// Videos `account` has watched, in watch order
    async fn watch_history(&self, account: Uuid) -> Result<Vec<WatchedVideo>, AppError>;
}
