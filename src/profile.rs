/// Profile updates for an authenticated account: display name and email,
/// avatar, cover image.

use std::sync::Arc;

use uuid::Uuid;

use crate::account::{AccountPatch, AccountView};
use crate::error::AppError;
use crate::store::CredentialStore;
use crate::validators::{parse_email, parse_full_name, required};

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn CredentialStore>,
}

impl ProfileService {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    /// Both fields are required; the email must not belong to another account
    pub async fn update_details(
        &self,
        account_id: Uuid,
        full_name: Option<&str>,
        email: Option<&str>,
    ) -> Result<AccountView, AppError> {
        let full_name = parse_full_name(full_name)?;
        let email = parse_email(email)?;

        if let Some(owner) = self.store.find_by_username_or_email(None, Some(&email)).await? {
            if owner.id != account_id {
                return Err(AppError::Conflict("Email is already in use".to_string()));
            }
        }

        self.apply(
            account_id,
            AccountPatch {
                full_name: Some(full_name),
                email: Some(email),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn update_avatar(&self, account_id: Uuid, avatar: &str) -> Result<AccountView, AppError> {
        let avatar = required("avatar", Some(avatar))?;
        self.apply(
            account_id,
            AccountPatch {
                avatar: Some(avatar),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn update_cover_image(
        &self,
        account_id: Uuid,
        cover_image: &str,
    ) -> Result<AccountView, AppError> {
        let cover_image = required("coverImage", Some(cover_image))?;
        self.apply(
            account_id,
            AccountPatch {
                cover_image: Some(cover_image),
                ..Default::default()
            },
        )
        .await
    }

    async fn apply(&self, account_id: Uuid, patch: AccountPatch) -> Result<AccountView, AppError> {
        let updated = self
            .store
            .update_profile(account_id, patch)
            .await?
            .ok_or_else(|| AppError::NotFound("User does not exist".to_string()))?;

        tracing::info!(account_id = %account_id, "Account profile updated");
        Ok(updated.view())
    }
}
