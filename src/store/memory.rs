use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::account::{Account, AccountPatch, NewAccount};
use crate::channel::{ChannelProfile, VideoOwner, WatchedVideo};
use crate::error::AppError;
use crate::store::{ChannelStore, CredentialStore};

/// In-process store with the same uniqueness rules as the Postgres schema.
/// Used by the integration tests and for running without a database.
#[derive(Default)]
pub struct InMemoryStore {
    state: RwLock<State>,
}

#[derive(Default)]
struct State {
    accounts: HashMap<Uuid, Account>,
    videos: HashMap<Uuid, Video>,
    /// (subscriber, channel)
    subscriptions: Vec<(Uuid, Uuid)>,
}

struct Video {
    owner: Uuid,
    title: String,
    description: String,
    thumbnail: String,
    video_file: String,
    duration: f64,
    views: i64,
    created_at: DateTime<Utc>,
}

impl State {
    fn identity_taken(&self, username: Option<&str>, email: Option<&str>, except: Option<Uuid>) -> bool {
        self.accounts.values().any(|a| {
            Some(a.id) != except
                && (username == Some(a.username.as_str()) || email == Some(a.email.as_str()))
        })
    }
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish a video owned by `owner`, returning its id
    pub async fn add_video(&self, owner: Uuid, title: &str, duration: f64) -> Uuid {
        let id = Uuid::new_v4();
        let video = Video {
            owner,
            title: title.to_string(),
            description: String::new(),
            thumbnail: format!("https://media.example/{}.jpg", id),
            video_file: format!("https://media.example/{}.mp4", id),
            duration,
            views: 0,
            created_at: Utc::now(),
        };
        self.state.write().await.videos.insert(id, video);
        id
    }

    /// Subscribe `subscriber` to `channel`; repeated calls are a no-op
    pub async fn subscribe(&self, subscriber: Uuid, channel: Uuid) {
        let mut state = self.state.write().await;
        if !state.subscriptions.contains(&(subscriber, channel)) {
            state.subscriptions.push((subscriber, channel));
        }
    }

    /// Append `video` to the account's watch history
    pub async fn record_watch(&self, account: Uuid, video: Uuid) {
        if let Some(account) = self.state.write().await.accounts.get_mut(&account) {
            account.watch_history.push(video);
        }
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Account>, AppError> {
        let state = self.state.read().await;
        Ok(state
            .accounts
            .values()
            .find(|a| username == Some(a.username.as_str()) || email == Some(a.email.as_str()))
            .cloned())
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        Ok(self.state.read().await.accounts.get(&id).cloned())
    }

    async fn create(&self, account: NewAccount) -> Result<Account, AppError> {
        let mut state = self.state.write().await;

        if state.identity_taken(Some(&account.username), Some(&account.email), None) {
            return Err(AppError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }

        let now = Utc::now();
        let created = Account {
            id: Uuid::new_v4(),
            username: account.username,
            email: account.email,
            full_name: account.full_name,
            avatar: account.avatar,
            cover_image: account.cover_image,
            password_hash: account.password_hash,
            refresh_token_hash: None,
            watch_history: Vec::new(),
            created_at: now,
            updated_at: now,
        };
        state.accounts.insert(created.id, created.clone());

        Ok(created)
    }

    async fn update_refresh_token(
        &self,
        id: Uuid,
        token_hash: Option<String>,
    ) -> Result<(), AppError> {
        if let Some(account) = self.state.write().await.accounts.get_mut(&id) {
            account.refresh_token_hash = token_hash;
            account.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: String) -> Result<(), AppError> {
        if let Some(account) = self.state.write().await.accounts.get_mut(&id) {
            account.password_hash = password_hash;
            account.updated_at = Utc::now();
        }
        Ok(())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        patch: AccountPatch,
    ) -> Result<Option<Account>, AppError> {
        let mut state = self.state.write().await;

        if patch.email.is_some() && state.identity_taken(None, patch.email.as_deref(), Some(id)) {
            return Err(AppError::Conflict(
                "User with email or username already exists".to_string(),
            ));
        }

        let Some(account) = state.accounts.get_mut(&id) else {
            return Ok(None);
        };

        if let Some(full_name) = patch.full_name {
            account.full_name = full_name;
        }
        if let Some(email) = patch.email {
            account.email = email;
        }
        if let Some(avatar) = patch.avatar {
            account.avatar = avatar;
        }
        if let Some(cover_image) = patch.cover_image {
            account.cover_image = Some(cover_image);
        }
        account.updated_at = Utc::now();

        Ok(Some(account.clone()))
    }
}

#[async_trait]
impl ChannelStore for InMemoryStore {
    async fn channel_profile(
        &self,
        username: &str,
        viewer: Uuid,
    ) -> Result<Option<ChannelProfile>, AppError> {
        let state = self.state.read().await;

        let Some(channel) = state.accounts.values().find(|a| a.username == username) else {
            return Ok(None);
        };

        let subscribers_count = state
            .subscriptions
            .iter()
            .filter(|(_, c)| *c == channel.id)
            .count() as i64;
        let channels_subscribed_to_count = state
            .subscriptions
            .iter()
            .filter(|(s, _)| *s == channel.id)
            .count() as i64;

        Ok(Some(ChannelProfile {
            id: channel.id,
            username: channel.username.clone(),
            full_name: channel.full_name.clone(),
            email: channel.email.clone(),
            avatar: channel.avatar.clone(),
            cover_image: channel.cover_image.clone(),
            subscribers_count,
            channels_subscribed_to_count,
            is_subscribed: state.subscriptions.contains(&(viewer, channel.id)),
        }))
    }

    async fn watch_history(&self, account: Uuid) -> Result<Vec<WatchedVideo>, AppError> {
        let state = self.state.read().await;

        let Some(account) = state.accounts.get(&account) else {
            return Ok(Vec::new());
        };

        Ok(account
            .watch_history
            .iter()
            .filter_map(|video_id| {
                let video = state.videos.get(video_id)?;
                let owner = state.accounts.get(&video.owner)?;
                Some(WatchedVideo {
                    id: *video_id,
                    title: video.title.clone(),
                    description: video.description.clone(),
                    thumbnail: video.thumbnail.clone(),
                    video_file: video.video_file.clone(),
                    duration: video.duration,
                    views: video.views,
                    created_at: video.created_at,
                    owner: VideoOwner {
                        id: owner.id,
                        username: owner.username.clone(),
                        full_name: owner.full_name.clone(),
                        avatar: owner.avatar.clone(),
                    },
                })
            })
            .collect())
    }
}
