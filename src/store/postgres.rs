use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::account::{Account, AccountPatch, NewAccount};
use crate::channel::{ChannelProfile, VideoOwner, WatchedVideo};
use crate::error::AppError;
use crate::store::{ChannelStore, CredentialStore};

const ACCOUNT_COLUMNS: &str = r#"
    u.id, u.username, u.email, u.full_name, u.avatar, u.cover_image,
    u.password_hash, u.refresh_token_hash,
    ARRAY(SELECT w.video_id FROM watch_history w WHERE w.user_id = u.id ORDER BY w.id) AS watch_history,
    u.created_at, u.updated_at
"#;

/// Postgres-backed store; schema lives in `migrations/`
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: Uuid,
    username: String,
    email: String,
    full_name: String,
    avatar: String,
    cover_image: Option<String>,
    password_hash: String,
    refresh_token_hash: Option<String>,
    watch_history: Vec<Uuid>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<AccountRow> for Account {
    fn from(row: AccountRow) -> Self {
        Account {
            id: row.id,
            username: row.username,
            email: row.email,
            full_name: row.full_name,
            avatar: row.avatar,
            cover_image: row.cover_image,
            password_hash: row.password_hash,
            refresh_token_hash: row.refresh_token_hash,
            watch_history: row.watch_history,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(sqlx::FromRow)]
struct ChannelRow {
    id: Uuid,
    username: String,
    full_name: String,
    email: String,
    avatar: String,
    cover_image: Option<String>,
    subscribers_count: i64,
    channels_subscribed_to_count: i64,
    is_subscribed: bool,
}

#[derive(sqlx::FromRow)]
struct WatchedVideoRow {
    id: Uuid,
    title: String,
    description: String,
    thumbnail: String,
    video_file: String,
    duration: f64,
    views: i64,
    created_at: DateTime<Utc>,
    owner_id: Uuid,
    owner_username: String,
    owner_full_name: String,
    owner_avatar: String,
}

#[async_trait]
impl CredentialStore for PgStore {
    async fn find_by_username_or_email(
        &self,
        username: Option<&str>,
        email: Option<&str>,
    ) -> Result<Option<Account>, AppError> {
        if username.is_none() && email.is_none() {
            return Ok(None);
        }

        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM users u WHERE u.username = $1 OR u.email = $2 LIMIT 1",
            ACCOUNT_COLUMNS
        ))
        .bind(username)
        .bind(email)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Account>, AppError> {
        let row = sqlx::query_as::<_, AccountRow>(&format!(
            "SELECT {} FROM users u WHERE u.id = $1",
            ACCOUNT_COLUMNS
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(Account::from))
    }

    async fn create(&self, account: NewAccount) -> Result<Account, AppError> {
        let id = Uuid::new_v4();
        let now = Utc::now();

        sqlx::query(
            r#"
            INSERT INTO users
                (id, username, email, full_name, avatar, cover_image, password_hash, created_at, updated_at)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            "#,
        )
        .bind(id)
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.full_name)
        .bind(&account.avatar)
        .bind(&account.cover_image)
        .bind(&account.password_hash)
        .bind(now)
        .bind(now)
        .execute(&self.pool)
        .await?;

        Ok(Account {
            id,
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
        })
    }

    async fn update_refresh_token(
        &self,
        id: Uuid,
        token_hash: Option<String>,
    ) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET refresh_token_hash = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(token_hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_password_hash(&self, id: Uuid, password_hash: String) -> Result<(), AppError> {
        sqlx::query("UPDATE users SET password_hash = $2, updated_at = $3 WHERE id = $1")
            .bind(id)
            .bind(password_hash)
            .bind(Utc::now())
            .execute(&self.pool)
            .await?;

        Ok(())
    }

    async fn update_profile(
        &self,
        id: Uuid,
        patch: AccountPatch,
    ) -> Result<Option<Account>, AppError> {
        let updated = sqlx::query(
            r#"
            UPDATE users SET
                full_name = COALESCE($2, full_name),
                email = COALESCE($3, email),
                avatar = COALESCE($4, avatar),
                cover_image = COALESCE($5, cover_image),
                updated_at = $6
            WHERE id = $1
            "#,
        )
        .bind(id)
        .bind(patch.full_name)
        .bind(patch.email)
        .bind(patch.avatar)
        .bind(patch.cover_image)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if updated.rows_affected() == 0 {
            return Ok(None);
        }

        self.find_by_id(id).await
    }
}

#[async_trait]
impl ChannelStore for PgStore {
    async fn channel_profile(
        &self,
        username: &str,
        viewer: Uuid,
    ) -> Result<Option<ChannelProfile>, AppError> {
        let row = sqlx::query_as::<_, ChannelRow>(
            r#"
            SELECT
                u.id, u.username, u.full_name, u.email, u.avatar, u.cover_image,
                (SELECT COUNT(*) FROM subscriptions s WHERE s.channel_id = u.id) AS subscribers_count,
                (SELECT COUNT(*) FROM subscriptions s WHERE s.subscriber_id = u.id) AS channels_subscribed_to_count,
                EXISTS (
                    SELECT 1 FROM subscriptions s
                    WHERE s.channel_id = u.id AND s.subscriber_id = $2
                ) AS is_subscribed
            FROM users u
            WHERE u.username = $1
            "#,
        )
        .bind(username)
        .bind(viewer)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|row| ChannelProfile {
            id: row.id,
            username: row.username,
            full_name: row.full_name,
            email: row.email,
            avatar: row.avatar,
            cover_image: row.cover_image,
            subscribers_count: row.subscribers_count,
            channels_subscribed_to_count: row.channels_subscribed_to_count,
            is_subscribed: row.is_subscribed,
        }))
    }

    async fn watch_history(&self, account: Uuid) -> Result<Vec<WatchedVideo>, AppError> {
        let rows = sqlx::query_as::<_, WatchedVideoRow>(
            r#"
            SELECT
                v.id, v.title, v.description, v.thumbnail, v.video_file,
                v.duration, v.views, v.created_at,
                o.id AS owner_id, o.username AS owner_username,
                o.full_name AS owner_full_name, o.avatar AS owner_avatar
            FROM watch_history w
            JOIN videos v ON v.id = w.video_id
            JOIN users o ON o.id = v.owner_id
            WHERE w.user_id = $1
            ORDER BY w.id
            "#,
        )
        .bind(account)
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|row| WatchedVideo {
                id: row.id,
                title: row.title,
                description: row.description,
                thumbnail: row.thumbnail,
                video_file: row.video_file,
                duration: row.duration,
                views: row.views,
                created_at: row.created_at,
                owner: VideoOwner {
                    id: row.owner_id,
                    username: row.owner_username,
                    full_name: row.owner_full_name,
                    avatar: row.owner_avatar,
                },
            })
            .collect())
    }
}
