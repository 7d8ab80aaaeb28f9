use anyhow::Context;
use chrono::{DateTime, Utc};
use sqlx::{migrate::Migrator, postgres::PgPoolOptions, PgPool};

use crate::{
    datastore::DataStore, ChatAccount, Channel, NewChannel, NewVideo, Platform, User, Video,
};

static MIGRATOR: Migrator = sqlx::migrate!();

#[derive(Debug, Clone)]
pub struct PgDataStore {
    pub pool: PgPool,
}

impl PgDataStore {
    /// Establish connection to database and create the tables if not exists
    pub async fn init(database_url: &str) -> anyhow::Result<Self> {
        let pool = PgPoolOptions::new()
            .max_connections(5)
            .connect(database_url)
            .await
            .inspect_err(
                |e| tracing::error!(error = ?e, "Failed to establish connection to database"),
            )
            .context("Failed to connect to postgres database")?;

        MIGRATOR
            .run(&pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to run database migrations"))
            .context("Failed to run database migrations")?;

        Ok(PgDataStore { pool })
    }
}

/// Row shape for channels; `platform` is stored as text and parsed on the
/// way out.
#[derive(sqlx::FromRow)]
struct ChannelRow {
    id: i64,
    platform: String,
    channel_id: String,
    channel_name: Option<String>,
    channel_url: String,
    last_checked: DateTime<Utc>,
    created_at: DateTime<Utc>,
}

impl TryFrom<ChannelRow> for Channel {
    type Error = anyhow::Error;

    fn try_from(row: ChannelRow) -> anyhow::Result<Channel> {
        Ok(Channel {
            id: row.id,
            platform: row.platform.parse()?,
            channel_id: row.channel_id,
            channel_name: row.channel_name,
            channel_url: row.channel_url,
            last_checked: row.last_checked,
            created_at: row.created_at,
        })
    }
}

fn channels_from_rows(rows: Vec<ChannelRow>) -> anyhow::Result<Vec<Channel>> {
    rows.into_iter().map(Channel::try_from).collect()
}

impl DataStore for PgDataStore {
    async fn get_or_create_user(&self, chat: &ChatAccount) -> anyhow::Result<User> {
        let inserted = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (chat_id, username, first_name)
            VALUES ($1, $2, $3)
            ON CONFLICT (chat_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(chat.chat_id)
        .bind(&chat.username)
        .bind(&chat.first_name)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, chat_id = chat.chat_id, "Failed to insert user"))
        .context("Failed to insert user")?;

        if let Some(user) = inserted {
            return Ok(user);
        }

        // Lost the insert race or the user already existed; re-read.
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE chat_id = $1")
            .bind(chat.chat_id)
            .fetch_one(&self.pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, chat_id = chat.chat_id, "Failed to fetch user"))
            .context("Failed to fetch existing user")
    }

    async fn set_user_language(&self, chat_id: i64, language: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE users SET language = $2 WHERE chat_id = $1")
            .bind(chat_id)
            .bind(language)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, chat_id, "Failed to update user language"))
            .context("Failed to update user language")?;

        Ok(())
    }

    async fn find_channel(
        &self,
        platform: Platform,
        channel_id: &str,
    ) -> anyhow::Result<Option<Channel>> {
        let row = sqlx::query_as::<_, ChannelRow>(
            "SELECT * FROM channels WHERE platform = $1 AND channel_id = $2",
        )
        .bind(platform.as_str())
        .bind(channel_id)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, channel_id, "Failed to fetch channel"))
        .context("Failed to fetch channel")?;

        row.map(Channel::try_from).transpose()
    }

    async fn get_or_create_channel(&self, channel: &NewChannel) -> anyhow::Result<Channel> {
        let inserted = sqlx::query_as::<_, ChannelRow>(
            r#"
            INSERT INTO channels (platform, channel_id, channel_name, channel_url)
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (platform, channel_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(channel.platform.as_str())
        .bind(&channel.channel_id)
        .bind(&channel.channel_name)
        .bind(&channel.channel_url)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| {
            tracing::error!(error = ?e, channel_id = %channel.channel_id, "Failed to insert channel")
        })
        .context("Failed to insert channel")?;

        if let Some(row) = inserted {
            return row.try_into();
        }

        self.find_channel(channel.platform, &channel.channel_id)
            .await?
            .context("Channel vanished between insert and re-read")
    }

    async fn create_subscription(&self, user_id: i64, channel_id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query(
            r#"
            INSERT INTO subscriptions (user_id, channel_id)
            VALUES ($1, $2)
            ON CONFLICT (user_id, channel_id) DO NOTHING
            "#,
        )
        .bind(user_id)
        .bind(channel_id)
        .execute(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, user_id, channel_id, "Failed to insert subscription"))
        .context("Failed to insert subscription")?;

        Ok(result.rows_affected() == 1)
    }

    async fn delete_subscription(&self, user_id: i64, channel_id: i64) -> anyhow::Result<bool> {
        let result = sqlx::query("DELETE FROM subscriptions WHERE user_id = $1 AND channel_id = $2")
            .bind(user_id)
            .bind(channel_id)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, user_id, channel_id, "Failed to delete subscription"))
            .context("Failed to delete subscription")?;

        Ok(result.rows_affected() > 0)
    }

    async fn list_subscribed_channels(&self, user_id: i64) -> anyhow::Result<Vec<Channel>> {
        let rows = sqlx::query_as::<_, ChannelRow>(
            r#"
            SELECT c.* FROM channels c
            JOIN subscriptions s ON s.channel_id = c.id
            WHERE s.user_id = $1
            ORDER BY s.created_at
            "#,
        )
        .bind(user_id)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, user_id, "Failed to list subscribed channels"))
        .context("Failed to list subscribed channels")?;

        channels_from_rows(rows)
    }

    async fn due_channels(
        &self,
        checked_before: DateTime<Utc>,
        limit: i64,
    ) -> anyhow::Result<Vec<Channel>> {
        let rows = sqlx::query_as::<_, ChannelRow>(
            r#"
            SELECT * FROM channels
            WHERE last_checked < $1
            ORDER BY last_checked ASC
            LIMIT $2
            "#,
        )
        .bind(checked_before)
        .bind(limit)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, "Failed to fetch due channels"))
        .context("Failed to fetch due channels")?;

        channels_from_rows(rows)
    }

    async fn touch_channel(&self, channel_id: i64) -> anyhow::Result<()> {
        sqlx::query("UPDATE channels SET last_checked = now() WHERE id = $1")
            .bind(channel_id)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, channel_id, "Failed to touch channel"))
            .context("Failed to touch channel")?;

        Ok(())
    }

    async fn insert_video(&self, video: &NewVideo) -> anyhow::Result<Option<Video>> {
        sqlx::query_as::<_, Video>(
            r#"
            INSERT INTO videos (channel_id, video_id, title, url, published_at)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (channel_id, video_id) DO NOTHING
            RETURNING *
            "#,
        )
        .bind(video.channel_id)
        .bind(&video.video_id)
        .bind(&video.title)
        .bind(&video.url)
        .bind(video.published_at)
        .fetch_optional(&self.pool)
        .await
        .inspect_err(|e| {
            tracing::error!(error = ?e, video_id = %video.video_id, "Failed to insert video")
        })
        .context("Failed to insert video")
    }

    async fn mark_video_processed(&self, video_id: i64, summary: &str) -> anyhow::Result<()> {
        sqlx::query("UPDATE videos SET summary = $2, processed = TRUE WHERE id = $1")
            .bind(video_id)
            .bind(summary)
            .execute(&self.pool)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, video_id, "Failed to mark video processed"))
            .context("Failed to mark video processed")?;

        Ok(())
    }

    async fn subscribers(&self, channel_id: i64) -> anyhow::Result<Vec<User>> {
        sqlx::query_as::<_, User>(
            r#"
            SELECT u.* FROM users u
            JOIN subscriptions s ON s.user_id = u.id
            WHERE s.channel_id = $1
            ORDER BY s.created_at
            "#,
        )
        .bind(channel_id)
        .fetch_all(&self.pool)
        .await
        .inspect_err(|e| tracing::error!(error = ?e, channel_id, "Failed to fetch subscribers"))
        .context("Failed to fetch subscribers")
    }
}
