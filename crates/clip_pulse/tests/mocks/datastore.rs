use std::sync::{Arc, Mutex};

use chrono::{DateTime, Duration, Utc};
use clip_datastore::{
    ChatAccount, Channel, DataStore, NewChannel, NewVideo, Platform, User, Video,
};

/// In-memory stand-in for the Postgres store, with the same idempotency
/// semantics: create-if-absent for users and channels, unique pairs for
/// subscriptions and videos.
#[derive(Clone, Default)]
pub struct MockDataStore {
    pub inner: Arc<Mutex<Inner>>,
    pub fail_insert_with: Option<String>,
}

#[derive(Default)]
pub struct Inner {
    next_id: i64,
    pub users: Vec<User>,
    pub channels: Vec<Channel>,
    pub videos: Vec<Video>,
    pub subscriptions: Vec<(i64, i64)>,
}

impl Inner {
    fn allocate_id(&mut self) -> i64 {
        self.next_id += 1;
        self.next_id
    }
}

impl MockDataStore {
    pub fn failing_inserts(msg: &str) -> Self {
        Self {
            fail_insert_with: Some(msg.to_string()),
            ..Default::default()
        }
    }

    /// Seeds a channel whose `last_checked` is old enough to be due.
    pub fn seed_stale_channel(&self, platform: Platform, channel_id: &str) -> Channel {
        let mut inner = self.inner.lock().unwrap();
        let id = inner.allocate_id();
        let channel = Channel {
            id,
            platform,
            channel_id: channel_id.to_string(),
            channel_name: Some(format!("channel {channel_id}")),
            channel_url: format!("https://example.com/{channel_id}"),
            last_checked: Utc::now() - Duration::hours(1),
            created_at: Utc::now(),
        };
        inner.channels.push(channel.clone());
        channel
    }

    /// Rewinds a channel's `last_checked` so the next cycle picks it up
    /// again.
    pub fn set_stale(&self, channel_id: i64) {
        let mut inner = self.inner.lock().unwrap();
        if let Some(channel) = inner.channels.iter_mut().find(|c| c.id == channel_id) {
            channel.last_checked = Utc::now() - Duration::hours(1);
        }
    }

    pub fn last_checked(&self, channel_id: i64) -> DateTime<Utc> {
        let inner = self.inner.lock().unwrap();
        inner
            .channels
            .iter()
            .find(|c| c.id == channel_id)
            .map(|c| c.last_checked)
            .expect("channel should exist")
    }

    pub fn channel_count(&self) -> usize {
        self.inner.lock().unwrap().channels.len()
    }

    pub fn subscription_count(&self) -> usize {
        self.inner.lock().unwrap().subscriptions.len()
    }

    pub fn video_count(&self) -> usize {
        self.inner.lock().unwrap().videos.len()
    }

    pub fn videos(&self) -> Vec<Video> {
        self.inner.lock().unwrap().videos.clone()
    }
}

impl DataStore for MockDataStore {
    async fn get_or_create_user(&self, chat: &ChatAccount) -> anyhow::Result<User> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.iter().find(|u| u.chat_id == chat.chat_id) {
            return Ok(user.clone());
        }
        let id = inner.allocate_id();
        let user = User {
            id,
            chat_id: chat.chat_id,
            username: chat.username.clone(),
            first_name: chat.first_name.clone(),
            language: "vi".to_string(),
            created_at: Utc::now(),
        };
        inner.users.push(user.clone());
        Ok(user)
    }

    async fn set_user_language(&self, chat_id: i64, language: &str) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(user) = inner.users.iter_mut().find(|u| u.chat_id == chat_id) {
            user.language = language.to_string();
        }
        Ok(())
    }

    async fn find_channel(
        &self,
        platform: Platform,
        channel_id: &str,
    ) -> anyhow::Result<Option<Channel>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .channels
            .iter()
            .find(|c| c.platform == platform && c.channel_id == channel_id)
            .cloned())
    }

    async fn get_or_create_channel(&self, channel: &NewChannel) -> anyhow::Result<Channel> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(existing) = inner
            .channels
            .iter()
            .find(|c| c.platform == channel.platform && c.channel_id == channel.channel_id)
        {
            return Ok(existing.clone());
        }
        let id = inner.allocate_id();
        let created = Channel {
            id,
            platform: channel.platform,
            channel_id: channel.channel_id.clone(),
            channel_name: channel.channel_name.clone(),
            channel_url: channel.channel_url.clone(),
            last_checked: Utc::now(),
            created_at: Utc::now(),
        };
        inner.channels.push(created.clone());
        Ok(created)
    }

    async fn create_subscription(&self, user_id: i64, channel_id: i64) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        if inner.subscriptions.contains(&(user_id, channel_id)) {
            return Ok(false);
        }
        inner.subscriptions.push((user_id, channel_id));
        Ok(true)
    }

    async fn delete_subscription(&self, user_id: i64, channel_id: i64) -> anyhow::Result<bool> {
        let mut inner = self.inner.lock().unwrap();
        let before = inner.subscriptions.len();
        inner
            .subscriptions
            .retain(|&(u, c)| !(u == user_id && c == channel_id));
        Ok(inner.subscriptions.len() < before)
    }

    async fn list_subscribed_channels(&self, user_id: i64) -> anyhow::Result<Vec<Channel>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .subscriptions
            .iter()
            .filter(|&&(u, _)| u == user_id)
            .filter_map(|&(_, c)| inner.channels.iter().find(|ch| ch.id == c).cloned())
            .collect())
    }

    async fn due_channels(
        &self,
        checked_before: DateTime<Utc>,
        limit: i64,
    ) -> anyhow::Result<Vec<Channel>> {
        let inner = self.inner.lock().unwrap();
        let mut due: Vec<Channel> = inner
            .channels
            .iter()
            .filter(|c| c.last_checked < checked_before)
            .cloned()
            .collect();
        due.sort_by_key(|c| c.last_checked);
        due.truncate(limit as usize);
        Ok(due)
    }

    async fn touch_channel(&self, channel_id: i64) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(channel) = inner.channels.iter_mut().find(|c| c.id == channel_id) {
            channel.last_checked = Utc::now();
        }
        Ok(())
    }

    async fn insert_video(&self, video: &NewVideo) -> anyhow::Result<Option<Video>> {
        if let Some(ref msg) = self.fail_insert_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        let mut inner = self.inner.lock().unwrap();
        if inner
            .videos
            .iter()
            .any(|v| v.channel_id == video.channel_id && v.video_id == video.video_id)
        {
            return Ok(None);
        }
        let id = inner.allocate_id();
        let created = Video {
            id,
            channel_id: video.channel_id,
            video_id: video.video_id.clone(),
            title: video.title.clone(),
            url: video.url.clone(),
            published_at: video.published_at,
            summary: None,
            processed: false,
            created_at: Utc::now(),
        };
        inner.videos.push(created.clone());
        Ok(Some(created))
    }

    async fn mark_video_processed(&self, video_id: i64, summary: &str) -> anyhow::Result<()> {
        let mut inner = self.inner.lock().unwrap();
        if let Some(video) = inner.videos.iter_mut().find(|v| v.id == video_id) {
            video.summary = Some(summary.to_string());
            video.processed = true;
        }
        Ok(())
    }

    async fn subscribers(&self, channel_id: i64) -> anyhow::Result<Vec<User>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .subscriptions
            .iter()
            .filter(|&&(_, c)| c == channel_id)
            .filter_map(|&(u, _)| inner.users.iter().find(|user| user.id == u).cloned())
            .collect())
    }
}
