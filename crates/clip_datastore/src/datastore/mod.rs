use std::future::Future;

use chrono::{DateTime, Utc};

use crate::{ChatAccount, Channel, NewChannel, NewVideo, Platform, User, Video};

pub mod postgres;

pub trait DataStore {
    fn get_or_create_user(
        &self,
        chat: &ChatAccount,
    ) -> impl Future<Output = anyhow::Result<User>> + Send;

    fn set_user_language(
        &self,
        chat_id: i64,
        language: &str,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn find_channel(
        &self,
        platform: Platform,
        channel_id: &str,
    ) -> impl Future<Output = anyhow::Result<Option<Channel>>> + Send;

    fn get_or_create_channel(
        &self,
        channel: &NewChannel,
    ) -> impl Future<Output = anyhow::Result<Channel>> + Send;

    /// Returns false when the (user, channel) pair already exists.
    fn create_subscription(
        &self,
        user_id: i64,
        channel_id: i64,
    ) -> impl Future<Output = anyhow::Result<bool>> + Send;

    /// Returns false when there was no subscription to delete.
    fn delete_subscription(
        &self,
        user_id: i64,
        channel_id: i64,
    ) -> impl Future<Output = anyhow::Result<bool>> + Send;

    fn list_subscribed_channels(
        &self,
        user_id: i64,
    ) -> impl Future<Output = anyhow::Result<Vec<Channel>>> + Send;

    /// Channels whose `last_checked` is older than the cutoff, oldest first,
    /// at most `limit` rows. This bounds per-cycle work and rotates staleness
    /// fairly.
    fn due_channels(
        &self,
        checked_before: DateTime<Utc>,
        limit: i64,
    ) -> impl Future<Output = anyhow::Result<Vec<Channel>>> + Send;

    fn touch_channel(&self, channel_id: i64) -> impl Future<Output = anyhow::Result<()>> + Send;

    /// Inserts the video unless its (channel, video id) pair was already
    /// seen; `None` means the row existed. This is the poller's dedup
    /// boundary.
    fn insert_video(
        &self,
        video: &NewVideo,
    ) -> impl Future<Output = anyhow::Result<Option<Video>>> + Send;

    fn mark_video_processed(
        &self,
        video_id: i64,
        summary: &str,
    ) -> impl Future<Output = anyhow::Result<()>> + Send;

    fn subscribers(
        &self,
        channel_id: i64,
    ) -> impl Future<Output = anyhow::Result<Vec<User>>> + Send;
}

impl<T: DataStore + Send + Sync> DataStore for &T {
    async fn get_or_create_user(&self, chat: &ChatAccount) -> anyhow::Result<User> {
        (**self).get_or_create_user(chat).await
    }

    async fn set_user_language(&self, chat_id: i64, language: &str) -> anyhow::Result<()> {
        (**self).set_user_language(chat_id, language).await
    }

    async fn find_channel(
        &self,
        platform: Platform,
        channel_id: &str,
    ) -> anyhow::Result<Option<Channel>> {
        (**self).find_channel(platform, channel_id).await
    }

    async fn get_or_create_channel(&self, channel: &NewChannel) -> anyhow::Result<Channel> {
        (**self).get_or_create_channel(channel).await
    }

    async fn create_subscription(&self, user_id: i64, channel_id: i64) -> anyhow::Result<bool> {
        (**self).create_subscription(user_id, channel_id).await
    }

    async fn delete_subscription(&self, user_id: i64, channel_id: i64) -> anyhow::Result<bool> {
        (**self).delete_subscription(user_id, channel_id).await
    }

    async fn list_subscribed_channels(&self, user_id: i64) -> anyhow::Result<Vec<Channel>> {
        (**self).list_subscribed_channels(user_id).await
    }

    async fn due_channels(
        &self,
        checked_before: DateTime<Utc>,
        limit: i64,
    ) -> anyhow::Result<Vec<Channel>> {
        (**self).due_channels(checked_before, limit).await
    }

    async fn touch_channel(&self, channel_id: i64) -> anyhow::Result<()> {
        (**self).touch_channel(channel_id).await
    }

    async fn insert_video(&self, video: &NewVideo) -> anyhow::Result<Option<Video>> {
        (**self).insert_video(video).await
    }

    async fn mark_video_processed(&self, video_id: i64, summary: &str) -> anyhow::Result<()> {
        (**self).mark_video_processed(video_id, summary).await
    }

    async fn subscribers(&self, channel_id: i64) -> anyhow::Result<Vec<User>> {
        (**self).subscribers(channel_id).await
    }
}
