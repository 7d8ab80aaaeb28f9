use anyhow::Context;
use chrono::Utc;
use clip_datastore::{Channel, DataStore, NewVideo, Video, DEFAULT_LANGUAGE};

use crate::{
    platform::{PlatformDirectory, VideoMeta},
    replies,
    telegram::Notifier,
    Summarizer,
};

pub mod builder;

// The periodic poll-and-notify pipeline over due channels
#[derive(Debug)]
pub struct PollProcessor<D, P, S, N>
where
    D: DataStore + Send + Sync + 'static,
    P: PlatformDirectory + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    store: D,
    platforms: P,
    summarizer: S,
    notifier: N,
    max_channels: usize,
}

impl<D, P, S, N> PollProcessor<D, P, S, N>
where
    D: DataStore + Send + Sync + 'static,
    P: PlatformDirectory + Send + Sync + 'static,
    S: Summarizer + Send + Sync + 'static,
    N: Notifier + Send + Sync + 'static,
{
    /// A channel becomes due again this long after its last check.
    const STALE_AFTER_MINUTES: i64 = 30;
    /// Recent-video fetches are bounded to this many entries per channel.
    const MAX_VIDEOS_PER_FETCH: usize = 5;

    /// One poll cycle: select due channels, discover and insert unseen
    /// videos, summarize them, and fan notifications out to subscribers.
    ///
    /// Every per-channel failure is contained within the cycle; the only
    /// error that escapes is the due-channel query itself.
    #[tracing::instrument(skip(self))]
    pub async fn run(&self) -> anyhow::Result<()> {
        let cutoff = Utc::now() - chrono::Duration::minutes(Self::STALE_AFTER_MINUTES);
        let due = self
            .store
            .due_channels(cutoff, self.max_channels as i64)
            .await
            .inspect_err(|e| tracing::error!(error = ?e, "Failed to query due channels"))
            .context("Failed to query due channels")?;

        if due.is_empty() {
            tracing::info!("No channels due for a check");
            return Ok(());
        }
        tracing::info!(count = due.len(), "Checking channels for new videos");

        for channel in due {
            let fresh = match self.discover_videos(&channel).await {
                Ok(videos) => videos,
                Err(e) => {
                    tracing::error!(error = ?e, channel = %channel.channel_id, "Channel check failed");
                    Vec::new()
                }
            };

            // The timestamp advances even when the check failed, so a broken
            // channel cannot hold a poll slot forever.
            if let Err(e) = self.store.touch_channel(channel.id).await {
                tracing::error!(error = ?e, channel = %channel.channel_id, "Failed to advance last_checked");
                continue;
            }

            if !fresh.is_empty() {
                self.notify_subscribers(&channel, fresh).await;
            }
        }

        Ok(())
    }

    /// Fetches the channel's recent videos and inserts the unseen ones.
    /// Re-fetching a known video finds the existing row and is a no-op.
    #[tracing::instrument(skip_all, fields(channel = %channel.channel_id))]
    async fn discover_videos(&self, channel: &Channel) -> anyhow::Result<Vec<(Video, VideoMeta)>> {
        let fetched = match self
            .platforms
            .list_recent_videos(channel.platform, &channel.channel_id, Self::MAX_VIDEOS_PER_FETCH)
            .await
        {
            Ok(videos) => videos,
            // A failed fetch is a transient miss, not an error worth surfacing
            Err(e) => {
                tracing::warn!(error = ?e, "Fetching recent videos failed, will retry next cycle");
                return Ok(Vec::new());
            }
        };

        let mut fresh = Vec::new();
        for meta in fetched {
            let new_video = NewVideo {
                channel_id: channel.id,
                video_id: meta.video_id.clone(),
                title: meta
                    .title
                    .clone()
                    .unwrap_or_else(|| replies::PLACEHOLDER_TITLE.to_string()),
                url: meta.url.clone(),
                published_at: meta.published_at.unwrap_or_else(Utc::now),
            };
            if let Some(video) = self
                .store
                .insert_video(&new_video)
                .await
                .context("Failed to insert video")?
            {
                tracing::info!(video = %video.video_id, "Discovered new video");
                fresh.push((video, meta));
            }
        }

        Ok(fresh)
    }

    /// Summarizes each newly inserted video and delivers the notification to
    /// every subscriber. A summarization failure leaves the video
    /// unprocessed for a later retry but the notification still goes out; a
    /// delivery failure for one subscriber never blocks the rest.
    #[tracing::instrument(skip_all, fields(channel = %channel.channel_id, videos = fresh.len()))]
    async fn notify_subscribers(&self, channel: &Channel, fresh: Vec<(Video, VideoMeta)>) {
        let subscribers = match self.store.subscribers(channel.id).await {
            Ok(users) => users,
            Err(e) => {
                tracing::error!(error = ?e, "Failed to load subscribers");
                return;
            }
        };

        let language = subscribers
            .first()
            .map(|u| u.language.clone())
            .unwrap_or_else(|| DEFAULT_LANGUAGE.to_string());

        for (mut video, meta) in fresh {
            match self.summarize(channel, &meta, &language).await {
                Ok(summary) => {
                    if let Err(e) = self.store.mark_video_processed(video.id, &summary).await {
                        tracing::error!(error = ?e, video = %video.video_id, "Failed to record summary");
                    }
                    video.summary = Some(summary);
                    video.processed = true;
                }
                Err(e) => {
                    tracing::warn!(error = ?e, video = %video.video_id, "Summarization failed, video left unprocessed");
                }
            }

            let text = replies::new_video_notification(channel, &video);
            for user in &subscribers {
                if let Err(e) = self.notifier.notify(user.chat_id, &text, false).await {
                    tracing::warn!(error = ?e, chat_id = user.chat_id, "Failed to deliver notification");
                }
            }
        }
    }

    async fn summarize(
        &self,
        channel: &Channel,
        meta: &VideoMeta,
        language: &str,
    ) -> anyhow::Result<String> {
        let content = self
            .platforms
            .extract_content(channel.platform, meta, language)
            .await?;

        let response = self
            .summarizer
            .summarize(&content, language)
            .await
            .map_err(|e| anyhow::anyhow!("Failed to summarize content: {e:?}"))?;

        Ok(response.summary)
    }
}
