//! # Platform resolvers and extractors
//!
//! One scraper per supported platform, each implementing the same
//! three-operation capability: resolve a channel URL to its canonical
//! identity, list a channel's recent videos, and extract summarizable text
//! for one video. [`PlatformRouter`] dispatches over the fixed set of
//! platforms; it is the seam the subscription service and the poll processor
//! consume.

pub mod facebook;
pub mod tiktok;
pub mod youtube;

use std::{fmt::Debug, future::Future, sync::LazyLock};

use chrono::{DateTime, Utc};
use clip_datastore::Platform;
use regex::Regex;

static YOUTUBE_DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)youtube\.com|youtu\.be").unwrap());
static TIKTOK_DOMAIN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(?i)tiktok\.com").unwrap());
static FACEBOOK_DOMAIN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)facebook\.com|fb\.com|fb\.watch").unwrap());

static PAGE_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<title>(.*?)</title>").unwrap());

/// Identifies the platform a URL belongs to. Ordered: youtube, then tiktok,
/// then facebook; the first match wins.
pub fn detect_platform(url: &str) -> Option<Platform> {
    if YOUTUBE_DOMAIN_RE.is_match(url) {
        Some(Platform::Youtube)
    } else if TIKTOK_DOMAIN_RE.is_match(url) {
        Some(Platform::Tiktok)
    } else if FACEBOOK_DOMAIN_RE.is_match(url) {
        Some(Platform::Facebook)
    } else {
        None
    }
}

pub(crate) fn page_title(html: &str) -> Option<String> {
    PAGE_TITLE_RE
        .captures(html)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str().trim().to_string())
        .filter(|t| !t.is_empty())
}

pub(crate) fn decode_entities(text: &str) -> String {
    text.replace("&amp;", "&")
        .replace("&#39;", "'")
        .replace("&quot;", "\"")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
}

/// Canonical identity of a channel, as resolved from a user-supplied URL.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChannelInfo {
    pub channel_id: String,
    pub channel_name: Option<String>,
    pub channel_url: String,
}

/// Metadata of one video as observed on its platform.
#[derive(Debug, Clone)]
pub struct VideoMeta {
    pub video_id: String,
    pub title: Option<String>,
    pub url: String,
    pub published_at: Option<DateTime<Utc>>,
}

pub trait VideoSource {
    const PLATFORM: Platform;

    type Error: Debug;

    fn resolve_channel(
        &self,
        url: &str,
    ) -> impl Future<Output = Result<ChannelInfo, Self::Error>> + Send;

    fn list_recent_videos(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> impl Future<Output = Result<Vec<VideoMeta>, Self::Error>> + Send;

    fn extract_content(
        &self,
        video: &VideoMeta,
        language: &str,
    ) -> impl Future<Output = Result<String, Self::Error>> + Send;
}

/// Platform-indexed dispatch over the three sources.
pub trait PlatformDirectory {
    fn resolve_channel(
        &self,
        platform: Platform,
        url: &str,
    ) -> impl Future<Output = anyhow::Result<ChannelInfo>> + Send;

    fn list_recent_videos(
        &self,
        platform: Platform,
        channel_id: &str,
        limit: usize,
    ) -> impl Future<Output = anyhow::Result<Vec<VideoMeta>>> + Send;

    fn extract_content(
        &self,
        platform: Platform,
        video: &VideoMeta,
        language: &str,
    ) -> impl Future<Output = anyhow::Result<String>> + Send;
}

#[derive(Debug, Clone)]
pub struct PlatformRouter<Y, T, F> {
    youtube: Y,
    tiktok: T,
    facebook: F,
}

/// The production router over the three live scrapers.
pub type LivePlatformRouter =
    PlatformRouter<youtube::YouTube, tiktok::TikTok, facebook::Facebook>;

impl<Y, T, F> PlatformRouter<Y, T, F> {
    pub fn new(youtube: Y, tiktok: T, facebook: F) -> Self {
        PlatformRouter {
            youtube,
            tiktok,
            facebook,
        }
    }
}

impl PlatformRouter<youtube::YouTube, tiktok::TikTok, facebook::Facebook> {
    /// All three scrapers sharing one HTTP client.
    pub fn from_http_client(client: reqwest::Client) -> Self {
        PlatformRouter {
            youtube: youtube::YouTube(client.clone()),
            tiktok: tiktok::TikTok(client.clone()),
            facebook: facebook::Facebook(client),
        }
    }
}

impl Default for PlatformRouter<youtube::YouTube, tiktok::TikTok, facebook::Facebook> {
    fn default() -> Self {
        Self::from_http_client(reqwest::Client::new())
    }
}

impl<Y, T, F> PlatformDirectory for PlatformRouter<Y, T, F>
where
    Y: VideoSource + Send + Sync,
    T: VideoSource + Send + Sync,
    F: VideoSource + Send + Sync,
{
    async fn resolve_channel(&self, platform: Platform, url: &str) -> anyhow::Result<ChannelInfo> {
        fn failed<E: Debug>(platform: Platform) -> impl FnOnce(E) -> anyhow::Error {
            move |e| anyhow::anyhow!("Failed to resolve {platform} channel: {e:?}")
        }

        match platform {
            Platform::Youtube => self.youtube.resolve_channel(url).await.map_err(failed(platform)),
            Platform::Tiktok => self.tiktok.resolve_channel(url).await.map_err(failed(platform)),
            Platform::Facebook => self.facebook.resolve_channel(url).await.map_err(failed(platform)),
        }
    }

    async fn list_recent_videos(
        &self,
        platform: Platform,
        channel_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<VideoMeta>> {
        fn failed<E: Debug>(platform: Platform) -> impl FnOnce(E) -> anyhow::Error {
            move |e| anyhow::anyhow!("Failed to list recent {platform} videos: {e:?}")
        }

        match platform {
            Platform::Youtube => self
                .youtube
                .list_recent_videos(channel_id, limit)
                .await
                .map_err(failed(platform)),
            Platform::Tiktok => self
                .tiktok
                .list_recent_videos(channel_id, limit)
                .await
                .map_err(failed(platform)),
            Platform::Facebook => self
                .facebook
                .list_recent_videos(channel_id, limit)
                .await
                .map_err(failed(platform)),
        }
    }

    async fn extract_content(
        &self,
        platform: Platform,
        video: &VideoMeta,
        language: &str,
    ) -> anyhow::Result<String> {
        fn failed<E: Debug>(platform: Platform) -> impl FnOnce(E) -> anyhow::Error {
            move |e| anyhow::anyhow!("Failed to extract {platform} video content: {e:?}")
        }

        match platform {
            Platform::Youtube => self
                .youtube
                .extract_content(video, language)
                .await
                .map_err(failed(platform)),
            Platform::Tiktok => self
                .tiktok
                .extract_content(video, language)
                .await
                .map_err(failed(platform)),
            Platform::Facebook => self
                .facebook
                .extract_content(video, language)
                .await
                .map_err(failed(platform)),
        }
    }
}

/// Platform-appropriate video id extraction, used to route free-text URLs.
pub fn video_id_from_url(platform: Platform, url: &str) -> Option<&str> {
    match platform {
        Platform::Youtube => youtube::video_id_from_url(url),
        Platform::Tiktok => tiktok::video_id_from_url(url),
        Platform::Facebook => facebook::video_id_from_url(url),
    }
}
