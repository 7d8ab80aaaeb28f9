use std::{ops::Deref, sync::LazyLock};

use clip_datastore::Platform;
use itertools::Itertools;
use regex::Regex;

use crate::{
    error::Error,
    platform::{decode_entities, page_title, ChannelInfo, VideoMeta, VideoSource},
};

static USERNAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"tiktok\.com/@([\w.]+)").unwrap());
static VIDEO_ID_URL_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"tiktok\.com/@[\w.]+/video/(\d+)").unwrap());
static LISTED_VIDEO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/video/(\d+)").unwrap());
static CANONICAL_LINK_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<link[^>]*rel="canonical"[^>]*href="([^"]+)""#).unwrap()
});
static TITLE_SUFFIX_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\(@[\w.]+\) TikTok.*$").unwrap());
static OG_DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta[^>]*property="og:description"[^>]*content="([^"]*)""#).unwrap()
});

pub fn username_from_url(url: &str) -> Option<&str> {
    USERNAME_RE
        .captures(url)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

pub fn video_id_from_url(url: &str) -> Option<&str> {
    VIDEO_ID_URL_RE
        .captures(url)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

#[derive(Debug, Clone)]
pub struct TikTok(pub reqwest::Client);

impl Deref for TikTok {
    type Target = reqwest::Client;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl TikTok {
    const PROFILE_BASE_URL: &'static str = "https://www.tiktok.com/@";

    async fn fetch_page(&self, url: &str) -> Result<String, Error> {
        let body = self
            .get(url)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?
            .text()
            .await?;

        Ok(body)
    }
}

impl VideoSource for TikTok {
    const PLATFORM: Platform = Platform::Tiktok;

    type Error = Error;

    #[tracing::instrument(skip(self))]
    async fn resolve_channel(&self, url: &str) -> Result<ChannelInfo, Error> {
        let username = match username_from_url(url) {
            Some(name) => name.to_string(),
            // Short links redirect; the canonical link carries the username
            None => {
                let page = self.fetch_page(url).await?;
                CANONICAL_LINK_RE
                    .captures(&page)
                    .and_then(|cap| cap.get(1))
                    .and_then(|m| username_from_url(m.as_str()))
                    .map(|name| name.to_string())
                    .ok_or(Error::ParseError("No TikTok username found in page"))?
            }
        };

        let channel_url = format!("{}{}", Self::PROFILE_BASE_URL, username);
        let channel_name = match self.fetch_page(&channel_url).await {
            Ok(page) => page_title(&page)
                .map(|t| TITLE_SUFFIX_RE.replace(&t, "").trim().to_string())
                .filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, %username, "Failed to fetch profile name");
                None
            }
        };

        Ok(ChannelInfo {
            channel_id: username,
            channel_name,
            channel_url,
        })
    }

    #[tracing::instrument(skip(self))]
    async fn list_recent_videos(
        &self,
        channel_id: &str,
        limit: usize,
    ) -> Result<Vec<VideoMeta>, Error> {
        let page = self
            .fetch_page(&format!("{}{}", Self::PROFILE_BASE_URL, channel_id))
            .await?;

        let videos = LISTED_VIDEO_RE
            .captures_iter(&page)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str())
            .unique()
            .take(limit)
            .map(|video_id| VideoMeta {
                video_id: video_id.to_string(),
                title: None,
                url: format!("{}{}/video/{}", Self::PROFILE_BASE_URL, channel_id, video_id),
                published_at: None,
            })
            .collect();

        Ok(videos)
    }

    #[tracing::instrument(skip(self, video), fields(video_id = %video.video_id))]
    async fn extract_content(&self, video: &VideoMeta, _language: &str) -> Result<String, Error> {
        let page = self.fetch_page(&video.url).await?;

        let description = OG_DESCRIPTION_RE
            .captures(&page)
            .and_then(|cap| cap.get(1))
            .map(|m| decode_entities(m.as_str()))
            .filter(|d| !d.trim().is_empty())
            .ok_or(Error::ParseError("No og:description on video page"))?;

        Ok(description)
    }
}
