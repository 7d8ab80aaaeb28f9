use std::{ops::Deref, sync::LazyLock};

use clip_datastore::Platform;
use itertools::Itertools;
use regex::Regex;
use serde::Deserialize;

use crate::{
    error::Error,
    platform::{decode_entities, page_title, ChannelInfo, VideoMeta, VideoSource},
};

static CHANNEL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtube\.com/channel/(UC[\w-]+)").unwrap());
static EMBEDDED_CHANNEL_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""channelId":"(UC[\w-]+)""#).unwrap());
static VIDEO_ID_URL_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:youtube\.com/(?:watch\?v=|embed/|shorts/|v/)|youtu\.be/)([A-Za-z0-9_-]{11})")
        .unwrap()
});
static LISTED_VIDEO_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""videoId":"([\w-]+)""#).unwrap());
static LISTED_TITLE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""title":\{"runs":\[\{"text":"([^"]+)"\}\]\},"thumbnail""#).unwrap());
static CAPTION_TRACKS_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""captionTracks":(\[.*?\])"#).unwrap());
static CAPTION_TEXT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)<text[^>]*>(.*?)</text>").unwrap());

/// Channel id straight from a `/channel/UC...` URL, without any network
/// round-trip.
pub fn channel_id_from_url(url: &str) -> Option<&str> {
    CHANNEL_ID_RE
        .captures(url)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

/// True for the channel URL shapes the resolver understands:
/// `/channel/UC...`, `/c/Name`, `/user/Name` and `/@handle`.
pub fn is_channel_url(url: &str) -> bool {
    CHANNEL_ID_RE.is_match(url)
        || url.contains("youtube.com/c/")
        || url.contains("youtube.com/user/")
        || url.contains("youtube.com/@")
}

pub fn video_id_from_url(url: &str) -> Option<&str> {
    VIDEO_ID_URL_RE
        .captures(url)
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

#[derive(Debug, Clone)]
pub struct YouTube(pub reqwest::Client);

impl Deref for YouTube {
    type Target = reqwest::Client;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl YouTube {
    const CHANNEL_BASE_URL: &'static str = "https://www.youtube.com/channel";
    const VIDEO_BASE_URL: &'static str = "https://www.youtube.com/watch";

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

/// One entry of the watch page's `captionTracks` array.
#[derive(Debug, Deserialize)]
struct CaptionTrack {
    #[serde(rename = "baseUrl")]
    base_url: String,
    #[serde(rename = "languageCode")]
    language_code: String,
}

impl VideoSource for YouTube {
    const PLATFORM: Platform = Platform::Youtube;

    type Error = Error;

    #[tracing::instrument(skip(self))]
    async fn resolve_channel(&self, url: &str) -> Result<ChannelInfo, Error> {
        let channel_id = match channel_id_from_url(url) {
            Some(id) => id.to_string(),
            // Custom /c/, /user/ and /@handle URLs carry the canonical id in
            // the page body
            None => {
                let page = self.fetch_page(url).await?;
                EMBEDDED_CHANNEL_ID_RE
                    .captures(&page)
                    .and_then(|cap| cap.get(1))
                    .map(|m| m.as_str().to_string())
                    .ok_or(Error::ParseError("No channelId found in channel page"))?
            }
        };

        let channel_url = format!("{}/{}", Self::CHANNEL_BASE_URL, channel_id);
        let channel_name = match self.fetch_page(&channel_url).await {
            Ok(page) => page_title(&page)
                .map(|t| t.trim_end_matches("- YouTube").trim().to_string())
                .filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, %channel_id, "Failed to fetch channel name");
                None
            }
        };

        Ok(ChannelInfo {
            channel_id,
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
            .fetch_page(&format!("{}/{}/videos", Self::CHANNEL_BASE_URL, channel_id))
            .await?;

        let titles: Vec<&str> = LISTED_TITLE_RE
            .captures_iter(&page)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str())
            .collect();

        // The grid repeats every video id several times; keep first-seen order
        let videos = LISTED_VIDEO_ID_RE
            .captures_iter(&page)
            .filter_map(|cap| cap.get(1))
            .map(|m| m.as_str())
            .unique()
            .take(limit)
            .enumerate()
            .map(|(i, video_id)| VideoMeta {
                video_id: video_id.to_string(),
                title: titles.get(i).map(|t| decode_entities(t)),
                url: format!("{}?v={}", Self::VIDEO_BASE_URL, video_id),
                published_at: None,
            })
            .collect();

        Ok(videos)
    }

    #[tracing::instrument(skip(self, video), fields(video_id = %video.video_id))]
    async fn extract_content(&self, video: &VideoMeta, language: &str) -> Result<String, Error> {
        let page = self.fetch_page(&video.url).await?;

        let tracks_json = CAPTION_TRACKS_RE
            .captures(&page)
            .and_then(|cap| cap.get(1))
            .ok_or(Error::ParseError("No caption tracks on video page"))?;
        let tracks: Vec<CaptionTrack> = serde_json::from_str(tracks_json.as_str())?;

        let track = tracks
            .iter()
            .find(|t| t.language_code == language)
            .or_else(|| tracks.first())
            .ok_or(Error::ParseError("Caption track list is empty"))?;

        let timedtext = self.fetch_page(&track.base_url).await?;
        let transcript = CAPTION_TEXT_RE
            .captures_iter(&timedtext)
            .filter_map(|cap| cap.get(1))
            .map(|m| decode_entities(m.as_str()))
            .join(" ");

        if transcript.is_empty() {
            return Err(Error::ParseError("Caption track produced no text"));
        }

        Ok(transcript)
    }
}
