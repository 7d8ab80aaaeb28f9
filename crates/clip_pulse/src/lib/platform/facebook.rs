use std::{ops::Deref, sync::LazyLock};

use clip_datastore::Platform;
use itertools::Itertools;
use regex::Regex;

use crate::{
    error::Error,
    platform::{decode_entities, page_title, ChannelInfo, VideoMeta, VideoSource},
};

static PROFILE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"facebook\.com/profile\.php\?id=(\d+)").unwrap());
static PAGES_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"facebook\.com/pages/[^/]+/(\d+)").unwrap());
static PAGE_NAME_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?:facebook|fb)\.com/([A-Za-z0-9.]+)/?$").unwrap());
static EMBEDDED_PAGE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#""pageID":"(\d+)""#).unwrap());
static VIDEO_ID_URL_RES: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"facebook\.com/[^/]+/videos/(\d+)",
        r"facebook\.com/watch/?\?v=(\d+)",
        r"fb\.watch/[^/]+/(\d+)",
    ]
    .iter()
    .map(|pattern| Regex::new(pattern).unwrap())
    .collect()
});
static LISTED_VIDEO_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"/videos/(\d+)").unwrap());
static TITLE_SUFFIX_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r" \| Facebook.*$").unwrap());
static OG_TITLE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta[^>]*property="og:title"[^>]*content="([^"]*)""#).unwrap()
});
static OG_DESCRIPTION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r#"<meta[^>]*property="og:description"[^>]*content="([^"]*)""#).unwrap()
});

pub fn video_id_from_url(url: &str) -> Option<&str> {
    VIDEO_ID_URL_RES
        .iter()
        .find_map(|re| re.captures(url))
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

/// Page identity from the URL alone: numeric profile/page ids, or the page's
/// path name.
pub fn page_id_from_url(url: &str) -> Option<&str> {
    if let Some(cap) = PROFILE_ID_RE.captures(url) {
        return cap.get(1).map(|m| m.as_str());
    }
    // Query parameters only matter for profile.php
    let url = url.split_once('?').map(|(head, _)| head).unwrap_or(url);
    PAGES_ID_RE
        .captures(url)
        .or_else(|| PAGE_NAME_RE.captures(url))
        .and_then(|cap| cap.get(1))
        .map(|m| m.as_str())
}

#[derive(Debug, Clone)]
pub struct Facebook(pub reqwest::Client);

impl Deref for Facebook {
    type Target = reqwest::Client;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl Facebook {
    const PAGE_BASE_URL: &'static str = "https://www.facebook.com";
    // Facebook serves a login wall to clients it does not recognize
    const USER_AGENT: &'static str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36";

    async fn fetch_page(&self, url: &str) -> Result<String, Error> {
        let body = self
            .get(url)
            .header("User-Agent", Self::USER_AGENT)
            .header("Accept-Language", "en-US,en;q=0.9")
            .send()
            .await?
            .text()
            .await?;

        Ok(body)
    }
}

impl VideoSource for Facebook {
    const PLATFORM: Platform = Platform::Facebook;

    type Error = Error;

    #[tracing::instrument(skip(self))]
    async fn resolve_channel(&self, url: &str) -> Result<ChannelInfo, Error> {
        let page_id = match page_id_from_url(url) {
            Some(id) => id.to_string(),
            None => {
                let page = self.fetch_page(url).await?;
                EMBEDDED_PAGE_ID_RE
                    .captures(&page)
                    .and_then(|cap| cap.get(1))
                    .map(|m| m.as_str().to_string())
                    .ok_or(Error::ParseError("No pageID found in page"))?
            }
        };

        let channel_url = format!("{}/{}", Self::PAGE_BASE_URL, page_id);
        let channel_name = match self.fetch_page(&channel_url).await {
            Ok(page) => page_title(&page)
                .map(|t| TITLE_SUFFIX_RE.replace(&t, "").trim().to_string())
                .filter(|t| !t.is_empty()),
            Err(e) => {
                tracing::warn!(error = %e, %page_id, "Failed to fetch page name");
                None
            }
        };

        Ok(ChannelInfo {
            channel_id: page_id,
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
            .fetch_page(&format!("{}/{}/videos", Self::PAGE_BASE_URL, channel_id))
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
                url: format!("{}/{}/videos/{}", Self::PAGE_BASE_URL, channel_id, video_id),
                published_at: None,
            })
            .collect();

        Ok(videos)
    }

    #[tracing::instrument(skip(self, video), fields(video_id = %video.video_id))]
    async fn extract_content(&self, video: &VideoMeta, _language: &str) -> Result<String, Error> {
        let page = self.fetch_page(&video.url).await?;

        let title = OG_TITLE_RE
            .captures(&page)
            .and_then(|cap| cap.get(1))
            .map(|m| decode_entities(m.as_str()));
        let description = OG_DESCRIPTION_RE
            .captures(&page)
            .and_then(|cap| cap.get(1))
            .map(|m| decode_entities(m.as_str()));

        let content = [title, description]
            .into_iter()
            .flatten()
            .filter(|part| !part.trim().is_empty())
            .join("\n\n");

        if content.is_empty() {
            return Err(Error::ParseError("No og metadata on video page"));
        }

        Ok(content)
    }
}
