use std::sync::{Arc, Mutex};

use clip_datastore::Platform;
use clip_pulse::platform::{ChannelInfo, PlatformDirectory, VideoMeta};

/// Stand-in for the platform router: one canned channel identity, one canned
/// video list, one canned content blob.
#[derive(Clone, Default)]
pub struct MockPlatforms {
    pub channel: Option<ChannelInfo>,
    pub videos: Arc<Mutex<Vec<VideoMeta>>>,
    pub content: Option<String>,
    pub fail_list_with: Option<String>,
    pub list_calls: Arc<Mutex<Vec<(Platform, String)>>>,
    pub extract_calls: Arc<Mutex<Vec<String>>>,
}

impl MockPlatforms {
    pub fn resolving(channel_id: &str, channel_name: &str) -> Self {
        Self {
            channel: Some(ChannelInfo {
                channel_id: channel_id.to_string(),
                channel_name: Some(channel_name.to_string()),
                channel_url: format!("https://example.com/{channel_id}"),
            }),
            content: Some("nội dung video để tóm tắt".to_string()),
            ..Default::default()
        }
    }

    pub fn with_videos(self, videos: Vec<VideoMeta>) -> Self {
        *self.videos.lock().unwrap() = videos;
        self
    }

    pub fn failing_list(mut self, msg: &str) -> Self {
        self.fail_list_with = Some(msg.to_string());
        self
    }

    pub fn without_content(mut self) -> Self {
        self.content = None;
        self
    }
}

impl PlatformDirectory for MockPlatforms {
    async fn resolve_channel(&self, _platform: Platform, _url: &str) -> anyhow::Result<ChannelInfo> {
        self.channel
            .clone()
            .ok_or_else(|| anyhow::anyhow!("channel resolution failed"))
    }

    async fn list_recent_videos(
        &self,
        platform: Platform,
        channel_id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<VideoMeta>> {
        self.list_calls
            .lock()
            .unwrap()
            .push((platform, channel_id.to_string()));
        if let Some(ref msg) = self.fail_list_with {
            return Err(anyhow::anyhow!("{}", msg));
        }
        let videos = self.videos.lock().unwrap();
        Ok(videos.iter().take(limit).cloned().collect())
    }

    async fn extract_content(
        &self,
        _platform: Platform,
        video: &VideoMeta,
        _language: &str,
    ) -> anyhow::Result<String> {
        self.extract_calls.lock().unwrap().push(video.video_id.clone());
        self.content
            .clone()
            .ok_or_else(|| anyhow::anyhow!("no extractable content"))
    }
}
