use std::{fmt, str::FromStr};

use chrono::{DateTime, Utc};

/// Summary language assumed for users who never ran the language command.
pub const DEFAULT_LANGUAGE: &str = "vi";

/// The video platforms a channel can live on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Platform {
    Youtube,
    Tiktok,
    Facebook,
}

impl Platform {
    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::Youtube => "youtube",
            Platform::Tiktok => "tiktok",
            Platform::Facebook => "facebook",
        }
    }

    /// Display icon used in the subscription list.
    pub fn icon(&self) -> &'static str {
        match self {
            Platform::Youtube => "🎬",
            Platform::Tiktok => "📱",
            Platform::Facebook => "📺",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown platform: {0}")]
pub struct UnknownPlatform(pub String);

impl FromStr for Platform {
    type Err = UnknownPlatform;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "youtube" => Ok(Platform::Youtube),
            "tiktok" => Ok(Platform::Tiktok),
            "facebook" => Ok(Platform::Facebook),
            other => Err(UnknownPlatform(other.to_string())),
        }
    }
}

/// Incoming chat identity, as reported by the messaging transport.
#[derive(Debug, Clone, Default)]
pub struct ChatAccount {
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct User {
    pub id: i64,
    pub chat_id: i64,
    pub username: Option<String>,
    pub first_name: Option<String>,
    pub language: String,
    pub created_at: DateTime<Utc>,
}

/// A creator channel, shared by all of its subscribers. Identity is the
/// (platform, platform-native id) pair.
#[derive(Debug, Clone)]
pub struct Channel {
    pub id: i64,
    pub platform: Platform,
    pub channel_id: String,
    pub channel_name: Option<String>,
    pub channel_url: String,
    pub last_checked: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
}

impl Channel {
    pub fn display_name(&self) -> &str {
        self.channel_name.as_deref().unwrap_or(&self.channel_url)
    }
}

#[derive(Debug, Clone)]
pub struct NewChannel {
    pub platform: Platform,
    pub channel_id: String,
    pub channel_name: Option<String>,
    pub channel_url: String,
}

/// A video observed on a channel. Identity is the (channel, platform-native
/// video id) pair; a video is never re-created once seen.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Video {
    pub id: i64,
    pub channel_id: i64,
    pub video_id: String,
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
    pub summary: Option<String>,
    pub processed: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewVideo {
    pub channel_id: i64,
    pub video_id: String,
    pub title: String,
    pub url: String,
    pub published_at: DateTime<Utc>,
}

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct Subscription {
    pub id: i64,
    pub user_id: i64,
    pub channel_id: i64,
    pub created_at: DateTime<Utc>,
}
