use clip_datastore::{ChatAccount, Channel, DataStore, NewChannel, Platform};

use crate::platform::{detect_platform, PlatformDirectory};

/// Subscribe/unsubscribe/list orchestration against the store, with URLs
/// normalized to canonical channel identities through the platform
/// directory.
pub struct SubscriptionService<D, P> {
    store: D,
    platforms: P,
}

#[derive(Debug, thiserror::Error)]
pub enum SubscribeError {
    #[error("URL does not belong to a supported platform")]
    UnsupportedUrl,
    #[error("Failed to resolve {platform} channel")]
    Resolve {
        platform: Platform,
        #[source]
        source: anyhow::Error,
    },
    #[error("Already subscribed to {}", .channel.display_name())]
    AlreadySubscribed { channel: Channel },
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum UnsubscribeError {
    #[error("URL does not belong to a supported platform")]
    UnsupportedUrl,
    #[error("Failed to resolve {platform} channel")]
    Resolve {
        platform: Platform,
        #[source]
        source: anyhow::Error,
    },
    #[error("Channel was never subscribed to")]
    UnknownChannel,
    #[error("No subscription for this channel")]
    NotSubscribed,
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

#[derive(Debug, thiserror::Error)]
pub enum LanguageError {
    #[error("Unsupported language code: {0}")]
    Unsupported(String),
    #[error(transparent)]
    Store(#[from] anyhow::Error),
}

impl<D, P> SubscriptionService<D, P>
where
    D: DataStore + Send + Sync,
    P: PlatformDirectory + Send + Sync,
{
    pub const SUPPORTED_LANGUAGES: &'static [&'static str] = &["vi", "en"];

    pub fn new(store: D, platforms: P) -> Self {
        SubscriptionService { store, platforms }
    }

    #[tracing::instrument(skip(self, chat), fields(chat_id = chat.chat_id))]
    pub async fn subscribe(
        &self,
        chat: &ChatAccount,
        channel_url: &str,
    ) -> Result<Channel, SubscribeError> {
        let platform = detect_platform(channel_url).ok_or(SubscribeError::UnsupportedUrl)?;
        let info = self
            .platforms
            .resolve_channel(platform, channel_url)
            .await
            .map_err(|source| SubscribeError::Resolve { platform, source })?;

        let user = self.store.get_or_create_user(chat).await?;
        let channel = self
            .store
            .get_or_create_channel(&NewChannel {
                platform,
                channel_id: info.channel_id,
                channel_name: info.channel_name,
                channel_url: info.channel_url,
            })
            .await?;

        if !self.store.create_subscription(user.id, channel.id).await? {
            return Err(SubscribeError::AlreadySubscribed { channel });
        }

        tracing::info!(channel = %channel.channel_id, %platform, "Created subscription");
        Ok(channel)
    }

    #[tracing::instrument(skip(self, chat), fields(chat_id = chat.chat_id))]
    pub async fn unsubscribe(
        &self,
        chat: &ChatAccount,
        channel_url: &str,
    ) -> Result<Channel, UnsubscribeError> {
        let platform = detect_platform(channel_url).ok_or(UnsubscribeError::UnsupportedUrl)?;
        let info = self
            .platforms
            .resolve_channel(platform, channel_url)
            .await
            .map_err(|source| UnsubscribeError::Resolve { platform, source })?;

        let user = self.store.get_or_create_user(chat).await?;
        let channel = self
            .store
            .find_channel(platform, &info.channel_id)
            .await?
            .ok_or(UnsubscribeError::UnknownChannel)?;

        if !self.store.delete_subscription(user.id, channel.id).await? {
            return Err(UnsubscribeError::NotSubscribed);
        }

        tracing::info!(channel = %channel.channel_id, %platform, "Removed subscription");
        Ok(channel)
    }

    pub async fn list_subscriptions(&self, chat: &ChatAccount) -> anyhow::Result<Vec<Channel>> {
        let user = self.store.get_or_create_user(chat).await?;
        self.store.list_subscribed_channels(user.id).await
    }

    pub async fn set_language(&self, chat: &ChatAccount, code: &str) -> Result<(), LanguageError> {
        let code = code.to_lowercase();
        if !Self::SUPPORTED_LANGUAGES.contains(&code.as_str()) {
            return Err(LanguageError::Unsupported(code));
        }

        self.store.get_or_create_user(chat).await?;
        self.store.set_user_language(chat.chat_id, &code).await?;
        Ok(())
    }

    pub async fn preferred_language(&self, chat: &ChatAccount) -> anyhow::Result<String> {
        let user = self.store.get_or_create_user(chat).await?;
        Ok(user.language)
    }
}
