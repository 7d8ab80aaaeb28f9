use std::time::Duration;

use clip_datastore::{ChatAccount, DataStore, Platform, DEFAULT_LANGUAGE};

use crate::{
    platform::{self, detect_platform, PlatformDirectory, VideoMeta},
    replies,
    service::SubscriptionService,
    telegram::{api::Message, TelegramClient},
    Summarizer,
};

/// Chat commands understood by the front-end. Anything else that starts
/// with `/` is ignored; plain text is treated as a URL submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command<'a> {
    Start,
    Help,
    Language(Option<&'a str>),
    Subscribe(Option<&'a str>),
    Unsubscribe(Option<&'a str>),
    List,
    Unknown,
}

impl<'a> Command<'a> {
    pub fn parse(text: &'a str) -> Option<Self> {
        if !text.starts_with('/') {
            return None;
        }

        let mut parts = text.splitn(2, char::is_whitespace);
        let head = parts.next().unwrap_or_default();
        let arg = parts.next().map(str::trim).filter(|s| !s.is_empty());
        // Group chats address commands as /command@botname
        let name = head.split('@').next().unwrap_or(head);

        match name {
            "/start" => Some(Command::Start),
            "/help" => Some(Command::Help),
            "/language" => Some(Command::Language(arg)),
            "/subscribe" => Some(Command::Subscribe(arg)),
            "/unsubscribe" => Some(Command::Unsubscribe(arg)),
            "/list" => Some(Command::List),
            _ => Some(Command::Unknown),
        }
    }
}

/// Stateless request/response front-end: one handler invocation per incoming
/// message, plus the on-demand summarize flow for free-text video URLs.
pub struct Bot<D, P, S>
where
    D: DataStore + Send + Sync,
    P: PlatformDirectory + Clone + Send + Sync,
    S: Summarizer + Send + Sync,
{
    telegram: TelegramClient,
    service: SubscriptionService<D, P>,
    platforms: P,
    summarizer: S,
}

impl<D, P, S> Bot<D, P, S>
where
    D: DataStore + Send + Sync,
    P: PlatformDirectory + Clone + Send + Sync,
    S: Summarizer + Send + Sync,
{
    const LONG_POLL_TIMEOUT_SECS: u64 = 30;

    pub fn new(telegram: TelegramClient, store: D, platforms: P, summarizer: S) -> Self {
        Bot {
            telegram,
            service: SubscriptionService::new(store, platforms.clone()),
            platforms,
            summarizer,
        }
    }

    /// Long-poll loop over incoming updates. Never returns in normal
    /// operation; transport errors back off and retry.
    pub async fn run(&self) -> anyhow::Result<()> {
        tracing::info!("Bot front-end started");
        let mut offset = 0i64;

        loop {
            let updates = match self
                .telegram
                .get_updates(offset, Self::LONG_POLL_TIMEOUT_SECS)
                .await
            {
                Ok(updates) => updates,
                Err(e) => {
                    tracing::error!(error = %e, "Failed to fetch updates");
                    tokio::time::sleep(Duration::from_secs(5)).await;
                    continue;
                }
            };

            for update in updates {
                offset = offset.max(update.update_id + 1);
                let Some(message) = update.message else {
                    continue;
                };
                if let Err(e) = self.handle_message(&message).await {
                    tracing::error!(error = ?e, chat_id = message.chat.id, "Message handler failed");
                }
            }
        }
    }

    #[tracing::instrument(skip_all, fields(chat_id = message.chat.id))]
    async fn handle_message(&self, message: &Message) -> anyhow::Result<()> {
        let Some(text) = message.text.as_deref().map(str::trim) else {
            return Ok(());
        };
        if text.is_empty() {
            return Ok(());
        }

        let chat = chat_account(message);
        match Command::parse(text) {
            Some(Command::Start) => {
                let name = chat.first_name.as_deref().unwrap_or("bạn");
                self.reply(chat.chat_id, &replies::welcome(name)).await?;
            }
            Some(Command::Help) => {
                self.reply(chat.chat_id, replies::HELP).await?;
            }
            Some(Command::Language(arg)) => self.handle_language(&chat, arg).await?,
            Some(Command::Subscribe(arg)) => self.handle_subscribe(&chat, arg).await?,
            Some(Command::Unsubscribe(arg)) => self.handle_unsubscribe(&chat, arg).await?,
            Some(Command::List) => self.handle_list(&chat).await?,
            Some(Command::Unknown) => {}
            None => self.handle_url(&chat, text).await?,
        }

        Ok(())
    }

    async fn reply(&self, chat_id: i64, text: &str) -> anyhow::Result<Message> {
        Ok(self.telegram.send_message(chat_id, text, false).await?)
    }

    async fn handle_language(&self, chat: &ChatAccount, arg: Option<&str>) -> anyhow::Result<()> {
        let Some(code) = arg else {
            self.reply(chat.chat_id, replies::LANGUAGE_USAGE).await?;
            return Ok(());
        };

        let text = match self.service.set_language(chat, code).await {
            Ok(()) => replies::language_changed(&code.to_lowercase()),
            Err(e) => replies::language_error(&e).to_string(),
        };
        self.reply(chat.chat_id, &text).await?;
        Ok(())
    }

    async fn handle_subscribe(&self, chat: &ChatAccount, arg: Option<&str>) -> anyhow::Result<()> {
        let Some(url) = arg else {
            self.reply(chat.chat_id, replies::SUBSCRIBE_USAGE).await?;
            return Ok(());
        };
        self.subscribe_with_placeholder(chat, url).await
    }

    /// Shared by the /subscribe command and channel-URL auto-subscribe:
    /// sends the processing placeholder, then edits in the outcome.
    async fn subscribe_with_placeholder(&self, chat: &ChatAccount, url: &str) -> anyhow::Result<()> {
        let processing = self.reply(chat.chat_id, replies::PROCESSING_SUBSCRIBE).await?;

        let text = match self.service.subscribe(chat, url).await {
            Ok(channel) => replies::subscribed(&channel),
            Err(e) => {
                tracing::warn!(error = ?e, %url, "Subscribe failed");
                replies::subscribe_error(&e)
            }
        };
        self.telegram
            .edit_message_text(chat.chat_id, processing.message_id, &text)
            .await?;
        Ok(())
    }

    async fn handle_unsubscribe(&self, chat: &ChatAccount, arg: Option<&str>) -> anyhow::Result<()> {
        let Some(url) = arg else {
            self.reply(chat.chat_id, replies::UNSUBSCRIBE_USAGE).await?;
            return Ok(());
        };

        let processing = self
            .reply(chat.chat_id, replies::PROCESSING_UNSUBSCRIBE)
            .await?;

        let text = match self.service.unsubscribe(chat, url).await {
            Ok(channel) => replies::unsubscribed(&channel),
            Err(e) => {
                tracing::warn!(error = ?e, %url, "Unsubscribe failed");
                replies::unsubscribe_error(&e)
            }
        };
        self.telegram
            .edit_message_text(chat.chat_id, processing.message_id, &text)
            .await?;
        Ok(())
    }

    async fn handle_list(&self, chat: &ChatAccount) -> anyhow::Result<()> {
        let channels = self.service.list_subscriptions(chat).await?;
        let text = if channels.is_empty() {
            replies::NO_SUBSCRIPTIONS.to_string()
        } else {
            replies::subscription_list(&channels)
        };
        self.reply(chat.chat_id, &text).await?;
        Ok(())
    }

    /// Free-text URL routing: a channel URL auto-subscribes, a video URL is
    /// summarized on demand, anything else is rejected.
    async fn handle_url(&self, chat: &ChatAccount, url: &str) -> anyhow::Result<()> {
        let Some(detected) = detect_platform(url) else {
            self.reply(chat.chat_id, replies::INVALID_LINK).await?;
            return Ok(());
        };

        if detected == Platform::Youtube
            && platform::youtube::video_id_from_url(url).is_none()
            && platform::youtube::is_channel_url(url)
        {
            return self.subscribe_with_placeholder(chat, url).await;
        }

        match platform::video_id_from_url(detected, url) {
            Some(video_id) => self.summarize_on_demand(chat, detected, video_id, url).await,
            None => {
                self.reply(chat.chat_id, replies::INVALID_LINK).await?;
                Ok(())
            }
        }
    }

    /// The direct flow: extract → summarize → edit the placeholder into the
    /// final summary. Unlike the poller it refuses to reply with a partial
    /// result on failure.
    #[tracing::instrument(skip(self, chat, url), fields(chat_id = chat.chat_id, %video_id))]
    async fn summarize_on_demand(
        &self,
        chat: &ChatAccount,
        platform: Platform,
        video_id: &str,
        url: &str,
    ) -> anyhow::Result<()> {
        let processing = self
            .reply(chat.chat_id, &replies::processing_video(platform))
            .await?;

        let language = self
            .service
            .preferred_language(chat)
            .await
            .unwrap_or_else(|_| DEFAULT_LANGUAGE.to_string());

        let meta = VideoMeta {
            video_id: video_id.to_string(),
            title: None,
            url: url.to_string(),
            published_at: None,
        };

        let content = match self.platforms.extract_content(platform, &meta, &language).await {
            Ok(content) => content,
            Err(e) => {
                tracing::warn!(error = ?e, %url, "Content extraction failed");
                self.telegram
                    .edit_message_text(
                        chat.chat_id,
                        processing.message_id,
                        &replies::extract_failed(platform),
                    )
                    .await?;
                return Ok(());
            }
        };

        self.telegram
            .edit_message_text(chat.chat_id, processing.message_id, replies::SUMMARIZING)
            .await?;

        let text = match self.summarizer.summarize(&content, &language).await {
            Ok(response) => replies::video_summary(platform, url, &response.summary),
            Err(e) => {
                tracing::warn!(error = ?e, %url, "Summarization failed");
                replies::SUMMARY_FAILED.to_string()
            }
        };
        self.telegram
            .edit_message_text(chat.chat_id, processing.message_id, &text)
            .await?;
        Ok(())
    }
}

fn chat_account(message: &Message) -> ChatAccount {
    ChatAccount {
        chat_id: message.chat.id,
        username: message.from.as_ref().and_then(|u| u.username.clone()),
        first_name: message.from.as_ref().and_then(|u| u.first_name.clone()),
    }
}
