mod bot;
mod error;
mod llm;
pub mod platform;
mod processor;
pub mod replies;
mod service;
pub mod telegram;
pub mod tracing;

pub use bot::{Bot, Command};
pub use error::Error;
pub use llm::openai;
pub use llm::summarizer::{Summarizer, SummaryResponse};
pub use processor::{builder::PollProcessorBuilder, PollProcessor};
pub use service::{LanguageError, SubscribeError, SubscriptionService, UnsubscribeError};
pub use telegram::{Notifier, TelegramClient};
