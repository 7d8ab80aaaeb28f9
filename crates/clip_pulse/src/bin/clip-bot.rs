use std::time::Duration;

use anyhow::Context;
use clip_datastore::PgDataStore;

use clip_pulse::{
    openai::OpenAIClient, platform::LivePlatformRouter, tracing::init_tracing_subscriber, Bot,
    PollProcessorBuilder, TelegramClient,
};

/// Check subscribed channels for new videos every five minutes.
const POLL_INTERVAL: Duration = Duration::from_secs(300);

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let _ = dotenvy::dotenv();

    let _guard = sentry::init((
        std::env::var("SENTRY_DSN").unwrap_or_default(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: Some("production".into()),
            ..Default::default()
        },
    ));

    init_tracing_subscriber()?;

    let db_url = std::env::var("DATABASE_URL").context("DATABASE_URL not set")?;
    let openai_key = std::env::var("OPENAI_API_KEY").context("OPENAI_API_KEY not set")?;
    let telegram_token =
        std::env::var("TELEGRAM_BOT_TOKEN").context("TELEGRAM_BOT_TOKEN not set")?;

    let store = PgDataStore::init(&db_url).await?;
    let platforms = LivePlatformRouter::default();
    //XXX: serves both the on-demand flow and the poller; hence will need to be cloned
    let openai_client = OpenAIClient::new(&openai_key);
    let telegram = TelegramClient::new(&telegram_token);

    let processor = PollProcessorBuilder::new()
        .store(store.clone())
        .platforms(platforms.clone())
        .summarizer(openai_client.clone())
        .notifier(telegram.clone())
        .build();

    let poller = async {
        let mut interval = tokio::time::interval(POLL_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(e) = processor.run().await {
                tracing::error!(error = ?e, "Poll cycle failed");
            }
        }
    };

    let bot = Bot::new(telegram, store, platforms, openai_client);

    tokio::select! {
        result = bot.run() => result,
        _ = poller => Ok(()),
    }
}
