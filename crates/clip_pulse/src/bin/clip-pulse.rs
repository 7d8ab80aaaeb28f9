use std::str::FromStr;

use apalis::{
    layers::{retry::RetryPolicy, sentry::SentryLayer},
    prelude::*,
};
use apalis_cron::{CronStream, Tick};
use clap::{Parser, Subcommand};
use clip_datastore::PgDataStore;
use cron::Schedule;

use clip_pulse::{
    openai::OpenAIClient, platform::LivePlatformRouter, tracing::init_tracing_subscriber,
    PollProcessorBuilder, TelegramClient,
};

#[derive(Parser)]
#[command(name = "clip-pulse", about = "Channel poller for the video digest bot")]
struct Cli {
    /// Database connection URL
    #[arg(long, env = "DATABASE_URL")]
    database_url: String,

    /// OpenAI API key
    #[arg(long, env = "OPENAI_API_KEY")]
    openai_key: String,

    /// Telegram bot token used to deliver notifications
    #[arg(long, env = "TELEGRAM_BOT_TOKEN")]
    telegram_token: String,

    /// Maximum channels to check per cycle
    #[arg(long, env = "MAX_CHANNELS_PER_CYCLE", default_value = "10")]
    max_channels: usize,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run one poll cycle and exit
    Run,
    /// Start the cron scheduler
    Cron {
        /// Cron schedule expression
        #[arg(long, env = "CRON_SCHEDULE", default_value = "0 */5 * * * *")]
        schedule: String,
    },
}

#[derive(Clone)]
struct Config {
    db_url: String,
    openai_key: String,
    telegram_token: String,
    max_channels: usize,
}

async fn run_cycle(config: &Config) -> anyhow::Result<()> {
    let store = PgDataStore::init(&config.db_url).await?;

    let processor = PollProcessorBuilder::new()
        .store(store)
        .platforms(LivePlatformRouter::default())
        .summarizer(OpenAIClient::new(&config.openai_key))
        .notifier(TelegramClient::new(&config.telegram_token))
        .max_channels(config.max_channels)
        .build();

    processor.run().await
}

async fn handle_tick(_tick: Tick, config: Data<Config>) -> anyhow::Result<()> {
    tracing::info!(
        max_channels = config.max_channels,
        "Running scheduled poll cycle..."
    );
    run_cycle(&config).await
}

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

    let cli = Cli::parse();
    init_tracing_subscriber()?;

    let config = Config {
        db_url: cli.database_url,
        openai_key: cli.openai_key,
        telegram_token: cli.telegram_token,
        max_channels: cli.max_channels,
    };

    match cli.command {
        Command::Run => {
            tracing::info!(max_channels = config.max_channels, "Running poll cycle once...");
            run_cycle(&config).await?;
        }
        Command::Cron { schedule } => {
            tracing::info!(%schedule, "Starting cron scheduler...");
            let schedule = Schedule::from_str(&schedule)?;

            let worker = WorkerBuilder::new("clip-pulse-cron")
                .backend(CronStream::new(schedule))
                .retry(RetryPolicy::retries(3))
                .layer(SentryLayer::new())
                .data(config)
                .build(handle_tick);

            worker.run().await?;
        }
    }

    Ok(())
}
