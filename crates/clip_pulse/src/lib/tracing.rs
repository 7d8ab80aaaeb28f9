//! Tracing subscriber wiring shared by the binaries.

use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_subscriber::{layer::SubscriberExt, EnvFilter, Registry};

pub fn init_tracing_subscriber() -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let formatting_layer = BunyanFormattingLayer::new("clip-pulse".into(), std::io::stdout);

    let subscriber = Registry::default()
        .with(env_filter)
        .with(sentry_tracing::layer())
        .with(JsonStorageLayer)
        .with(formatting_layer);

    ::tracing::subscriber::set_global_default(subscriber)?;

    Ok(())
}
