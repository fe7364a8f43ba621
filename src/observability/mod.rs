//! Process-wide tracing setup.

use anyhow::{Context, Result};
use tracing_subscriber::{fmt, EnvFilter};

use crate::config::LoggingConfig;

/// Install the global `tracing` subscriber.
///
/// Fails instead of panicking when the level is not a valid filter or a
/// subscriber is already installed.
pub fn init_tracing(config: &LoggingConfig) -> Result<()> {
    let filter = build_filter(config)?;

    fmt::Subscriber::builder()
        .with_env_filter(filter)
        .with_ansi(config.ansi)
        .try_init()
        .map_err(|e| anyhow::anyhow!(e))
        .context("failed to install tracing subscriber")
}

/// `RUST_LOG` when set and valid, otherwise `config.level`.
pub fn build_filter(config: &LoggingConfig) -> Result<EnvFilter> {
    match EnvFilter::try_from_default_env() {
        Ok(filter) => Ok(filter),
        Err(_) => level_filter(&config.level),
    }
}

fn level_filter(level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(level).with_context(|| format!("invalid log level {level:?}"))
}
