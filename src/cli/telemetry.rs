//! Tracing initialization from the CLI verbosity flag.
//!
//! `RUST_LOG` wins when set; otherwise the `-v` count picks the level, with
//! ERROR as the quiet default.

use anyhow::{Context, Result};
use tracing::Level;
use tracing_subscriber::{EnvFilter, Registry, fmt, layer::SubscriberExt};

/// Initialize the global tracing subscriber.
///
/// # Errors
/// Returns an error if a global subscriber was already installed.
pub fn init(level: Option<Level>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        EnvFilter::new(level.unwrap_or(Level::ERROR).to_string().to_lowercase())
    });

    let subscriber = Registry::default().with(filter).with(fmt::layer());

    tracing::subscriber::set_global_default(subscriber)
        .context("Failed to set global tracing subscriber")
}
