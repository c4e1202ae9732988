use anyhow::{Context, Result};
use clap::{Arg, Command};

pub const ARG_SESSION_SECRET: &str = "session-secret";
pub const ARG_SESSION_TTL_SECONDS: &str = "session-ttl-seconds";
pub const ARG_PUBLIC_BASE_URL: &str = "public-base-url";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_SESSION_SECRET)
                .long(ARG_SESSION_SECRET)
                .help("Secret key used to sign session tokens")
                .env("RUBRICA_SESSION_SECRET")
                .hide_env_values(true)
                .required(true),
        )
        .arg(
            Arg::new(ARG_SESSION_TTL_SECONDS)
                .long(ARG_SESSION_TTL_SECONDS)
                .help("Session token TTL in seconds")
                .env("RUBRICA_SESSION_TTL_SECONDS")
                .default_value("3600")
                .value_parser(clap::value_parser!(i64)),
        )
        .arg(
            Arg::new(ARG_PUBLIC_BASE_URL)
                .long(ARG_PUBLIC_BASE_URL)
                .help("Public base URL used to build verification links")
                .env("RUBRICA_PUBLIC_BASE_URL")
                .default_value("http://localhost:8080"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub session_secret: String,
    pub session_ttl_seconds: i64,
    pub public_base_url: String,
}

impl Options {
    /// Extract auth options from parsed CLI matches.
    ///
    /// # Errors
    /// Returns an error if a required argument is missing.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let session_secret = matches
            .get_one::<String>(ARG_SESSION_SECRET)
            .cloned()
            .context("missing required argument: --session-secret")?;
        let session_ttl_seconds = matches
            .get_one::<i64>(ARG_SESSION_TTL_SECONDS)
            .copied()
            .unwrap_or(3600);
        let public_base_url = matches
            .get_one::<String>(ARG_PUBLIC_BASE_URL)
            .cloned()
            .unwrap_or_else(|| "http://localhost:8080".to_string());

        Ok(Self {
            session_secret,
            session_ttl_seconds,
            public_base_url,
        })
    }
}
