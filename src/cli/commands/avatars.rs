use anyhow::Result;
use clap::{Arg, Command};

pub const ARG_UPLOAD_DIR: &str = "upload-dir";
pub const ARG_AVATAR_DIR: &str = "avatar-dir";
pub const ARG_AVATAR_PUBLIC_PATH: &str = "avatar-public-path";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_UPLOAD_DIR)
                .long(ARG_UPLOAD_DIR)
                .help("Scratch directory for staged avatar uploads")
                .env("RUBRICA_UPLOAD_DIR")
                .default_value("tmp"),
        )
        .arg(
            Arg::new(ARG_AVATAR_DIR)
                .long(ARG_AVATAR_DIR)
                .help("Durable directory for committed avatar images")
                .env("RUBRICA_AVATAR_DIR")
                .default_value("public/avatars"),
        )
        .arg(
            Arg::new(ARG_AVATAR_PUBLIC_PATH)
                .long(ARG_AVATAR_PUBLIC_PATH)
                .help("URL path prefix under which avatars are served")
                .env("RUBRICA_AVATAR_PUBLIC_PATH")
                .default_value("/avatars"),
        )
}

#[derive(Debug)]
pub struct Options {
    pub upload_dir: String,
    pub avatar_dir: String,
    pub public_path: String,
}

impl Options {
    /// Extract avatar storage options from parsed CLI matches.
    ///
    /// # Errors
    /// Never fails today; kept fallible to match the other option parsers.
    pub fn parse(matches: &clap::ArgMatches) -> Result<Self> {
        let upload_dir = matches
            .get_one::<String>(ARG_UPLOAD_DIR)
            .cloned()
            .unwrap_or_else(|| "tmp".to_string());
        let avatar_dir = matches
            .get_one::<String>(ARG_AVATAR_DIR)
            .cloned()
            .unwrap_or_else(|| "public/avatars".to_string());
        let public_path = matches
            .get_one::<String>(ARG_AVATAR_PUBLIC_PATH)
            .cloned()
            .unwrap_or_else(|| "/avatars".to_string());

        Ok(Self {
            upload_dir,
            avatar_dir,
            public_path,
        })
    }
}
