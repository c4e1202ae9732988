//! Command-line argument dispatch and server initialization.
//!
//! This module parses validated CLI arguments and maps them to the appropriate
//! action, such as starting the API server with its full configuration state.

use crate::cli::actions::{Action, server::Args};
use crate::cli::commands::{auth, avatars};
use anyhow::{Context, Result};

/// Map validated CLI matches to a server action.
///
/// # Errors
/// Returns an error if required arguments are missing or inconsistent.
pub fn handler(matches: &clap::ArgMatches) -> Result<Action> {
    let port = matches.get_one::<u16>("port").copied().unwrap_or(8080);
    let dsn = matches
        .get_one::<String>("dsn")
        .cloned()
        .context("missing required argument: --dsn")?;

    let auth_opts = auth::Options::parse(matches)?;
    let avatar_opts = avatars::Options::parse(matches)?;

    Ok(Action::Server(Args {
        port,
        dsn,
        session_secret: auth_opts.session_secret,
        session_ttl_seconds: auth_opts.session_ttl_seconds,
        public_base_url: auth_opts.public_base_url,
        upload_dir: avatar_opts.upload_dir,
        avatar_dir: avatar_opts.avatar_dir,
        avatar_public_path: avatar_opts.public_path,
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::actions::Action;

    #[test]
    fn session_secret_required() {
        temp_env::with_vars(
            [
                ("RUBRICA_SESSION_SECRET", None::<&str>),
                ("RUBRICA_DSN", Some("postgres://user@localhost:5432/rubrica")),
            ],
            || {
                let command = crate::cli::commands::new();
                let result = command.try_get_matches_from(vec!["rubrica"]);
                assert_eq!(
                    result.map(|_| ()).map_err(|e| e.kind()),
                    Err(clap::error::ErrorKind::MissingRequiredArgument)
                );
            },
        );
    }

    #[test]
    fn handler_builds_server_args() {
        temp_env::with_vars(
            [
                ("RUBRICA_DSN", Some("postgres://user@localhost:5432/rubrica")),
                ("RUBRICA_SESSION_SECRET", Some("super-secret")),
                ("RUBRICA_SESSION_TTL_SECONDS", Some("60")),
                ("RUBRICA_PUBLIC_BASE_URL", Some("https://contacts.test")),
                ("RUBRICA_AVATAR_DIR", Some("/srv/avatars")),
            ],
            || {
                let command = crate::cli::commands::new();
                let matches = command.get_matches_from(vec!["rubrica"]);
                let Action::Server(args) = handler(&matches).expect("handler should succeed");
                assert_eq!(args.port, 8080);
                assert_eq!(args.dsn, "postgres://user@localhost:5432/rubrica");
                assert_eq!(args.session_secret, "super-secret");
                assert_eq!(args.session_ttl_seconds, 60);
                assert_eq!(args.public_base_url, "https://contacts.test");
                assert_eq!(args.upload_dir, "tmp");
                assert_eq!(args.avatar_dir, "/srv/avatars");
                assert_eq!(args.avatar_public_path, "/avatars");
            },
        );
    }
}
