use crate::api::{
    self,
    handlers::users::{
        avatar::{AvatarIngester, FixedResizer, ImageProcessor},
        registry::AccountRegistry,
        token::TokenAuthority,
    },
    mail::{LogMailSender, MailSender},
};
use anyhow::Result;
use std::{path::PathBuf, sync::Arc};

#[derive(Debug)]
pub struct Args {
    pub port: u16,
    pub dsn: String,
    pub session_secret: String,
    pub session_ttl_seconds: i64,
    pub public_base_url: String,
    pub upload_dir: String,
    pub avatar_dir: String,
    pub avatar_public_path: String,
}

/// Execute the server action.
///
/// Collaborators (mail transport, image processor) are constructed once here
/// and injected into the components; nothing reaches for ambient global state.
///
/// # Errors
/// Returns an error if the avatar directories cannot be created or the server
/// fails to start.
pub async fn execute(args: Args) -> Result<()> {
    let mailer: Arc<dyn MailSender> = Arc::new(LogMailSender);
    let registry = Arc::new(AccountRegistry::new(args.public_base_url, mailer));

    let authority = Arc::new(TokenAuthority::new(
        args.session_secret.as_bytes(),
        args.session_ttl_seconds,
    ));

    let processor: Arc<dyn ImageProcessor> = Arc::new(FixedResizer);
    let ingester = Arc::new(AvatarIngester::new(
        PathBuf::from(args.upload_dir),
        PathBuf::from(args.avatar_dir),
        args.avatar_public_path,
        processor,
    ));

    api::new(args.port, args.dsn, registry, authority, ingester).await
}
