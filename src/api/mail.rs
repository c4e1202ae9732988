//! Outbound verification mail and delivery abstraction.
//!
//! The registry only ever talks to a [`MailSender`]; delivery (SMTP, API,
//! etc.) is the sender's business. The default for local dev is
//! [`LogMailSender`], which logs the message and returns `Ok(())`.

use anyhow::Result;
use tracing::info;

/// A rendered verification message, ready for delivery.
#[derive(Clone, Debug)]
pub struct VerificationMail {
    pub to_email: String,
    pub verify_url: String,
}

/// Mail delivery abstraction used by the account registry.
pub trait MailSender: Send + Sync {
    /// Deliver a message or return an error.
    fn send(&self, mail: &VerificationMail) -> Result<()>;
}

/// Local dev sender that logs the payload instead of sending real email.
#[derive(Clone, Debug)]
pub struct LogMailSender;

impl MailSender for LogMailSender {
    fn send(&self, mail: &VerificationMail) -> Result<()> {
        info!(
            to_email = %mail.to_email,
            verify_url = %mail.verify_url,
            "verification mail send stub"
        );
        Ok(())
    }
}

/// Build the verification link included in outbound mail.
pub fn build_verify_url(public_base_url: &str, token: &str) -> String {
    let base = public_base_url.trim_end_matches('/');
    format!("{base}/api/users/verify/{token}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_verify_url_trims_trailing_slash() {
        let url = build_verify_url("https://contacts.test/", "token");
        assert_eq!(url, "https://contacts.test/api/users/verify/token");
    }

    #[test]
    fn log_sender_accepts_messages() {
        let mail = VerificationMail {
            to_email: "a@b.com".to_string(),
            verify_url: "https://contacts.test/api/users/verify/t".to_string(),
        };
        assert!(LogMailSender.send(&mail).is_ok());
    }
}
