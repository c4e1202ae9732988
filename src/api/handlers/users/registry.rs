//! Account registry: record of truth for credentials and verification state.

use anyhow::{Context, Result, anyhow};
use argon2::{Argon2, PasswordHasher, PasswordVerifier};
use password_hash::{PasswordHash, SaltString};
use rand::rngs::OsRng;
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use crate::api::mail::{MailSender, VerificationMail, build_verify_url};

use super::storage::{self, Account, SignupOutcome};
use super::types::PublicUser;
use super::utils::{generate_verification_token, gravatar_url, normalize_email};

/// Outcome of a signup attempt.
#[derive(Debug)]
pub enum SignupResult {
    Created(PublicUser),
    DuplicateEmail,
}

/// Outcome of a resend-verification request.
#[derive(Debug)]
pub enum ResendOutcome {
    Sent,
    AlreadyVerified,
    NotFound,
}

/// Owns account records: credential hashing, verification-token
/// issuance/consumption, and the credential check that gates login.
pub struct AccountRegistry {
    public_base_url: String,
    mailer: Arc<dyn MailSender>,
}

impl AccountRegistry {
    #[must_use]
    pub fn new(public_base_url: String, mailer: Arc<dyn MailSender>) -> Self {
        Self {
            public_base_url,
            mailer,
        }
    }

    /// Create an unverified account and schedule its verification mail.
    ///
    /// # Errors
    /// Returns an error on hashing or storage failures; a taken email is the
    /// `DuplicateEmail` outcome, not an error.
    pub async fn register(
        &self,
        pool: &PgPool,
        email: &str,
        password: &str,
    ) -> Result<SignupResult> {
        let email = normalize_email(email);
        let password_hash = hash_password(password)?;
        let token = generate_verification_token()?;
        let avatar_url = gravatar_url(&email);

        match storage::insert_account(pool, &email, &password_hash, &token, &avatar_url).await? {
            SignupOutcome::Conflict => Ok(SignupResult::DuplicateEmail),
            SignupOutcome::Created => {
                self.send_verification(&email, &token);
                Ok(SignupResult::Created(PublicUser {
                    email,
                    subscription: "starter".to_string(),
                    avatar_url,
                }))
            }
        }
    }

    /// Consume a verification token. Single-use: a second submission of the
    /// same token finds no row and returns `false`.
    ///
    /// # Errors
    /// Returns an error on storage failures.
    pub async fn verify(&self, pool: &PgPool, token: &str) -> Result<bool> {
        storage::consume_verification_token(pool, token).await
    }

    /// Re-send the verification mail using the still-stored token.
    ///
    /// # Errors
    /// Returns an error on storage failures or if the unverified account has
    /// no token, which the schema rules out.
    pub async fn resend_verification(&self, pool: &PgPool, email: &str) -> Result<ResendOutcome> {
        let email = normalize_email(email);
        let Some(account) = storage::find_by_email(pool, &email).await? else {
            return Ok(ResendOutcome::NotFound);
        };
        if account.verified {
            return Ok(ResendOutcome::AlreadyVerified);
        }
        let token = account
            .verification_token
            .ok_or_else(|| anyhow!("unverified account has no verification token"))?;

        self.send_verification(&email, &token);
        Ok(ResendOutcome::Sent)
    }

    /// Check login credentials. Returns `None` for every failure (unknown
    /// email, unverified account, wrong password) so callers cannot tell the
    /// cases apart; the password check runs even for unverified accounts.
    ///
    /// # Errors
    /// Returns an error on storage failures only.
    pub async fn check_credentials(
        &self,
        pool: &PgPool,
        email: &str,
        password: &str,
    ) -> Result<Option<Account>> {
        let email = normalize_email(email);
        let Some(account) = storage::find_by_email(pool, &email).await? else {
            return Ok(None);
        };
        if !verify_password(&account.password_hash, password) {
            return Ok(None);
        }
        if !account.verified {
            return Ok(None);
        }
        Ok(Some(account))
    }

    fn send_verification(&self, email: &str, token: &str) {
        let mail = VerificationMail {
            to_email: email.to_string(),
            verify_url: build_verify_url(&self.public_base_url, token),
        };
        // Delivery is best-effort; the token stays stored and can be re-sent.
        if let Err(err) = self.mailer.send(&mail) {
            error!("Failed to send verification mail: {err}");
        }
    }
}

/// Hash a raw password into an Argon2id PHC string.
pub(super) fn hash_password(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let phc = argon2
        .hash_password(password.as_bytes(), &salt)
        .map_err(|err| anyhow!(err.to_string()))
        .context("failed to hash password")?
        .to_string();
    Ok(phc)
}

/// Verify a raw password against a stored PHC string.
pub(super) fn verify_password(hash: &str, password: &str) -> bool {
    if let Ok(parsed) = PasswordHash::new(hash) {
        let argon2 = Argon2::default();
        argon2.verify_password(password.as_bytes(), &parsed).is_ok()
    } else {
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mail::LogMailSender;
    use anyhow::Result;
    use std::sync::Mutex;

    #[test]
    fn password_hash_round_trip() -> Result<()> {
        let hash = hash_password("secret1")?;
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password(&hash, "secret1"));
        assert!(!verify_password(&hash, "secret2"));
        Ok(())
    }

    #[test]
    fn verify_password_rejects_garbage_hash() {
        assert!(!verify_password("not-a-phc-string", "secret1"));
    }

    #[test]
    fn hashes_are_salted() -> Result<()> {
        let first = hash_password("secret1")?;
        let second = hash_password("secret1")?;
        assert_ne!(first, second);
        Ok(())
    }

    struct RecordingMailSender {
        sent: Mutex<Vec<VerificationMail>>,
    }

    impl MailSender for RecordingMailSender {
        fn send(&self, mail: &VerificationMail) -> Result<()> {
            self.sent
                .lock()
                .map_err(|_| anyhow!("poisoned"))?
                .push(mail.clone());
            Ok(())
        }
    }

    #[test]
    fn send_verification_builds_link_from_base_url() -> Result<()> {
        let sender = Arc::new(RecordingMailSender {
            sent: Mutex::new(Vec::new()),
        });
        let registry = AccountRegistry::new("https://contacts.test/".to_string(), sender.clone());

        registry.send_verification("a@b.com", "tok123");

        let sent = sender.sent.lock().map_err(|_| anyhow!("poisoned"))?;
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].to_email, "a@b.com");
        assert_eq!(
            sent[0].verify_url,
            "https://contacts.test/api/users/verify/tok123"
        );
        Ok(())
    }

    #[test]
    fn registry_constructs_with_log_sender() {
        let registry =
            AccountRegistry::new("http://localhost:8080".to_string(), Arc::new(LogMailSender));
        assert_eq!(registry.public_base_url, "http://localhost:8080");
    }
}
