//! Session token authority.
//!
//! Tokens are HMAC-SHA256 signed claims (`sub` + `exp`) with a fixed TTL, but
//! signature validity alone is not enough: the exact issued string is stored
//! on the account row, and validation additionally requires storage equality.
//! That single extra check converts a stateless signed token into a
//! single-session-enforcing credential: issuing a new token or revoking the
//! stored one terminates the previous session before its expiry elapses.

use anyhow::{Context, Result, anyhow};
use base64::Engine;
use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use chrono::Utc;
use hmac::{Hmac, Mac};
use serde::{Deserialize, Serialize};
use sha2::Sha256;
use sqlx::PgPool;
use uuid::Uuid;

use super::storage::{self, Account};

type HmacSha256 = Hmac<Sha256>;

/// Default session token lifetime: one hour.
pub const DEFAULT_TTL_SECONDS: i64 = 3600;

#[derive(Serialize, Deserialize, Debug)]
struct Claims {
    sub: Uuid,
    exp: i64,
}

/// Issues, validates, and revokes session tokens against the account store.
pub struct TokenAuthority {
    key: Vec<u8>,
    ttl_seconds: i64,
}

impl TokenAuthority {
    #[must_use]
    pub fn new(secret: &[u8], ttl_seconds: i64) -> Self {
        Self {
            key: secret.to_vec(),
            ttl_seconds,
        }
    }

    /// Sign a token for the account, expiring `ttl_seconds` from now.
    ///
    /// # Errors
    /// Returns an error if claim serialization or keying fails.
    pub fn sign(&self, account_id: Uuid) -> Result<String> {
        self.sign_at(account_id, Utc::now().timestamp())
    }

    fn sign_at(&self, account_id: Uuid, issued_at: i64) -> Result<String> {
        let claims = Claims {
            sub: account_id,
            exp: issued_at + self.ttl_seconds,
        };
        let payload = serde_json::to_vec(&claims).context("failed to serialize token claims")?;

        let mut mac = HmacSha256::new_from_slice(&self.key)
            .map_err(|err| anyhow!("invalid session key: {err}"))?;
        mac.update(&payload);
        let signature = mac.finalize().into_bytes();

        Ok(format!(
            "{}.{}",
            URL_SAFE_NO_PAD.encode(payload),
            URL_SAFE_NO_PAD.encode(signature)
        ))
    }

    /// Check signature and expiry, returning the embedded account id.
    ///
    /// Every failure collapses to `None`; callers answer a uniform 401.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<Uuid> {
        self.verify_at(token, Utc::now().timestamp())
    }

    fn verify_at(&self, token: &str, now: i64) -> Option<Uuid> {
        let (payload_b64, signature_b64) = token.split_once('.')?;
        let payload = URL_SAFE_NO_PAD.decode(payload_b64).ok()?;
        let signature = URL_SAFE_NO_PAD.decode(signature_b64).ok()?;

        let mut mac = HmacSha256::new_from_slice(&self.key).ok()?;
        mac.update(&payload);
        // Constant-time comparison via the Mac verifier.
        mac.verify_slice(&signature).ok()?;

        let claims: Claims = serde_json::from_slice(&payload).ok()?;
        if claims.exp <= now {
            return None;
        }
        Some(claims.sub)
    }

    /// Issue a token and persist it as the account's only valid session.
    ///
    /// # Errors
    /// Returns an error on signing or storage failures.
    pub async fn issue(&self, pool: &PgPool, account_id: Uuid) -> Result<String> {
        let token = self.sign(account_id)?;
        storage::store_session_token(pool, account_id, &token).await?;
        Ok(token)
    }

    /// Validate a presented token: signature, expiry, account existence, and
    /// stored-token equality. `Ok(None)` means 401, uniformly.
    ///
    /// # Errors
    /// Returns an error on storage failures only.
    pub async fn validate(&self, pool: &PgPool, presented: &str) -> Result<Option<Account>> {
        let Some(account_id) = self.verify(presented) else {
            return Ok(None);
        };
        let Some(account) = storage::find_by_id(pool, account_id).await? else {
            return Ok(None);
        };
        if !matches_stored(presented, account.session_token.as_deref()) {
            return Ok(None);
        }
        Ok(Some(account))
    }

    /// Clear the account's stored session token. Used by logout.
    ///
    /// # Errors
    /// Returns an error on storage failures.
    pub async fn revoke(&self, pool: &PgPool, account_id: Uuid) -> Result<()> {
        storage::clear_session_token(pool, account_id).await
    }
}

/// The storage-equality contract: a presented token is live only while it is
/// the exact value last persisted for the account.
#[must_use]
pub fn matches_stored(presented: &str, stored: Option<&str>) -> bool {
    stored == Some(presented)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Result;

    fn authority() -> TokenAuthority {
        TokenAuthority::new(b"test-session-secret", DEFAULT_TTL_SECONDS)
    }

    #[test]
    fn sign_verify_round_trip() -> Result<()> {
        let authority = authority();
        let account_id = Uuid::new_v4();
        let token = authority.sign(account_id)?;
        assert_eq!(authority.verify(&token), Some(account_id));
        Ok(())
    }

    #[test]
    fn expired_token_fails() -> Result<()> {
        let authority = authority();
        let account_id = Uuid::new_v4();
        let now = Utc::now().timestamp();
        let token = authority.sign_at(account_id, now - 2 * DEFAULT_TTL_SECONDS)?;
        assert_eq!(authority.verify_at(&token, now), None);
        Ok(())
    }

    #[test]
    fn expiry_boundary_is_exclusive() -> Result<()> {
        let authority = authority();
        let account_id = Uuid::new_v4();
        let now = Utc::now().timestamp();
        let token = authority.sign_at(account_id, now - DEFAULT_TTL_SECONDS)?;
        // exp == now is already expired; one second earlier still validates.
        assert_eq!(authority.verify_at(&token, now), None);
        assert_eq!(authority.verify_at(&token, now - 1), Some(account_id));
        Ok(())
    }

    #[test]
    fn tampered_payload_fails() -> Result<()> {
        let authority = authority();
        let token = authority.sign(Uuid::new_v4())?;
        let (payload, signature) = token.split_once('.').expect("token has two parts");
        let other = authority.sign(Uuid::new_v4())?;
        let (other_payload, _) = other.split_once('.').expect("token has two parts");
        let spliced = format!("{other_payload}.{signature}");
        assert_ne!(payload, other_payload);
        assert_eq!(authority.verify(&spliced), None);
        Ok(())
    }

    #[test]
    fn wrong_key_fails() -> Result<()> {
        let token = authority().sign(Uuid::new_v4())?;
        let other = TokenAuthority::new(b"another-secret", DEFAULT_TTL_SECONDS);
        assert_eq!(other.verify(&token), None);
        Ok(())
    }

    #[test]
    fn malformed_tokens_fail() {
        let authority = authority();
        for token in ["", "no-dot", ".", "a.b", "a.b.c", "!!!.###"] {
            assert_eq!(authority.verify(token), None, "token: {token:?}");
        }
    }

    #[test]
    fn stored_equality_enforces_single_session() -> Result<()> {
        let authority = authority();
        let account_id = Uuid::new_v4();
        let now = Utc::now().timestamp();
        // Two logins in sequence: T1 then T2. Both carry valid signatures,
        // but only the stored one validates.
        let t1 = authority.sign_at(account_id, now - 1)?;
        let t2 = authority.sign_at(account_id, now)?;
        assert_ne!(t1, t2);

        assert!(matches_stored(&t1, Some(&t1)));
        assert!(!matches_stored(&t1, Some(&t2)));
        assert!(matches_stored(&t2, Some(&t2)));

        // Logout clears the stored value; T2 dies before its expiry.
        assert!(!matches_stored(&t2, None));
        Ok(())
    }
}
