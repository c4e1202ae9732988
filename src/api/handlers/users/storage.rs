//! Database helpers for account rows.
//!
//! All session-token coordination is plain read-modify-write on a single row;
//! concurrent logins race last-writer-wins, which is correct because each
//! write fully overwrites `session_token` and only the stored value validates.

use anyhow::{Context, Result};
use sqlx::{PgPool, Row, postgres::PgRow};
use tracing::Instrument;
use uuid::Uuid;

/// Outcome when attempting to create a new account.
#[derive(Debug)]
pub(super) enum SignupOutcome {
    Created,
    Conflict,
}

/// A full account row. `password_hash` and the tokens never leave the crate.
#[derive(Clone, Debug)]
pub struct Account {
    pub id: Uuid,
    pub email: String,
    pub password_hash: String,
    pub subscription: String,
    pub verified: bool,
    pub verification_token: Option<String>,
    pub session_token: Option<String>,
    pub avatar_url: String,
}

const ACCOUNT_COLUMNS: &str = r"
    id, email, password_hash, subscription::text AS subscription,
    verified, verification_token, session_token, avatar_url
";

fn account_from_row(row: &PgRow) -> Account {
    Account {
        id: row.get("id"),
        email: row.get("email"),
        password_hash: row.get("password_hash"),
        subscription: row.get("subscription"),
        verified: row.get("verified"),
        verification_token: row.get("verification_token"),
        session_token: row.get("session_token"),
        avatar_url: row.get("avatar_url"),
    }
}

pub(super) async fn insert_account(
    pool: &PgPool,
    email: &str,
    password_hash: &str,
    verification_token: &str,
    avatar_url: &str,
) -> Result<SignupOutcome> {
    let query = r"
        INSERT INTO accounts
            (email, password_hash, verification_token, avatar_url)
        VALUES ($1, $2, $3, $4)
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "INSERT",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(email)
        .bind(password_hash)
        .bind(verification_token)
        .bind(avatar_url)
        .fetch_one(pool)
        .instrument(span)
        .await;

    match row {
        Ok(_) => Ok(SignupOutcome::Created),
        Err(err) if super::utils::is_unique_violation(&err) => Ok(SignupOutcome::Conflict),
        Err(err) => Err(err).context("failed to insert account"),
    }
}

pub(super) async fn find_by_email(pool: &PgPool, email: &str) -> Result<Option<Account>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE email = $1 LIMIT 1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(email)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account by email")?;

    Ok(row.as_ref().map(account_from_row))
}

pub(super) async fn find_by_id(pool: &PgPool, id: Uuid) -> Result<Option<Account>> {
    let query = format!("SELECT {ACCOUNT_COLUMNS} FROM accounts WHERE id = $1 LIMIT 1");
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "SELECT",
        db.statement = query.as_str()
    );
    let row = sqlx::query(&query)
        .bind(id)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to lookup account by id")?;

    Ok(row.as_ref().map(account_from_row))
}

/// Consume a verification token: flip the account to verified and clear the
/// token in one statement, so the token is single-use by construction.
pub(super) async fn consume_verification_token(pool: &PgPool, token: &str) -> Result<bool> {
    let query = r"
        UPDATE accounts
        SET verified = TRUE,
            verification_token = NULL,
            updated_at = NOW()
        WHERE verification_token = $1
        RETURNING id
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    let row = sqlx::query(query)
        .bind(token)
        .fetch_optional(pool)
        .instrument(span)
        .await
        .context("failed to consume verification token")?;

    Ok(row.is_some())
}

/// Overwrite the stored session token. This is the write that terminates any
/// previously issued token, whatever its embedded expiry says.
pub(super) async fn store_session_token(pool: &PgPool, id: Uuid, token: &str) -> Result<()> {
    let query = r"
        UPDATE accounts
        SET session_token = $2,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id)
        .bind(token)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to store session token")?;
    Ok(())
}

pub(super) async fn clear_session_token(pool: &PgPool, id: Uuid) -> Result<()> {
    // Logout is idempotent; clearing an already-NULL column is fine.
    let query = r"
        UPDATE accounts
        SET session_token = NULL,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to clear session token")?;
    Ok(())
}

pub(super) async fn update_avatar_url(pool: &PgPool, id: Uuid, avatar_url: &str) -> Result<()> {
    let query = r"
        UPDATE accounts
        SET avatar_url = $2,
            updated_at = NOW()
        WHERE id = $1
    ";
    let span = tracing::info_span!(
        "db.query",
        db.system = "postgresql",
        db.operation = "UPDATE",
        db.statement = query
    );
    sqlx::query(query)
        .bind(id)
        .bind(avatar_url)
        .execute(pool)
        .instrument(span)
        .await
        .context("failed to update avatar url")?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::{Account, SignupOutcome};
    use uuid::Uuid;

    #[test]
    fn signup_outcome_debug_names() {
        assert_eq!(format!("{:?}", SignupOutcome::Created), "Created");
        assert_eq!(format!("{:?}", SignupOutcome::Conflict), "Conflict");
    }

    #[test]
    fn account_holds_values() {
        let account = Account {
            id: Uuid::nil(),
            email: "a@b.com".to_string(),
            password_hash: "$argon2id$stub".to_string(),
            subscription: "starter".to_string(),
            verified: false,
            verification_token: Some("token".to_string()),
            session_token: None,
            avatar_url: "/avatars/x.png".to_string(),
        };
        assert_eq!(account.id, Uuid::nil());
        assert!(!account.verified);
        assert_eq!(account.verification_token.as_deref(), Some("token"));
        assert!(account.session_token.is_none());
    }
}
