//! Request-boundary auth gate for protected endpoints.
//!
//! Reads the bearer token, delegates to the token authority, and hands the
//! resolved account to the handler — or short-circuits with 401 before the
//! protected operation runs.

use axum::{
    http::{HeaderMap, StatusCode, header::AUTHORIZATION},
    response::Response,
};
use sqlx::PgPool;
use tracing::error;

use super::storage::Account;
use super::token::TokenAuthority;
use super::types::message;

/// Resolve the request's bearer token into an account, or 401.
///
/// All validation failures collapse to `UNAUTHORIZED`; only storage failures
/// surface as 500.
///
/// # Errors
/// Returns the status the handler should answer with.
pub async fn require_auth(
    headers: &HeaderMap,
    pool: &PgPool,
    authority: &TokenAuthority,
) -> Result<Account, StatusCode> {
    let Some(token) = extract_bearer_token(headers) else {
        return Err(StatusCode::UNAUTHORIZED);
    };
    match authority.validate(pool, &token).await {
        Ok(Some(account)) => Ok(account),
        Ok(None) => Err(StatusCode::UNAUTHORIZED),
        Err(err) => {
            error!("Failed to validate session token: {err}");
            Err(StatusCode::INTERNAL_SERVER_ERROR)
        }
    }
}

/// Response for a failed gate check: 401 carries the uniform
/// "Not authorized" body, anything else stays generic.
pub(super) fn gate_response(status: StatusCode) -> Response {
    if status == StatusCode::UNAUTHORIZED {
        message(status, "Not authorized")
    } else {
        message(status, "Internal server error")
    }
}

fn extract_bearer_token(headers: &HeaderMap) -> Option<String> {
    let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
    let trimmed = value.trim();
    let token = trimmed
        .strip_prefix("Bearer ")
        .or_else(|| trimmed.strip_prefix("bearer "))?
        .trim();
    if token.is_empty() {
        None
    } else {
        Some(token.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    fn headers_with(value: &'static str) -> HeaderMap {
        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, HeaderValue::from_static(value));
        headers
    }

    #[test]
    fn extracts_bearer_token() {
        let headers = headers_with("Bearer abc.def");
        assert_eq!(extract_bearer_token(&headers), Some("abc.def".to_string()));
    }

    #[test]
    fn accepts_lowercase_scheme() {
        let headers = headers_with("bearer abc.def");
        assert_eq!(extract_bearer_token(&headers), Some("abc.def".to_string()));
    }

    #[test]
    fn rejects_missing_header() {
        assert_eq!(extract_bearer_token(&HeaderMap::new()), None);
    }

    #[test]
    fn rejects_other_schemes() {
        let headers = headers_with("Basic dXNlcjpwYXNz");
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[test]
    fn rejects_empty_token() {
        let headers = headers_with("Bearer ");
        assert_eq!(extract_bearer_token(&headers), None);
    }

    #[tokio::test]
    async fn require_auth_missing_header_is_unauthorized() {
        let pool = sqlx::postgres::PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool");
        let authority = TokenAuthority::new(b"secret", 3600);
        let result = require_auth(&HeaderMap::new(), &pool, &authority).await;
        assert_eq!(result.err(), Some(StatusCode::UNAUTHORIZED));
    }
}
