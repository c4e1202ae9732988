//! Session endpoints: login, logout, and the current-account lookup.

use axum::{
    Json,
    extract::Extension,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::gate::{gate_response, require_auth};
use super::registry::AccountRegistry;
use super::token::TokenAuthority;
use super::types::{
    LoginRequest, LoginResponse, MessageResponse, PublicUser, message, validate_credentials,
};

/// Exchange credentials for a session token.
///
/// Every credential failure answers the same 401 body, so callers cannot
/// probe which emails are registered or verified.
#[utoipa::path(
    post,
    path = "/api/users/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Session issued", body = LoginResponse),
        (status = 400, description = "Invalid email or password shape", body = MessageResponse),
        (status = 401, description = "Credentials rejected", body = MessageResponse)
    ),
    tag = "users"
)]
pub async fn login(
    pool: Extension<PgPool>,
    registry: Extension<Arc<AccountRegistry>>,
    authority: Extension<Arc<TokenAuthority>>,
    payload: Option<Json<LoginRequest>>,
) -> impl IntoResponse {
    let Some(Json(request)) = payload else {
        return message(
            StatusCode::BAD_REQUEST,
            "missing required fields email and password",
        );
    };

    if let Err(reason) = validate_credentials(&request.email, &request.password) {
        return message(StatusCode::BAD_REQUEST, reason);
    }

    let account = match registry
        .check_credentials(&pool, &request.email, &request.password)
        .await
    {
        Ok(Some(account)) => account,
        Ok(None) => return message(StatusCode::UNAUTHORIZED, "Email or password is wrong"),
        Err(err) => {
            error!("Failed to check credentials: {err}");
            return message(StatusCode::INTERNAL_SERVER_ERROR, "Login failed");
        }
    };

    // Issuing overwrites the stored token, ending any previous session.
    match authority.issue(&pool, account.id).await {
        Ok(token) => (
            StatusCode::OK,
            Json(LoginResponse {
                token,
                user: PublicUser::from(&account),
            }),
        )
            .into_response(),
        Err(err) => {
            error!("Failed to issue session token: {err}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Login failed")
        }
    }
}

/// End the current session by clearing the stored token.
#[utoipa::path(
    get,
    path = "/api/users/logout",
    responses(
        (status = 204, description = "Session ended"),
        (status = 401, description = "Not authorized", body = MessageResponse)
    ),
    tag = "users"
)]
pub async fn logout(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    authority: Extension<Arc<TokenAuthority>>,
) -> impl IntoResponse {
    let account = match require_auth(&headers, &pool, &authority).await {
        Ok(account) => account,
        Err(status) => return gate_response(status),
    };

    match authority.revoke(&pool, account.id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(err) => {
            error!("Failed to revoke session token: {err}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Logout failed")
        }
    }
}

/// Return the account behind the presented session token.
#[utoipa::path(
    get,
    path = "/api/users/current",
    responses(
        (status = 200, description = "Current account", body = PublicUser),
        (status = 401, description = "Not authorized", body = MessageResponse)
    ),
    tag = "users"
)]
pub async fn current(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    authority: Extension<Arc<TokenAuthority>>,
) -> impl IntoResponse {
    match require_auth(&headers, &pool, &authority).await {
        Ok(account) => (StatusCode::OK, Json(PublicUser::from(&account))).into_response(),
        Err(status) => gate_response(status),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::mail::LogMailSender;
    use sqlx::postgres::PgPoolOptions;

    fn lazy_pool() -> PgPool {
        PgPoolOptions::new()
            .connect_lazy("postgres://postgres@localhost/postgres")
            .expect("lazy pool")
    }

    fn registry() -> Arc<AccountRegistry> {
        Arc::new(AccountRegistry::new(
            "http://localhost:8080".to_string(),
            Arc::new(LogMailSender),
        ))
    }

    fn authority() -> Arc<TokenAuthority> {
        Arc::new(TokenAuthority::new(b"test-session-secret", 3600))
    }

    #[tokio::test]
    async fn login_missing_payload_is_bad_request() {
        let response = login(
            Extension(lazy_pool()),
            Extension(registry()),
            Extension(authority()),
            None,
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn login_invalid_email_is_bad_request() {
        let payload = Json(LoginRequest {
            email: "not-an-email".to_string(),
            password: "secret1".to_string(),
        });
        let response = login(
            Extension(lazy_pool()),
            Extension(registry()),
            Extension(authority()),
            Some(payload),
        )
        .await
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn logout_without_bearer_is_unauthorized() {
        let response = logout(HeaderMap::new(), Extension(lazy_pool()), Extension(authority()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn current_without_bearer_is_unauthorized() {
        let response = current(HeaderMap::new(), Extension(lazy_pool()), Extension(authority()))
            .await
            .into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
