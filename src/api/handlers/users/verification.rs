//! Email verification endpoints: the clicked link and the resend request.

use axum::{
    Json,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::registry::{AccountRegistry, ResendOutcome};
use super::types::{MessageResponse, ResendVerificationRequest, message};

/// Consume the emailed verification token and activate the account.
#[utoipa::path(
    get,
    path = "/api/users/verify/{token}",
    params(
        ("token" = String, Path, description = "Verification token from the mail link")
    ),
    responses(
        (status = 200, description = "Account verified", body = MessageResponse),
        (status = 404, description = "Unknown or already-consumed token", body = MessageResponse)
    ),
    tag = "users"
)]
pub async fn verify_email(
    pool: Extension<PgPool>,
    registry: Extension<Arc<AccountRegistry>>,
    Path(token): Path<String>,
) -> impl IntoResponse {
    match registry.verify(&pool, &token).await {
        Ok(true) => message(StatusCode::OK, "Verification successful"),
        // A consumed token finds no row, same as a token that never existed.
        Ok(false) => message(StatusCode::NOT_FOUND, "User not found"),
        Err(err) => {
            error!("Failed to verify email: {err}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Verification failed")
        }
    }
}

/// Re-send the verification mail with the still-stored token.
#[utoipa::path(
    post,
    path = "/api/users/verify",
    request_body = ResendVerificationRequest,
    responses(
        (status = 200, description = "Verification mail sent", body = MessageResponse),
        (status = 400, description = "Missing email or already verified", body = MessageResponse),
        (status = 404, description = "Unknown email", body = MessageResponse)
    ),
    tag = "users"
)]
pub async fn resend_verification(
    pool: Extension<PgPool>,
    registry: Extension<Arc<AccountRegistry>>,
    payload: Option<Json<ResendVerificationRequest>>,
) -> impl IntoResponse {
    let email = match payload {
        Some(Json(request)) if !request.email.trim().is_empty() => request.email,
        _ => return message(StatusCode::BAD_REQUEST, "missing required field email"),
    };

    match registry.resend_verification(&pool, &email).await {
        Ok(ResendOutcome::Sent) => message(StatusCode::OK, "Verification email sent"),
        Ok(ResendOutcome::AlreadyVerified) => message(
            StatusCode::BAD_REQUEST,
            "Verification has already been passed",
        ),
        Ok(ResendOutcome::NotFound) => message(StatusCode::NOT_FOUND, "User not found"),
        Err(err) => {
            error!("Failed to resend verification mail: {err}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Verification failed")
        }
    }
}
