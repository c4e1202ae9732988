//! Account signup endpoint.

use axum::{
    Json,
    extract::Extension,
    http::StatusCode,
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::registry::{AccountRegistry, SignupResult};
use super::types::{MessageResponse, SignupRequest, SignupResponse, message, validate_credentials};

/// Create a new, unverified account and send its verification mail.
#[utoipa::path(
    post,
    path = "/api/users/signup",
    request_body = SignupRequest,
    responses(
        (status = 201, description = "Account created", body = SignupResponse),
        (status = 400, description = "Invalid email or password", body = MessageResponse),
        (status = 409, description = "Email already registered", body = MessageResponse)
    ),
    tag = "users"
)]
pub async fn signup(
    pool: Extension<PgPool>,
    registry: Extension<Arc<AccountRegistry>>,
    payload: Option<Json<SignupRequest>>,
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

    match registry
        .register(&pool, &request.email, &request.password)
        .await
    {
        Ok(SignupResult::Created(user)) => {
            (StatusCode::CREATED, Json(SignupResponse { user })).into_response()
        }
        Ok(SignupResult::DuplicateEmail) => message(StatusCode::CONFLICT, "Email in use"),
        Err(err) => {
            error!("Failed to sign up account: {err}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Signup failed")
        }
    }
}
