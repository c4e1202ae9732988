//! Request/response types for the users endpoints.

use axum::{Json, http::StatusCode, response::{IntoResponse, Response}};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use super::storage::Account;

pub const MIN_PASSWORD_LENGTH: usize = 6;

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignupRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct ResendVerificationRequest {
    pub email: String,
}

/// Public projection of an account; everything else stays server-side.
#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct PublicUser {
    pub email: String,
    pub subscription: String,
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
}

impl From<&Account> for PublicUser {
    fn from(account: &Account) -> Self {
        Self {
            email: account.email.clone(),
            subscription: account.subscription.clone(),
            avatar_url: account.avatar_url.clone(),
        }
    }
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct SignupResponse {
    pub user: PublicUser,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct LoginResponse {
    pub token: String,
    pub user: PublicUser,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct AvatarResponse {
    #[serde(rename = "avatarURL")]
    pub avatar_url: String,
}

#[derive(ToSchema, Serialize, Deserialize, Debug)]
pub struct MessageResponse {
    pub message: String,
}

/// Shape a plain-text outcome as the `{"message": ...}` body every error
/// path answers with.
pub(super) fn message(status: StatusCode, text: &str) -> Response {
    (
        status,
        Json(MessageResponse {
            message: text.to_string(),
        }),
    )
        .into_response()
}

/// Validate a signup/login body before any persistence access.
///
/// Returns the offending message so the handler can answer 400 with it.
pub fn validate_credentials(email: &str, password: &str) -> Result<(), &'static str> {
    if !super::utils::valid_email(&super::utils::normalize_email(email)) {
        return Err("email must be a valid email address");
    }
    if password.len() < MIN_PASSWORD_LENGTH {
        return Err("password must be at least 6 characters");
    }
    Ok(())
}
