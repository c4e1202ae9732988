//! Avatar upload endpoint: stage the multipart file, hand it to the ingester
//! on a blocking thread, then persist the new public URL.

use axum::{
    Json,
    extract::{Extension, Multipart},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};
use sqlx::PgPool;
use std::sync::Arc;
use tracing::error;

use super::avatar::{AvatarIngester, IngestError};
use super::gate::{gate_response, require_auth};
use super::storage;
use super::token::TokenAuthority;
use super::types::{AvatarResponse, MessageResponse, message};

/// Replace the authenticated account's avatar.
#[utoipa::path(
    patch,
    path = "/api/users/avatars",
    request_body(content_type = "multipart/form-data", description = "Form with an `avatar` file field"),
    responses(
        (status = 200, description = "Avatar replaced", body = AvatarResponse),
        (status = 400, description = "No avatar file in the form", body = MessageResponse),
        (status = 401, description = "Not authorized", body = MessageResponse),
        (status = 500, description = "Processing or storage failure", body = MessageResponse)
    ),
    tag = "users"
)]
pub async fn upload_avatar(
    headers: HeaderMap,
    pool: Extension<PgPool>,
    authority: Extension<Arc<TokenAuthority>>,
    ingester: Extension<Arc<AvatarIngester>>,
    mut multipart: Multipart,
) -> impl IntoResponse {
    let account = match require_auth(&headers, &pool, &authority).await {
        Ok(account) => account,
        Err(status) => return gate_response(status),
    };

    let Some((original_name, bytes)) = read_avatar_field(&mut multipart).await else {
        return message(StatusCode::BAD_REQUEST, "Avatar file is required");
    };

    let staged = ingester.staging_path(account.id, &original_name);
    if let Err(err) = tokio::fs::write(&staged, &bytes).await {
        error!("Failed to stage avatar upload: {err}");
        return message(StatusCode::INTERNAL_SERVER_ERROR, "Avatar upload failed");
    }

    // Image decode and resize are CPU-bound; keep them off the runtime.
    let worker = ingester.0.clone();
    let staged_path = staged.clone();
    let account_id = account.id;
    let ingested = tokio::task::spawn_blocking(move || {
        worker.ingest(account_id, &staged_path, &original_name)
    })
    .await;

    let avatar_url = match ingested {
        Ok(Ok(url)) => url,
        Ok(Err(IngestError::MissingFile)) => {
            return message(StatusCode::BAD_REQUEST, "Avatar file is required");
        }
        Ok(Err(err)) => {
            error!("Failed to process avatar: {err}");
            return message(StatusCode::INTERNAL_SERVER_ERROR, "Avatar upload failed");
        }
        Err(err) => {
            error!("Avatar processing task failed: {err}");
            return message(StatusCode::INTERNAL_SERVER_ERROR, "Avatar upload failed");
        }
    };

    match storage::update_avatar_url(&pool, account.id, &avatar_url).await {
        Ok(()) => (StatusCode::OK, Json(AvatarResponse { avatar_url })).into_response(),
        Err(err) => {
            error!("Failed to store avatar url: {err}");
            message(StatusCode::INTERNAL_SERVER_ERROR, "Avatar upload failed")
        }
    }
}

/// Pull the `avatar` file out of the form, skipping unrelated fields.
/// `None` covers every absent-or-unreadable case; they all answer 400.
async fn read_avatar_field(multipart: &mut Multipart) -> Option<(String, axum::body::Bytes)> {
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return None,
            Err(err) => {
                error!("Failed to read multipart form: {err}");
                return None;
            }
        };
        if field.name() != Some("avatar") {
            continue;
        }
        let original_name = field.file_name().unwrap_or("avatar").to_string();
        match field.bytes().await {
            Ok(bytes) if !bytes.is_empty() => return Some((original_name, bytes)),
            Ok(_) => return None,
            Err(err) => {
                error!("Failed to read avatar field: {err}");
                return None;
            }
        }
    }
}
