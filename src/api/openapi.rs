//! `OpenAPI` document for the users API.
//!
//! Handlers carry `#[utoipa::path]` annotations; this module collects them
//! into the document served through Swagger UI at `/docs`.

use crate::api::handlers::users::{avatars, session, signup, types, verification};
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "rubrica",
        description = "Contacts API authentication, session, and avatar service"
    ),
    paths(
        signup::signup,
        session::login,
        session::logout,
        session::current,
        verification::verify_email,
        verification::resend_verification,
        avatars::upload_avatar,
    ),
    components(schemas(
        types::SignupRequest,
        types::LoginRequest,
        types::ResendVerificationRequest,
        types::PublicUser,
        types::SignupResponse,
        types::LoginResponse,
        types::AvatarResponse,
        types::MessageResponse,
    )),
    tags(
        (name = "users", description = "Account, session, and avatar lifecycle")
    )
)]
pub struct ApiDoc;
