//! # Rubrica (Contacts API auth & avatar service)
//!
//! `rubrica` authenticates users of a contacts API and manages the lifecycle
//! of their session credential and profile avatar.
//!
//! ## Accounts & Verification
//!
//! Accounts are created unverified with a single-use verification token that
//! is emailed as a link. Verification consumes the token and flips the account
//! to verified; login is refused until then. At any moment exactly one of
//! (token set, verified) holds per account.
//!
//! ## Sessions (single active token)
//!
//! Login issues an HMAC-signed token with a fixed one-hour expiry and persists
//! the exact token string on the account row. Validation requires signature,
//! expiry, *and* equality with the stored value, so issuing a new token or
//! logging out immediately invalidates the previous one regardless of its
//! embedded expiry. One active session per account, by design.
//!
//! ## Avatars
//!
//! Uploads are staged to a scratch directory, resized to a fixed 250x250
//! square, and committed atomically to the public avatar directory under a
//! deterministic `<account-id><ext>` name, so re-uploads replace in place.

pub mod api;
pub mod cli;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub const APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"),);
