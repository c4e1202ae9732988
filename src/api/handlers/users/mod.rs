//! Account, session, and avatar lifecycle.
//!
//! The split mirrors the request path: `types` (payloads + validation) →
//! handlers (`signup`, `session`, `verification`, `avatars`) → components
//! (`registry`, `token`, `gate`, `avatar`) → `storage` (account rows).

pub mod avatar;
pub mod avatars;
pub mod gate;
pub mod registry;
pub mod session;
pub mod signup;
pub mod storage;
pub mod token;
pub mod types;
pub mod utils;
pub mod verification;
