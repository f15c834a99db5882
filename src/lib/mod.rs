//! Shared client utilities for API access, configuration, persisted storage,
//! errors and build metadata.
//!
//! ## Core Authentication Flows
//!
//! ### Login
//!
//! 1. **Credentials:** The client POSTs `{ emailOrPhone, password }` to `/auth/{role}/login`.
//! 2. **Branch:** The backend either answers with a token payload (done) or reports that a
//!    one-time code was sent.
//! 3. **OTP:** The client POSTs `{ emailOrPhone, otp }` to `/auth/verify-otp` and receives the
//!    token payload.
//!
//! ### Registration
//!
//! Registration always ends in OTP verification. The role picks the endpoint
//! (`/auth/register`, `/auth/vendor/register`, `/auth/admin/register`) and the
//! credentials are kept in memory until the code is verified.
//!
//! ### Persistence
//!
//! `authToken` and `user` are written and removed together; the bearer token is
//! attached to authenticated calls such as `GET /api/users/profile`. Callers must
//! never log passwords, codes or token material.

pub mod api;
pub mod config;
pub mod errors;
pub mod storage;

#[allow(clippy::doc_markdown, clippy::needless_raw_string_hashes)]
pub mod built_info {
    include!(concat!(env!("OUT_DIR"), "/built.rs"));
}

pub const GIT_COMMIT_HASH: &str = match built_info::GIT_COMMIT_HASH {
    Some(hash) => hash,
    None => "unknown",
};

pub static APP_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

pub use api::ApiClient;
pub use config::AppConfig;
pub use errors::AppError;
pub use storage::{FileStore, KeyValueStore, MemoryStore};
