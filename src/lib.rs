//! Client-side authentication and role routing for the marketplace.
//!
//! The crate is split the same way the web frontend is: `app_lib` carries the
//! shared HTTP, configuration, storage and error plumbing, `features` holds the
//! auth session store, OTP flows, guards and form validation, `routes` names the
//! navigation targets, and `cli` is the `marketgate` command-line front end.

#[path = "lib/mod.rs"]
pub mod app_lib;
pub mod cli;
pub mod features;
pub mod routes;

pub use app_lib::{APP_USER_AGENT, AppError, GIT_COMMIT_HASH};
