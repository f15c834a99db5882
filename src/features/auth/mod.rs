//! Auth feature module covering the session store, credential/OTP flows,
//! password recovery, route guards and post-auth routing. It keeps
//! authentication logic out of views and must stay aligned with backend
//! expectations. This module touches security boundaries and must avoid
//! logging passwords, codes or token material.
//!
//! Flow Overview: Login posts credentials and either receives a token or moves
//! to the code step. Registration always moves to the code step and keeps the
//! credentials in memory until the code is verified. Logout and any 401 reset the
//! session and the persisted `authToken`/`user` pair together.

pub mod client;
pub mod flow;
pub mod guards;
pub mod persist;
pub mod recovery;
pub mod redirect;
pub mod role;
pub mod session;
pub mod state;
pub mod token;
pub mod types;

#[cfg(test)]
pub(crate) mod test_support;
#[cfg(test)]
mod tests;

pub use client::{AuthApi, HttpAuthApi};
pub use flow::{CredentialFlow, FlowStep, FormOutcome};
pub use guards::{GuardConfig, GuardDecision, Requirement, RouteGuard, decide};
pub use recovery::{RecoveryFlow, RecoveryStage};
pub use redirect::{PostAuthRouter, destination_for};
pub use role::{AccountKind, Role, roles_match};
pub use session::{Phase, Session};
pub use state::{SessionStore, Submission};
