//! Post-auth routing: once the session becomes authenticated, send the user to
//! the dashboard for their role. Runs once per sign-in, not on every session
//! change, so it cannot loop.

use crate::{
    features::auth::{role::Role, session::Session},
    routes::{Navigator, paths},
};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::debug;

/// Dashboard for a raw role string. Absent or unknown roles land on the home page.
#[must_use]
pub fn destination_for(role: Option<&str>) -> &'static str {
    match role.and_then(Role::parse) {
        Some(Role::User) => paths::USER_DASHBOARD,
        Some(Role::Vendor) => paths::VENDOR_DASHBOARD,
        Some(Role::Admin) => paths::ADMIN_DASHBOARD,
        Some(Role::Other(_)) | None => paths::HOME,
    }
}

/// Watches session transitions and navigates on each sign-in.
pub struct PostAuthRouter {
    navigator: Arc<dyn Navigator>,
    was_authenticated: bool,
}

impl PostAuthRouter {
    #[must_use]
    pub fn new(navigator: Arc<dyn Navigator>) -> Self {
        Self {
            navigator,
            was_authenticated: false,
        }
    }

    /// Starts from an already-authenticated session, e.g. after hydration, so
    /// that restoring a session does not count as a fresh sign-in.
    #[must_use]
    pub fn resuming(navigator: Arc<dyn Navigator>, session: &Session) -> Self {
        Self {
            navigator,
            was_authenticated: session.is_authenticated(),
        }
    }

    /// Feeds one session snapshot. Returns the destination when this snapshot
    /// completed a sign-in. Snapshots taken while a request is in flight are
    /// ignored; a restored token only counts once the backend has answered.
    pub fn observe(&mut self, session: &Session) -> Option<&'static str> {
        if session.loading {
            return None;
        }
        let authenticated = session.is_authenticated();
        let transitioned = authenticated && !self.was_authenticated;
        self.was_authenticated = authenticated;

        if !transitioned {
            return None;
        }
        let destination = destination_for(session.role());
        debug!(destination, "post-auth redirect");
        self.navigator.navigate(destination);
        Some(destination)
    }

    /// Observes every session change until the store is dropped.
    pub async fn run(mut self, mut sessions: watch::Receiver<Session>) {
        loop {
            let session = sessions.borrow_and_update().clone();
            self.observe(&session);
            if sessions.changed().await.is_err() {
                break;
            }
        }
    }
}
