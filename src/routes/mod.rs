//! Navigation targets and the `Navigator` seam used by guards and the
//! post-auth router. Views are rendered elsewhere; this module only names the
//! places the auth flow can send a user.

use std::sync::{Arc, Mutex};
use tracing::debug;

pub mod paths {
    pub const HOME: &str = "/";
    pub const LOGIN: &str = "/login";
    pub const UNAUTHORIZED: &str = "/unauthorized";
    pub const USER_DASHBOARD: &str = "/user/dashboard";
    pub const VENDOR_DASHBOARD: &str = "/vendor/dashboard";
    pub const ADMIN_DASHBOARD: &str = "/admin/dashboard";
}

/// Performs navigation. Implementations decide what a navigation means: a
/// router push in a UI shell, or a recorded history entry in the CLI.
pub trait Navigator: Send + Sync {
    fn navigate(&self, path: &str);
}

/// Navigator that records every navigation in order.
#[derive(Clone, Debug, Default)]
pub struct History {
    entries: Arc<Mutex<Vec<String>>>,
}

impl History {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Every path navigated to so far, oldest first.
    #[must_use]
    pub fn entries(&self) -> Vec<String> {
        self.entries
            .lock()
            .map(|entries| entries.clone())
            .unwrap_or_default()
    }

    #[must_use]
    pub fn current(&self) -> Option<String> {
        self.entries().last().cloned()
    }
}

impl Navigator for History {
    fn navigate(&self, path: &str) {
        debug!(path, "navigate");
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(path.to_string());
        }
    }
}
