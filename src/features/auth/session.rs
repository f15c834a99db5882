//! Session snapshot published by the session store.
//!
//! The flow position is an explicit [`Phase`] rather than independent
//! `isAuthenticated`/`otpSent` flags, so "code pending and signed in" cannot be
//! represented. The flag accessors are derived from the phase.

use crate::features::auth::types::UserProfile;

/// Where the credential flow currently stands.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    /// No session and no pending code.
    #[default]
    Anonymous,
    /// Credentials were accepted and a one-time code was sent.
    OtpPending { email_or_phone: String },
    /// A token exchange completed.
    Authenticated(UserProfile),
}

/// Snapshot of the client session. Contains no secrets.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Session {
    pub phase: Phase,
    pub loading: bool,
    pub error: Option<String>,
}

impl Session {
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        matches!(self.phase, Phase::Authenticated(_))
    }

    #[must_use]
    pub fn user(&self) -> Option<&UserProfile> {
        match &self.phase {
            Phase::Authenticated(user) => Some(user),
            _ => None,
        }
    }

    #[must_use]
    pub fn otp_sent(&self) -> bool {
        matches!(self.phase, Phase::OtpPending { .. })
    }

    /// The account the pending code was sent to.
    #[must_use]
    pub fn otp_target(&self) -> Option<&str> {
        match &self.phase {
            Phase::OtpPending { email_or_phone } => Some(email_or_phone),
            _ => None,
        }
    }

    #[must_use]
    pub fn role(&self) -> Option<&str> {
        self.user().and_then(|user| user.role.as_deref())
    }
}
