//! Route guarding. [`decide`] is a pure function of the session and the
//! route's requirement; [`RouteGuard`] performs the resulting navigation. This
//! is a UX gate only: the backend must enforce access on every call.

use crate::{
    features::auth::{role::roles_match, session::Session},
    routes::{Navigator, paths},
};
use std::sync::Arc;
use tokio::sync::watch;

/// Access a route requires.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Requirement {
    /// Anyone may view the route.
    Public,
    /// Any signed-in account.
    Authenticated,
    /// A single role, compared after normalization.
    Role(String),
    /// Any of these roles, compared after normalization.
    AnyOf(Vec<String>),
}

impl Requirement {
    fn needs_authentication(&self) -> bool {
        !matches!(self, Requirement::Public)
    }

    fn allows(&self, role: Option<&str>) -> bool {
        match self {
            Requirement::Public | Requirement::Authenticated => true,
            Requirement::Role(required) => role.is_some_and(|role| roles_match(role, required)),
            Requirement::AnyOf(allowed) => {
                role.is_some_and(|role| allowed.iter().any(|required| roles_match(role, required)))
            }
        }
    }
}

/// Guard settings for one protected route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GuardConfig {
    pub requirement: Requirement,
    pub login_path: String,
    pub unauthorized_path: String,
    /// View rendered in place of the route when the role does not match.
    pub fallback: Option<String>,
}

impl GuardConfig {
    #[must_use]
    pub fn new(requirement: Requirement) -> Self {
        Self {
            requirement,
            login_path: paths::LOGIN.to_string(),
            unauthorized_path: paths::UNAUTHORIZED.to_string(),
            fallback: None,
        }
    }

    #[must_use]
    pub fn authenticated() -> Self {
        Self::new(Requirement::Authenticated)
    }

    #[must_use]
    pub fn role(role: impl Into<String>) -> Self {
        Self::new(Requirement::Role(role.into()))
    }

    #[must_use]
    pub fn any_of<I, S>(roles: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::new(Requirement::AnyOf(roles.into_iter().map(Into::into).collect()))
    }

    #[must_use]
    pub fn with_login_path(mut self, path: impl Into<String>) -> Self {
        self.login_path = path.into();
        self
    }

    #[must_use]
    pub fn with_fallback(mut self, view: impl Into<String>) -> Self {
        self.fallback = Some(view.into());
        self
    }
}

/// What to do with a guarded route.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum GuardDecision {
    /// Session is still being resolved; show a loading indicator.
    Loading,
    Render,
    /// Render this fallback view instead of the route.
    Fallback(String),
    /// Navigate away.
    Redirect(String),
}

/// Decides access for a route. Never redirects while the session is loading.
#[must_use]
pub fn decide(session: &Session, config: &GuardConfig) -> GuardDecision {
    if session.loading {
        return GuardDecision::Loading;
    }

    if !config.requirement.needs_authentication() {
        return GuardDecision::Render;
    }

    if !session.is_authenticated() {
        return GuardDecision::Redirect(config.login_path.clone());
    }

    if config.requirement.allows(session.role()) {
        GuardDecision::Render
    } else if let Some(view) = &config.fallback {
        GuardDecision::Fallback(view.clone())
    } else {
        GuardDecision::Redirect(config.unauthorized_path.clone())
    }
}

/// Applies guard decisions through a navigator. Re-evaluating an unchanged
/// session does not navigate a second time.
pub struct RouteGuard {
    config: GuardConfig,
    navigator: Arc<dyn Navigator>,
    last: Option<(Session, GuardDecision)>,
}

impl RouteGuard {
    #[must_use]
    pub fn new(config: GuardConfig, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            config,
            navigator,
            last: None,
        }
    }

    /// Decides for `session` and navigates if the decision is a redirect that
    /// was not already performed for this exact session.
    pub fn evaluate(&mut self, session: &Session) -> GuardDecision {
        if let Some((previous, decision)) = &self.last {
            if previous == session {
                return decision.clone();
            }
        }

        let decision = decide(session, &self.config);
        let already_there = self
            .last
            .as_ref()
            .is_some_and(|(_, previous)| previous == &decision);
        if let GuardDecision::Redirect(path) = &decision {
            if !already_there {
                self.navigator.navigate(path);
            }
        }
        self.last = Some((session.clone(), decision.clone()));
        decision
    }

    /// Re-evaluates on every session change until the store is dropped.
    pub async fn run(mut self, mut sessions: watch::Receiver<Session>) {
        loop {
            let session = sessions.borrow_and_update().clone();
            self.evaluate(&session);
            if sessions.changed().await.is_err() {
                break;
            }
        }
    }
}
