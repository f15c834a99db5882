//! Auth session state shared by every consumer of the client. The store owns the
//! only mutable copy of the [`Session`]; consumers read snapshots or subscribe to
//! changes through a `watch` channel. Writes happen only inside the operations
//! below.
//!
//! Every operation captures the session generation when it starts. Logout and
//! expiry bump the generation, so a response that arrives after the user signed
//! out is dropped instead of resurrecting the session. The bearer token stays in
//! the store and is never published in snapshots.

use crate::{
    app_lib::{AppError, KeyValueStore},
    features::auth::{
        client::AuthApi,
        persist,
        role::AccountKind,
        session::{Phase, Session},
        token,
        types::{AuthReply, LoginRequest, RegisterRequest, TokenPayload, UserProfile, VerifyOtpRequest},
    },
};
use secrecy::{ExposeSecret, SecretString};
use std::{future::Future, sync::Arc};
use tokio::sync::{Mutex, watch};
use tracing::{debug, info, warn};

/// What happened to a submitted operation.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Submission {
    /// The session is now authenticated.
    Authenticated,
    /// A one-time code was sent; the session is waiting for it.
    OtpRequired,
    /// The operation failed; `Session::error` carries the message.
    Rejected,
    /// No session exists (hydration found nothing usable).
    Anonymous,
    /// Another request was already in flight; nothing was sent.
    Suppressed,
    /// The session was reset while the request was in flight; the response was dropped.
    Stale,
}

/// Credentials captured at registration, consumed by OTP verification.
struct PendingRegistration {
    kind: AccountKind,
    email_or_phone: String,
    password: SecretString,
}

#[derive(Default)]
struct Inner {
    generation: u64,
    token: Option<SecretString>,
    pending: Option<PendingRegistration>,
}

/// Result of a backend exchange, applied under the generation check.
enum Settled {
    Session {
        token: SecretString,
        user: UserProfile,
    },
    OtpPending {
        email_or_phone: String,
        pending: Option<PendingRegistration>,
    },
    Failed {
        error: AppError,
        back_to_credentials: bool,
    },
    /// Hydration could not reach the backend; keep the provisional session.
    Provisional,
    /// Hydration found no usable session.
    Empty,
    /// The stored token was rejected.
    SignedOut,
}

/// Single source of truth for authentication status.
pub struct SessionStore {
    api: Arc<dyn AuthApi>,
    storage: Arc<dyn KeyValueStore>,
    tx: watch::Sender<Session>,
    inner: Mutex<Inner>,
}

impl SessionStore {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>, storage: Arc<dyn KeyValueStore>) -> Self {
        let (tx, _rx) = watch::channel(Session::default());
        Self {
            api,
            storage,
            tx,
            inner: Mutex::new(Inner::default()),
        }
    }

    /// Current snapshot.
    #[must_use]
    pub fn session(&self) -> Session {
        self.tx.borrow().clone()
    }

    /// Receiver that observes every session change.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Session> {
        self.tx.subscribe()
    }

    /// Restores a persisted session at startup. A stored token yields a
    /// provisional authenticated state that is then checked against the profile
    /// endpoint. Missing or invalid tokens leave the session empty without an
    /// error message.
    pub async fn hydrate(&self) -> Submission {
        let Some(generation) = self.begin().await else {
            return Submission::Suppressed;
        };

        let stored = persist::load(self.storage.as_ref()).unwrap_or_else(|err| {
            warn!("failed to read persisted session: {err}");
            None
        });
        let Some(stored) = stored else {
            return self.settle(generation, Settled::Empty).await;
        };

        if token::is_expired(stored.token.expose_secret()) {
            debug!("persisted token expired");
            return self.settle(generation, Settled::SignedOut).await;
        }

        {
            let mut inner = self.inner.lock().await;
            if inner.generation != generation {
                return Submission::Stale;
            }
            inner.token = Some(copy_secret(&stored.token));
            let user = stored.user.clone();
            self.tx.send_modify(|session| session.phase = Phase::Authenticated(user));
        }

        let outcome = match self.api.fetch_profile(&stored.token).await {
            Ok(user) => Settled::Session {
                token: stored.token,
                user,
            },
            Err(err) if err.is_unauthorized() => Settled::SignedOut,
            Err(err) => {
                warn!("could not validate persisted session: {err}");
                Settled::Provisional
            }
        };
        self.settle(generation, outcome).await
    }

    /// Submits credentials for the given account kind.
    pub async fn login(&self, kind: AccountKind, email_or_phone: &str, password: &SecretString) -> Submission {
        let Some(generation) = self.begin().await else {
            return Submission::Suppressed;
        };

        let email_or_phone = email_or_phone.trim().to_string();
        let outcome = match self.exchange_credentials(kind, &email_or_phone, password).await {
            Ok(Some(payload)) => self.complete(payload).await,
            Ok(None) => Settled::OtpPending {
                email_or_phone,
                pending: None,
            },
            Err(error) => Settled::Failed {
                error,
                back_to_credentials: true,
            },
        };
        self.settle(generation, outcome).await
    }

    /// Creates an account on the kind-specific endpoint. Acceptance always
    /// moves to OTP verification and keeps the credentials for it.
    pub async fn register(&self, kind: AccountKind, request: RegisterRequest) -> Submission {
        let Some(generation) = self.begin().await else {
            return Submission::Suppressed;
        };

        let outcome = match self.api.register(kind, &request).await {
            Ok(()) => {
                let email_or_phone = request.email.trim().to_string();
                Settled::OtpPending {
                    pending: Some(PendingRegistration {
                        kind,
                        email_or_phone: email_or_phone.clone(),
                        password: SecretString::from(request.password),
                    }),
                    email_or_phone,
                }
            }
            Err(error) => Settled::Failed {
                error,
                back_to_credentials: false,
            },
        };
        self.settle(generation, outcome).await
    }

    /// Exchanges a one-time code for a session. Failures keep the pending state
    /// so the code can be retried; there is no client-side attempt limit.
    pub async fn verify_otp(&self, email_or_phone: &str, code: &str) -> Submission {
        let Some(generation) = self.begin().await else {
            return Submission::Suppressed;
        };

        let email_or_phone = email_or_phone.trim().to_string();
        let pending = {
            let inner = self.inner.lock().await;
            inner.pending.as_ref().map(|pending| {
                (
                    pending.kind,
                    pending.email_or_phone.clone(),
                    copy_secret(&pending.password),
                )
            })
        };

        if let Some((_, expected, _)) = &pending {
            if !expected.eq_ignore_ascii_case(&email_or_phone) {
                let error = AppError::Validation(
                    "The verification code was sent to a different account.".to_string(),
                );
                return self.settle(generation, Settled::Failed { error, back_to_credentials: false }).await;
            }
        }

        let request = VerifyOtpRequest {
            email_or_phone: email_or_phone.clone(),
            otp: code.trim().to_string(),
        };
        let outcome = match self.api.verify_otp(&request).await {
            Ok(AuthReply::Token(payload)) => self.complete(payload).await,
            Ok(AuthReply::Verified(_)) => match pending {
                Some((kind, email_or_phone, password)) => {
                    match self.exchange_credentials(kind, &email_or_phone, &password).await {
                        Ok(Some(payload)) => self.complete(payload).await,
                        Ok(None) => Settled::OtpPending {
                            email_or_phone,
                            pending: None,
                        },
                        Err(error) => Settled::Failed {
                            error,
                            back_to_credentials: false,
                        },
                    }
                }
                None => Settled::Failed {
                    error: AppError::Validation("Account verified. Please sign in.".to_string()),
                    back_to_credentials: true,
                },
            },
            Ok(AuthReply::OtpSent(_)) => Settled::Failed {
                error: AppError::Parse("Verification did not return a session.".to_string()),
                back_to_credentials: false,
            },
            Err(error) => Settled::Failed {
                error,
                back_to_credentials: false,
            },
        };
        self.settle(generation, outcome).await
    }

    /// Clears local state unconditionally, then tells the backend. Backend
    /// failures are logged and ignored.
    pub async fn logout(&self) {
        let token = self.reset().await;
        if let Some(token) = token {
            if let Err(err) = self.api.logout(&token).await {
                warn!("logout request failed: {err}");
            }
        }
        info!("signed out");
    }

    /// Same reset as logout without contacting the backend. Used when any
    /// authenticated call answers 401.
    pub async fn expire(&self) {
        if self.reset().await.is_some() {
            info!("session expired");
        }
    }

    /// Clears the error message only.
    pub fn clear_error(&self) {
        self.tx.send_if_modified(|session| session.error.take().is_some());
    }

    /// Drops a pending registration when the user leaves the OTP step.
    pub async fn abandon_registration(&self) {
        let mut inner = self.inner.lock().await;
        inner.pending = None;
        self.tx.send_if_modified(|session| {
            if session.otp_sent() && !session.loading {
                session.phase = Phase::Anonymous;
                session.error = None;
                true
            } else {
                false
            }
        });
    }

    /// Runs an authenticated API call with the current bearer token. A 401
    /// answer resets the session like [`SessionStore::expire`].
    ///
    /// # Errors
    /// Returns the call's error, or a 401 `AppError::Http` when no session exists.
    pub async fn call_authenticated<T, F, Fut>(&self, call: F) -> Result<T, AppError>
    where
        F: FnOnce(SecretString) -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        let (token, generation) = {
            let inner = self.inner.lock().await;
            (inner.token.as_ref().map(copy_secret), inner.generation)
        };
        let Some(token) = token else {
            return Err(AppError::Http {
                status: 401,
                message: "You are not signed in.".to_string(),
            });
        };

        let result = call(token).await;
        if let Err(err) = &result {
            if err.is_unauthorized() && self.inner.lock().await.generation == generation {
                self.expire().await;
            }
        }
        result
    }

    /// Refreshes the profile through [`SessionStore::call_authenticated`].
    ///
    /// # Errors
    /// Returns the profile call's error.
    pub async fn refresh_profile(&self) -> Result<UserProfile, AppError> {
        let generation = self.inner.lock().await.generation;
        let api = Arc::clone(&self.api);
        let user = self
            .call_authenticated(|token| async move { api.fetch_profile(&token).await })
            .await?;

        let inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!("dropping profile for a reset session");
            return Ok(user);
        }
        if let Some(token) = &inner.token {
            if let Err(err) = persist::save(self.storage.as_ref(), token, &user) {
                warn!("failed to persist refreshed profile: {err}");
            }
            let updated = user.clone();
            self.tx.send_modify(|session| session.phase = Phase::Authenticated(updated));
        }
        Ok(user)
    }

    /// Marks a request as in flight. Returns `None` when one already is.
    async fn begin(&self) -> Option<u64> {
        let inner = self.inner.lock().await;
        let started = self.tx.send_if_modified(|session| {
            if session.loading {
                false
            } else {
                session.loading = true;
                session.error = None;
                true
            }
        });
        if started {
            Some(inner.generation)
        } else {
            debug!("request already in flight");
            None
        }
    }

    /// Sends credentials. `Ok(None)` means a code was sent instead of a token.
    async fn exchange_credentials(
        &self,
        kind: AccountKind,
        email_or_phone: &str,
        password: &SecretString,
    ) -> Result<Option<TokenPayload>, AppError> {
        let request = LoginRequest {
            email_or_phone: email_or_phone.to_string(),
            password: password.expose_secret().to_string(),
        };
        match self.api.login(kind, &request).await? {
            AuthReply::Token(payload) => Ok(Some(payload)),
            AuthReply::OtpSent(_) => Ok(None),
            AuthReply::Verified(_) => Err(AppError::Parse("Sign in did not return a session.".to_string())),
        }
    }

    /// Fills in the profile when the token payload did not carry one.
    async fn complete(&self, payload: TokenPayload) -> Settled {
        let user = match payload.user {
            Some(user) => Ok(user),
            None => self.api.fetch_profile(&payload.token).await,
        };
        match user {
            Ok(user) => Settled::Session {
                token: payload.token,
                user,
            },
            Err(error) => Settled::Failed {
                error,
                back_to_credentials: false,
            },
        }
    }

    /// Applies an outcome if the session was not reset in the meantime.
    async fn settle(&self, generation: u64, outcome: Settled) -> Submission {
        let mut inner = self.inner.lock().await;
        if inner.generation != generation {
            debug!("dropping response for a reset session");
            return Submission::Stale;
        }

        match outcome {
            Settled::Session { token, user } => {
                if let Err(err) = persist::save(self.storage.as_ref(), &token, &user) {
                    warn!("failed to persist session: {err}");
                }
                inner.token = Some(token);
                inner.pending = None;
                self.tx.send_modify(|session| {
                    session.loading = false;
                    session.error = None;
                    session.phase = Phase::Authenticated(user);
                });
                info!("session established");
                Submission::Authenticated
            }
            Settled::OtpPending {
                email_or_phone,
                pending,
            } => {
                inner.pending = pending;
                self.tx.send_modify(|session| {
                    session.loading = false;
                    session.phase = Phase::OtpPending { email_or_phone };
                });
                debug!("one-time code sent");
                Submission::OtpRequired
            }
            Settled::Failed { error, back_to_credentials } => {
                let message = error.user_message();
                debug!("request rejected: {error}");
                self.tx.send_modify(|session| {
                    session.loading = false;
                    session.error = Some(message);
                    if back_to_credentials && session.otp_sent() {
                        session.phase = Phase::Anonymous;
                    }
                });
                Submission::Rejected
            }
            Settled::Provisional => {
                self.tx.send_modify(|session| session.loading = false);
                Submission::Authenticated
            }
            Settled::Empty => {
                self.tx.send_modify(|session| session.loading = false);
                Submission::Anonymous
            }
            Settled::SignedOut => {
                if let Err(err) = persist::clear(self.storage.as_ref()) {
                    warn!("failed to clear persisted session: {err}");
                }
                inner.token = None;
                inner.pending = None;
                self.tx.send_replace(Session::default());
                Submission::Anonymous
            }
        }
    }

    /// Bumps the generation, clears storage and publishes an empty session.
    /// Returns the token that was active, if any.
    async fn reset(&self) -> Option<SecretString> {
        let mut inner = self.inner.lock().await;
        inner.generation += 1;
        inner.pending = None;
        if let Err(err) = persist::clear(self.storage.as_ref()) {
            warn!("failed to clear persisted session: {err}");
        }
        self.tx.send_replace(Session::default());
        inner.token.take()
    }
}

fn copy_secret(secret: &SecretString) -> SecretString {
    SecretString::from(secret.expose_secret().to_string())
}
