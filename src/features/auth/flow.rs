//! Credential/OTP flow for one login or registration form. The step is read
//! from the session phase, so the form and every other consumer agree on where
//! the flow stands:
//!
//! `Credentials` → submit → `OtpPending` (code sent) or `Authenticated`
//! `OtpPending` → submit code → `Authenticated`, or stay with an error
//!
//! There is no client-side attempt limit; the backend enforces one.

use crate::{
    app_lib::AppError,
    features::{
        auth::{
            role::AccountKind,
            session::Phase,
            state::{SessionStore, Submission},
            types::RegisterRequest,
        },
        forms::validation::{Field, FieldErrors, RegistrationForm},
    },
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

/// Where a form's flow stands.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FlowStep {
    Credentials,
    OtpPending,
    Authenticated,
}

/// Result of submitting a form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum FormOutcome {
    /// The request went to the store.
    Submitted(Submission),
    /// Local validation failed; nothing was sent.
    Invalid(FieldErrors),
}

/// Login/registration controller bound to one account kind.
pub struct CredentialFlow {
    kind: AccountKind,
    store: Arc<SessionStore>,
}

impl CredentialFlow {
    #[must_use]
    pub fn new(kind: AccountKind, store: Arc<SessionStore>) -> Self {
        Self { kind, store }
    }

    #[must_use]
    pub fn kind(&self) -> AccountKind {
        self.kind
    }

    #[must_use]
    pub fn step(&self) -> FlowStep {
        match self.store.session().phase {
            Phase::Anonymous => FlowStep::Credentials,
            Phase::OtpPending { .. } => FlowStep::OtpPending,
            Phase::Authenticated(_) => FlowStep::Authenticated,
        }
    }

    /// True while a request is in flight; the submit control should be disabled.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.store.session().loading
    }

    /// Submits the login form.
    pub async fn submit_credentials(&self, email_or_phone: &str, password: &SecretString) -> FormOutcome {
        let mut errors = FieldErrors::new();
        if email_or_phone.trim().is_empty() {
            errors.insert(Field::Email, "Email or phone is required.".to_string());
        }
        if password.expose_secret().is_empty() {
            errors.insert(Field::Password, "Password is required.".to_string());
        }
        if !errors.is_empty() {
            return FormOutcome::Invalid(errors);
        }

        self.store.clear_error();
        FormOutcome::Submitted(self.store.login(self.kind, email_or_phone, password).await)
    }

    /// Validates and submits the registration form.
    pub async fn submit_registration(&self, form: &RegistrationForm) -> FormOutcome {
        let errors = form.validate_all();
        if !errors.is_empty() {
            return FormOutcome::Invalid(errors);
        }

        let request = RegisterRequest {
            name: form.name.trim().to_string(),
            email: form.email.trim().to_string(),
            phone: form.phone.trim().to_string(),
            password: form.password.clone(),
            business_name: form
                .business_name
                .as_deref()
                .map(str::trim)
                .filter(|name| !name.is_empty())
                .map(str::to_string),
            national_id: form.national_id.as_deref().map(|id| id.trim().to_string()),
        };
        self.store.clear_error();
        FormOutcome::Submitted(self.store.register(self.kind, request).await)
    }

    /// Submits the one-time code for the account it was sent to.
    ///
    /// # Errors
    /// Returns `AppError::Validation` when no code is pending or the code is empty.
    pub async fn submit_code(&self, code: &str) -> Result<Submission, AppError> {
        let session = self.store.session();
        let target = session
            .otp_target()
            .ok_or_else(|| AppError::Validation("No verification code is pending.".to_string()))?;
        if code.trim().is_empty() {
            return Err(AppError::Validation("Enter the verification code.".to_string()));
        }
        Ok(self.store.verify_otp(target, code).await)
    }

    /// Leaves the code step and returns to the credentials form.
    pub async fn back_to_credentials(&self) {
        self.store.abandon_registration().await;
    }
}
