//! Password recovery: request a code, verify it, then set a new password. It
//! follows the same one-time-code pattern as sign-in but never touches the
//! session; the user signs in with the new password afterwards.

use crate::{
    app_lib::AppError,
    features::{
        auth::{
            client::AuthApi,
            types::{ForgotPasswordRequest, SetPasswordRequest, VerifyOtpRequest},
        },
        forms::validation::{validate_confirm_password, validate_password},
    },
};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RecoveryStage {
    RequestCode,
    VerifyCode,
    SetPassword,
    Done,
}

/// One password-recovery attempt.
pub struct RecoveryFlow {
    api: Arc<dyn AuthApi>,
    stage: RecoveryStage,
    email_or_phone: Option<String>,
    reset_token: Option<SecretString>,
    error: Option<String>,
}

impl RecoveryFlow {
    #[must_use]
    pub fn new(api: Arc<dyn AuthApi>) -> Self {
        Self {
            api,
            stage: RecoveryStage::RequestCode,
            email_or_phone: None,
            reset_token: None,
            error: None,
        }
    }

    #[must_use]
    pub fn stage(&self) -> RecoveryStage {
        self.stage
    }

    #[must_use]
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Resumes at the code step for an account that already received a code,
    /// e.g. when the code is entered in a later invocation.
    #[must_use]
    pub fn resume(api: Arc<dyn AuthApi>, email_or_phone: &str) -> Self {
        Self {
            stage: RecoveryStage::VerifyCode,
            email_or_phone: Some(email_or_phone.trim().to_string()),
            ..Self::new(api)
        }
    }

    /// Asks the backend to send a reset code. Allowed again from the code step
    /// to resend.
    ///
    /// # Errors
    /// Returns the validation or backend error, which is also kept in `error()`.
    pub async fn request_code(&mut self, email_or_phone: &str) -> Result<RecoveryStage, AppError> {
        let email_or_phone = email_or_phone.trim().to_string();
        if email_or_phone.is_empty() {
            return self.fail(AppError::Validation("Email or phone is required.".to_string()));
        }
        if !matches!(self.stage, RecoveryStage::RequestCode | RecoveryStage::VerifyCode) {
            return self.fail(AppError::Validation("A reset is already in progress.".to_string()));
        }

        let request = ForgotPasswordRequest {
            email_or_phone: email_or_phone.clone(),
        };
        match self.api.forgot_password(&request).await {
            Ok(()) => {
                debug!("password reset code sent");
                self.email_or_phone = Some(email_or_phone);
                self.advance(RecoveryStage::VerifyCode)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Verifies the reset code. Failures stay on the code step for a retry.
    ///
    /// # Errors
    /// Returns the validation or backend error, which is also kept in `error()`.
    pub async fn verify_code(&mut self, code: &str) -> Result<RecoveryStage, AppError> {
        let Some(email_or_phone) = self.email_or_phone.clone().filter(|_| self.stage == RecoveryStage::VerifyCode)
        else {
            return self.fail(AppError::Validation("Request a reset code first.".to_string()));
        };
        if code.trim().is_empty() {
            return self.fail(AppError::Validation("Enter the verification code.".to_string()));
        }

        let request = VerifyOtpRequest {
            email_or_phone,
            otp: code.trim().to_string(),
        };
        match self.api.verify_forgot_password_otp(&request).await {
            Ok(reset_token) => {
                self.reset_token = reset_token;
                self.advance(RecoveryStage::SetPassword)
            }
            Err(err) => self.fail(err),
        }
    }

    /// Stores the new password after local policy checks.
    ///
    /// # Errors
    /// Returns the validation or backend error, which is also kept in `error()`.
    pub async fn set_password(&mut self, password: &SecretString, confirm: &SecretString) -> Result<RecoveryStage, AppError> {
        let Some(email_or_phone) = self.email_or_phone.clone().filter(|_| self.stage == RecoveryStage::SetPassword)
        else {
            return self.fail(AppError::Validation("Verify the reset code first.".to_string()));
        };
        if let Err(message) = validate_password(password.expose_secret())
            .and_then(|()| validate_confirm_password(password.expose_secret(), confirm.expose_secret()))
        {
            return self.fail(AppError::Validation(message));
        }

        let request = SetPasswordRequest {
            email_or_phone,
            password: password.expose_secret().to_string(),
            reset_token: self
                .reset_token
                .as_ref()
                .map(|token| token.expose_secret().to_string()),
        };
        match self.api.set_password(&request).await {
            Ok(()) => {
                info!("password reset completed");
                self.reset_token = None;
                self.advance(RecoveryStage::Done)
            }
            Err(err) => self.fail(err),
        }
    }

    fn advance(&mut self, stage: RecoveryStage) -> Result<RecoveryStage, AppError> {
        self.stage = stage;
        self.error = None;
        Ok(stage)
    }

    fn fail(&mut self, err: AppError) -> Result<RecoveryStage, AppError> {
        self.error = Some(err.user_message());
        Err(err)
    }
}
