//! Client wrappers for the marketplace auth API. The [`AuthApi`] trait is the
//! seam between the session store and the network; [`HttpAuthApi`] is the real
//! implementation on top of the shared HTTP helpers. Request bodies carry
//! passwords and codes and must never be logged.

use crate::{
    app_lib::{ApiClient, AppError},
    features::{
        auth::{
            role::AccountKind,
            types::{
                AuthReply, ForgotPasswordRequest, LoginRequest, RegisterRequest,
                SetPasswordRequest, VerifyOtpRequest, interpret_auth_reply,
            },
        },
        users::{client as users_client, types::UserProfile},
    },
};
use async_trait::async_trait;
use secrecy::SecretString;
use serde_json::Value;

pub const VERIFY_OTP_PATH: &str = "/auth/verify-otp";
pub const LOGOUT_PATH: &str = "/auth/logout";
pub const FORGOT_PASSWORD_PATH: &str = "/auth/forgot-password";
pub const VERIFY_FORGOT_PASSWORD_OTP_PATH: &str = "/auth/verify-forgot-password-otp";
pub const SET_PASSWORD_PATH: &str = "/auth/set-password";

/// Backend operations used by the session store and the recovery flow.
#[async_trait]
pub trait AuthApi: Send + Sync {
    /// Submits credentials. The reply is either a token or "code sent".
    async fn login(&self, kind: AccountKind, request: &LoginRequest) -> Result<AuthReply, AppError>;

    /// Creates an account. Acceptance always leads to OTP verification.
    async fn register(&self, kind: AccountKind, request: &RegisterRequest) -> Result<(), AppError>;

    /// Exchanges a one-time code for a token, or confirms the account.
    async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<AuthReply, AppError>;

    /// Invalidates the session on the server.
    async fn logout(&self, token: &SecretString) -> Result<(), AppError>;

    /// Fetches the profile of the token owner.
    async fn fetch_profile(&self, token: &SecretString) -> Result<UserProfile, AppError>;

    /// Sends a password-reset code.
    async fn forgot_password(&self, request: &ForgotPasswordRequest) -> Result<(), AppError>;

    /// Checks a password-reset code. Returns the reset token if one is issued.
    async fn verify_forgot_password_otp(
        &self,
        request: &VerifyOtpRequest,
    ) -> Result<Option<SecretString>, AppError>;

    /// Stores the new password.
    async fn set_password(&self, request: &SetPasswordRequest) -> Result<(), AppError>;
}

/// `AuthApi` over HTTP.
#[derive(Clone, Debug)]
pub struct HttpAuthApi {
    api: ApiClient,
}

impl HttpAuthApi {
    #[must_use]
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }
}

#[async_trait]
impl AuthApi for HttpAuthApi {
    async fn login(&self, kind: AccountKind, request: &LoginRequest) -> Result<AuthReply, AppError> {
        let body = self.api.post_json_text(&kind.login_path(), request).await?;
        interpret_auth_reply(&body)
    }

    async fn register(&self, kind: AccountKind, request: &RegisterRequest) -> Result<(), AppError> {
        self.api.post_json(kind.register_path(), request).await
    }

    async fn verify_otp(&self, request: &VerifyOtpRequest) -> Result<AuthReply, AppError> {
        let body = self.api.post_json_text(VERIFY_OTP_PATH, request).await?;
        interpret_auth_reply(&body)
    }

    async fn logout(&self, token: &SecretString) -> Result<(), AppError> {
        self.api.post_empty_with_token(LOGOUT_PATH, token).await
    }

    async fn fetch_profile(&self, token: &SecretString) -> Result<UserProfile, AppError> {
        users_client::fetch_profile(&self.api, token).await
    }

    async fn forgot_password(&self, request: &ForgotPasswordRequest) -> Result<(), AppError> {
        self.api.post_json(FORGOT_PASSWORD_PATH, request).await
    }

    async fn verify_forgot_password_otp(
        &self,
        request: &VerifyOtpRequest,
    ) -> Result<Option<SecretString>, AppError> {
        let body = self
            .api
            .post_json_text(VERIFY_FORGOT_PASSWORD_OTP_PATH, request)
            .await?;
        Ok(reset_token(&body))
    }

    async fn set_password(&self, request: &SetPasswordRequest) -> Result<(), AppError> {
        self.api.post_json(SET_PASSWORD_PATH, request).await
    }
}

/// Extracts a reset token from a verify-code reply, if the backend sent one.
fn reset_token(body: &str) -> Option<SecretString> {
    let value = serde_json::from_str::<Value>(body.trim()).ok()?;
    ["resetToken", "reset_token", "token"]
        .iter()
        .find_map(|key| value.get(*key).and_then(Value::as_str))
        .map(str::trim)
        .filter(|token| !token.is_empty())
        .map(|token| SecretString::from(token.to_string()))
}
