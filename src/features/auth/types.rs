//! Request and response types for auth-related API calls. These payloads carry
//! passwords, one-time codes and bearer tokens, so they must never be logged.

pub use crate::features::users::types::UserProfile;

use crate::app_lib::AppError;
use secrecy::SecretString;
use serde::Serialize;
use serde_json::Value;

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub email_or_phone: String,
    pub password: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyOtpRequest {
    pub email_or_phone: String,
    pub otp: String,
}

/// New-account payload. The account kind picks the endpoint and is not sent.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub business_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub national_id: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ForgotPasswordRequest {
    pub email_or_phone: String,
}

#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SetPasswordRequest {
    pub email_or_phone: String,
    pub password: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reset_token: Option<String>,
}

/// Bearer token and, when the backend includes it, the profile.
#[derive(Debug)]
pub struct TokenPayload {
    pub token: SecretString,
    pub user: Option<UserProfile>,
}

/// Interpretation of a login, registration or verification response body.
#[derive(Debug)]
pub enum AuthReply {
    /// The exchange completed and a session token was issued.
    Token(TokenPayload),
    /// The backend accepted the request and sent a one-time code.
    OtpSent(String),
    /// The backend confirmed the request without issuing a token.
    Verified(String),
}

/// Interprets a response body that is either a JSON token payload, a JSON
/// status object, or a bare status string.
///
/// # Errors
/// Returns `AppError::Parse` when the body matches none of the known shapes.
pub fn interpret_auth_reply(body: &str) -> Result<AuthReply, AppError> {
    let trimmed = body.trim();
    let value = serde_json::from_str::<Value>(trimmed).unwrap_or_else(|_| Value::String(trimmed.to_string()));

    match value {
        Value::Object(object) => {
            let token = ["token", "accessToken", "access_token", "authToken"]
                .iter()
                .find_map(|key| object.get(*key).and_then(Value::as_str))
                .map(str::trim)
                .filter(|token| !token.is_empty());
            let message = ["message", "status"]
                .iter()
                .find_map(|key| object.get(*key).and_then(Value::as_str))
                .unwrap_or_default()
                .to_string();

            if let Some(token) = token {
                let user = object
                    .get("user")
                    .cloned()
                    .map(serde_json::from_value::<UserProfile>)
                    .transpose()
                    .map_err(|err| AppError::Parse(format!("Invalid user in token payload: {err}")))?;
                return Ok(AuthReply::Token(TokenPayload {
                    token: SecretString::from(token.to_string()),
                    user,
                }));
            }

            let flag = |keys: &[&str]| keys.iter().any(|key| object.get(*key).and_then(Value::as_bool) == Some(true));
            if flag(&["otpSent", "otp_sent", "otpRequired"]) {
                Ok(AuthReply::OtpSent(message))
            } else if flag(&["verified"]) {
                Ok(AuthReply::Verified(message))
            } else if let Some(reply) = classify_message(&message) {
                Ok(reply)
            } else if flag(&["success"]) {
                Ok(AuthReply::Verified(message))
            } else {
                Err(AppError::Parse("Unrecognized authentication response.".to_string()))
            }
        }
        Value::String(message) => classify_message(&message)
            .ok_or_else(|| AppError::Parse("Unrecognized authentication response.".to_string())),
        _ => Err(AppError::Parse("Unrecognized authentication response.".to_string())),
    }
}

/// Reads a bare status message. "verified" wins over a mention of the code,
/// so "OTP verified successfully" completes verification.
fn classify_message(message: &str) -> Option<AuthReply> {
    let lowered = message.to_lowercase();
    if lowered.contains("verified") {
        Some(AuthReply::Verified(message.to_string()))
    } else if lowered.contains("otp") || lowered.contains("one-time") || lowered.contains("verification code") {
        Some(AuthReply::OtpSent(message.to_string()))
    } else if lowered.contains("success") {
        Some(AuthReply::Verified(message.to_string()))
    } else {
        None
    }
}
