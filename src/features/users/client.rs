use crate::{
    app_lib::{ApiClient, AppError},
    features::users::types::{ProfileEnvelope, UserProfile},
};
use secrecy::SecretString;

pub const PROFILE_PATH: &str = "/api/users/profile";

/// Fetches the current user's profile with the bearer token.
/// A 401 here means the token is no longer valid.
///
/// # Errors
/// Returns an `AppError` on transport failure, non-success status or an unexpected body.
pub async fn fetch_profile(api: &ApiClient, token: &SecretString) -> Result<UserProfile, AppError> {
    let envelope: ProfileEnvelope = api.get_json_with_token(PROFILE_PATH, token).await?;
    Ok(envelope.into_profile())
}
