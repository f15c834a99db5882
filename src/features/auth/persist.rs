//! Persisted session: the `authToken` and `user` keys, always written and
//! removed as one batch.

use crate::{
    app_lib::{AppError, KeyValueStore},
    features::auth::types::UserProfile,
};
use secrecy::{ExposeSecret, SecretString};
use tracing::warn;

pub const AUTH_TOKEN_KEY: &str = "authToken";
pub const USER_KEY: &str = "user";

/// Token and profile restored from storage.
#[derive(Debug)]
pub struct StoredSession {
    pub token: SecretString,
    pub user: UserProfile,
}

/// Writes both keys together.
///
/// # Errors
/// Returns `AppError` if the profile cannot be encoded or the store rejects the batch.
pub fn save(store: &dyn KeyValueStore, token: &SecretString, user: &UserProfile) -> Result<(), AppError> {
    let user = serde_json::to_string(user)
        .map_err(|err| AppError::Serialization(format!("Failed to encode user: {err}")))?;
    store.set_many(&[
        (AUTH_TOKEN_KEY, token.expose_secret().to_string()),
        (USER_KEY, user),
    ])
}

/// Reads both keys. A half-written or unreadable pair is cleared and treated as
/// no session.
///
/// # Errors
/// Returns `AppError::Storage` only if the store itself cannot be read.
pub fn load(store: &dyn KeyValueStore) -> Result<Option<StoredSession>, AppError> {
    let token = store.get(AUTH_TOKEN_KEY)?.filter(|token| !token.trim().is_empty());
    let user = store.get(USER_KEY)?;

    match (token, user) {
        (None, None) => Ok(None),
        (Some(token), Some(user)) => match serde_json::from_str::<UserProfile>(&user) {
            Ok(user) => Ok(Some(StoredSession {
                token: SecretString::from(token),
                user,
            })),
            Err(err) => {
                warn!("discarding persisted session with unreadable user: {err}");
                clear(store)?;
                Ok(None)
            }
        },
        _ => {
            warn!("discarding incomplete persisted session");
            clear(store)?;
            Ok(None)
        }
    }
}

/// Removes both keys together.
///
/// # Errors
/// Returns `AppError::Storage` if the store rejects the batch.
pub fn clear(store: &dyn KeyValueStore) -> Result<(), AppError> {
    store.remove_many(&[AUTH_TOKEN_KEY, USER_KEY])
}
