//! Local inspection of bearer tokens. Only the `exp` claim of a JWT is read to
//! skip a doomed round-trip at hydration; signatures are never checked here and
//! the backend stays the authority on validity.

use base64ct::{Base64UrlUnpadded, Encoding};
use serde::Deserialize;
use std::time::{SystemTime, UNIX_EPOCH};

#[derive(Deserialize)]
struct Claims {
    exp: Option<u64>,
}

/// Returns the `exp` claim (seconds since the epoch) of a JWT, or `None` when
/// the token is opaque or the claim is absent.
#[must_use]
pub fn expires_at(token: &str) -> Option<u64> {
    let mut parts = token.trim().split('.');
    let (_header, payload, _signature) = (parts.next()?, parts.next()?, parts.next()?);
    if parts.next().is_some() {
        return None;
    }

    let bytes = Base64UrlUnpadded::decode_vec(payload.trim_end_matches('=')).ok()?;
    let claims: Claims = serde_json::from_slice(&bytes).ok()?;
    claims.exp
}

/// True only when the token carries an `exp` claim that is not after `now`.
#[must_use]
pub fn is_expired_at(token: &str, now: u64) -> bool {
    expires_at(token).is_some_and(|exp| exp <= now)
}

#[must_use]
pub fn is_expired(token: &str) -> bool {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|elapsed| elapsed.as_secs())
        .unwrap_or_default();
    is_expired_at(token, now)
}

#[cfg(test)]
pub(crate) fn jwt_with_exp(exp: u64) -> String {
    let header = Base64UrlUnpadded::encode_string(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = Base64UrlUnpadded::encode_string(format!(r#"{{"sub":"1","exp":{exp}}}"#).as_bytes());
    format!("{header}.{payload}.c2lnbmF0dXJl")
}
