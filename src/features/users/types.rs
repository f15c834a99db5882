use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Profile of the signed-in account as returned by the backend. The role is a
/// free-form string; normalize it with `features::auth::role::Role::parse`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserProfile {
    #[serde(alias = "_id", alias = "userId", deserialize_with = "string_or_number")]
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<String>,
    #[serde(default, alias = "is_verified")]
    pub is_verified: bool,
}

/// `GET /api/users/profile` answers either with the profile itself or with the
/// profile wrapped in `user` or `data`.
#[derive(Deserialize)]
#[serde(untagged)]
pub(crate) enum ProfileEnvelope {
    User { user: UserProfile },
    Data { data: UserProfile },
    Bare(UserProfile),
}

impl ProfileEnvelope {
    pub(crate) fn into_profile(self) -> UserProfile {
        match self {
            ProfileEnvelope::User { user } => user,
            ProfileEnvelope::Data { data } => data,
            ProfileEnvelope::Bare(profile) => profile,
        }
    }
}

fn string_or_number<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    match Value::deserialize(deserializer)? {
        Value::String(value) => Ok(value),
        Value::Number(value) => Ok(value.to_string()),
        other => Err(serde::de::Error::custom(format!(
            "expected string or number id, got {other}"
        ))),
    }
}
