use thiserror::Error;

/// Failures surfaced by API helpers, storage and local validation.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum AppError {
    #[error("Config error: {0}")]
    Config(String),
    #[error("Network error: {0}")]
    Network(String),
    #[error("Timeout: {0}")]
    Timeout(String),
    #[error("Request failed ({status}): {message}")]
    Http { status: u16, message: String },
    #[error("Response error: {0}")]
    Parse(String),
    #[error("Request error: {0}")]
    Serialization(String),
    #[error("Storage error: {0}")]
    Storage(String),
    #[error("{0}")]
    Validation(String),
}

impl AppError {
    /// True for a 401 response, which the session store treats as expiry.
    #[must_use]
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, AppError::Http { status: 401, .. })
    }

    /// True when the server could not be reached at all.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        matches!(self, AppError::Network(_) | AppError::Timeout(_))
    }

    /// Form-level message. Transport failures and backend rejections only
    /// differ in wording.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            AppError::Network(_) | AppError::Timeout(_) => {
                "Unable to reach the server. Please check your connection and try again.".to_string()
            }
            AppError::Http { message, .. } | AppError::Validation(message) => message.clone(),
            other => other.to_string(),
        }
    }
}
