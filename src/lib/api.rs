//! HTTP helpers for JSON APIs with consistent timeouts and error handling. Feature
//! clients use these helpers to avoid duplicating request setup and to enforce a
//! predictable timeout policy. The helpers never store tokens; callers pass the
//! bearer token per request and it is only ever written to the `Authorization`
//! header.

use super::{APP_USER_AGENT, config::AppConfig, errors::AppError};
use reqwest::{Client, Method, Response};
use secrecy::{ExposeSecret, SecretString};
use serde::{Serialize, de::DeserializeOwned};
use serde_json::to_string;
use std::time::Duration;
use tracing::{Instrument, debug, info_span};
use ulid::Ulid;
use url::Url;

/// Maximum number of error body characters surfaced to the UI.
const MAX_ERROR_CHARS: usize = 200;

/// Thin wrapper around a configured `reqwest::Client` and the API base URL.
#[derive(Clone, Debug)]
pub struct ApiClient {
    http: Client,
    base_url: String,
}

impl ApiClient {
    /// Builds a client for `config.api_base_url` with the configured timeout.
    ///
    /// # Errors
    /// Returns `AppError::Config` if the base URL is not an absolute http(s) URL
    /// or the HTTP client cannot be initialized.
    pub fn new(config: &AppConfig) -> Result<Self, AppError> {
        let parsed = Url::parse(config.api_base_url.trim()).map_err(|err| {
            AppError::Config(format!("Invalid API base URL '{}': {err}", config.api_base_url))
        })?;
        if !matches!(parsed.scheme(), "http" | "https") {
            return Err(AppError::Config(format!(
                "Unsupported API scheme: {}",
                parsed.scheme()
            )));
        }

        let http = Client::builder()
            .user_agent(APP_USER_AGENT)
            .timeout(Duration::from_millis(config.request_timeout_ms))
            .build()
            .map_err(|err| AppError::Config(format!("Failed to initialize HTTP client: {err}")))?;

        Ok(Self {
            http,
            base_url: config.api_base_url.clone(),
        })
    }

    /// Fetches JSON with a bearer token for authenticated APIs.
    ///
    /// # Errors
    /// Returns an `AppError` on transport failure, non-success status, or an undecodable body.
    pub async fn get_json_with_token<T: DeserializeOwned>(
        &self,
        path: &str,
        token: &SecretString,
    ) -> Result<T, AppError> {
        let response = self.send(Method::GET, path, None, Some(token)).await?;
        handle_json_response(response).await
    }

    /// Posts JSON and returns the raw response body. Used where the backend
    /// answers with either a JSON payload or a bare status string.
    ///
    /// # Errors
    /// Returns an `AppError` on encoding, transport or status failure.
    pub async fn post_json_text<B: Serialize>(&self, path: &str, body: &B) -> Result<String, AppError> {
        let payload = encode(body)?;
        let response = self.send(Method::POST, path, Some(payload), None).await?;
        handle_text_response(response).await
    }

    /// Posts JSON and expects no meaningful response body.
    ///
    /// # Errors
    /// Returns an `AppError` on encoding, transport or status failure.
    pub async fn post_json<B: Serialize>(&self, path: &str, body: &B) -> Result<(), AppError> {
        let payload = encode(body)?;
        let response = self.send(Method::POST, path, Some(payload), None).await?;
        handle_empty_response(response).await
    }

    /// Posts an empty body with a bearer token, used to clear a session.
    ///
    /// # Errors
    /// Returns an `AppError` on transport or status failure.
    pub async fn post_empty_with_token(&self, path: &str, token: &SecretString) -> Result<(), AppError> {
        let response = self.send(Method::POST, path, None, Some(token)).await?;
        handle_empty_response(response).await
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        payload: Option<String>,
        token: Option<&SecretString>,
    ) -> Result<Response, AppError> {
        let url = build_url_with_base(&self.base_url, path);
        let request_id = Ulid::new().to_string();
        let span = info_span!(
            "api.request",
            http.method = %method,
            path = %path,
            request_id = %request_id
        );

        let mut builder = self
            .http
            .request(method, &url)
            .header("X-Request-Id", &request_id);
        if let Some(token) = token {
            builder = builder.bearer_auth(token.expose_secret());
        }
        if let Some(payload) = payload {
            builder = builder
                .header("Content-Type", "application/json")
                .body(payload);
        }

        async move {
            let response = builder.send().await.map_err(map_request_error)?;
            debug!(status = response.status().as_u16(), "response received");
            Ok(response)
        }
        .instrument(span)
        .await
    }
}

fn encode<B: Serialize>(body: &B) -> Result<String, AppError> {
    to_string(body).map_err(|err| AppError::Serialization(format!("Failed to encode request: {err}")))
}

/// Builds a URL from an explicit base URL and the provided path.
fn build_url_with_base(base_url: &str, path: &str) -> String {
    let base = base_url.trim().trim_end_matches('/');
    let path = path.trim();

    if base.is_empty() {
        path.to_string()
    } else {
        format!("{}/{}", base, path.trim_start_matches('/'))
    }
}

/// Maps transport errors into user-facing `AppError` variants with timeout detection.
fn map_request_error(err: reqwest::Error) -> AppError {
    if err.is_timeout() {
        AppError::Timeout("Request timed out. Please try again.".to_string())
    } else {
        AppError::Network(format!("Unable to reach the server: {err}"))
    }
}

/// Parses JSON responses and surfaces HTTP errors with sanitized bodies.
async fn handle_json_response<T: DeserializeOwned>(response: Response) -> Result<T, AppError> {
    if response.status().is_success() {
        response
            .json::<T>()
            .await
            .map_err(|err| AppError::Parse(format!("Failed to decode response: {err}")))
    } else {
        Err(http_error(response).await)
    }
}

/// Returns the raw body of a successful response.
async fn handle_text_response(response: Response) -> Result<String, AppError> {
    if response.status().is_success() {
        response
            .text()
            .await
            .map_err(|err| AppError::Parse(format!("Failed to read response: {err}")))
    } else {
        Err(http_error(response).await)
    }
}

/// Handles empty responses and returns sanitized HTTP errors when needed.
async fn handle_empty_response(response: Response) -> Result<(), AppError> {
    if response.status().is_success() {
        Ok(())
    } else {
        Err(http_error(response).await)
    }
}

async fn http_error(response: Response) -> AppError {
    let status = response.status().as_u16();
    let body = response.text().await.unwrap_or_default();
    AppError::Http {
        status,
        message: sanitize_body(&body),
    }
}

/// Sanitizes HTTP error bodies for user-facing messages. JSON bodies with a
/// `message` or `error` field are reduced to that field; everything is trimmed
/// and truncated.
fn sanitize_body(body: &str) -> String {
    let trimmed = body.trim();
    let extracted = serde_json::from_str::<serde_json::Value>(trimmed)
        .ok()
        .and_then(|value| {
            ["message", "error"]
                .iter()
                .find_map(|key| value.get(*key).and_then(serde_json::Value::as_str).map(str::to_string))
                .or_else(|| value.as_str().map(str::to_string))
        });
    let text = extracted.as_deref().unwrap_or(trimmed).trim();

    if text.is_empty() {
        "Request failed.".to_string()
    } else {
        text.chars().take(MAX_ERROR_CHARS).collect()
    }
}
