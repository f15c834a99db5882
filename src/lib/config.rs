//! Client configuration for the backend endpoint, the local state directory and
//! the request timeout. Build-time defaults come from `option_env!` and are
//! overridden at runtime by `MARKETGATE_*` environment variables, so one binary
//! can target different backends without rebuilding. Configuration values are
//! public; do not store secrets here.

use std::path::PathBuf;

/// Default request timeout (milliseconds) applied to all HTTP helpers.
pub const DEFAULT_TIMEOUT_MS: u64 = 10_000;

/// Client configuration derived from build-time and runtime settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AppConfig {
    pub api_base_url: String,
    pub state_dir: PathBuf,
    pub request_timeout_ms: u64,
}

impl AppConfig {
    /// Loads config from build-time defaults and applies runtime overrides.
    #[must_use]
    pub fn load() -> Self {
        let api_base_url = option_env!("MARKETGATE_API_BASE_URL").unwrap_or("http://localhost:8080");
        let state_dir = option_env!("MARKETGATE_STATE_DIR")
            .map(PathBuf::from)
            .unwrap_or_else(default_state_dir);

        let mut config = Self {
            api_base_url: api_base_url.to_string(),
            state_dir,
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
        };

        apply_runtime_overrides(&mut config, runtime_config());

        config
    }

    #[must_use]
    pub fn with_api_base_url(mut self, api_base_url: impl Into<String>) -> Self {
        self.api_base_url = api_base_url.into();
        self
    }

    #[must_use]
    pub fn with_state_dir(mut self, state_dir: impl Into<PathBuf>) -> Self {
        self.state_dir = state_dir.into();
        self
    }

    #[must_use]
    pub fn with_request_timeout_ms(mut self, request_timeout_ms: u64) -> Self {
        self.request_timeout_ms = request_timeout_ms;
        self
    }

    /// Location of the persisted `authToken`/`user` pair.
    #[must_use]
    pub fn session_file(&self) -> PathBuf {
        self.state_dir.join("session.json")
    }
}

#[derive(Default)]
struct RuntimeConfig {
    api_base_url: Option<String>,
    state_dir: Option<String>,
    request_timeout_ms: Option<u64>,
}

fn apply_runtime_overrides(config: &mut AppConfig, runtime: RuntimeConfig) {
    if let Some(value) = runtime.api_base_url {
        config.api_base_url = value;
    }
    if let Some(value) = runtime.state_dir {
        config.state_dir = PathBuf::from(value);
    }
    if let Some(value) = runtime.request_timeout_ms {
        config.request_timeout_ms = value;
    }
}

fn runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        api_base_url: read_runtime_value("MARKETGATE_API_BASE_URL"),
        state_dir: read_runtime_value("MARKETGATE_STATE_DIR"),
        request_timeout_ms: read_runtime_value("MARKETGATE_TIMEOUT_MS")
            .and_then(|value| value.parse::<u64>().ok())
            .filter(|value| *value > 0),
    }
}

fn read_runtime_value(key: &str) -> Option<String> {
    let value = std::env::var(key).ok()?;
    normalize_runtime_value(&value)
}

fn normalize_runtime_value(value: &str) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn default_state_dir() -> PathBuf {
    std::env::var_os("HOME")
        .map(|home| PathBuf::from(home).join(".marketgate"))
        .unwrap_or_else(|| std::env::temp_dir().join("marketgate"))
}
