use crate::{
    app_lib::{ApiClient, AppConfig, FileStore},
    features::auth::{HttpAuthApi, SessionStore},
};
use anyhow::Result;
use std::sync::Arc;

/// Settings shared by every subcommand.
#[derive(Debug, Clone)]
pub struct GlobalArgs {
    pub config: AppConfig,
}

impl GlobalArgs {
    #[must_use]
    pub fn new(config: AppConfig) -> Self {
        Self { config }
    }

    /// Backend client for the configured base URL.
    ///
    /// # Errors
    /// Returns an error if the base URL is invalid or the HTTP client cannot be built.
    pub fn auth_api(&self) -> Result<Arc<HttpAuthApi>> {
        let api = ApiClient::new(&self.config)?;
        Ok(Arc::new(HttpAuthApi::new(api)))
    }

    /// Session store persisted in the state directory.
    ///
    /// # Errors
    /// Returns an error if the backend client cannot be built.
    pub fn session_store(&self) -> Result<Arc<SessionStore>> {
        let storage = Arc::new(FileStore::new(self.config.session_file()));
        Ok(Arc::new(SessionStore::new(self.auth_api()?, storage)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_global_args() {
        let config = AppConfig::load()
            .with_api_base_url("https://api.market.test")
            .with_state_dir("/tmp/marketgate-globals");
        let args = GlobalArgs::new(config);
        assert_eq!(args.config.api_base_url, "https://api.market.test");
        assert!(args.auth_api().is_ok());
        assert!(args.session_store().is_ok());
    }

    #[test]
    fn test_invalid_base_url() {
        let args = GlobalArgs::new(AppConfig::load().with_api_base_url("ftp://files.market.test"));
        assert!(args.auth_api().is_err());
    }
}
