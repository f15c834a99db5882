use crate::app_lib::AppConfig;
use clap::{Arg, ArgMatches, Command};
use std::path::PathBuf;

pub const ARG_API_URL: &str = "api-url";
pub const ARG_STATE_DIR: &str = "state-dir";
pub const ARG_TIMEOUT_MS: &str = "timeout-ms";

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_API_URL)
                .long("api-url")
                .help("Marketplace backend base URL, example: https://api.market.tld")
                .env("MARKETGATE_API_BASE_URL")
                .global(true),
        )
        .arg(
            Arg::new(ARG_STATE_DIR)
                .long("state-dir")
                .help("Directory holding the persisted session (default: ~/.marketgate)")
                .env("MARKETGATE_STATE_DIR")
                .global(true)
                .value_parser(clap::value_parser!(PathBuf)),
        )
        .arg(
            Arg::new(ARG_TIMEOUT_MS)
                .long("timeout-ms")
                .help("Per-request timeout in milliseconds")
                .env("MARKETGATE_TIMEOUT_MS")
                .global(true)
                .value_parser(clap::value_parser!(u64).range(1..)),
        )
}

#[derive(Debug, Default)]
pub struct Options {
    pub api_url: Option<String>,
    pub state_dir: Option<PathBuf>,
    pub timeout_ms: Option<u64>,
}

impl Options {
    #[must_use]
    pub fn parse(matches: &ArgMatches) -> Self {
        Self {
            api_url: matches
                .get_one::<String>(ARG_API_URL)
                .map(|url| url.trim().to_string())
                .filter(|url| !url.is_empty()),
            state_dir: matches.get_one::<PathBuf>(ARG_STATE_DIR).cloned(),
            timeout_ms: matches.get_one::<u64>(ARG_TIMEOUT_MS).copied(),
        }
    }

    /// Layers the flags over an already loaded configuration.
    #[must_use]
    pub fn apply(self, mut config: AppConfig) -> AppConfig {
        if let Some(url) = self.api_url {
            config = config.with_api_base_url(url);
        }
        if let Some(dir) = self.state_dir {
            config = config.with_state_dir(dir);
        }
        if let Some(timeout) = self.timeout_ms {
            config = config.with_request_timeout_ms(timeout);
        }
        config
    }
}
