//! Log output flags shared by every subcommand.

use clap::{Arg, ArgAction, Command, builder::ValueParser};

pub const ARG_VERBOSITY: &str = "verbosity";
pub const ARG_JSON_LOGS: &str = "json-logs";

/// Level names in verbosity order; the index is the `-v` count.
const LEVEL_NAMES: [&str; 5] = ["error", "warn", "info", "debug", "trace"];

/// Accepts `MARKETGATE_LOG_LEVEL` as a level name or as the equivalent count.
fn parse_level(value: &str) -> Result<u8, String> {
    let value = value.trim();
    let position = value
        .parse::<usize>()
        .ok()
        .filter(|count| *count < LEVEL_NAMES.len())
        .or_else(|| {
            LEVEL_NAMES
                .iter()
                .position(|name| name.eq_ignore_ascii_case(value))
        });

    position
        .and_then(|index| u8::try_from(index).ok())
        .ok_or_else(|| format!("expected one of {} or 0-4", LEVEL_NAMES.join(", ")))
}

#[must_use]
pub fn level_parser() -> ValueParser {
    ValueParser::from(parse_level)
}

#[must_use]
pub fn with_args(command: Command) -> Command {
    command
        .arg(
            Arg::new(ARG_VERBOSITY)
                .short('v')
                .long("verbose")
                .help("Raise log verbosity; repeat for more (error, warn, info, debug, trace)")
                .env("MARKETGATE_LOG_LEVEL")
                .global(true)
                .action(ArgAction::Count)
                .value_parser(level_parser()),
        )
        .arg(
            Arg::new(ARG_JSON_LOGS)
                .long("json-logs")
                .help("Write logs to stderr as JSON lines")
                .global(true)
                .action(ArgAction::SetTrue),
        )
}
