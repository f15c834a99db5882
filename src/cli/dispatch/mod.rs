//! Maps parsed command-line arguments to an [`Action`] and the shared client
//! settings. Secrets taken from flags are wrapped in `SecretString` here and
//! never leave that wrapper until they are sent.

use crate::app_lib::AppConfig;
use crate::cli::{
    actions::{Action, account, guard, recovery},
    commands::{
        account::{
            ARG_AS, ARG_BUSINESS_NAME, ARG_CONFIRM_PASSWORD, ARG_EMAIL, ARG_NAME, ARG_NATIONAL_ID,
            ARG_OTP, ARG_PASSWORD, ARG_PHONE, CMD_LOGIN, CMD_LOGOUT, CMD_REGISTER, CMD_VERIFY_OTP,
            CMD_WHOAMI,
        },
        backend,
        guard::{ARG_FALLBACK, ARG_LOGIN_PATH, ARG_PUBLIC, ARG_ROLE, CMD_GUARD},
        recovery::{CMD_FORGOT_PASSWORD, CMD_RESET_PASSWORD},
    },
    globals::GlobalArgs,
};
use crate::features::auth::{AccountKind, Requirement};
use crate::routes::paths;
use anyhow::{Context, Result, anyhow};
use clap::ArgMatches;
use secrecy::SecretString;

/// Client settings: build-time defaults, then `MARKETGATE_*` variables, then flags.
#[must_use]
pub fn globals(matches: &ArgMatches) -> GlobalArgs {
    let config = backend::Options::parse(matches).apply(AppConfig::load());
    GlobalArgs::new(config)
}

/// Map validated CLI matches to an action.
///
/// # Errors
/// Returns an error if no subcommand was given or a required argument is missing.
pub fn handler(matches: &ArgMatches) -> Result<Action> {
    let (name, sub) = matches.subcommand().context("missing subcommand")?;

    match name {
        CMD_LOGIN => Ok(Action::Login(account::LoginArgs {
            kind: kind(sub),
            email_or_phone: required(sub, ARG_EMAIL)?,
            password: secret(sub, ARG_PASSWORD)?,
            otp: optional(sub, ARG_OTP),
        })),
        CMD_REGISTER => {
            let password = secret(sub, ARG_PASSWORD)?;
            let confirm_password = match optional(sub, ARG_CONFIRM_PASSWORD) {
                Some(confirm) => SecretString::from(confirm),
                None => secret(sub, ARG_PASSWORD)?,
            };
            Ok(Action::Register(account::RegisterArgs {
                kind: kind(sub),
                name: required(sub, ARG_NAME)?,
                email: required(sub, ARG_EMAIL)?,
                phone: required(sub, ARG_PHONE)?,
                password,
                confirm_password,
                national_id: optional(sub, ARG_NATIONAL_ID),
                business_name: optional(sub, ARG_BUSINESS_NAME),
                otp: optional(sub, ARG_OTP),
            }))
        }
        CMD_VERIFY_OTP => Ok(Action::VerifyOtp {
            email_or_phone: required(sub, ARG_EMAIL)?,
            otp: required(sub, ARG_OTP)?,
        }),
        CMD_LOGOUT => Ok(Action::Logout),
        CMD_WHOAMI => Ok(Action::Whoami),
        CMD_GUARD => Ok(Action::Guard(guard::Args {
            requirement: requirement(sub),
            fallback: optional(sub, ARG_FALLBACK),
            login_path: optional(sub, ARG_LOGIN_PATH).unwrap_or_else(|| paths::LOGIN.to_string()),
        })),
        CMD_FORGOT_PASSWORD => Ok(Action::ForgotPassword {
            email_or_phone: required(sub, ARG_EMAIL)?,
        }),
        CMD_RESET_PASSWORD => {
            let password = secret(sub, ARG_PASSWORD)?;
            let confirm_password = match optional(sub, ARG_CONFIRM_PASSWORD) {
                Some(confirm) => SecretString::from(confirm),
                None => secret(sub, ARG_PASSWORD)?,
            };
            Ok(Action::ResetPassword(recovery::ResetArgs {
                email_or_phone: required(sub, ARG_EMAIL)?,
                otp: required(sub, ARG_OTP)?,
                password,
                confirm_password,
            }))
        }
        other => Err(anyhow!("unknown subcommand: {other}")),
    }
}

fn kind(matches: &ArgMatches) -> AccountKind {
    matches
        .get_one::<AccountKind>(ARG_AS)
        .copied()
        .unwrap_or(AccountKind::User)
}

fn optional(matches: &ArgMatches, id: &str) -> Option<String> {
    matches
        .get_one::<String>(id)
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

fn required(matches: &ArgMatches, id: &str) -> Result<String> {
    optional(matches, id).with_context(|| format!("missing required argument: --{id}"))
}

fn secret(matches: &ArgMatches, id: &str) -> Result<SecretString> {
    matches
        .get_one::<String>(id)
        .filter(|value| !value.is_empty())
        .map(|value| SecretString::from(value.clone()))
        .with_context(|| format!("missing required argument: --{id}"))
}

fn requirement(matches: &ArgMatches) -> Requirement {
    if matches.get_flag(ARG_PUBLIC) {
        return Requirement::Public;
    }
    let roles: Vec<String> = matches
        .get_many::<String>(ARG_ROLE)
        .map(|roles| roles.cloned().collect())
        .unwrap_or_default();
    match roles.len() {
        0 => Requirement::Authenticated,
        1 => Requirement::Role(roles.into_iter().next().unwrap_or_default()),
        _ => Requirement::AnyOf(roles),
    }
}
