use crate::features::auth::AccountKind;
use clap::{Arg, Command, builder::ValueParser};

pub const CMD_LOGIN: &str = "login";
pub const CMD_REGISTER: &str = "register";
pub const CMD_VERIFY_OTP: &str = "verify-otp";
pub const CMD_LOGOUT: &str = "logout";
pub const CMD_WHOAMI: &str = "whoami";

pub const ARG_AS: &str = "as";
pub const ARG_EMAIL: &str = "email";
pub const ARG_PASSWORD: &str = "password";
pub const ARG_CONFIRM_PASSWORD: &str = "confirm-password";
pub const ARG_OTP: &str = "otp";
pub const ARG_NAME: &str = "name";
pub const ARG_PHONE: &str = "phone";
pub const ARG_NATIONAL_ID: &str = "national-id";
pub const ARG_BUSINESS_NAME: &str = "business-name";

#[must_use]
pub fn validator_account_kind() -> ValueParser {
    ValueParser::from(move |kind: &str| -> std::result::Result<AccountKind, String> {
        AccountKind::from_role(kind).ok_or_else(|| format!("unknown account type: {kind}"))
    })
}

pub(crate) fn arg_as() -> Arg {
    Arg::new(ARG_AS)
        .long("as")
        .help("Account type: user (buyer), vendor (seller) or admin")
        .default_value("user")
        .value_parser(validator_account_kind())
}

pub(crate) fn arg_email() -> Arg {
    Arg::new(ARG_EMAIL)
        .short('e')
        .long("email")
        .help("Email address or phone number of the account")
        .env("MARKETGATE_EMAIL")
        .required(true)
}

pub(crate) fn arg_password() -> Arg {
    Arg::new(ARG_PASSWORD)
        .long("password")
        .help("Account password")
        .env("MARKETGATE_PASSWORD")
        .hide_env_values(true)
        .required(true)
}

pub(crate) fn arg_confirm_password() -> Arg {
    Arg::new(ARG_CONFIRM_PASSWORD)
        .long("confirm-password")
        .help("Password confirmation (default: same as --password)")
}

fn arg_otp(required: bool) -> Arg {
    Arg::new(ARG_OTP)
        .long("otp")
        .help("One-time code; prompted for when omitted and a code is sent")
        .required(required)
}

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(CMD_LOGIN)
                .about("Sign in, completing the one-time code step when the backend asks for it")
                .arg(arg_as())
                .arg(arg_email())
                .arg(arg_password())
                .arg(arg_otp(false)),
        )
        .subcommand(
            Command::new(CMD_REGISTER)
                .about("Create an account and verify it with the code sent by the backend")
                .arg(arg_as())
                .arg(
                    Arg::new(ARG_NAME)
                        .long("name")
                        .help("Full name, letters and spaces only")
                        .required(true),
                )
                .arg(arg_email())
                .arg(
                    Arg::new(ARG_PHONE)
                        .long("phone")
                        .help("10-digit phone number")
                        .required(true),
                )
                .arg(arg_password())
                .arg(arg_confirm_password())
                .arg(
                    Arg::new(ARG_NATIONAL_ID)
                        .long("national-id")
                        .help("12-digit national identity number"),
                )
                .arg(
                    Arg::new(ARG_BUSINESS_NAME)
                        .long("business-name")
                        .help("Business name for vendor accounts"),
                )
                .arg(arg_otp(false)),
        )
        .subcommand(
            Command::new(CMD_VERIFY_OTP)
                .about("Submit a one-time code for an account")
                .arg(arg_email())
                .arg(arg_otp(true)),
        )
        .subcommand(Command::new(CMD_LOGOUT).about("Sign out and forget the stored session"))
        .subcommand(Command::new(CMD_WHOAMI).about("Show the stored session and its dashboard"))
}
