use super::account::{ARG_OTP, arg_confirm_password, arg_email, arg_password};
use clap::{Arg, Command};

pub const CMD_FORGOT_PASSWORD: &str = "forgot-password";
pub const CMD_RESET_PASSWORD: &str = "reset-password";

#[must_use]
pub fn with_subcommands(command: Command) -> Command {
    command
        .subcommand(
            Command::new(CMD_FORGOT_PASSWORD)
                .about("Ask the backend to send a password reset code")
                .arg(arg_email()),
        )
        .subcommand(
            Command::new(CMD_RESET_PASSWORD)
                .about("Verify a reset code and set a new password")
                .arg(arg_email())
                .arg(
                    Arg::new(ARG_OTP)
                        .long("otp")
                        .help("Reset code received after forgot-password")
                        .required(true),
                )
                .arg(arg_password().help("New password"))
                .arg(arg_confirm_password()),
        )
}
