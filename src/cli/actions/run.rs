use crate::cli::{
    actions::{Action, account, guard, recovery},
    globals::GlobalArgs,
};
use anyhow::Result;

/// Execute the provided action.
// Single dispatch point for all CLI actions.
/// # Errors
/// Returns an error if the action fails.
pub async fn execute(action: Action, globals: &GlobalArgs) -> Result<()> {
    match action {
        Action::Login(args) => account::login(args, globals).await,
        Action::Register(args) => account::register(args, globals).await,
        Action::VerifyOtp { email_or_phone, otp } => {
            account::verify_otp(&email_or_phone, &otp, globals).await
        }
        Action::Logout => account::logout(globals).await,
        Action::Whoami => account::whoami(globals).await,
        Action::Guard(args) => guard::execute(args, globals).await,
        Action::ForgotPassword { email_or_phone } => {
            recovery::forgot_password(&email_or_phone, globals).await
        }
        Action::ResetPassword(args) => recovery::reset_password(args, globals).await,
    }
}
