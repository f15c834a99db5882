use crate::{
    cli::globals::GlobalArgs,
    features::auth::{AuthApi, RecoveryFlow},
};
use anyhow::Result;
use secrecy::SecretString;
use std::sync::Arc;

#[derive(Debug)]
pub struct ResetArgs {
    pub email_or_phone: String,
    pub otp: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
}

/// Execute the forgot-password action.
/// # Errors
/// Returns an error if the backend rejects the request.
pub async fn forgot_password(email_or_phone: &str, globals: &GlobalArgs) -> Result<()> {
    let api: Arc<dyn AuthApi> = globals.auth_api()?;
    RecoveryFlow::new(api).request_code(email_or_phone).await?;

    println!("Reset code sent to {email_or_phone}. Finish with `marketgate reset-password`.");
    Ok(())
}

/// Execute the reset-password action.
/// # Errors
/// Returns an error if the code is rejected or the new password fails the policy.
pub async fn reset_password(args: ResetArgs, globals: &GlobalArgs) -> Result<()> {
    let api: Arc<dyn AuthApi> = globals.auth_api()?;
    reset(api, args).await?;

    println!("Password updated. Sign in with the new password.");
    Ok(())
}

async fn reset(api: Arc<dyn AuthApi>, args: ResetArgs) -> Result<()> {
    let mut flow = RecoveryFlow::resume(api, &args.email_or_phone);
    flow.verify_code(&args.otp).await?;
    flow.set_password(&args.password, &args.confirm_password).await?;
    Ok(())
}
