pub mod account;
pub mod guard;
pub mod recovery;

// Internal "interpreter" for `Action`.
mod run;

#[derive(Debug)]
pub enum Action {
    Login(account::LoginArgs),
    Register(account::RegisterArgs),
    VerifyOtp { email_or_phone: String, otp: String },
    Logout,
    Whoami,
    Guard(guard::Args),
    ForgotPassword { email_or_phone: String },
    ResetPassword(recovery::ResetArgs),
}

impl Action {
    /// Execute the action.
    /// # Errors
    /// Returns an error if the action fails.
    pub async fn execute(self, globals: &crate::cli::globals::GlobalArgs) -> anyhow::Result<()> {
        run::execute(self, globals).await
    }
}
