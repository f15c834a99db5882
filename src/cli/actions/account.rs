use crate::{
    cli::globals::GlobalArgs,
    features::{
        auth::{
            AccountKind, CredentialFlow, FlowStep, FormOutcome, PostAuthRouter, Session,
            SessionStore, Submission, destination_for,
        },
        forms::{FieldErrors, RegistrationForm},
    },
    routes::History,
};
use anyhow::{Result, anyhow};
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::debug;

#[derive(Debug)]
pub struct LoginArgs {
    pub kind: AccountKind,
    pub email_or_phone: String,
    pub password: SecretString,
    pub otp: Option<String>,
}

#[derive(Debug)]
pub struct RegisterArgs {
    pub kind: AccountKind,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub password: SecretString,
    pub confirm_password: SecretString,
    pub national_id: Option<String>,
    pub business_name: Option<String>,
    pub otp: Option<String>,
}

/// Execute the login action.
/// # Errors
/// Returns an error if the credentials or the code are rejected.
pub async fn login(args: LoginArgs, globals: &GlobalArgs) -> Result<()> {
    let store = globals.session_store()?;
    let flow = CredentialFlow::new(args.kind, Arc::clone(&store));
    let mut router = PostAuthRouter::new(Arc::new(History::new()));

    match flow.submit_credentials(&args.email_or_phone, &args.password).await {
        FormOutcome::Invalid(errors) => return Err(invalid_form(&errors)),
        FormOutcome::Submitted(outcome) => check(&store.session(), outcome)?,
    }
    let code = match args.otp {
        Some(code) => Some(code),
        None if flow.step() == FlowStep::OtpPending => prompt_code().await?,
        None => None,
    };
    finish_with_code(&flow, &store, code).await?;

    report(&store.session(), &mut router);
    Ok(())
}

/// Execute the register action. The code step runs in the same process so the
/// pending credentials can complete the sign-in.
/// # Errors
/// Returns an error if the form is invalid or the backend rejects it.
pub async fn register(args: RegisterArgs, globals: &GlobalArgs) -> Result<()> {
    let store = globals.session_store()?;
    let flow = CredentialFlow::new(args.kind, Arc::clone(&store));
    let mut router = PostAuthRouter::new(Arc::new(History::new()));

    let form = RegistrationForm {
        name: args.name,
        email: args.email,
        phone: args.phone,
        password: args.password.expose_secret().to_string(),
        confirm_password: args.confirm_password.expose_secret().to_string(),
        national_id: args.national_id,
        business_name: args.business_name,
    };
    match flow.submit_registration(&form).await {
        FormOutcome::Invalid(errors) => return Err(invalid_form(&errors)),
        FormOutcome::Submitted(outcome) => check(&store.session(), outcome)?,
    }
    println!("Account created. A verification code was sent to {}.", form.email.trim());

    let code = match args.otp {
        Some(code) => Some(code),
        None => prompt_code().await?,
    };
    finish_with_code(&flow, &store, code).await?;

    report(&store.session(), &mut router);
    Ok(())
}

/// Execute the verify-otp action for a code sent to an earlier login.
/// # Errors
/// Returns an error if the code is rejected.
pub async fn verify_otp(email_or_phone: &str, otp: &str, globals: &GlobalArgs) -> Result<()> {
    let store = globals.session_store()?;
    let mut router = PostAuthRouter::new(Arc::new(History::new()));

    let outcome = store.verify_otp(email_or_phone, otp).await;
    check(&store.session(), outcome)?;

    report(&store.session(), &mut router);
    Ok(())
}

/// Execute the logout action.
/// # Errors
/// Returns an error if the backend client cannot be built.
pub async fn logout(globals: &GlobalArgs) -> Result<()> {
    let store = globals.session_store()?;
    store.hydrate().await;
    let was_signed_in = store.session().is_authenticated();

    store.logout().await;

    if was_signed_in {
        println!("Signed out.");
    } else {
        println!("Not signed in.");
    }
    Ok(())
}

/// Execute the whoami action.
/// # Errors
/// Returns an error if the backend client cannot be built.
pub async fn whoami(globals: &GlobalArgs) -> Result<()> {
    let store = globals.session_store()?;
    store.hydrate().await;

    let session = store.session();
    match session.user() {
        Some(user) => {
            println!("Name:      {}", user.name);
            println!("Email:     {}", user.email);
            println!("Role:      {}", user.role.as_deref().unwrap_or("-"));
            println!("Verified:  {}", if user.is_verified { "yes" } else { "no" });
            println!("Dashboard: {}", destination_for(session.role()));
        }
        None => println!("Not signed in."),
    }
    Ok(())
}

/// Submits the code when the flow is waiting for one. Without a code the
/// flow is left pending for a later `verify-otp`.
async fn finish_with_code(
    flow: &CredentialFlow,
    store: &SessionStore,
    code: Option<String>,
) -> Result<()> {
    if flow.step() != FlowStep::OtpPending {
        return Ok(());
    }
    let Some(code) = code.filter(|code| !code.trim().is_empty()) else {
        println!("Verification code sent. Finish with `marketgate verify-otp`.");
        return Ok(());
    };

    let outcome = flow.submit_code(&code).await?;
    check(&store.session(), outcome)
}

fn check(session: &Session, outcome: Submission) -> Result<()> {
    debug!(?outcome, "submission finished");
    match outcome {
        Submission::Rejected => Err(anyhow!(
            session
                .error
                .clone()
                .unwrap_or_else(|| "Request failed.".to_string())
        )),
        Submission::Suppressed => Err(anyhow!("Another request is already in flight.")),
        Submission::Stale => Err(anyhow!("The session was reset while the request was in flight.")),
        Submission::Authenticated | Submission::OtpRequired | Submission::Anonymous => Ok(()),
    }
}

fn invalid_form(errors: &FieldErrors) -> anyhow::Error {
    for (field, message) in errors {
        eprintln!("{}: {message}", field.as_str());
    }
    anyhow!("The form has invalid fields.")
}

fn report(session: &Session, router: &mut PostAuthRouter) {
    let Some(user) = session.user() else {
        return;
    };
    println!("Signed in as {} <{}>", user.name, user.email);
    if let Some(destination) = router.observe(session) {
        println!("Redirect: {destination}");
    }
}

async fn prompt_code() -> Result<Option<String>> {
    let mut stdout = tokio::io::stdout();
    stdout.write_all(b"Verification code: ").await?;
    stdout.flush().await?;

    let mut line = String::new();
    let read = BufReader::new(tokio::io::stdin()).read_line(&mut line).await?;
    Ok((read > 0).then(|| line.trim().to_string()))
}
