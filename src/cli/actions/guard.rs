use crate::{
    cli::globals::GlobalArgs,
    features::auth::{GuardConfig, GuardDecision, Requirement, RouteGuard, Session},
    routes::History,
};
use anyhow::Result;
use std::sync::Arc;

#[derive(Debug)]
pub struct Args {
    pub requirement: Requirement,
    pub fallback: Option<String>,
    pub login_path: String,
}

/// Execute the guard action: restore the stored session and print what a
/// guarded route would do with it.
/// # Errors
/// Returns an error if the backend client cannot be built.
pub async fn execute(args: Args, globals: &GlobalArgs) -> Result<()> {
    let store = globals.session_store()?;
    store.hydrate().await;

    println!("{}", describe(&evaluate(args, &store.session())));
    Ok(())
}

fn evaluate(args: Args, session: &Session) -> GuardDecision {
    let mut config = GuardConfig::new(args.requirement).with_login_path(args.login_path);
    if let Some(view) = args.fallback {
        config = config.with_fallback(view);
    }
    RouteGuard::new(config, Arc::new(History::new())).evaluate(session)
}

fn describe(decision: &GuardDecision) -> String {
    match decision {
        GuardDecision::Loading => "loading".to_string(),
        GuardDecision::Render => "render".to_string(),
        GuardDecision::Fallback(view) => format!("fallback {view}"),
        GuardDecision::Redirect(path) => format!("redirect {path}"),
    }
}
