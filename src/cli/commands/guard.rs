use crate::routes::paths;
use clap::{Arg, ArgAction, Command};

pub const CMD_GUARD: &str = "guard";

pub const ARG_ROLE: &str = "role";
pub const ARG_PUBLIC: &str = "public";
pub const ARG_FALLBACK: &str = "fallback";
pub const ARG_LOGIN_PATH: &str = "login-path";

#[must_use]
pub fn with_subcommand(command: Command) -> Command {
    command.subcommand(
        Command::new(CMD_GUARD)
            .about("Evaluate a route guard against the stored session")
            .arg(
                Arg::new(ARG_ROLE)
                    .short('r')
                    .long("role")
                    .help("Role allowed on the route; repeat for several (default: any signed-in account)")
                    .action(ArgAction::Append),
            )
            .arg(
                Arg::new(ARG_PUBLIC)
                    .long("public")
                    .help("The route needs no session")
                    .action(ArgAction::SetTrue)
                    .conflicts_with(ARG_ROLE),
            )
            .arg(
                Arg::new(ARG_FALLBACK)
                    .long("fallback")
                    .help("View rendered instead of redirecting when the role does not match"),
            )
            .arg(
                Arg::new(ARG_LOGIN_PATH)
                    .long("login-path")
                    .help("Where unauthenticated sessions are sent")
                    .default_value(paths::LOGIN),
            ),
    )
}
