//! CLI command dispatch and handlers
//!
//! Routes parsed CLI arguments to the appropriate command handler.

pub mod check;
pub mod completions;
pub mod job;
pub mod serve;
pub mod supervisor;
pub mod version;

use crate::cli::args::{Cli, Commands};
use crate::config::profiles::Profile;
use crate::error::EntrygateError;

/// Profiles applied when a gate command is given none.
pub const DEFAULT_PROFILES: &[Profile] = &[Profile::Database];

/// Dispatch a parsed CLI invocation to the appropriate command handler.
///
/// `supervisor` and `serve` only return on failure or with `--dry-run`.
///
/// # Errors
///
/// Returns an error if the dispatched command handler fails.
pub async fn dispatch(cli: Cli) -> Result<(), EntrygateError> {
    match cli.command {
        Commands::Supervisor(args) => supervisor::run(&args),
        Commands::Serve(args) => serve::run(&args),
        Commands::Check(args) => check::run(&args),
        Commands::Job(args) => job::run(&args).await,
        Commands::Completions(args) => {
            completions::run(&args);
            Ok(())
        }
        Commands::Version(args) => {
            version::run(&args);
            Ok(())
        }
    }
}

/// Either prints `handoff` (dry run) or execs it.
///
/// # Errors
///
/// Returns the exec failure, or a JSON error when printing.
pub(crate) fn hand_off(
    handoff: crate::handoff::Handoff,
    dry_run: bool,
    format: crate::cli::args::OutputFormat,
) -> Result<(), EntrygateError> {
    if !dry_run {
        return Err(handoff.exec().into());
    }

    match format {
        crate::cli::args::OutputFormat::Human => println!("{}", handoff.command_line()),
        crate::cli::args::OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&handoff)?);
        }
    }
    Ok(())
}
