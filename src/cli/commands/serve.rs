//! `serve` command handler.
//!
//! Gate on the required configuration and the server parameters together,
//! then replace ourselves with the application server.

use crate::cli::args::ServeArgs;
use crate::config::env::{EnvSource, ProcessEnv};
use crate::error::{EntrygateError, ValidationIssue};
use crate::gate::guard;
use crate::handoff::{Handoff, ServerParams};

use super::{DEFAULT_PROFILES, hand_off};

/// Builds the server argv from derived parameters.
///
/// Trailing `--` arguments go after the environment's extra arguments and
/// before the application module.
#[must_use]
pub fn build_handoff(args: &ServeArgs, params: &ServerParams) -> Handoff {
    let mut params = params.clone();
    params.extra_args.extend(args.args.iter().cloned());
    Handoff::new(&args.program).args(params.to_args(&args.app))
}

/// Derives the server parameters and returns them with any issues.
#[must_use]
pub fn derive_params(env: &dyn EnvSource) -> (ServerParams, Vec<ValidationIssue>) {
    let (params, issues) = ServerParams::from_env(env);
    tracing::debug!(
        bind = %params.bind(),
        workers = params.workers,
        threads = params.threads,
        timeout = params.timeout,
        "derived server parameters"
    );
    (params, issues)
}

/// Run the gate and exec the application server.
///
/// # Errors
///
/// Returns `GateFailed` if the gate fails (including malformed optional
/// parameters), or a handoff error if the server cannot be exec'd.
pub fn run(args: &ServeArgs) -> Result<(), EntrygateError> {
    let (params, issues) = derive_params(&ProcessEnv);
    guard(
        args.gate.requirements(DEFAULT_PROFILES),
        &ProcessEnv,
        issues,
        args.gate.init_target(),
    )?;

    hand_off(build_handoff(args, &params), args.dry_run, args.format)
}
