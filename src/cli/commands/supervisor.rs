//! `supervisor` command handler.
//!
//! Gate on the required configuration, then replace ourselves with the
//! process supervisor running in the foreground.

use crate::cli::args::SupervisorArgs;
use crate::config::env::ProcessEnv;
use crate::error::EntrygateError;
use crate::gate::guard;
use crate::handoff::Handoff;

use super::{DEFAULT_PROFILES, hand_off};

/// Builds the supervisor argv: `<program> -n -c <config> [args...]`.
#[must_use]
pub fn build_handoff(args: &SupervisorArgs) -> Handoff {
    Handoff::new(&args.program)
        .args(["-n", "-c"])
        .args([args.config.display().to_string()])
        .args(args.args.iter().cloned())
}

/// Run the gate and exec the supervisor.
///
/// # Errors
///
/// Returns `GateFailed` if the requirements cannot be built or are not met,
/// or a handoff error if the supervisor cannot be exec'd.
pub fn run(args: &SupervisorArgs) -> Result<(), EntrygateError> {
    guard(
        args.gate.requirements(DEFAULT_PROFILES),
        &ProcessEnv,
        Vec::new(),
        args.gate.init_target(),
    )?;

    hand_off(build_handoff(args), args.dry_run, args.format)
}
