//! The fail-fast gate.
//!
//! One evaluation per container start: validate, and on failure log every
//! issue and return the aggregated error. There are no retries and no
//! defaults for required variables.
//!
//! Init is signalled by `main` only after the aggregated error is on
//! stderr; an init that forwards SIGTERM back to us must not cut it off.

use crate::config::env::EnvSource;
use crate::config::schema::Requirements;
use crate::config::validation::{ValidationReport, validate};
use crate::error::{ConfigError, EntrygateError, ValidationIssue};
use crate::handoff::init::InitTarget;

/// Runs the gate.
///
/// `extra` carries issues found outside the requirement set (malformed
/// optional parameters); they fail the gate the same way.
///
/// # Errors
///
/// Returns `ConfigError::Validation` listing every issue when anything is
/// missing or malformed.
pub fn gate(
    requirements: &Requirements,
    env: &dyn EnvSource,
    extra: Vec<ValidationIssue>,
) -> Result<ValidationReport, ConfigError> {
    let mut report = validate(requirements, env);
    report.absorb(extra);

    if report.is_valid() {
        tracing::info!(checked = report.checked.len(), "configuration gate passed");
        return Ok(report);
    }

    for issue in &report.issues {
        tracing::error!(var = %issue.var, kind = ?issue.kind, "{}", issue.message);
    }

    Err(ConfigError::Validation {
        issues: report.issues,
    })
}

/// Gate in front of a handoff.
///
/// A requirement set that could not be built (bad `--require`, unreadable
/// policy) fails the same way a missing variable does: both come back as
/// `EntrygateError::GateFailed` carrying `init`.
///
/// # Errors
///
/// Returns `EntrygateError::GateFailed` wrapping the first failure.
pub fn guard(
    requirements: Result<Requirements, EntrygateError>,
    env: &dyn EnvSource,
    extra: Vec<ValidationIssue>,
    init: InitTarget,
) -> Result<ValidationReport, EntrygateError> {
    requirements
        .and_then(|reqs| Ok(gate(&reqs, env, extra)?))
        .map_err(|err| EntrygateError::gate_failed(err, init))
}
