//! `check` command handler.
//!
//! Runs the same validation as the handoff commands and reports the result
//! without starting anything or signalling init.

use serde::Serialize;

use crate::cli::args::{CheckArgs, OutputFormat};
use crate::config::env::{EnvSource, ProcessEnv};
use crate::config::validation::{ValidationReport, validate};
use crate::error::EntrygateError;
use crate::handoff::ServerParams;

use super::DEFAULT_PROFILES;

#[derive(Debug, Serialize)]
struct CheckOutput<'a> {
    valid: bool,
    #[serde(flatten)]
    report: &'a ValidationReport,
    #[serde(skip_serializing_if = "Option::is_none")]
    server: Option<&'a ServerParams>,
}

/// Validates and builds the report without printing.
///
/// # Errors
///
/// Returns an error only when the requirement set itself cannot be built.
pub fn evaluate(
    args: &CheckArgs,
    env: &dyn EnvSource,
) -> Result<(ValidationReport, Option<ServerParams>), EntrygateError> {
    let requirements = args.gate.requirements(DEFAULT_PROFILES)?;
    let mut report = validate(&requirements, env);

    let server = if args.server_params {
        let (params, issues) = ServerParams::from_env(env);
        report.absorb(issues);
        Some(params)
    } else {
        None
    };

    Ok((report, server))
}

/// Validate and print the report.
///
/// # Errors
///
/// Returns `ConfigError::Validation` when anything is missing or malformed.
pub fn run(args: &CheckArgs) -> Result<(), EntrygateError> {
    let (report, server) = evaluate(args, &ProcessEnv)?;
    tracing::info!(
        checked = report.checked.len(),
        issues = report.issues.len(),
        "configuration check complete"
    );

    match args.format {
        OutputFormat::Human => {
            for var in &report.checked {
                println!("ok       {var}");
            }
            for issue in &report.issues {
                println!("FAIL     {issue}");
            }
            if let Some(params) = &server {
                println!("bind     {}", params.bind());
            }
        }
        OutputFormat::Json => {
            let output = CheckOutput {
                valid: report.is_valid(),
                report: &report,
                server: server.as_ref(),
            };
            println!("{}", serde_json::to_string_pretty(&output)?);
        }
    }

    Ok(report.into_result()?)
}
