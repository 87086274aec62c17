//! Requirement validation.
//!
//! Validation visits every requirement and collects ALL issues, so a
//! misconfigured container reports everything that is wrong in one go.

use serde::Serialize;

use crate::config::env::EnvSource;
use crate::config::schema::Requirements;
use crate::error::{ConfigError, ValidationIssue};

/// Outcome of validating a requirement set.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ValidationReport {
    /// Variables that passed, in requirement order.
    pub checked: Vec<String>,
    /// Every issue found, in requirement order.
    pub issues: Vec<ValidationIssue>,
}

impl ValidationReport {
    /// Returns `true` if no issues were found.
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.issues.is_empty()
    }

    /// Appends issues found elsewhere (e.g. optional parameter parsing).
    pub fn absorb(&mut self, issues: impl IntoIterator<Item = ValidationIssue>) {
        self.issues.extend(issues);
    }

    /// Converts the report into a result.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Validation` carrying every issue if the report
    /// is not valid.
    pub fn into_result(self) -> Result<(), ConfigError> {
        if self.issues.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Validation {
                issues: self.issues,
            })
        }
    }
}

/// Validates `requirements` against `env`.
///
/// Unset, empty and whitespace-only values are missing. Shape checks run
/// only for present values, and a value failing several shapes yields one
/// issue per failed shape.
#[must_use]
pub fn validate(requirements: &Requirements, env: &dyn EnvSource) -> ValidationReport {
    let mut report = ValidationReport::default();

    for var in requirements.iter() {
        let Some(value) = env.get_nonempty(&var.name) else {
            tracing::debug!(var = %var.name, "required variable missing");
            report.issues.push(ValidationIssue::missing(&var.name));
            continue;
        };

        let failed: Vec<_> = var
            .shapes
            .iter()
            .filter(|shape| !shape.accepts(&value))
            .inspect(|shape| {
                tracing::debug!(var = %var.name, constraint = %shape, "required variable malformed");
            })
            .map(|shape| ValidationIssue::invalid(&var.name, shape.to_string()))
            .collect();

        if failed.is_empty() {
            report.checked.push(var.name.clone());
        } else {
            report.absorb(failed);
        }
    }

    report
}
