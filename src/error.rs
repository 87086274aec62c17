//! Error types for `entrygate`
//!
//! Every failure the gate can produce maps onto a process exit code. The
//! validation errors carry the complete list of issues so they can be
//! reported together before the process exits.

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::handoff::init::InitTarget;

// ============================================================================
// Exit Codes
// ============================================================================

/// Exit codes for `entrygate` operations.
///
/// Configuration problems exit with `1`, matching the shell entrypoints this
/// tool stands in for. Handoff failures use the shell's 126/127 convention.
pub struct ExitCode;

impl ExitCode {
    /// Successful execution
    pub const SUCCESS: i32 = 0;

    /// General error, including missing or invalid configuration
    pub const ERROR: i32 = 1;

    /// I/O error (policy file unreadable, mount directory not creatable)
    pub const IO_ERROR: i32 = 3;

    /// Usage error (invalid arguments, unknown options)
    pub const USAGE_ERROR: i32 = 64;

    /// Target program found but could not be executed
    pub const NOT_EXECUTABLE: i32 = 126;

    /// Target program not found
    pub const NOT_FOUND: i32 = 127;

    /// Interrupted by SIGINT (Ctrl+C)
    pub const INTERRUPTED: i32 = 130;

    /// Terminated by SIGTERM
    pub const TERMINATED: i32 = 143;
}

// ============================================================================
// Top-Level Error
// ============================================================================

/// Top-level error type for `entrygate` operations.
#[derive(Debug, Error)]
pub enum EntrygateError {
    /// Required configuration missing or malformed
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Process image replacement failed
    #[error(transparent)]
    Handoff(#[from] HandoffError),

    /// Local job runner failure
    #[error(transparent)]
    Job(#[from] JobError),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON serialization error
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing error
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// A handoff gate failed, while building its requirements or while
    /// validating; init is signalled after this has been reported
    #[error("{source}")]
    GateFailed {
        /// What went wrong
        source: Box<EntrygateError>,
        /// Who to stop once the error is on stderr
        init: InitTarget,
    },
}

impl EntrygateError {
    /// Returns the appropriate exit code for this error.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::GateFailed { .. } => ExitCode::ERROR,
            Self::Config(ConfigError::Policy { .. }) | Self::Io(_) => ExitCode::IO_ERROR,
            Self::Config(_) | Self::Json(_) | Self::Yaml(_) => ExitCode::ERROR,
            Self::Handoff(err) => err.exit_code(),
            Self::Job(err) => err.exit_code(),
        }
    }

    /// Wraps a gate failure with the init signal to send after reporting it.
    #[must_use]
    pub fn gate_failed(err: impl Into<Self>, init: InitTarget) -> Self {
        Self::GateFailed {
            source: Box::new(err.into()),
            init,
        }
    }

    /// The init signal owed by a failed gate, if any.
    #[must_use]
    pub const fn init_target(&self) -> Option<InitTarget> {
        match self {
            Self::GateFailed { init, .. } => Some(*init),
            _ => None,
        }
    }
}

// ============================================================================
// Configuration Errors
// ============================================================================

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// One or more required variables are missing or malformed
    #[error("missing or invalid configuration: {}", IssueList(.issues))]
    Validation {
        /// Every issue found, in requirement order
        issues: Vec<ValidationIssue>,
    },

    /// Requirement policy file could not be read
    #[error("cannot read policy {path}: {source}")]
    Policy {
        /// Path to the policy file
        path: PathBuf,
        /// Underlying I/O error
        source: std::io::Error,
    },

    /// Requirement definition itself is malformed
    #[error("invalid requirement '{name}': {reason}")]
    InvalidRequirement {
        /// Variable name the requirement refers to
        name: String,
        /// Why it was rejected
        reason: String,
    },
}

impl ConfigError {
    /// Returns the individual issues carried by a validation error.
    #[must_use]
    pub fn issues(&self) -> &[ValidationIssue] {
        match self {
            Self::Validation { issues } => issues,
            _ => &[],
        }
    }
}

struct IssueList<'a>(&'a [ValidationIssue]);

impl fmt::Display for IssueList<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, issue) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{issue}")?;
        }
        Ok(())
    }
}

// ============================================================================
// Validation Types
// ============================================================================

/// The two ways a required item can fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum IssueKind {
    /// Variable unset, empty, or whitespace only
    MissingVariable,
    /// Variable present but fails its shape constraint
    InvalidFormat,
}

/// A single failed requirement.
///
/// The message describes the constraint, never the offending value.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ValidationIssue {
    /// Name of the variable
    pub var: String,
    /// Failure kind
    pub kind: IssueKind,
    /// Human description of the failed constraint
    pub message: String,
}

impl ValidationIssue {
    /// Creates a missing-variable issue.
    #[must_use]
    pub fn missing(var: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            kind: IssueKind::MissingVariable,
            message: "missing".to_string(),
        }
    }

    /// Creates an invalid-format issue.
    #[must_use]
    pub fn invalid(var: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            var: var.into(),
            kind: IssueKind::InvalidFormat,
            message: message.into(),
        }
    }
}

impl fmt::Display for ValidationIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.var, self.message)
    }
}

// ============================================================================
// Handoff Errors
// ============================================================================

/// Failure to replace the current process image.
#[derive(Debug, Error)]
pub enum HandoffError {
    /// Handoff was requested with no program
    #[error("no program to hand off to")]
    EmptyCommand,

    /// `exec` returned, which only happens on failure
    #[error("failed to exec '{program}': {source}")]
    ExecFailed {
        /// Program that was being exec'd
        program: String,
        /// Error returned by `exec`
        source: std::io::Error,
    },
}

impl HandoffError {
    /// 127 when the program does not exist, 126 otherwise.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::EmptyCommand => ExitCode::ERROR,
            Self::ExecFailed { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => ExitCode::NOT_FOUND,
                _ => ExitCode::NOT_EXECUTABLE,
            },
        }
    }
}

// ============================================================================
// Job Runner Errors
// ============================================================================

/// Local job runner failures.
#[derive(Debug, Error)]
pub enum JobError {
    /// Positional customer identifier was not given
    #[error("missing customer identifier\n\n{usage}")]
    MissingCustomer {
        /// Rendered usage text
        usage: String,
    },

    /// External command could not be started
    #[error("failed to start '{program}': {source}")]
    SpawnFailed {
        /// Program that failed to start
        program: String,
        /// Underlying error
        source: std::io::Error,
    },

    /// External command exited unsuccessfully
    #[error("'{step}' exited with status {code}")]
    CommandFailed {
        /// Step name (`docker build`, `docker run`)
        step: String,
        /// Exit code reported by the child; 1 when killed by a signal
        code: i32,
    },
}

impl JobError {
    /// Mirrors the child's exit code for failed commands.
    #[must_use]
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::MissingCustomer { .. } => ExitCode::ERROR,
            Self::SpawnFailed { source, .. } => match source.kind() {
                std::io::ErrorKind::NotFound => ExitCode::NOT_FOUND,
                _ => ExitCode::NOT_EXECUTABLE,
            },
            Self::CommandFailed { code, .. } => *code,
        }
    }
}

// ============================================================================
// Result Type Alias
// ============================================================================

/// Result type alias for `entrygate` operations.
pub type Result<T> = std::result::Result<T, EntrygateError>;

// ============================================================================
// Tests
// ============================================================================
