//! Process handoff
//!
//! After the gate passes, the entrypoint replaces itself with the workload
//! (supervisor or application server). The workload inherits our pid, so
//! signals from the container runtime reach it directly.

pub mod init;
pub mod params;

use std::os::unix::process::CommandExt;
use std::process::Command;

use serde::Serialize;

use crate::error::HandoffError;

pub use init::{InitOutcome, InitSignal, InitTarget, in_container, signal_init};
pub use params::ServerParams;

/// A program and its arguments, ready to replace the current process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Handoff {
    /// Program name or path, resolved through `PATH`.
    pub program: String,
    /// Arguments, not including the program itself.
    pub args: Vec<String>,
}

impl Handoff {
    /// Creates a handoff with no arguments.
    #[must_use]
    pub fn new(program: impl Into<String>) -> Self {
        Self {
            program: program.into(),
            args: Vec::new(),
        }
    }

    /// Appends arguments, builder style.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.args.extend(args.into_iter().map(Into::into));
        self
    }

    /// Full argv as a single shell-quoted line, for logs and dry runs.
    #[must_use]
    pub fn command_line(&self) -> String {
        std::iter::once(self.program.as_str())
            .chain(self.args.iter().map(String::as_str))
            .map(|word| shlex::try_quote(word).map_or_else(|_| word.to_string(), Into::into))
            .collect::<Vec<_>>()
            .join(" ")
    }

    /// Replaces the current process image with the target program.
    ///
    /// Only returns on failure.
    #[must_use]
    pub fn exec(self) -> HandoffError {
        if self.program.is_empty() {
            return HandoffError::EmptyCommand;
        }

        tracing::info!(program = %self.program, argc = self.args.len(), "handing off");

        let source = Command::new(&self.program).args(&self.args).exec();
        HandoffError::ExecFailed {
            program: self.program,
            source,
        }
    }
}
