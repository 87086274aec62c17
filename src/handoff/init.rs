//! Stopping the container from inside it.
//!
//! When the gate fails in a process that is not PID 1 (e.g. under `tini` or
//! a shell wrapper), exiting alone leaves the container running. Sending
//! SIGTERM to PID 1 brings the whole container down.

use std::path::Path;

use clap::ValueEnum;
use nix::sys::signal::{Signal, kill};
use nix::unistd::Pid;

const CONTAINER_MARKERS: &[&str] = &["/.dockerenv", "/run/.containerenv"];

/// Pid of the container's init process.
pub const INIT_PID: u32 = 1;

/// When to signal init after a failed gate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum InitSignal {
    /// Only inside a container, and only when we are not init ourselves.
    #[default]
    Auto,
    /// Whenever we are not init.
    Always,
    /// Never.
    Never,
}

/// What [`signal_init`] did.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InitOutcome {
    /// SIGTERM was delivered.
    Signalled,
    /// Policy or environment said not to.
    Skipped,
    /// Delivery failed; the caller still exits non-zero.
    Failed,
}

impl InitSignal {
    /// Decides whether to signal `init_pid`, given our own pid and whether
    /// we appear to be inside a container.
    #[must_use]
    pub const fn should_signal(self, own_pid: u32, init_pid: u32, in_container: bool) -> bool {
        if own_pid == init_pid {
            return false;
        }
        match self {
            Self::Auto => in_container,
            Self::Always => true,
            Self::Never => false,
        }
    }
}

/// A signal policy bound to the process it targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitTarget {
    /// When to signal.
    pub policy: InitSignal,
    /// Whom to signal; [`INIT_PID`] outside tests.
    pub pid: u32,
}

impl InitTarget {
    /// Targets the container's init with `policy`.
    #[must_use]
    pub const fn new(policy: InitSignal) -> Self {
        Self {
            policy,
            pid: INIT_PID,
        }
    }

    /// See [`signal_init`].
    pub fn signal(self) -> InitOutcome {
        signal_init(self.policy, self.pid)
    }
}

/// Returns `true` if a container runtime marker file exists.
#[must_use]
pub fn in_container() -> bool {
    CONTAINER_MARKERS.iter().any(|m| Path::new(m).exists())
}

/// Sends SIGTERM to `init_pid` if `policy` calls for it.
///
/// Delivery failure is logged and otherwise ignored.
pub fn signal_init(policy: InitSignal, init_pid: u32) -> InitOutcome {
    if !policy.should_signal(std::process::id(), init_pid, in_container()) {
        tracing::debug!(?policy, init_pid, "not signalling init");
        return InitOutcome::Skipped;
    }

    let Ok(raw) = i32::try_from(init_pid) else {
        tracing::warn!(init_pid, "init pid out of range");
        return InitOutcome::Failed;
    };

    match kill(Pid::from_raw(raw), Signal::SIGTERM) {
        Ok(()) => {
            tracing::info!(init_pid, "sent SIGTERM to init");
            InitOutcome::Signalled
        }
        Err(errno) => {
            tracing::warn!(init_pid, error = %errno, "could not signal init");
            InitOutcome::Failed
        }
    }
}
