//! `entrygate` - fail-fast container entrypoint
//!
//! Validates required configuration from the environment, then replaces
//! the current process with a supervisor or application server. Also runs
//! a scheduled job image locally with bind-mounted volumes.

pub mod cli;
pub mod config;
pub mod error;
pub mod gate;
pub mod handoff;
pub mod job;
pub mod observability;
