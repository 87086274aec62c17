//! Observability module
//!
//! Structured logging for the gate and the job runner.

pub mod logging;

pub use logging::{LogFormat, init_logging};
