//! Configuration module
//!
//! Required-variable definitions, built-in profiles, policy files and the
//! validator that checks them against the environment.

pub mod env;
pub mod profiles;
pub mod schema;
pub mod validation;

pub use env::{EnvSource, MapEnv, ProcessEnv};
pub use profiles::Profile;
pub use schema::{PolicyFile, RequiredVar, Requirements, Shape};
pub use validation::{ValidationReport, validate};
