//! Built-in requirement profiles.

use clap::ValueEnum;

use super::schema::{RequiredVar, Requirements, Shape};

/// Database username variable.
pub const MONGO_USERNAME: &str = "MONGO_USERNAME";
/// Database password variable.
pub const MONGO_PASSWORD: &str = "MONGO_PASSWORD";
/// Database cluster host variable.
pub const MONGO_CLUSTER: &str = "MONGO_CLUSTER";
/// Substring every hosted cluster address contains.
pub const CLUSTER_DOMAIN: &str = ".mongodb.net";
/// Minimum database password length.
pub const MIN_PASSWORD_LEN: usize = 8;

/// Service API key variable.
pub const API_KEY: &str = "API_KEY";
/// Service API secret variable.
pub const API_SECRET: &str = "API_SECRET";
/// Minimum API key length.
pub const MIN_API_KEY_LEN: usize = 16;
/// Minimum API secret length.
pub const MIN_API_SECRET_LEN: usize = 32;

/// A named, built-in set of requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, ValueEnum)]
pub enum Profile {
    /// Database username, password and cluster address.
    Database,
    /// Service API key and secret.
    Api,
}

impl Profile {
    /// Expands the profile into its requirements.
    #[must_use]
    pub fn requirements(self) -> Requirements {
        match self {
            Self::Database => [
                fixed(MONGO_USERNAME),
                fixed(MONGO_PASSWORD).with_shape(Shape::MinLength(MIN_PASSWORD_LEN)),
                fixed(MONGO_CLUSTER).with_shape(Shape::Contains(CLUSTER_DOMAIN.to_string())),
            ]
            .into_iter()
            .collect(),
            Self::Api => [
                fixed(API_KEY).with_shape(Shape::MinLength(MIN_API_KEY_LEN)),
                fixed(API_SECRET).with_shape(Shape::MinLength(MIN_API_SECRET_LEN)),
            ]
            .into_iter()
            .collect(),
        }
    }
}

/// Presence-only requirements for the job runner's three credentials.
#[must_use]
pub fn database_presence() -> Requirements {
    [MONGO_USERNAME, MONGO_PASSWORD, MONGO_CLUSTER]
        .into_iter()
        .map(fixed)
        .collect()
}

fn fixed(name: &str) -> RequiredVar {
    RequiredVar {
        name: name.to_string(),
        shapes: Vec::new(),
    }
}
