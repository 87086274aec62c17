//! Requirement types.
//!
//! A [`RequiredVar`] names one environment variable that must be present,
//! optionally with shape constraints on its value. [`Requirements`] is the
//! ordered set the gate evaluates.

use std::fmt;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;

use crate::error::ConfigError;

static VAR_NAME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex"));

// ============================================================================
// Shape
// ============================================================================

/// A constraint on a present value.
#[derive(Debug, Clone)]
pub enum Shape {
    /// Value must contain the given substring.
    Contains(String),
    /// Value must be at least this many characters long.
    MinLength(usize),
    /// Value must match the regular expression.
    Pattern(Regex),
}

impl Shape {
    /// Compiles a pattern shape.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRequirement` if the pattern does not compile.
    pub fn pattern(var: &str, pattern: &str) -> Result<Self, ConfigError> {
        Regex::new(pattern)
            .map(Self::Pattern)
            .map_err(|e| ConfigError::InvalidRequirement {
                name: var.to_string(),
                reason: format!("bad pattern: {e}"),
            })
    }

    /// Returns `true` if `value` satisfies this constraint.
    #[must_use]
    pub fn accepts(&self, value: &str) -> bool {
        match self {
            Self::Contains(needle) => value.contains(needle.as_str()),
            Self::MinLength(min) => value.chars().count() >= *min,
            Self::Pattern(re) => re.is_match(value),
        }
    }

    fn same_as(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Contains(a), Self::Contains(b)) => a == b,
            (Self::MinLength(a), Self::MinLength(b)) => a == b,
            (Self::Pattern(a), Self::Pattern(b)) => a.as_str() == b.as_str(),
            _ => false,
        }
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Contains(needle) => write!(f, "must contain '{needle}'"),
            Self::MinLength(min) => write!(f, "must be at least {min} characters"),
            Self::Pattern(re) => write!(f, "must match /{}/", re.as_str()),
        }
    }
}

// ============================================================================
// RequiredVar
// ============================================================================

/// One required configuration item.
#[derive(Debug, Clone)]
pub struct RequiredVar {
    /// Environment variable name.
    pub name: String,
    /// Constraints checked once the value is known to be present.
    pub shapes: Vec<Shape>,
}

impl RequiredVar {
    /// Creates a presence-only requirement.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRequirement` if `name` is not a valid
    /// environment variable name.
    pub fn new(name: impl Into<String>) -> Result<Self, ConfigError> {
        let name = name.into();
        if !VAR_NAME.is_match(&name) {
            return Err(ConfigError::InvalidRequirement {
                name,
                reason: "not a valid environment variable name".to_string(),
            });
        }
        Ok(Self {
            name,
            shapes: Vec::new(),
        })
    }

    /// Adds a shape constraint, builder style.
    #[must_use]
    pub fn with_shape(mut self, shape: Shape) -> Self {
        self.shapes.push(shape);
        self
    }

    /// Parses `NAME=SUBSTRING` into a contains-constrained requirement.
    ///
    /// # Errors
    ///
    /// Returns an error if the argument has no `=` or the name is invalid.
    pub fn parse_contains(arg: &str) -> Result<Self, ConfigError> {
        let (name, needle) = split_pair(arg)?;
        if needle.is_empty() {
            return Err(ConfigError::InvalidRequirement {
                name: name.to_string(),
                reason: "substring must not be empty".to_string(),
            });
        }
        Ok(Self::new(name)?.with_shape(Shape::Contains(needle.to_string())))
    }

    /// Parses `NAME=N` into a minimum-length requirement.
    ///
    /// # Errors
    ///
    /// Returns an error if the argument has no `=`, the name is invalid, or
    /// `N` is not a non-negative integer.
    pub fn parse_min_length(arg: &str) -> Result<Self, ConfigError> {
        let (name, len) = split_pair(arg)?;
        let min = len
            .trim()
            .parse::<usize>()
            .map_err(|_| ConfigError::InvalidRequirement {
                name: name.to_string(),
                reason: format!("'{len}' is not a length"),
            })?;
        Ok(Self::new(name)?.with_shape(Shape::MinLength(min)))
    }
}

fn split_pair(arg: &str) -> Result<(&str, &str), ConfigError> {
    arg.split_once('=')
        .ok_or_else(|| ConfigError::InvalidRequirement {
            name: arg.to_string(),
            reason: "expected NAME=VALUE".to_string(),
        })
}

// ============================================================================
// Requirements
// ============================================================================

/// Ordered, name-unique list of requirements.
///
/// Adding a name that is already present merges its shapes into the
/// existing entry; the original position is kept.
#[derive(Debug, Clone, Default)]
pub struct Requirements {
    vars: Vec<RequiredVar>,
}

impl Requirements {
    /// Creates an empty requirement set.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a requirement, merging with an existing entry of the same name.
    pub fn push(&mut self, var: RequiredVar) {
        if let Some(existing) = self.vars.iter_mut().find(|v| v.name == var.name) {
            for shape in var.shapes {
                if !existing.shapes.iter().any(|s| s.same_as(&shape)) {
                    existing.shapes.push(shape);
                }
            }
        } else {
            self.vars.push(var);
        }
    }

    /// Adds every requirement from `other`.
    pub fn extend(&mut self, other: impl IntoIterator<Item = RequiredVar>) {
        for var in other {
            self.push(var);
        }
    }

    /// Iterates requirements in insertion order.
    pub fn iter(&self) -> impl Iterator<Item = &RequiredVar> {
        self.vars.iter()
    }

    /// Number of distinct variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns `true` if nothing is required.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }

    /// Names of all required variables, in order.
    #[must_use]
    pub fn names(&self) -> Vec<&str> {
        self.vars.iter().map(|v| v.name.as_str()).collect()
    }
}

impl IntoIterator for Requirements {
    type Item = RequiredVar;
    type IntoIter = std::vec::IntoIter<RequiredVar>;

    fn into_iter(self) -> Self::IntoIter {
        self.vars.into_iter()
    }
}

impl FromIterator<RequiredVar> for Requirements {
    fn from_iter<I: IntoIterator<Item = RequiredVar>>(iter: I) -> Self {
        let mut reqs = Self::new();
        reqs.extend(iter);
        reqs
    }
}

// ============================================================================
// Policy File
// ============================================================================

/// YAML requirement policy.
///
/// ```yaml
/// required:
///   - name: MONGO_CLUSTER
///     contains: ".mongodb.net"
///   - name: API_SECRET
///     min_length: 32
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyFile {
    /// Required variables.
    #[serde(default)]
    pub required: Vec<PolicyEntry>,
}

/// One entry of a [`PolicyFile`].
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PolicyEntry {
    /// Variable name.
    pub name: String,
    /// Required substring.
    #[serde(default)]
    pub contains: Option<String>,
    /// Minimum length in characters.
    #[serde(default)]
    pub min_length: Option<usize>,
    /// Regular expression the value must match.
    #[serde(default)]
    pub pattern: Option<String>,
}

impl PolicyFile {
    /// Parses a policy from YAML text.
    ///
    /// # Errors
    ///
    /// Returns a YAML error on malformed input.
    pub fn from_yaml(text: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(text)
    }

    /// Reads and parses a policy file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Policy` if the file cannot be read, or a YAML
    /// error if it cannot be parsed.
    pub fn load(path: &Path) -> crate::error::Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Policy {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::from_yaml(&text)?)
    }

    /// Converts the policy into requirements.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::InvalidRequirement` for bad names or patterns.
    pub fn into_requirements(self) -> Result<Requirements, ConfigError> {
        let mut reqs = Requirements::new();
        for entry in self.required {
            let mut var = RequiredVar::new(entry.name)?;
            if let Some(needle) = entry.contains {
                var = var.with_shape(Shape::Contains(needle));
            }
            if let Some(min) = entry.min_length {
                var = var.with_shape(Shape::MinLength(min));
            }
            if let Some(pattern) = entry.pattern {
                let shape = Shape::pattern(&var.name, &pattern)?;
                var = var.with_shape(shape);
            }
            reqs.push(var);
        }
        Ok(reqs)
    }
}
