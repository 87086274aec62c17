//! Local scheduled-job simulation.
//!
//! Builds the job image and runs it once with the host directories that
//! stand in for the storage bucket and the staging area bind-mounted into
//! the container, the same way the scheduler would start it.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::config::env::EnvSource;
use crate::config::profiles::{MONGO_CLUSTER, MONGO_PASSWORD, MONGO_USERNAME};
use crate::error::{ConfigError, JobError, ValidationIssue};

/// Shape every customer identifier (tenant database name) has.
pub const CUSTOMER_ID_PATTERN: &str = r"^(stg|prd)-modula-\d{5}$";

/// Container-side bucket root.
pub const DEFAULT_FILES_ROOT: &str = "/gcp-bucket";
/// Container-side staging root.
pub const DEFAULT_STAGE_ROOT: &str = "/tmp/staged-files";
/// Log level passed to the job when `LOG_LEVEL` is unset.
pub const DEFAULT_JOB_LOG_LEVEL: &str = "INFO";
/// Timezone passed to the job when `TZ` is unset.
pub const DEFAULT_TZ: &str = "UTC";

static CUSTOMER_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(CUSTOMER_ID_PATTERN).expect("valid regex"));

/// Checks the customer identifier format.
///
/// # Errors
///
/// Returns `ConfigError::Validation` with an `InvalidFormat` issue.
pub fn check_customer_id(customer_id: &str) -> Result<(), ConfigError> {
    if CUSTOMER_ID.is_match(customer_id) {
        Ok(())
    } else {
        Err(ConfigError::Validation {
            issues: vec![ValidationIssue::invalid(
                "CUSTOMER_ID",
                format!("must match /{CUSTOMER_ID_PATTERN}/"),
            )],
        })
    }
}

/// Everything needed to build and run the job once.
#[derive(Debug, Clone)]
pub struct JobSettings {
    /// Tenant identifier passed to the job.
    pub customer_id: String,
    /// Image tag to build and run.
    pub image: String,
    /// Build context directory.
    pub context: PathBuf,
    /// Dockerfile, if not `<context>/Dockerfile`.
    pub dockerfile: Option<PathBuf>,
    /// Host directory mirroring the bucket.
    pub bucket_dir: PathBuf,
    /// Host staging directory.
    pub stage_dir: PathBuf,
    /// Docker CLI binary.
    pub docker: String,
    /// Whether to build before running.
    pub build: bool,
    /// Log level for the job.
    pub log_level: String,
    /// Timezone for the job.
    pub tz: String,
    /// Container-side bucket root.
    pub files_root: String,
    /// Container-side staging root.
    pub stage_root: String,
}

impl JobSettings {
    /// Fills the container environment settings from `env`, with defaults.
    pub fn apply_env(&mut self, env: &dyn EnvSource) {
        self.log_level = env
            .get_nonempty("LOG_LEVEL")
            .unwrap_or_else(|| DEFAULT_JOB_LOG_LEVEL.to_string());
        self.tz = env
            .get_nonempty("TZ")
            .unwrap_or_else(|| DEFAULT_TZ.to_string());
        self.files_root = env
            .get_nonempty("FILES_ROOT")
            .unwrap_or_else(|| DEFAULT_FILES_ROOT.to_string());
        self.stage_root = env
            .get_nonempty("STAGE_FILES_ROOT")
            .unwrap_or_else(|| DEFAULT_STAGE_ROOT.to_string());
    }
}

/// One external command of the job run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Step {
    /// Step label used in errors and logs.
    pub name: String,
    /// Program to run.
    pub program: String,
    /// Arguments.
    pub args: Vec<String>,
}

/// Ordered steps for one job run.
#[derive(Debug, Clone, Serialize)]
pub struct JobPlan {
    /// Host directories to create before running.
    pub mounts: Vec<PathBuf>,
    /// Commands to run in order.
    pub steps: Vec<Step>,
}

/// Plans the build and run commands.
///
/// `bucket_dir` and `stage_dir` should already be absolute; docker treats
/// relative `-v` sources as named volumes.
#[must_use]
pub fn plan(settings: &JobSettings, container_name: &str) -> JobPlan {
    let mut steps = Vec::new();

    if settings.build {
        let mut args = vec!["build".to_string(), "-t".to_string(), settings.image.clone()];
        if let Some(dockerfile) = &settings.dockerfile {
            args.push("-f".to_string());
            args.push(dockerfile.display().to_string());
        }
        args.push(settings.context.display().to_string());
        steps.push(Step {
            name: "docker build".to_string(),
            program: settings.docker.clone(),
            args,
        });
    }

    let mut args = vec![
        "run".to_string(),
        "--rm".to_string(),
        "--name".to_string(),
        container_name.to_string(),
    ];
    // Credentials by name only; docker copies the values from our environment.
    for var in [MONGO_USERNAME, MONGO_PASSWORD, MONGO_CLUSTER] {
        args.push("-e".to_string());
        args.push(var.to_string());
    }
    for (key, value) in [
        ("LOG_LEVEL", &settings.log_level),
        ("TZ", &settings.tz),
        ("FILES_ROOT", &settings.files_root),
        ("STAGE_FILES_ROOT", &settings.stage_root),
    ] {
        args.push("-e".to_string());
        args.push(format!("{key}={value}"));
    }
    for (host, container) in [
        (&settings.bucket_dir, &settings.files_root),
        (&settings.stage_dir, &settings.stage_root),
    ] {
        args.push("-v".to_string());
        args.push(format!("{}:{container}", host.display()));
    }
    args.push(settings.image.clone());
    args.push("--customer-id".to_string());
    args.push(settings.customer_id.clone());

    steps.push(Step {
        name: "docker run".to_string(),
        program: settings.docker.clone(),
        args,
    });

    JobPlan {
        mounts: vec![settings.bucket_dir.clone(), settings.stage_dir.clone()],
        steps,
    }
}

/// Container name unique per run: `<customer>-<UTC timestamp>`.
#[must_use]
pub fn container_name(customer_id: &str) -> String {
    format!(
        "{customer_id}-{}",
        chrono::Utc::now().format("%Y%m%d%H%M%S")
    )
}

/// Creates `dir` and returns its absolute path.
///
/// # Errors
///
/// Returns an I/O error if the directory cannot be created or resolved.
pub fn prepare_mount(dir: &Path) -> std::io::Result<PathBuf> {
    std::fs::create_dir_all(dir)?;
    let absolute = std::fs::canonicalize(dir)?;
    tracing::debug!(dir = %absolute.display(), "mount directory ready");
    Ok(absolute)
}

/// Runs one step with inherited stdio and waits for it.
///
/// # Errors
///
/// Returns `JobError::SpawnFailed` if the program cannot start, or
/// `JobError::CommandFailed` with the child's code if it exits non-zero.
pub async fn run_step(step: &Step) -> Result<(), JobError> {
    tracing::info!(step = %step.name, "running");

    let status = tokio::process::Command::new(&step.program)
        .args(&step.args)
        .stdin(Stdio::null())
        .stdout(Stdio::inherit())
        .stderr(Stdio::inherit())
        .status()
        .await
        .map_err(|source| JobError::SpawnFailed {
            program: step.program.clone(),
            source,
        })?;

    if status.success() {
        Ok(())
    } else {
        Err(JobError::CommandFailed {
            step: step.name.clone(),
            code: status.code().unwrap_or(1),
        })
    }
}

/// Runs every step of `plan` in order, stopping at the first failure.
///
/// # Errors
///
/// Returns the first failing step's error.
pub async fn execute(plan: &JobPlan) -> Result<(), JobError> {
    for step in &plan.steps {
        run_step(step).await?;
    }
    Ok(())
}
