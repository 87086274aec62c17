//! CLI argument definitions
//!
//! All Clap derive structs for `entrygate` command-line parsing. Every
//! option that a container would set has an environment fallback.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand, ValueEnum};

use crate::config::profiles::Profile;
use crate::config::schema::{PolicyFile, RequiredVar, Requirements};
use crate::error::EntrygateError;
use crate::handoff::init::{INIT_PID, InitSignal, InitTarget};
use crate::handoff::params::DEFAULT_APP;
use crate::observability::LogFormat;

/// Default supervisor configuration path.
pub const DEFAULT_SUPERVISOR_CONFIG: &str = "/etc/supervisor/conf.d/supervisord.conf";

// ============================================================================
// Root CLI
// ============================================================================

/// Fail-fast container entrypoint: validate required configuration, then
/// hand off to the workload.
#[derive(Parser, Debug)]
#[command(name = "entrygate", author, version, about)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug, -vvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output; errors are still printed.
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// Color output control.
    #[arg(long, default_value = "auto", global = true, env = "ENTRYGATE_COLOR")]
    pub color: ColorChoice,

    /// Log line format.
    #[arg(long, default_value = "human", global = true, env = "ENTRYGATE_LOG_FORMAT")]
    pub log_format: LogFormat,
}

// ============================================================================
// Top-Level Commands
// ============================================================================

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validate, then exec the process supervisor.
    Supervisor(SupervisorArgs),

    /// Validate, then exec the application server with derived parameters.
    Serve(ServeArgs),

    /// Validate only and report; never hands off.
    Check(CheckArgs),

    /// Build and run the scheduled job image locally.
    Job(JobArgs),

    /// Generate shell completion scripts.
    Completions(CompletionsArgs),

    /// Display version information.
    Version(VersionArgs),
}

// ============================================================================
// Gate Options
// ============================================================================

/// Options shared by every command that runs the gate.
#[derive(Args, Debug, Clone)]
pub struct GateArgs {
    /// Built-in requirement profiles (comma separated).
    #[arg(long = "profile", value_delimiter = ',', env = "ENTRYGATE_PROFILES")]
    pub profiles: Vec<Profile>,

    /// Do not apply the command's default profile.
    #[arg(long)]
    pub no_default_profile: bool,

    /// Additional required variable (repeatable, comma separated).
    #[arg(long, value_name = "NAME", value_delimiter = ',', env = "ENTRYGATE_REQUIRE")]
    pub require: Vec<String>,

    /// Required variable that must contain a substring.
    #[arg(
        long,
        value_name = "NAME=SUBSTRING",
        value_delimiter = ',',
        env = "ENTRYGATE_REQUIRE_CONTAINS"
    )]
    pub require_contains: Vec<String>,

    /// Required variable with a minimum length.
    #[arg(
        long,
        value_name = "NAME=LENGTH",
        value_delimiter = ',',
        env = "ENTRYGATE_REQUIRE_MIN_LEN"
    )]
    pub require_min_len: Vec<String>,

    /// YAML requirement policy file.
    #[arg(long, env = "ENTRYGATE_POLICY")]
    pub policy: Option<PathBuf>,

    /// When to SIGTERM pid 1 after a failed gate.
    #[arg(long, default_value = "auto", env = "ENTRYGATE_SIGNAL_INIT")]
    pub signal_init: InitSignal,

    /// Pid to signal in place of init.
    #[arg(
        long,
        hide = true,
        default_value_t = INIT_PID,
        value_parser = clap::value_parser!(u32).range(1..),
        env = "ENTRYGATE_INIT_PID"
    )]
    pub init_pid: u32,
}

impl GateArgs {
    /// The signal owed to init if this gate fails.
    #[must_use]
    pub const fn init_target(&self) -> InitTarget {
        InitTarget {
            policy: self.signal_init,
            pid: self.init_pid,
        }
    }

    /// Assembles the requirement set: profiles (or `defaults` when none were
    /// given), then `--require*` options, then the policy file.
    ///
    /// # Errors
    ///
    /// Returns an error for malformed requirement options or an unreadable
    /// or invalid policy file.
    pub fn requirements(&self, defaults: &[Profile]) -> Result<Requirements, EntrygateError> {
        let mut reqs = Requirements::new();

        let profiles: &[Profile] = if !self.profiles.is_empty() {
            &self.profiles
        } else if self.no_default_profile {
            &[]
        } else {
            defaults
        };
        for profile in profiles {
            reqs.extend(profile.requirements());
        }

        for name in &self.require {
            reqs.push(RequiredVar::new(name.trim())?);
        }
        for arg in &self.require_contains {
            reqs.push(RequiredVar::parse_contains(arg)?);
        }
        for arg in &self.require_min_len {
            reqs.push(RequiredVar::parse_min_length(arg)?);
        }

        if let Some(path) = &self.policy {
            tracing::debug!(policy = %path.display(), "loading requirement policy");
            reqs.extend(PolicyFile::load(path)?.into_requirements()?);
        }

        Ok(reqs)
    }
}

// ============================================================================
// Handoff Commands
// ============================================================================

/// Arguments for `supervisor`.
#[derive(Args, Debug)]
pub struct SupervisorArgs {
    /// Requirement options.
    #[command(flatten)]
    pub gate: GateArgs,

    /// Supervisor program.
    #[arg(long, default_value = "supervisord", env = "SUPERVISOR_PROGRAM")]
    pub program: String,

    /// Supervisor configuration file.
    #[arg(short, long, default_value = DEFAULT_SUPERVISOR_CONFIG, env = "SUPERVISOR_CONFIG")]
    pub config: PathBuf,

    /// Print the command instead of running it.
    #[arg(long)]
    pub dry_run: bool,

    /// Output format for `--dry-run`.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Extra arguments passed to the supervisor (after `--`).
    #[arg(last = true)]
    pub args: Vec<String>,
}

/// Arguments for `serve`.
#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Requirement options.
    #[command(flatten)]
    pub gate: GateArgs,

    /// Application server program.
    #[arg(long, default_value = "gunicorn", env = "SERVER_PROGRAM")]
    pub program: String,

    /// Application module to serve.
    #[arg(long, default_value = DEFAULT_APP, env = "APP_MODULE")]
    pub app: String,

    /// Print the command instead of running it.
    #[arg(long)]
    pub dry_run: bool,

    /// Output format for `--dry-run`.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,

    /// Extra arguments inserted before the application module (after `--`).
    #[arg(last = true)]
    pub args: Vec<String>,
}

/// Arguments for `check`.
#[derive(Args, Debug)]
pub struct CheckArgs {
    /// Requirement options.
    #[command(flatten)]
    pub gate: GateArgs,

    /// Also validate the application server parameters.
    #[arg(long)]
    pub server_params: bool,

    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Job Command
// ============================================================================

/// Arguments for `job`.
#[derive(Args, Debug)]
pub struct JobArgs {
    /// Customer identifier, e.g. `stg-modula-00001`.
    pub customer_id: Option<String>,

    /// Image tag to build and run.
    #[arg(long, default_value = "files-job:local", env = "JOB_IMAGE")]
    pub image: String,

    /// Build context directory.
    #[arg(long, default_value = ".", env = "JOB_CONTEXT")]
    pub context: PathBuf,

    /// Dockerfile path.
    #[arg(long, env = "JOB_DOCKERFILE")]
    pub dockerfile: Option<PathBuf>,

    /// Host directory mirroring the storage bucket.
    #[arg(long, default_value = "./.local/gcp-bucket", env = "JOB_BUCKET_DIR")]
    pub bucket_dir: PathBuf,

    /// Host staging directory.
    #[arg(long, default_value = "./.local/staged-files", env = "JOB_STAGE_DIR")]
    pub stage_dir: PathBuf,

    /// Docker CLI binary.
    #[arg(long, default_value = "docker", env = "DOCKER")]
    pub docker: String,

    /// Skip `docker build`.
    #[arg(long)]
    pub no_build: bool,

    /// Print the plan instead of running it.
    #[arg(long)]
    pub dry_run: bool,

    /// Output format for `--dry-run`.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// Completions / Version
// ============================================================================

/// Arguments for shell completion generation.
#[derive(Args, Debug)]
pub struct CompletionsArgs {
    /// Target shell for completion script.
    pub shell: Shell,
}

/// Arguments for version display.
#[derive(Args, Debug)]
pub struct VersionArgs {
    /// Output format.
    #[arg(short, long, default_value = "human")]
    pub format: OutputFormat,
}

// ============================================================================
// CLI-Local Enums
// ============================================================================

/// Color output choice.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum ColorChoice {
    /// Auto-detect terminal support.
    #[default]
    Auto,
    /// Always use color.
    Always,
    /// Never use color.
    Never,
}

/// Output format for structured output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable output.
    #[default]
    Human,
    /// JSON output.
    Json,
}

/// Shell type for completion generation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Shell {
    /// Bash shell.
    Bash,
    /// Zsh shell.
    Zsh,
    /// Fish shell.
    Fish,
    /// `PowerShell`.
    #[value(name = "powershell")]
    PowerShell,
    /// Elvish shell.
    Elvish,
}

// ============================================================================
// Tests
// ============================================================================
