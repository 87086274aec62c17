//! `job` command handler.
//!
//! Checks the customer identifier and the database credentials, prepares
//! the bind-mount directories, then builds and runs the job image.

use clap::CommandFactory;

use crate::cli::args::{Cli, JobArgs, OutputFormat};
use crate::config::env::{EnvSource, ProcessEnv};
use crate::config::profiles::database_presence;
use crate::config::validation::{ValidationReport, validate};
use crate::error::{EntrygateError, JobError};
use crate::job::{
    JobPlan, JobSettings, check_customer_id, container_name, execute, plan, prepare_mount,
};

/// Renders `entrygate job --help` usage text.
#[must_use]
pub fn usage() -> String {
    let mut cmd = Cli::command();
    cmd.find_subcommand_mut("job")
        .map(|sub| sub.render_usage().to_string())
        .unwrap_or_default()
}

/// Runs every pre-flight check and returns the settings to run with.
///
/// # Errors
///
/// - `JobError::MissingCustomer` when no identifier was given.
/// - `ConfigError::Validation` for a malformed identifier or any missing
///   credential (all reported together).
pub fn preflight(args: &JobArgs, env: &dyn EnvSource) -> Result<JobSettings, EntrygateError> {
    let Some(customer_id) = args.customer_id.as_deref().map(str::trim).filter(|s| !s.is_empty())
    else {
        return Err(JobError::MissingCustomer { usage: usage() }.into());
    };

    let mut report = ValidationReport::default();
    if let Err(err) = check_customer_id(customer_id) {
        report.absorb(err.issues().to_vec());
    }
    report.absorb(validate(&database_presence(), env).issues);
    report.into_result()?;

    let mut settings = JobSettings {
        customer_id: customer_id.to_string(),
        image: args.image.clone(),
        context: args.context.clone(),
        dockerfile: args.dockerfile.clone(),
        bucket_dir: args.bucket_dir.clone(),
        stage_dir: args.stage_dir.clone(),
        docker: args.docker.clone(),
        build: !args.no_build,
        log_level: String::new(),
        tz: String::new(),
        files_root: String::new(),
        stage_root: String::new(),
    };
    settings.apply_env(env);
    Ok(settings)
}

fn print_plan(plan: &JobPlan, format: OutputFormat) -> Result<(), EntrygateError> {
    match format {
        OutputFormat::Human => {
            for dir in &plan.mounts {
                println!("mkdir -p {}", dir.display());
            }
            for step in &plan.steps {
                let words = std::iter::once(step.program.as_str())
                    .chain(step.args.iter().map(String::as_str));
                println!("{}", shlex::try_join(words).unwrap_or_default());
            }
        }
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(plan)?),
    }
    Ok(())
}

/// Run the job locally.
///
/// # Errors
///
/// Returns pre-flight errors, I/O errors creating the mount directories,
/// or the first failing docker step.
pub async fn run(args: &JobArgs) -> Result<(), EntrygateError> {
    let mut settings = preflight(args, &ProcessEnv)?;
    let name = container_name(&settings.customer_id);

    if args.dry_run {
        return print_plan(&plan(&settings, &name), args.format);
    }

    settings.bucket_dir = prepare_mount(&settings.bucket_dir)?;
    settings.stage_dir = prepare_mount(&settings.stage_dir)?;

    let job_plan = plan(&settings, &name);
    tracing::info!(
        customer = %settings.customer_id,
        image = %settings.image,
        container = %name,
        "starting local job run"
    );
    execute(&job_plan).await?;
    tracing::info!(customer = %settings.customer_id, "job run completed");
    Ok(())
}
