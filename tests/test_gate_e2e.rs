mod common;

use common::{API_ENV, DATABASE_ENV, Entrygate, recording_target, stderr, stdout};

// ============================================================================
// supervisor
// ============================================================================

#[test]
fn missing_variable_never_starts_target() {
    let tmp = tempfile::tempdir().unwrap();
    let (target, marker) = recording_target(tmp.path(), 0);

    let output = Entrygate::new(&["supervisor", "--program", target.to_str().unwrap()])
        .env("MONGO_USERNAME", "svc-files")
        .env("MONGO_CLUSTER", "cluster0.ab12c.mongodb.net")
        .output();

    assert_eq!(output.status.code(), Some(1), "stderr: {}", stderr(&output));
    assert!(!marker.exists(), "target must not run when the gate fails");
    assert!(stderr(&output).contains("MONGO_PASSWORD (missing)"));
}

#[test]
fn empty_variable_counts_as_missing() {
    let tmp = tempfile::tempdir().unwrap();
    let (target, marker) = recording_target(tmp.path(), 0);

    let output = Entrygate::new(&["supervisor", "--program", target.to_str().unwrap()])
        .envs(DATABASE_ENV)
        .env("MONGO_USERNAME", "")
        .output();

    assert_eq!(output.status.code(), Some(1));
    assert!(!marker.exists());
    assert!(stderr(&output).contains("MONGO_USERNAME (missing)"));
}

#[test]
fn all_missing_reported_in_one_message() {
    let output = Entrygate::new(&["supervisor", "--program", "/bin/true"]).output();
    assert_eq!(output.status.code(), Some(1));

    let err = stderr(&output);
    let line = err
        .lines()
        .find(|l| l.starts_with("error:"))
        .expect("aggregated error line");
    for var in ["MONGO_USERNAME", "MONGO_PASSWORD", "MONGO_CLUSTER"] {
        assert!(line.contains(var), "{var} missing from: {line}");
    }
}

#[test]
fn valid_config_hands_off_to_supervisor() {
    let tmp = tempfile::tempdir().unwrap();
    let (target, marker) = recording_target(tmp.path(), 0);

    let output = Entrygate::new(&[
        "supervisor",
        "--program",
        target.to_str().unwrap(),
        "--config",
        "/app/supervisord.conf",
    ])
    .envs(DATABASE_ENV)
    .output();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let argv = std::fs::read_to_string(&marker).expect("target should have run");
    assert_eq!(argv, "-n\n-c\n/app/supervisord.conf\n");
}

#[test]
fn exit_code_is_the_targets_own() {
    let tmp = tempfile::tempdir().unwrap();
    let (target, marker) = recording_target(tmp.path(), 42);

    let output = Entrygate::new(&["supervisor", "--program", target.to_str().unwrap()])
        .envs(DATABASE_ENV)
        .output();

    assert!(marker.exists());
    assert_eq!(output.status.code(), Some(42));
}

#[test]
fn missing_program_exits_127() {
    let output = Entrygate::new(&["supervisor", "--program", "/nonexistent/supervisord"])
        .envs(DATABASE_ENV)
        .output();
    assert_eq!(output.status.code(), Some(127), "stderr: {}", stderr(&output));
}

// ============================================================================
// shape constraints
// ============================================================================

#[test]
fn cluster_without_domain_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let (target, marker) = recording_target(tmp.path(), 0);

    let output = Entrygate::new(&["serve", "--program", target.to_str().unwrap()])
        .envs(DATABASE_ENV)
        .env("MONGO_CLUSTER", "mongo.internal:27017")
        .output();

    assert_eq!(output.status.code(), Some(1));
    assert!(!marker.exists());
    assert!(stderr(&output).contains("MONGO_CLUSTER (must contain '.mongodb.net')"));
}

#[test]
fn short_credential_rejected() {
    let tmp = tempfile::tempdir().unwrap();
    let (target, marker) = recording_target(tmp.path(), 0);

    let output = Entrygate::new(&[
        "serve",
        "--profile",
        "api",
        "--program",
        target.to_str().unwrap(),
    ])
    .envs(API_ENV)
    .env("API_SECRET", "short")
    .output();

    assert_eq!(output.status.code(), Some(1));
    assert!(!marker.exists());
    assert!(stderr(&output).contains("API_SECRET (must be at least 32 characters)"));
    assert!(!stderr(&output).contains("short"), "values must not be echoed");
}

#[test]
fn policy_file_constraints_apply() {
    let policy = std::path::PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/policy.yaml");
    let output = Entrygate::new(&[
        "check",
        "--no-default-profile",
        "--policy",
        policy.to_str().unwrap(),
    ])
    .env("MONGO_CLUSTER", "cluster0.ab12c.mongodb.net")
    .env("API_SECRET", "0123456789abcdef0123456789abcdef")
    .env("CUSTOMER_ID", "dev-modula-1")
    .output();

    assert_eq!(output.status.code(), Some(1));
    assert!(stdout(&output).contains("FAIL     CUSTOMER_ID"));
}

#[test]
fn unreadable_policy_is_io_error() {
    let output = Entrygate::new(&["check", "--policy", "/nonexistent/policy.yaml"]).output();
    assert_eq!(output.status.code(), Some(3));
}

#[test]
fn shape_options_fall_back_to_env() {
    let output = Entrygate::new(&["check", "--no-default-profile"])
        .env("ENTRYGATE_REQUIRE_MIN_LEN", "API_KEY=16,API_SECRET=32")
        .env("ENTRYGATE_REQUIRE_CONTAINS", "MONGO_CLUSTER=.mongodb.net")
        .env("API_KEY", "0123456789abcdef")
        .env("API_SECRET", "short")
        .env("MONGO_CLUSTER", "localhost")
        .output();

    assert_eq!(output.status.code(), Some(1));
    let out = stdout(&output);
    assert!(out.contains("ok       API_KEY"), "{out}");
    assert!(out.contains("API_SECRET (must be at least 32 characters)"), "{out}");
    assert!(out.contains("MONGO_CLUSTER (must contain '.mongodb.net')"), "{out}");
}

// ============================================================================
// init signalling
// ============================================================================

#[test]
fn failure_is_reported_before_init_forwards_sigterm() {
    let tmp = tempfile::tempdir().unwrap();
    for _ in 0..5 {
        let run = Entrygate::new(&["--quiet", "supervisor", "--program", "/bin/true"])
            .output_under_init(tmp.path());

        assert!(run.signalled, "init was not signalled");
        assert_eq!(run.code, 1, "stderr: {}", run.stderr);
        assert_eq!(
            run.stderr.trim_end(),
            "error: missing or invalid configuration: MONGO_USERNAME (missing), \
             MONGO_PASSWORD (missing), MONGO_CLUSTER (missing)"
        );
        std::fs::remove_file(tmp.path().join("signalled")).unwrap();
    }
}

#[test]
fn unreadable_policy_fails_the_gate() {
    let tmp = tempfile::tempdir().unwrap();
    let run = Entrygate::new(&[
        "--quiet",
        "supervisor",
        "--program",
        "/bin/true",
        "--policy",
        "/nonexistent/policy.yaml",
    ])
    .envs(DATABASE_ENV)
    .output_under_init(tmp.path());

    assert!(run.signalled, "init was not signalled");
    assert_eq!(run.code, 1, "stderr: {}", run.stderr);
    assert!(run.stderr.contains("cannot read policy /nonexistent/policy.yaml"));
}

#[test]
fn bad_requirement_fails_the_gate() {
    let tmp = tempfile::tempdir().unwrap();
    let run = Entrygate::new(&["--quiet", "serve", "--program", "/bin/true", "--require", "NOT-VALID"])
        .envs(DATABASE_ENV)
        .output_under_init(tmp.path());

    assert!(run.signalled, "init was not signalled");
    assert_eq!(run.code, 1, "stderr: {}", run.stderr);
    assert!(run.stderr.contains("NOT-VALID"));
}

#[test]
fn passing_gate_leaves_init_alone() {
    let tmp = tempfile::tempdir().unwrap();
    let run = Entrygate::new(&["--quiet", "supervisor", "--program", "/bin/true"])
        .envs(DATABASE_ENV)
        .output_under_init(tmp.path());

    assert_eq!(run.code, 0, "stderr: {}", run.stderr);
    assert!(!run.signalled);
}

// ============================================================================
// serve
// ============================================================================

#[test]
fn serve_passes_derived_parameters() {
    let tmp = tempfile::tempdir().unwrap();
    let (target, marker) = recording_target(tmp.path(), 0);

    let output = Entrygate::new(&["serve", "--program", target.to_str().unwrap()])
        .envs(DATABASE_ENV)
        .env("PORT", "9000")
        .env("GUNICORN_WORKERS", "3")
        .env("GUNICORN_EXTRA_ARGS", "--access-logfile -")
        .output();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let argv: Vec<String> = std::fs::read_to_string(&marker)
        .unwrap()
        .lines()
        .map(String::from)
        .collect();
    assert!(argv.windows(2).any(|w| w == ["--bind", "0.0.0.0:9000"]));
    assert!(argv.windows(2).any(|w| w == ["--workers", "3"]));
    assert!(argv.windows(2).any(|w| w == ["--threads", "4"]));
    assert!(argv.windows(2).any(|w| w == ["--access-logfile", "-"]));
    assert_eq!(argv.last().map(String::as_str), Some("app:app"));
}

#[test]
fn serve_malformed_optional_fails_with_required() {
    let output = Entrygate::new(&["serve", "--program", "/bin/true"])
        .envs(DATABASE_ENV)
        .env("MONGO_PASSWORD", "")
        .env("GUNICORN_TIMEOUT", "forever")
        .output();

    assert_eq!(output.status.code(), Some(1));
    let err = stderr(&output);
    assert!(err.contains("MONGO_PASSWORD (missing)"), "{err}");
    assert!(err.contains("GUNICORN_TIMEOUT (must be a positive integer)"), "{err}");
}

#[test]
fn serve_dry_run_json() {
    let output = Entrygate::new(&["serve", "--dry-run", "--format", "json"])
        .envs(DATABASE_ENV)
        .output();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    let parsed: serde_json::Value =
        serde_json::from_str(&stdout(&output)).expect("dry-run JSON should be valid");
    assert_eq!(parsed["program"], "gunicorn");
    assert_eq!(parsed["args"][0], "--bind");
}

// ============================================================================
// check
// ============================================================================

#[test]
fn check_json_reports_every_issue() {
    let output = Entrygate::new(&["check", "--profile", "database,api", "--format", "json"])
        .envs(DATABASE_ENV)
        .output();

    assert_eq!(output.status.code(), Some(1));
    let parsed: serde_json::Value = serde_json::from_str(&stdout(&output)).unwrap();
    assert_eq!(parsed["valid"], false);
    assert_eq!(parsed["checked"].as_array().unwrap().len(), 3);
    let issues = parsed["issues"].as_array().unwrap();
    assert_eq!(issues.len(), 2);
    assert_eq!(issues[0]["var"], "API_KEY");
    assert_eq!(issues[0]["kind"], "missing_variable");
}

#[test]
fn check_passes_with_full_config() {
    let output = Entrygate::new(&["check", "--profile", "database,api"])
        .envs(DATABASE_ENV)
        .envs(API_ENV)
        .output();

    assert!(output.status.success(), "stderr: {}", stderr(&output));
    assert_eq!(stdout(&output).lines().count(), 5);
}
