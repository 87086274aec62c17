//! Shared integration-test harness: runs the `entrygate` binary with a
//! cleared, controlled environment and provides throwaway target programs.

#![allow(dead_code)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::process::{Command, Output};

/// Credentials that satisfy the `database` profile.
pub const DATABASE_ENV: &[(&str, &str)] = &[
    ("MONGO_USERNAME", "svc-files"),
    ("MONGO_PASSWORD", "correct-horse-battery"),
    ("MONGO_CLUSTER", "cluster0.ab12c.mongodb.net"),
];

/// Credentials that satisfy the `api` profile.
pub const API_ENV: &[(&str, &str)] = &[
    ("API_KEY", "0123456789abcdef"),
    ("API_SECRET", "0123456789abcdef0123456789abcdef"),
];

/// Builder for one `entrygate` invocation.
pub struct Entrygate {
    args: Vec<String>,
    env: Vec<(String, String)>,
}

impl Entrygate {
    /// Starts an invocation with `args` and an empty environment (apart
    /// from `PATH`), with init signalling disabled.
    pub fn new(args: &[&str]) -> Self {
        Self {
            args: args.iter().map(ToString::to_string).collect(),
            env: vec![("ENTRYGATE_SIGNAL_INIT".into(), "never".into())],
        }
    }

    /// Sets one environment variable.
    pub fn env(mut self, key: &str, value: &str) -> Self {
        self.env.push((key.into(), value.into()));
        self
    }

    /// Sets several environment variables.
    pub fn envs(mut self, vars: &[(&str, &str)]) -> Self {
        for (k, v) in vars {
            self.env.push(((*k).into(), (*v).into()));
        }
        self
    }

    /// Runs to completion and captures output.
    ///
    /// A freshly written script can transiently fail to exec with
    /// `ETXTBSY` (exit 126) while another test thread is forking; such
    /// runs are retried.
    #[allow(clippy::missing_panics_doc)]
    pub fn output(&self) -> Output {
        let mut last = None;
        for _ in 0..3 {
            let output = Command::new(env!("CARGO_BIN_EXE_entrygate"))
                .args(&self.args)
                .env_clear()
                .env("PATH", std::env::var_os("PATH").unwrap_or_default())
                .envs(self.env.iter().map(|(k, v)| (k, v)))
                .output()
                .expect("failed to spawn entrygate");
            if output.status.code() != Some(126) {
                return output;
            }
            last = Some(output);
        }
        last.expect("at least one attempt")
    }
}

/// Stand-in init: runs its arguments as a child told to signal this shell,
/// records a SIGTERM and forwards it to the child the way `tini` does.
const FORWARDING_INIT: &str = r#"
out=$1; shift
trap ': > "$out/signalled"; kill -TERM "$child" 2>/dev/null' TERM
ENTRYGATE_INIT_PID=$$ "$@" 2> "$out/stderr" &
child=$!
wait "$child"; rc=$?
if [ "$rc" -gt 128 ]; then wait "$child"; rc=$?; fi
echo "$rc" > "$out/rc"
"#;

/// What happened under [`Entrygate::output_under_init`].
pub struct InitRun {
    /// Exit code of `entrygate`
    pub code: i32,
    /// Everything `entrygate` wrote to stderr
    pub stderr: String,
    /// Whether the stand-in init received SIGTERM
    pub signalled: bool,
}

impl Entrygate {
    /// Runs under a shell init that forwards SIGTERM back, with init
    /// signalling forced on.
    #[allow(clippy::missing_panics_doc)]
    pub fn output_under_init(&self, dir: &Path) -> InitRun {
        let status = Command::new("/bin/sh")
            .args(["-c", FORWARDING_INIT, "init"])
            .arg(dir)
            .arg(env!("CARGO_BIN_EXE_entrygate"))
            .args(&self.args)
            .env_clear()
            .env("PATH", std::env::var_os("PATH").unwrap_or_default())
            .envs(self.env.iter().map(|(k, v)| (k, v)))
            .env("ENTRYGATE_SIGNAL_INIT", "always")
            .status()
            .expect("failed to spawn init shell");
        assert!(status.success(), "init shell failed: {status}");

        let code = std::fs::read_to_string(dir.join("rc")).expect("rc recorded");
        InitRun {
            code: code.trim().parse().expect("numeric rc"),
            stderr: std::fs::read_to_string(dir.join("stderr")).unwrap_or_default(),
            signalled: dir.join("signalled").exists(),
        }
    }
}

/// Writes an executable `sh` script into `dir`.
#[allow(clippy::missing_panics_doc)]
pub fn write_script(dir: &Path, name: &str, body: &str) -> PathBuf {
    let path = dir.join(name);
    std::fs::write(&path, format!("#!/bin/sh\n{body}\n")).expect("write script");
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).expect("chmod");
    path
}

/// Writes a target program that records its argv into `<dir>/ran` and
/// exits with `code`.
pub fn recording_target(dir: &Path, code: i32) -> (PathBuf, PathBuf) {
    let marker = dir.join("ran");
    let script = write_script(
        dir,
        "target.sh",
        &format!("printf '%s\\n' \"$@\" > '{}'\nexit {code}", marker.display()),
    );
    (script, marker)
}

/// Lossy stdout.
pub fn stdout(output: &Output) -> String {
    String::from_utf8_lossy(&output.stdout).into_owned()
}

/// Lossy stderr.
pub fn stderr(output: &Output) -> String {
    String::from_utf8_lossy(&output.stderr).into_owned()
}
