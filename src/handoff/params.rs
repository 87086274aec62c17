//! Application server startup parameters.
//!
//! Every parameter is optional in the environment and falls back to a
//! documented default. Malformed values are reported as
//! [`IssueKind::InvalidFormat`](crate::error::IssueKind) issues alongside
//! the required-variable issues.

use serde::Serialize;

use crate::config::env::EnvSource;
use crate::error::ValidationIssue;

/// Default worker process count.
pub const DEFAULT_WORKERS: u32 = 2;
/// Default threads per worker.
pub const DEFAULT_THREADS: u32 = 4;
/// Default worker timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u32 = 120;
/// Default keep-alive in seconds.
pub const DEFAULT_KEEPALIVE_SECS: u32 = 5;
/// Default requests served before a worker is recycled.
pub const DEFAULT_MAX_REQUESTS: u32 = 1000;
/// Default random jitter added to `max_requests`.
pub const DEFAULT_MAX_REQUESTS_JITTER: u32 = 100;
/// Default bind host.
pub const DEFAULT_HOST: &str = "0.0.0.0";
/// Default bind port.
pub const DEFAULT_PORT: u16 = 8000;
/// Default server log level.
pub const DEFAULT_LOG_LEVEL: &str = "info";
/// Default WSGI application module.
pub const DEFAULT_APP: &str = "app:app";

const WORKERS_VARS: &[&str] = &["GUNICORN_WORKERS", "WEB_CONCURRENCY"];
const THREADS_VARS: &[&str] = &["GUNICORN_THREADS"];
const TIMEOUT_VARS: &[&str] = &["GUNICORN_TIMEOUT"];
const KEEPALIVE_VARS: &[&str] = &["GUNICORN_KEEPALIVE"];
const MAX_REQUESTS_VARS: &[&str] = &["GUNICORN_MAX_REQUESTS"];
const JITTER_VARS: &[&str] = &["GUNICORN_MAX_REQUESTS_JITTER"];
const HOST_VAR: &str = "HOST";
const PORT_VAR: &str = "PORT";
const LOG_LEVEL_VAR: &str = "LOG_LEVEL";
const EXTRA_ARGS_VAR: &str = "GUNICORN_EXTRA_ARGS";

/// Derived application server parameters.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServerParams {
    /// Worker processes.
    pub workers: u32,
    /// Threads per worker.
    pub threads: u32,
    /// Worker timeout, seconds.
    pub timeout: u32,
    /// Keep-alive, seconds.
    pub keep_alive: u32,
    /// Requests before a worker restarts.
    pub max_requests: u32,
    /// Jitter added to `max_requests`.
    pub max_requests_jitter: u32,
    /// Bind host.
    pub host: String,
    /// Bind port.
    pub port: u16,
    /// Server log level.
    pub log_level: String,
    /// Extra arguments appended verbatim.
    pub extra_args: Vec<String>,
}

impl Default for ServerParams {
    fn default() -> Self {
        Self {
            workers: DEFAULT_WORKERS,
            threads: DEFAULT_THREADS,
            timeout: DEFAULT_TIMEOUT_SECS,
            keep_alive: DEFAULT_KEEPALIVE_SECS,
            max_requests: DEFAULT_MAX_REQUESTS,
            max_requests_jitter: DEFAULT_MAX_REQUESTS_JITTER,
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            log_level: DEFAULT_LOG_LEVEL.to_string(),
            extra_args: Vec::new(),
        }
    }
}

impl ServerParams {
    /// Derives parameters from `env`.
    ///
    /// Returns the parameters (defaults substituted for anything malformed)
    /// together with one issue per malformed value.
    #[must_use]
    pub fn from_env(env: &dyn EnvSource) -> (Self, Vec<ValidationIssue>) {
        let mut issues = Vec::new();
        let d = Self::default();

        let params = Self {
            workers: count(env, WORKERS_VARS, d.workers, 1, &mut issues),
            threads: count(env, THREADS_VARS, d.threads, 1, &mut issues),
            timeout: count(env, TIMEOUT_VARS, d.timeout, 1, &mut issues),
            keep_alive: count(env, KEEPALIVE_VARS, d.keep_alive, 1, &mut issues),
            max_requests: count(env, MAX_REQUESTS_VARS, d.max_requests, 1, &mut issues),
            max_requests_jitter: count(env, JITTER_VARS, d.max_requests_jitter, 0, &mut issues),
            host: env.get_nonempty(HOST_VAR).unwrap_or(d.host),
            port: port(env, d.port, &mut issues),
            log_level: log_level(env, d.log_level, &mut issues),
            extra_args: extra_args(env, &mut issues),
        };

        (params, issues)
    }

    /// `host:port`, bracketing IPv6 literals.
    #[must_use]
    pub fn bind(&self) -> String {
        if self.host.contains(':') && !self.host.starts_with('[') {
            format!("[{}]:{}", self.host, self.port)
        } else {
            format!("{}:{}", self.host, self.port)
        }
    }

    /// Command-line arguments for the server, ending with `app`.
    #[must_use]
    pub fn to_args(&self, app: &str) -> Vec<String> {
        let mut args = vec![
            "--bind".to_string(),
            self.bind(),
            "--workers".to_string(),
            self.workers.to_string(),
            "--threads".to_string(),
            self.threads.to_string(),
            "--timeout".to_string(),
            self.timeout.to_string(),
            "--keep-alive".to_string(),
            self.keep_alive.to_string(),
            "--max-requests".to_string(),
            self.max_requests.to_string(),
            "--max-requests-jitter".to_string(),
            self.max_requests_jitter.to_string(),
            "--log-level".to_string(),
            self.log_level.clone(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args.push(app.to_string());
        args
    }
}

fn count(
    env: &dyn EnvSource,
    names: &[&str],
    default: u32,
    min: u32,
    issues: &mut Vec<ValidationIssue>,
) -> u32 {
    let Some((name, raw)) = env.first_nonempty(names) else {
        return default;
    };
    match raw.parse::<u32>() {
        Ok(n) if n >= min => n,
        _ => {
            let expected = if min == 0 {
                "must be a non-negative integer"
            } else {
                "must be a positive integer"
            };
            issues.push(ValidationIssue::invalid(name, expected));
            default
        }
    }
}

fn port(env: &dyn EnvSource, default: u16, issues: &mut Vec<ValidationIssue>) -> u16 {
    let Some(raw) = env.get_nonempty(PORT_VAR) else {
        return default;
    };
    match raw.parse::<u16>() {
        Ok(p) if p > 0 => p,
        _ => {
            issues.push(ValidationIssue::invalid(
                PORT_VAR,
                "must be a port number (1-65535)",
            ));
            default
        }
    }
}

fn log_level(env: &dyn EnvSource, default: String, issues: &mut Vec<ValidationIssue>) -> String {
    let Some(raw) = env.get_nonempty(LOG_LEVEL_VAR) else {
        return default;
    };
    match raw.to_ascii_lowercase().as_str() {
        "debug" => "debug".to_string(),
        "info" => "info".to_string(),
        "warn" | "warning" => "warning".to_string(),
        "error" => "error".to_string(),
        "critical" | "fatal" => "critical".to_string(),
        _ => {
            issues.push(ValidationIssue::invalid(
                LOG_LEVEL_VAR,
                "must be one of debug, info, warning, error, critical",
            ));
            default
        }
    }
}

fn extra_args(env: &dyn EnvSource, issues: &mut Vec<ValidationIssue>) -> Vec<String> {
    let Some(raw) = env.get_nonempty(EXTRA_ARGS_VAR) else {
        return Vec::new();
    };
    shlex::split(&raw).unwrap_or_else(|| {
        issues.push(ValidationIssue::invalid(
            EXTRA_ARGS_VAR,
            "must be valid shell words (unbalanced quotes?)",
        ));
        Vec::new()
    })
}
