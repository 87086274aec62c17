//! `entrygate` - fail-fast container entrypoint

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use clap::Parser;

use entrygate::cli::args::Cli;
use entrygate::cli::commands;
use entrygate::error::ExitCode;
use entrygate::observability::init_logging;

#[tokio::main]
async fn main() {
    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = e.print();
            std::process::exit(ExitCode::USAGE_ERROR);
        }
        Err(e) => e.exit(),
    };

    if !cli.quiet {
        init_logging(cli.log_format, cli.verbose, cli.color);
    }

    // Set once a failed gate is on its way out; init may echo our SIGTERM back.
    let failing = Arc::new(AtomicBool::new(false));

    // Only reachable while the job runner waits on docker, or while a failed
    // gate exits; a successful handoff replaces us.
    let ignore_term = Arc::clone(&failing);
    tokio::spawn(async move {
        let Ok(mut sigterm) =
            tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
        else {
            tracing::warn!("failed to register SIGTERM handler");
            return;
        };

        loop {
            tokio::select! {
                _ = tokio::signal::ctrl_c() => std::process::exit(ExitCode::INTERRUPTED),
                _ = sigterm.recv() => {
                    if ignore_term.load(Ordering::SeqCst) {
                        tracing::debug!("SIGTERM during gate failure, keeping exit code");
                        continue;
                    }
                    std::process::exit(ExitCode::TERMINATED);
                }
            }
        }
    });

    match commands::dispatch(cli).await {
        Ok(()) => std::process::exit(ExitCode::SUCCESS),
        Err(e) => {
            eprintln!("error: {e}");
            if let Some(init) = e.init_target() {
                failing.store(true, Ordering::SeqCst);
                init.signal();
            }
            std::process::exit(e.exit_code());
        }
    }
}
