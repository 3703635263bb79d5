/*============================================================
  Synavera Project: Syn-Vigil
  Module: synvigil_core::main
  Etiquette: Synavera Script Etiquette — Rust Profile v1.1.1
  ------------------------------------------------------------
  Purpose:
    Entry point for Syn-Vigil Core. Watches a repository's
    latest-release endpoint, persists the outcome of each
    check, announces newer versions, and answers control
    requests from companion tooling.

  Security / Safety Notes:
    Operates within user privileges. Performs HTTPS GET
    requests against a public API only.

  Dependencies:
    clap for CLI parsing, tokio for the runtime, chrono for
    session timestamps.

  Operational Scope:
    Run as a long-lived daemon (startup check, hourly cadence,
    control socket) or with `--once` for a single check from
    scripts and service health probes.

  Revision History:
    2025-06-12 COD  Authored Syn-Vigil Core runtime.
  ------------------------------------------------------------
  SSE Principles Observed:
    - Result-first error handling with deterministic exits
    - Structured logging following Synavera cadence
    - Configurable execution via CLI and config file
============================================================*/

mod checker;
mod config;
mod control;
mod error;
mod logger;
mod notify;
mod release;
mod store;
mod version;

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use std::time::Duration;

use chrono::Utc;
use clap::{ArgAction, Parser};
use tokio::time::MissedTickBehavior;

use checker::UpdateChecker;
use config::{parse_repository_slug, VigilConfig};
use error::{Result, VigilError};
use logger::Logger;
use notify::{ConsoleNotifier, Notifier, SilentNotifier};
use release::GitHubReleaseClient;
use store::JsonFileStore;

/// Command-line arguments for Syn-Vigil-Core.
#[derive(Debug, Parser)]
#[command(
    name = "Syn-Vigil-Core",
    version,
    author = "Synavera Systems",
    about = "Release sentinel for Synavera deployments"
)]
struct Cli {
    /// Override configuration file path.
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// Repository to watch, in owner/name form.
    #[arg(long, value_name = "OWNER/NAME")]
    repo: Option<String>,
    /// Installed version to compare against.
    #[arg(long, value_name = "X.Y.Z")]
    current_version: Option<String>,
    /// Override state file path.
    #[arg(long, value_name = "PATH")]
    state: Option<PathBuf>,
    /// Override control socket path.
    #[arg(long, value_name = "PATH")]
    socket: Option<PathBuf>,
    /// Explicit log file path.
    #[arg(long, value_name = "PATH")]
    log: Option<PathBuf>,
    /// Seconds between recurring checks.
    #[arg(long, value_name = "SECS")]
    interval_secs: Option<u64>,
    /// Run a single check, print its record as JSON, and exit.
    #[arg(long, action = ArgAction::SetTrue)]
    once: bool,
    /// Suppress update notifications.
    #[arg(long, action = ArgAction::SetTrue)]
    no_notify: bool,
    /// Enable verbose logging to stderr.
    #[arg(long, action = ArgAction::SetTrue)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("[Syn-Vigil-Core] {}", err);
            err.exit_code()
        }
    }
}

async fn run() -> Result<ExitCode> {
    let cli = Cli::parse();

    let config = VigilConfig::load_from_optional_path(cli.config.as_deref())?;

    let slug = cli
        .repo
        .clone()
        .or_else(|| config.watch.repository.clone())
        .ok_or_else(|| {
            VigilError::Config("No repository configured; set watch.repository or pass --repo".into())
        })?;
    let (owner, repo) = parse_repository_slug(&slug)?;

    let current_version = cli
        .current_version
        .clone()
        .or_else(|| config.watch.current_version.clone())
        .unwrap_or_else(|| env!("CARGO_PKG_VERSION").to_string());

    let interval_secs = cli.interval_secs.unwrap_or(config.watch.interval_secs);
    if interval_secs == 0 {
        return Err(VigilError::Config("Check interval must be positive".into()));
    }

    let session_stamp = Utc::now().format("%Y-%m-%d_%H-%M-%S").to_string();
    let log_path = cli
        .log
        .clone()
        .or_else(|| Some(config.log_dir().join(format!("vigil_{session_stamp}.log"))));
    let logger = Arc::new(Logger::new(log_path, cli.verbose)?);
    logger.info("INIT", format!("Syn-Vigil Core watching {owner}/{repo}"));

    let client = GitHubReleaseClient::new(&config.watch, &owner, &repo)?;
    logger.debug("ENDPOINT", client.endpoint().to_string());

    let releases_url = format!(
        "{}/{owner}/{repo}/releases",
        config.watch.releases_host.trim_end_matches('/')
    );
    let notifier: Box<dyn Notifier> = if cli.no_notify || !config.notify.enabled {
        Box::new(SilentNotifier)
    } else {
        Box::new(ConsoleNotifier::new(config.notify.open_release_page))
    };

    let state_path = cli.state.clone().unwrap_or_else(|| config.state_path());
    logger.info("STATE", format!("Persisting records to {}", state_path.display()));

    let checker = Arc::new(UpdateChecker::new(
        current_version,
        releases_url,
        Box::new(client),
        Box::new(JsonFileStore::new(state_path)),
        notifier,
        logger.clone(),
    ));

    if cli.once {
        let info = checker.check_for_updates().await;
        let rendered = serde_json::to_string_pretty(&info).map_err(|err| {
            VigilError::Serialization(format!("Failed to render UpdateInfo: {err}"))
        })?;
        println!("{rendered}");
        logger.info("COMPLETE", "Single check finished");
        logger.finalize()?;
        return Ok(ExitCode::SUCCESS);
    }

    let socket_path = cli.socket.clone().unwrap_or_else(|| config.socket_path());
    let mut control_task = tokio::spawn({
        let checker = checker.clone();
        let logger = logger.clone();
        async move { control::serve(checker, &socket_path, logger).await }
    });

    let mut ticker = tokio::time::interval(Duration::from_secs(interval_secs));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    logger.info(
        "SCHEDULE",
        format!("Checking now and every {interval_secs}s thereafter"),
    );

    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let info = checker.check_for_updates().await;
                logger.debug(
                    "RECORD",
                    format!(
                        "available={} error={}",
                        info.available,
                        info.error.as_deref().unwrap_or("none")
                    ),
                );
            }
            joined = &mut control_task => {
                logger.finalize()?;
                return Err(match joined {
                    Ok(Err(err)) => err,
                    Ok(Ok(())) => VigilError::Runtime("Control channel closed unexpectedly".into()),
                    Err(err) => VigilError::Runtime(format!("Control task failed: {err}")),
                });
            }
            _ = tokio::signal::ctrl_c() => {
                logger.info("SHUTDOWN", "Interrupt received; shutting down");
                break;
            }
        }
    }

    control_task.abort();
    logger.info("COMPLETE", "Watch ended");
    logger.finalize()?;
    Ok(ExitCode::SUCCESS)
}
