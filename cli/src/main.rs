//! carvote CLI - binary entry point and the terminal driver loop.
//!
//! ```text
//! main() -> init_tracing() -> load config -> ApiClient -> SessionController::start
//!                                                              |
//!                                                              v
//!                      every 50ms: drain stdin -> controller.tick() -> print on version change
//! ```
//!
//! Logs go to `~/.carvote/logs/carvote.log`; stdout belongs to the session view.

mod dispatch;
mod input;
mod render;

use std::env;
use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use anyhow::{Context, Result};
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use carvote_client::ApiClient;
use carvote_config::{BACKEND_URL_ENV, CarvoteConfig, resolve_backend_url};
use carvote_engine::{SessionConfig, SessionController};

use dispatch::{CommandOutcome, apply_command};
use input::{Command, InputMsg, InputPump};
use render::{COMMAND_HELP, render_view};

const TICK_INTERVAL: Duration = Duration::from_millis(50);

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let (log_file, init_warnings) = open_log_file();

    if let Some((log_path, file)) = log_file {
        tracing_subscriber::registry()
            .with(fmt::layer().with_ansi(false).with_writer(Mutex::new(file)))
            .with(env_filter)
            .init();

        tracing::info!(path = %log_path.display(), "Logging initialized");
        for warning in init_warnings {
            tracing::warn!("{warning}");
        }
        return;
    }

    // No log file: stay silent rather than interleave logs with the view.
    tracing_subscriber::registry().with(env_filter).init();
}

fn open_log_file() -> (Option<(PathBuf, fs::File)>, Vec<String>) {
    let mut warnings = Vec::new();

    for candidate in log_file_candidates() {
        if let Some(parent) = candidate.parent()
            && let Err(e) = fs::create_dir_all(parent)
        {
            warnings.push(format!(
                "Failed to create log dir {}: {e}",
                parent.display()
            ));
            continue;
        }

        match OpenOptions::new().create(true).append(true).open(&candidate) {
            Ok(file) => return (Some((candidate, file)), warnings),
            Err(e) => {
                warnings.push(format!(
                    "Failed to open log file {}: {e}",
                    candidate.display()
                ));
            }
        }
    }

    (None, warnings)
}

fn log_file_candidates() -> Vec<PathBuf> {
    let mut candidates = Vec::new();

    // Primary: ~/.carvote/logs/carvote.log
    if let Some(config_path) = CarvoteConfig::path()
        && let Some(config_dir) = config_path.parent()
    {
        candidates.push(config_dir.join("logs").join("carvote.log"));
    }

    // Fallback: ./.carvote/logs/carvote.log
    candidates.push(PathBuf::from(".carvote").join("logs").join("carvote.log"));

    candidates
}

fn load_config() -> Option<CarvoteConfig> {
    match CarvoteConfig::load() {
        Ok(config) => config,
        Err(err) => {
            tracing::warn!(path = %err.path().display(), error = %err, "Ignoring config file");
            eprintln!("warning: {err}; using defaults");
            None
        }
    }
}

enum LoopExit {
    Quit,
    InputClosed,
}

async fn run(client: Arc<ApiClient>, session_config: SessionConfig) -> LoopExit {
    let mut pump = InputPump::new();
    let mut interval = tokio::time::interval(TICK_INTERVAL);
    interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    let mut controller = SessionController::start(Arc::clone(&client), session_config);
    let mut last_version = None;

    loop {
        interval.tick().await;

        while let Some(msg) = pump.try_recv() {
            let line = match msg {
                InputMsg::Line(line) => line,
                InputMsg::Closed => {
                    controller.teardown();
                    return LoopExit::InputClosed;
                }
            };
            let Some(command) = Command::parse(&line) else {
                continue;
            };
            let outcome = apply_command(&mut controller, command, || {
                SessionController::start(Arc::clone(&client), session_config)
            });
            match outcome {
                CommandOutcome::Voted(_) => {}
                CommandOutcome::Restarted => last_version = None,
                CommandOutcome::RestartRefused => {
                    println!("Restart is only available after an error.");
                }
                CommandOutcome::Quit => return LoopExit::Quit,
                CommandOutcome::Help => println!("{COMMAND_HELP}"),
                CommandOutcome::Unknown(raw) => {
                    println!("Unknown command '{raw}'. {COMMAND_HELP}");
                }
            }
        }

        controller.tick();

        let version = controller.version();
        if last_version != Some(version) {
            last_version = Some(version);
            println!();
            print!(
                "{}",
                render_view(controller.phase(), controller.is_vote_pending())
            );
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = load_config();
    let env_url = env::var(BACKEND_URL_ENV).ok();
    let base = resolve_backend_url(env_url.as_deref(), config.as_ref())
        .with_context(|| format!("invalid backend address (check {BACKEND_URL_ENV})"))?;
    let timeout = config
        .as_ref()
        .map(CarvoteConfig::request_timeout)
        .unwrap_or_else(|| CarvoteConfig::default().request_timeout());
    let session_config = config
        .as_ref()
        .map(SessionConfig::from)
        .unwrap_or_default();

    tracing::info!(backend = %base, timeout_secs = timeout.as_secs(), "Starting carvote");
    let client = ApiClient::new(base, timeout).context("failed to build HTTP client")?;

    match run(Arc::new(client), session_config).await {
        LoopExit::Quit => tracing::info!("Quit requested"),
        LoopExit::InputClosed => tracing::info!("Input closed"),
    }
    Ok(())
}
