//! Leakwatch - Pipeline Leak Monitoring Core (console entry point)
//!
//! One current-thread tokio runtime drives a single event loop. Poll ticks,
//! console lines, upstream completions and Ctrl-C are handled one at a time;
//! upstream requests run as spawned tasks that only send their completion
//! back into the loop.

mod api;
mod logic;
pub mod constants;

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{Interval, MissedTickBehavior};

use api::commands::{self, Command};
use logic::config::MonitorConfig;
use logic::monitor::Monitor;
use logic::snapshot::Snapshot;
use logic::storage::{FileBackend, StateBackend};
use logic::upstream::{
    Component, FailureDetail, HardwareStatus, Ticket, UpstreamClient, UpstreamError,
};

/// Result of a spawned upstream request
enum Completion {
    Snapshot(Ticket, Result<Snapshot, UpstreamError>),
    Hardware(Result<Vec<HardwareStatus>, UpstreamError>),
    Components(Result<Vec<Component>, UpstreamError>),
    Failure(i64, Result<FailureDetail, UpstreamError>),
}

fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .init();

    log::info!("Starting {} v{}...", constants::APP_NAME, constants::APP_VERSION);

    let config = MonitorConfig::load(constants::get_config_path().as_deref());
    let data_dir = constants::get_data_dir();
    let file_backend = FileBackend::default_location();
    log::info!("State directory: {:?}", file_backend.base_dir());
    let backend: Arc<dyn StateBackend> = Arc::new(file_backend);

    let client = UpstreamClient::new(config.upstream.clone())
        .context("Failed to build prediction service client")?;
    log::info!("Prediction service: {}", client.base_url());

    let rt = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to create tokio runtime")?;

    rt.block_on(run(config, backend, client, data_dir));

    log::info!("{} stopped", constants::APP_NAME);
    Ok(())
}

async fn run(
    config: MonitorConfig,
    backend: Arc<dyn StateBackend>,
    client: UpstreamClient,
    data_dir: PathBuf,
) {
    let mut monitor = Monitor::open(&config, backend);
    let (tx, mut rx) = mpsc::unbounded_channel::<Completion>();
    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut stdin_open = true;

    let mut poll = match config.poll_interval_secs {
        0 => {
            log::info!("Polling disabled, use 'simulate' to request readings");
            None
        }
        secs => {
            let mut interval = tokio::time::interval(Duration::from_secs(secs));
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            Some(interval)
        }
    };

    println!("{}", commands::HELP);

    loop {
        tokio::select! {
            _ = next_tick(&mut poll) => {
                spawn_simulate(&mut monitor, &client, &tx);
            }

            Some(completion) = rx.recv() => {
                handle_completion(&mut monitor, completion);
            }

            line = stdin.next_line(), if stdin_open => match line {
                Ok(Some(line)) if line.trim().is_empty() => {}
                Ok(Some(line)) => {
                    let keep_running = handle_line(&mut monitor, &client, &tx, &line, &data_dir);
                    if !keep_running {
                        break;
                    }
                }
                Ok(None) => {
                    log::info!("Console closed");
                    stdin_open = false;
                    if poll.is_none() {
                        break;
                    }
                }
                Err(e) => {
                    log::warn!("Console read failed: {}", e);
                    stdin_open = false;
                }
            },

            _ = tokio::signal::ctrl_c() => {
                log::info!("Interrupted");
                break;
            }
        }
    }
}

async fn next_tick(poll: &mut Option<Interval>) {
    match poll {
        Some(interval) => {
            interval.tick().await;
        }
        None => std::future::pending::<()>().await,
    }
}

fn spawn_simulate(
    monitor: &mut Monitor,
    client: &UpstreamClient,
    tx: &mpsc::UnboundedSender<Completion>,
) {
    let ticket = monitor.begin_request();
    let client = client.clone();
    let tx = tx.clone();
    tokio::spawn(async move {
        let result = client.simulate().await;
        let _ = tx.send(Completion::Snapshot(ticket, result));
    });
}

fn handle_completion(monitor: &mut Monitor, completion: Completion) {
    match completion {
        Completion::Snapshot(ticket, result) => match monitor.apply_completion(ticket, result) {
            Ok(Some(snapshot)) => {
                println!("{}", commands::render_snapshot(&snapshot));
                let alerts = monitor.alerts();
                if !alerts.is_empty() {
                    println!("{}", commands::render_alerts(monitor));
                }
            }
            Ok(None) => {}
            Err(e) => log::error!("Request failed: {}", e),
        },
        Completion::Hardware(result) => match result {
            Ok(sensors) => println!("{}", commands::render_hardware(&sensors)),
            Err(e) => log::error!("Hardware check failed: {}", e),
        },
        Completion::Components(result) => match result {
            Ok(components) => println!("{}", commands::render_components(&components)),
            Err(e) => log::error!("Component list failed: {}", e),
        },
        Completion::Failure(id, result) => match result {
            Ok(detail) => println!("{}", commands::render_failure(id, &detail)),
            Err(e) => log::error!("Failure detail for component {} failed: {}", id, e),
        },
    }
}

/// Returns false when the operator asked to quit
fn handle_line(
    monitor: &mut Monitor,
    client: &UpstreamClient,
    tx: &mpsc::UnboundedSender<Completion>,
    line: &str,
    data_dir: &Path,
) -> bool {
    let command = match commands::parse(line) {
        Ok(command) => command,
        Err(e) => {
            println!("{}", e);
            return true;
        }
    };

    match command {
        Command::Quit => return false,
        Command::Simulate => spawn_simulate(monitor, client, tx),
        Command::Predict(input) => {
            let ticket = monitor.begin_request();
            let client = client.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = client.predict(input).await;
                let _ = tx.send(Completion::Snapshot(ticket, result));
            });
        }
        Command::Hardware => {
            let client = client.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let result = client.check_hardware().await;
                let _ = tx.send(Completion::Hardware(result));
            });
        }
        Command::Equipment(id) => {
            let client = client.clone();
            let tx = tx.clone();
            tokio::spawn(async move {
                let completion = match id {
                    Some(id) => Completion::Failure(id, client.component_failure(id).await),
                    None => Completion::Components(client.components().await),
                };
                let _ = tx.send(completion);
            });
        }
        other => {
            if let Some(text) = commands::execute_local(monitor, &other, data_dir) {
                println!("{}", text);
            }
        }
    }
    true
}
