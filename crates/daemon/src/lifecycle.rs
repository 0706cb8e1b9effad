// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Daemon lifecycle management: startup, shutdown, the root Supervisor.

use std::fs::File;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use fs2::FileExt;
use thiserror::Error;
use tokio::net::TcpListener;
use tokio::sync::{mpsc, oneshot};
use tracing::{info, warn};
use vrlog_adapters::RealProcessProbe;
use vrlog_core::{RawLine, UuidIdGen};

use crate::env;
use crate::fabric::{BroadcastFabric, FabricConfig};
use crate::supervisor::{SourceSupervisor, StatusChangeEvent, SupervisorConfig};

/// Daemon configuration (§6 bind address, §4.1/§4.3 tunables, all
/// resolved once at startup via [`env`]).
#[derive(Debug, Clone)]
pub struct Config {
    pub state_dir: PathBuf,
    pub lock_path: PathBuf,
    pub version_path: PathBuf,
    pub log_path: PathBuf,
    pub bind_addr: std::net::SocketAddr,
    pub max_clients: usize,
    pub ping_interval: Duration,
    pub group_period: Duration,
    pub max_files: usize,
    pub target_process_name: String,
    pub game_log_dir: PathBuf,
}

impl Config {
    pub fn load() -> Result<Self, LifecycleError> {
        let state_dir = env::state_dir()?;
        let bind_addr =
            std::net::SocketAddr::from(([127, 0, 0, 1], env::bind_port()));

        Ok(Self {
            lock_path: state_dir.join("daemon.pid"),
            version_path: state_dir.join("daemon.version"),
            log_path: state_dir.join("daemon.log"),
            bind_addr,
            max_clients: env::max_clients(),
            ping_interval: env::ping_interval(),
            group_period: env::group_period(),
            max_files: env::max_files(),
            target_process_name: env::target_process_name(),
            game_log_dir: env::game_log_dir()?,
            state_dir,
        })
    }
}

#[derive(Debug, Error)]
pub enum LifecycleError {
    #[error("could not determine state directory")]
    NoStateDir,
    #[error("failed to acquire lock: daemon already running?")]
    LockFailed(#[source] std::io::Error),
    #[error("failed to bind transport listener at {0}: {1}")]
    BindFailed(std::net::SocketAddr, std::io::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Handle to every running task, used only to drive the §5 shutdown
/// sequence in order.
pub struct DaemonState {
    pub config: Config,
    #[allow(dead_code)]
    lock_file: File,
    pub fabric: Arc<BroadcastFabric>,
    pub start_time: Instant,
    supervisor_stop: Option<oneshot::Sender<()>>,
    acceptor_stop: Option<oneshot::Sender<()>>,
    heartbeat_stop: Option<oneshot::Sender<()>>,
    supervisor_task: tokio::task::JoinHandle<()>,
    acceptor_task: tokio::task::JoinHandle<()>,
    heartbeat_task: tokio::task::JoinHandle<()>,
    dispatch_task: tokio::task::JoinHandle<()>,
}

pub struct StartupResult {
    pub daemon: DaemonState,
}

pub async fn startup(config: Config) -> Result<StartupResult, LifecycleError> {
    match startup_inner(config.clone()).await {
        Ok(result) => Ok(result),
        Err(e) => {
            if !matches!(e, LifecycleError::LockFailed(_)) {
                cleanup_on_failure(&config);
            }
            Err(e)
        }
    }
}

async fn startup_inner(config: Config) -> Result<StartupResult, LifecycleError> {
    // 1. Create state directory.
    std::fs::create_dir_all(&config.state_dir)?;

    // 2. Acquire the lock file first so races with a second instance fail fast.
    let lock_file = std::fs::OpenOptions::new()
        .write(true)
        .create(true)
        .truncate(false)
        .open(&config.lock_path)?;
    lock_file
        .try_lock_exclusive()
        .map_err(LifecycleError::LockFailed)?;

    use std::io::Write;
    let mut lock_file = lock_file;
    lock_file.set_len(0)?;
    writeln!(lock_file, "{}", std::process::id())?;
    let lock_file = lock_file;

    // 3. Write version file.
    std::fs::write(&config.version_path, env!("CARGO_PKG_VERSION"))?;

    // 4. Set up the Source Supervisor with the real Process Prober.
    let probe = Arc::new(
        RealProcessProbe::new(config.target_process_name.clone(), std::process::id())
    );
    let (line_tx, line_rx) = mpsc::channel::<RawLine>(1024);
    let (status_tx, status_rx) = mpsc::channel::<StatusChangeEvent>(64);
    let (supervisor, status_cell) = SourceSupervisor::new(
        SupervisorConfig {
            log_dir: config.game_log_dir.clone(),
            probe_interval: vrlog_adapters::env::probe_interval(),
            group_period: config.group_period,
            max_files: config.max_files,
        },
        probe,
        line_tx,
        status_tx,
    );

    // 5. Set up the Broadcast Fabric.
    let id_gen = UuidIdGen;
    let record_id_gen = UuidIdGen;
    let fabric_config = FabricConfig {
        bind_addr: config.bind_addr,
        max_clients: config.max_clients,
        ping_interval: config.ping_interval,
    };
    let fabric = Arc::new(BroadcastFabric::new(
        &fabric_config,
        status_cell,
        Arc::new(move || vrlog_core::IdGen::next(&id_gen)),
    ));

    // 6. Bind the transport listener last, after all validation passes.
    let listener = TcpListener::bind(config.bind_addr)
        .await
        .map_err(|e| LifecycleError::BindFailed(config.bind_addr, e))?;

    let (supervisor_stop_tx, supervisor_stop_rx) = oneshot::channel();
    let (acceptor_stop_tx, acceptor_stop_rx) = oneshot::channel();
    let (heartbeat_stop_tx, heartbeat_stop_rx) = oneshot::channel();

    let supervisor_task = tokio::spawn(supervisor.run(supervisor_stop_rx));
    let acceptor_task = tokio::spawn(Arc::clone(&fabric).run_acceptor(listener, acceptor_stop_rx));
    let heartbeat_task = tokio::spawn(Arc::clone(&fabric).run_heartbeat(heartbeat_stop_rx));
    let dispatch_task = tokio::spawn(spawn_dispatch_pipeline(
        Arc::clone(&fabric),
        line_rx,
        status_rx,
        record_id_gen,
    ));

    Ok(StartupResult {
        daemon: DaemonState {
            config,
            lock_file,
            fabric,
            start_time: Instant::now(),
            supervisor_stop: Some(supervisor_stop_tx),
            acceptor_stop: Some(acceptor_stop_tx),
            heartbeat_stop: Some(heartbeat_stop_tx),
            supervisor_task,
            acceptor_task,
            heartbeat_task,
            dispatch_task,
        },
    })
}

/// Wires raw lines through the Parser into the Broadcast Fabric, and
/// forwards Source Supervisor status changes (§2 data/control flow).
async fn spawn_dispatch_pipeline(
    fabric: Arc<BroadcastFabric>,
    mut line_rx: mpsc::Receiver<RawLine>,
    mut status_rx: mpsc::Receiver<StatusChangeEvent>,
    id_gen: UuidIdGen,
) {
    let file_indices: parking_lot::Mutex<std::collections::HashMap<PathBuf, usize>> =
        parking_lot::Mutex::new(std::collections::HashMap::new());
    let next_index = AtomicU64::new(0);

    loop {
        tokio::select! {
            line = line_rx.recv() => {
                match line {
                    Some(raw) => {
                        let file_index = {
                            let mut indices = file_indices.lock();
                            let len = indices.len();
                            *indices.entry(raw.source_path.clone()).or_insert_with(|| {
                                next_index.fetch_add(1, Ordering::Relaxed);
                                len
                            })
                        };
                        let id = vrlog_core::IdGen::next(&id_gen);
                        if let Some(record) = vrlog_core::parser::parse(&raw, id, file_index) {
                            fabric.publish(&record);
                        }
                    }
                    None => return,
                }
            }
            event = status_rx.recv() => {
                match event {
                    Some(event) => fabric.publish_status_change(&event),
                    None => return,
                }
            }
        }
    }
}

impl DaemonState {
    /// Runs the §5 shutdown sequence: acceptor stops taking new
    /// subscribers, then the supervisor's tailers stop producing, then
    /// the dispatch pipeline drains, then the fabric's heartbeat stops
    /// and disconnects everyone, then housekeeping files are removed.
    pub async fn shutdown(mut self) -> Result<(), LifecycleError> {
        info!("shutting down daemon");

        if let Some(tx) = self.acceptor_stop.take() {
            let _ = tx.send(());
        }
        let _ = self.acceptor_task.await;

        if let Some(tx) = self.supervisor_stop.take() {
            let _ = tx.send(());
        }
        let _ = self.supervisor_task.await;

        // Drop the dispatch pipeline's input by letting its channels close,
        // bounded by a short drain deadline (§5: "bounded time, seconds not
        // minutes").
        let _ = tokio::time::timeout(Duration::from_secs(2), self.dispatch_task).await;

        if let Some(tx) = self.heartbeat_stop.take() {
            let _ = tx.send(());
        }
        let _ = self.heartbeat_task.await;

        if self.config.lock_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.lock_path) {
                warn!("failed to remove PID file: {}", e);
            }
        }
        if self.config.version_path.exists() {
            if let Err(e) = std::fs::remove_file(&self.config.version_path) {
                warn!("failed to remove version file: {}", e);
            }
        }

        info!("daemon shutdown complete");
        Ok(())
    }
}

fn cleanup_on_failure(config: &Config) {
    let _ = std::fs::remove_file(&config.version_path);
    let _ = std::fs::remove_file(&config.lock_path);
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
