// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Source Supervisor (§4.4): owns the Process Prober, the directory
//! watcher, and the live tailer set, and reconciles them on every event.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, SystemTime};

use parking_lot::Mutex;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};
use vrlog_adapters::{spawn_dirwatch, spawn_tailer, DirEvent, ProcessProbe, StartPosition, TailerHandle};
use vrlog_core::{select_from_listing, RawLine, SourceStatus};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    ProbeOnly,
    DirectoryAbsent,
    DirectoryPresentIdle,
    Tailing,
}

pub struct SupervisorConfig {
    pub log_dir: PathBuf,
    pub probe_interval: Duration,
    pub group_period: Duration,
    pub max_files: usize,
}

/// Shared, read-mostly snapshot of the Source Supervisor's status (§5):
/// written only by the supervisor task, read by value everywhere else.
pub struct StatusCell {
    inner: Mutex<SourceStatus>,
}

impl StatusCell {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SourceStatus::default()),
        }
    }

    pub fn snapshot(&self) -> SourceStatus {
        self.inner.lock().clone()
    }

    fn set(&self, status: SourceStatus) {
        *self.inner.lock() = status;
    }
}

impl Default for StatusCell {
    fn default() -> Self {
        Self::new()
    }
}

/// One transition worth notifying subscribers about (§4.4: "on every
/// transition the supervisor emits a `source_status_changed` event").
#[derive(Debug, Clone)]
pub struct StatusChangeEvent {
    pub change_type: StatusChangeType,
    pub status: SourceStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusChangeType {
    Process,
    LogDirectory,
    LogMonitoring,
}

pub struct SourceSupervisor<P: ProcessProbe> {
    config: SupervisorConfig,
    probe: Arc<P>,
    status: Arc<StatusCell>,
    state: SupervisorState,
    live_tailers: HashMap<PathBuf, TailerHandle>,
    last_pid: Option<u32>,
    line_tx: mpsc::Sender<RawLine>,
    status_tx: mpsc::Sender<StatusChangeEvent>,
}

impl<P: ProcessProbe + 'static> SourceSupervisor<P> {
    pub fn new(
        config: SupervisorConfig,
        probe: Arc<P>,
        line_tx: mpsc::Sender<RawLine>,
        status_tx: mpsc::Sender<StatusChangeEvent>,
    ) -> (Self, Arc<StatusCell>) {
        let status = Arc::new(StatusCell::new());
        (
            Self {
                config,
                probe,
                status: Arc::clone(&status),
                state: SupervisorState::ProbeOnly,
                live_tailers: HashMap::new(),
                last_pid: None,
                line_tx,
                status_tx,
            },
            status,
        )
    }

    pub fn status_cell(&self) -> Arc<StatusCell> {
        Arc::clone(&self.status)
    }

    /// Runs the reconciliation loop until `stop_rx` fires (§5 shutdown:
    /// the supervisor is stopped after tailers and the parser drain).
    pub async fn run(mut self, mut stop_rx: tokio::sync::oneshot::Receiver<()>) {
        let (dir_tx, mut dir_rx) = mpsc::channel(16);
        let _dirwatch = spawn_dirwatch(self.config.log_dir.clone(), dir_tx);

        let mut probe_tick = tokio::time::interval(self.config.probe_interval);

        loop {
            tokio::select! {
                biased;
                _ = &mut stop_rx => {
                    info!("source supervisor stopping");
                    for (_, handle) in self.live_tailers.drain() {
                        handle.stop();
                    }
                    return;
                }
                _ = probe_tick.tick() => {
                    self.on_probe_tick().await;
                }
                Some(event) = dir_rx.recv() => {
                    self.on_dir_event(event).await;
                }
            }
        }
    }

    async fn on_probe_tick(&mut self) {
        let present = match self.probe.probe().await {
            Ok(result) => result,
            Err(e) => {
                warn!(error = %e, "process probe failed this round, treating as absent");
                return;
            }
        };

        let was_running = matches!(
            self.state,
            SupervisorState::DirectoryAbsent
                | SupervisorState::DirectoryPresentIdle
                | SupervisorState::Tailing
        );

        if present.present && !was_running {
            debug!(pid = ?present.pid, "process detected");
            self.last_pid = present.pid;
            self.state = if self.config.log_dir.exists() {
                SupervisorState::DirectoryPresentIdle
            } else {
                SupervisorState::DirectoryAbsent
            };
            self.publish(StatusChangeType::Process).await;
            self.reconcile_directory().await;
        } else if !present.present && was_running {
            debug!("process no longer detected, stopping tailers");
            for (_, handle) in self.live_tailers.drain() {
                handle.stop();
            }
            self.state = SupervisorState::ProbeOnly;
            self.last_pid = None;
            self.publish(StatusChangeType::Process).await;
        }
    }

    async fn on_dir_event(&mut self, event: DirEvent) {
        match event {
            DirEvent::DirectoryAppeared => {
                if self.state != SupervisorState::ProbeOnly {
                    self.state = SupervisorState::DirectoryPresentIdle;
                    self.publish(StatusChangeType::LogDirectory).await;
                    self.reconcile_directory().await;
                }
            }
            DirEvent::DirectoryDisappeared => {
                for (_, handle) in self.live_tailers.drain() {
                    handle.stop();
                }
                if self.state != SupervisorState::ProbeOnly {
                    self.state = SupervisorState::DirectoryAbsent;
                }
                self.publish(StatusChangeType::LogDirectory).await;
            }
            DirEvent::EntriesChanged => {
                if matches!(
                    self.state,
                    SupervisorState::DirectoryPresentIdle | SupervisorState::Tailing
                ) {
                    self.reconcile_directory().await;
                }
            }
        }
    }

    /// Runs the File Selector against the current directory listing and
    /// diffs it against the live tailer set (§4.3, §4.4 reconciliation).
    async fn reconcile_directory(&mut self) {
        let entries = match std::fs::read_dir(&self.config.log_dir) {
            Ok(entries) => entries.filter_map(|e| e.ok().map(|e| e.path())).collect(),
            Err(_) => Vec::new(),
        };
        let selected = select_from_listing(&entries, self.config.group_period, self.config.max_files);
        let selected_set: std::collections::HashSet<_> = selected.iter().cloned().collect();

        let to_stop: Vec<PathBuf> = self
            .live_tailers
            .keys()
            .filter(|p| !selected_set.contains(*p))
            .cloned()
            .collect();
        for path in to_stop {
            if let Some(handle) = self.live_tailers.remove(&path) {
                handle.stop();
            }
        }

        for path in &selected {
            if !self.live_tailers.contains_key(path) {
                // A file entering the selection is this session's log, seen
                // for the first time by this supervisor: tail it from the
                // start so no part of the session is missed.
                let handle = spawn_tailer(path.clone(), StartPosition::Offset(0), self.line_tx.clone());
                self.live_tailers.insert(path.clone(), handle);
            }
        }

        if !self.live_tailers.is_empty() {
            self.state = SupervisorState::Tailing;
        } else if self.config.log_dir.exists() {
            self.state = SupervisorState::DirectoryPresentIdle;
        }

        self.publish(StatusChangeType::LogMonitoring).await;
    }

    async fn publish(&self, change_type: StatusChangeType) {
        let status = SourceStatus {
            running: !matches!(self.state, SupervisorState::ProbeOnly),
            process_id: self.last_pid,
            log_directory_present: self.config.log_dir.exists(),
            active_file_count: self.live_tailers.len(),
            last_line_observed_at: None,
            last_change_at: Some(SystemTime::now()),
        };
        self.status.set(status.clone());
        let _ = self
            .status_tx
            .send(StatusChangeEvent { change_type, status })
            .await;
    }
}

#[cfg(test)]
#[path = "supervisor_tests.rs"]
mod tests;
