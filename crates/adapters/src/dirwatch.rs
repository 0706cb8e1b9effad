// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Directory watcher: tells the Source Supervisor when the log directory
//! itself appears/disappears, and when entries inside it change, so it
//! can re-run file selection (§4.3) without polling the filesystem on a
//! tight loop.

use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tracing::debug;

use crate::env::dirwatch_poll_interval;

/// A single noteworthy directory event. Coalesced at the call site: the
/// Source Supervisor re-runs `select_from_listing` on any of these
/// rather than trying to interpret individual filesystem events.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirEvent {
    DirectoryAppeared,
    DirectoryDisappeared,
    EntriesChanged,
}

pub struct DirWatchHandle {
    _watcher: Option<RecommendedWatcher>,
    stop_tx: Option<tokio::sync::oneshot::Sender<()>>,
}

impl DirWatchHandle {
    pub fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Watches `dir`'s existence and contents, emitting [`DirEvent`]s onto
/// `event_tx`. `notify` cannot watch a path that doesn't exist yet, so
/// this also polls at [`dirwatch_poll_interval`] to detect the
/// directory's first appearance.
pub fn spawn_dirwatch(dir: PathBuf, event_tx: mpsc::Sender<DirEvent>) -> DirWatchHandle {
    let (stop_tx, stop_rx) = tokio::sync::oneshot::channel();
    let (notify_tx, notify_rx) = mpsc::channel::<()>(16);

    let watcher = if dir.exists() {
        create_watcher(&dir, notify_tx.clone())
    } else {
        None
    };

    tokio::spawn(run_dirwatch(dir, event_tx, notify_rx, stop_rx, notify_tx));

    DirWatchHandle {
        _watcher: watcher,
        stop_tx: Some(stop_tx),
    }
}

async fn run_dirwatch(
    dir: PathBuf,
    event_tx: mpsc::Sender<DirEvent>,
    mut notify_rx: mpsc::Receiver<()>,
    mut stop_rx: tokio::sync::oneshot::Receiver<()>,
    notify_tx: mpsc::Sender<()>,
) {
    let mut present = dir.exists();
    let mut watcher: Option<RecommendedWatcher> = if present {
        create_watcher(&dir, notify_tx.clone())
    } else {
        None
    };
    let mut poll = tokio::time::interval(dirwatch_poll_interval());

    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => {
                debug!(dir = %dir.display(), "dirwatch stopping on request");
                return;
            }
            _ = notify_rx.recv() => {
                if event_tx.send(DirEvent::EntriesChanged).await.is_err() {
                    return;
                }
            }
            _ = poll.tick() => {
                let now_present = dir.exists();
                if now_present && !present {
                    debug!(dir = %dir.display(), "directory appeared");
                    watcher = create_watcher(&dir, notify_tx.clone());
                    if event_tx.send(DirEvent::DirectoryAppeared).await.is_err() {
                        return;
                    }
                } else if !now_present && present {
                    debug!(dir = %dir.display(), "directory disappeared");
                    watcher = None;
                    if event_tx.send(DirEvent::DirectoryDisappeared).await.is_err() {
                        return;
                    }
                }
                present = now_present;
            }
        }
    }
}

fn create_watcher(dir: &Path, tx: mpsc::Sender<()>) -> Option<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if res.is_ok() {
            let _ = tx.try_send(());
        }
    })
    .ok()?;
    watcher.watch(dir, RecursiveMode::NonRecursive).ok()?;
    Some(watcher)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::tempdir;

    #[tokio::test]
    async fn detects_directory_appearing_and_a_new_entry() {
        let base = tempdir().expect("tempdir");
        let watched = base.path().join("logs");

        let (tx, mut rx) = mpsc::channel(16);
        let handle = spawn_dirwatch(watched.clone(), tx);

        std::fs::create_dir(&watched).unwrap();
        let appeared = tokio::time::timeout(Duration::from_secs(3), rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        assert_eq!(appeared, DirEvent::DirectoryAppeared);

        std::fs::write(watched.join("output_log_2026-01-02_03-04-05.txt"), "").unwrap();
        let changed = tokio::time::timeout(Duration::from_secs(3), rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        assert_eq!(changed, DirEvent::EntriesChanged);

        handle.stop();
    }

    #[tokio::test]
    async fn detects_directory_disappearing() {
        let base = tempdir().expect("tempdir");
        let watched = base.path().join("logs");
        std::fs::create_dir(&watched).unwrap();

        let (tx, mut rx) = mpsc::channel(16);
        let handle = spawn_dirwatch(watched.clone(), tx);

        std::fs::remove_dir_all(&watched).unwrap();
        let disappeared = tokio::time::timeout(Duration::from_secs(3), rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        assert_eq!(disappeared, DirEvent::DirectoryDisappeared);

        handle.stop();
    }
}
