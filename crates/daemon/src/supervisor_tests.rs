// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::time::Duration;

use tempfile::tempdir;
use tokio::sync::{mpsc, oneshot};
use vrlog_adapters::FakeProcessProbe;

use super::*;

fn fast_config(log_dir: PathBuf) -> SupervisorConfig {
    SupervisorConfig {
        log_dir,
        probe_interval: Duration::from_millis(20),
        group_period: Duration::from_secs(30),
        max_files: 4,
    }
}

#[tokio::test]
async fn reconciles_tailers_when_a_session_file_appears() {
    let dir = tempdir().expect("tempdir");
    std::fs::create_dir_all(dir.path()).unwrap();

    let probe = Arc::new(FakeProcessProbe::new());
    probe.set_present(4242);

    let (line_tx, mut line_rx) = mpsc::channel(16);
    let (status_tx, mut status_rx) = mpsc::channel(16);

    let (supervisor, status_cell) = SourceSupervisor::new(
        fast_config(dir.path().to_path_buf()),
        probe,
        line_tx,
        status_tx,
    );

    let (stop_tx, stop_rx) = oneshot::channel();
    let handle = tokio::spawn(supervisor.run(stop_rx));

    // Wait for the process-detected transition.
    let first = tokio::time::timeout(Duration::from_secs(2), status_rx.recv())
        .await
        .expect("timed out")
        .expect("channel closed");
    assert_eq!(first.change_type, StatusChangeType::Process);
    assert!(first.status.running);

    std::fs::write(
        dir.path().join("output_log_2026-01-02_03-04-05.txt"),
        "2026.1.2 3:04:05 Debug - hello\n",
    )
    .unwrap();

    let raw = tokio::time::timeout(Duration::from_secs(3), line_rx.recv())
        .await
        .expect("timed out waiting for tailed line")
        .expect("channel closed");
    assert_eq!(raw.text, "2026.1.2 3:04:05 Debug - hello");

    assert_eq!(status_cell.snapshot().active_file_count, 1);

    let _ = stop_tx.send(());
    handle.await.unwrap();
}

#[tokio::test]
async fn stops_all_tailers_when_process_disappears() {
    let dir = tempdir().expect("tempdir");
    std::fs::write(
        dir.path().join("output_log_2026-01-02_03-04-05.txt"),
        "preexisting\n",
    )
    .unwrap();

    let probe = Arc::new(FakeProcessProbe::new());
    probe.set_present(1);

    let (line_tx, _line_rx) = mpsc::channel(16);
    let (status_tx, mut status_rx) = mpsc::channel(16);

    let (supervisor, status_cell) = SourceSupervisor::new(
        fast_config(dir.path().to_path_buf()),
        Arc::clone(&probe),
        line_tx,
        status_tx,
    );

    let (stop_tx, stop_rx) = oneshot::channel();
    let handle = tokio::spawn(supervisor.run(stop_rx));

    loop {
        let event = tokio::time::timeout(Duration::from_secs(2), status_rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        if event.status.active_file_count > 0 {
            break;
        }
    }

    probe.set_absent();

    loop {
        let event = tokio::time::timeout(Duration::from_secs(2), status_rx.recv())
            .await
            .expect("timed out")
            .expect("channel closed");
        if !event.status.running {
            break;
        }
    }

    assert_eq!(status_cell.snapshot().active_file_count, 0);

    let _ = stop_tx.send(());
    handle.await.unwrap();
}
