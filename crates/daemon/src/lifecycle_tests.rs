// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use tempfile::tempdir;

use super::*;

fn test_config(state_dir: PathBuf, game_log_dir: PathBuf) -> Config {
    Config {
        lock_path: state_dir.join("daemon.pid"),
        version_path: state_dir.join("daemon.version"),
        log_path: state_dir.join("daemon.log"),
        bind_addr: std::net::SocketAddr::from(([127, 0, 0, 1], 0)),
        max_clients: 8,
        ping_interval: Duration::from_secs(30),
        group_period: Duration::from_secs(30),
        max_files: 4,
        target_process_name: "NonexistentTestProcess".to_string(),
        game_log_dir,
        state_dir,
    }
}

#[tokio::test]
async fn startup_acquires_lock_and_binds_listener() {
    let state_dir = tempdir().expect("tempdir");
    let log_dir = tempdir().expect("tempdir");
    let config = test_config(state_dir.path().to_path_buf(), log_dir.path().to_path_buf());

    let result = startup(config.clone()).await.expect("startup should succeed");
    assert!(config.lock_path.exists());
    assert!(config.version_path.exists());

    result.daemon.shutdown().await.expect("shutdown should succeed");
    assert!(!config.lock_path.exists());
    assert!(!config.version_path.exists());
}

#[tokio::test]
async fn second_startup_against_the_same_state_dir_fails_to_lock() {
    let state_dir = tempdir().expect("tempdir");
    let log_dir = tempdir().expect("tempdir");
    let config = test_config(state_dir.path().to_path_buf(), log_dir.path().to_path_buf());

    let first = startup(config.clone()).await.expect("first startup should succeed");

    let second = startup(config.clone()).await;
    assert!(matches!(second, Err(LifecycleError::LockFailed(_))));

    first.daemon.shutdown().await.expect("shutdown should succeed");
}
