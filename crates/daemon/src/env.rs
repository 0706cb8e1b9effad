// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the daemon crate.

use std::path::PathBuf;
use std::time::Duration;

use crate::lifecycle::LifecycleError;

/// Resolve state directory: VRLOG_STATE_DIR > XDG_STATE_HOME/vrlog > ~/.local/state/vrlog
pub fn state_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("VRLOG_STATE_DIR") {
        return Ok(PathBuf::from(dir));
    }
    if let Ok(xdg) = std::env::var("XDG_STATE_HOME") {
        return Ok(PathBuf::from(xdg).join("vrlog"));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join(".local/state/vrlog"))
}

fn parse_env<T: std::str::FromStr>(var: &str) -> Option<T> {
    std::env::var(var).ok().and_then(|s| s.parse().ok())
}

/// Loopback bind port (default: 7913, arbitrarily chosen outside the
/// ephemeral range).
pub fn bind_port() -> u16 {
    parse_env("VRLOG_PORT").unwrap_or(7913)
}

/// Maximum concurrent subscribers (§3 I3, default: 32).
pub fn max_clients() -> usize {
    parse_env("VRLOG_MAX_CLIENTS").unwrap_or(32)
}

/// Heartbeat ping interval (§4.7, default: 30s).
pub fn ping_interval() -> Duration {
    parse_env::<u64>("VRLOG_PING_INTERVAL_MS")
        .map(Duration::from_millis)
        .unwrap_or(Duration::from_secs(30))
}

/// File Selector grouping window (§4.3, default: 30s).
pub fn group_period() -> Duration {
    parse_env::<u64>("VRLOG_GROUP_PERIOD_SECS")
        .map(Duration::from_secs)
        .unwrap_or(Duration::from_secs(30))
}

/// File Selector cap on files per session (§4.3, default: 4).
pub fn max_files() -> usize {
    parse_env("VRLOG_MAX_FILES").unwrap_or(4)
}

/// Executable name the Process Prober looks for.
pub fn target_process_name() -> String {
    std::env::var("VRLOG_TARGET_PROCESS").unwrap_or_else(|_| "VRChat".to_string())
}

/// Directory the game writes its `output_log_*.txt` files to.
pub fn game_log_dir() -> Result<PathBuf, LifecycleError> {
    if let Ok(dir) = std::env::var("VRLOG_GAME_LOG_DIR") {
        return Ok(PathBuf::from(dir));
    }
    let home = std::env::var("HOME").map_err(|_| LifecycleError::NoStateDir)?;
    Ok(PathBuf::from(home).join("AppData/LocalLow/VRChat/VRChat"))
}
