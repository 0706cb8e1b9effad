// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the adapters crate.

use std::time::Duration;

fn parse_duration_ms(var: &str) -> Option<Duration> {
    std::env::var(var)
        .ok()
        .and_then(|s| s.parse::<u64>().ok())
        .map(Duration::from_millis)
}

/// Process prober poll interval (default: 5000ms per §4.1).
pub fn probe_interval() -> Duration {
    parse_duration_ms("VRLOG_PROBE_INTERVAL_MS").unwrap_or(Duration::from_secs(5))
}

/// Directory-watch fallback poll interval, used when the `notify` backend
/// cannot establish a watch (default: 2000ms).
pub fn dirwatch_poll_interval() -> Duration {
    parse_duration_ms("VRLOG_DIRWATCH_POLL_MS").unwrap_or(Duration::from_secs(2))
}

/// Tailer initial retry backoff (default: 100ms, doubling to a 2s cap per §4.2).
pub fn tailer_initial_backoff() -> Duration {
    parse_duration_ms("VRLOG_TAILER_BACKOFF_MS").unwrap_or(Duration::from_millis(100))
}

/// Tailer maximum retry backoff (default: 2000ms per §4.2).
pub fn tailer_max_backoff() -> Duration {
    parse_duration_ms("VRLOG_TAILER_MAX_BACKOFF_MS").unwrap_or(Duration::from_secs(2))
}
