// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use async_trait::async_trait;
use tokio::process::Command;
use tokio::time::sleep;

use crate::subprocess::{run_with_timeout, PROBE_STRATEGY_TIMEOUT};

use super::{ProbeResult, ProcessProbe, ProcessProbeError};

const RETRIES_PER_STRATEGY: u32 = 3;
const RETRY_DELAY: std::time::Duration = std::time::Duration::from_secs(1);

/// A single OS-level candidate: its pid and the full command line/args
/// string the strategy found it under.
struct Candidate {
    pid: u32,
    command_line: String,
}

/// Production [`ProcessProbe`]: shells out to `ps`/`pgrep`, exactly the
/// way the teacher's tmux adapter shells out for every session
/// operation, wrapped in the same timeout helper.
pub struct RealProcessProbe {
    target_name: String,
    self_pid: u32,
    aux_patterns: Vec<String>,
}

impl RealProcessProbe {
    /// `self_pid` must be the daemon's own PID (§9 "self-detection
    /// guard"): it is unconditionally filtered out of every candidate
    /// list so a probe run during development never matches its own
    /// shell wrapper.
    pub fn new(target_name: impl Into<String>, self_pid: u32) -> Self {
        Self {
            target_name: target_name.into(),
            self_pid,
            aux_patterns: default_aux_patterns(),
        }
    }

    pub fn with_aux_patterns(mut self, patterns: Vec<String>) -> Self {
        self.aux_patterns = patterns;
        self
    }

    async fn run_strategy<F>(&self, name: &str, strategy: F) -> Option<Vec<Candidate>>
    where
        F: Fn() -> Command,
    {
        for attempt in 0..=RETRIES_PER_STRATEGY {
            match run_with_timeout(strategy(), PROBE_STRATEGY_TIMEOUT, name).await {
                Ok(output) if output.status.success() => {
                    return Some(parse_candidates(&String::from_utf8_lossy(&output.stdout)));
                }
                Ok(_) | Err(_) => {
                    if attempt < RETRIES_PER_STRATEGY {
                        sleep(RETRY_DELAY).await;
                    }
                }
            }
        }
        None
    }

    /// Strategy 1: inspect running processes by executable name.
    async fn strategy_by_name(&self) -> Option<Vec<Candidate>> {
        self.run_strategy("ps by name", || {
            let mut cmd = Command::new("ps");
            cmd.args(["-A", "-o", "pid=,comm="]);
            cmd
        })
        .await
        .map(|candidates| {
            candidates
                .into_iter()
                .filter(|c| {
                    c.command_line
                        .to_lowercase()
                        .contains(&self.target_name.to_lowercase())
                })
                .collect()
        })
    }

    /// Strategy 2: inspect full command lines, catching a launcher
    /// wrapper that `ps -o comm=` would show only by its wrapper name.
    /// `pgrep -af` prints `pid args...`, the same shape `ps` gives us.
    async fn strategy_by_command_line(&self) -> Option<Vec<Candidate>> {
        let pattern = self.target_name.clone();
        self.run_strategy("pgrep -af", move || {
            let mut cmd = Command::new("pgrep");
            cmd.args(["-af", &pattern]);
            cmd
        })
        .await
    }

    fn select_candidate(&self, mut candidates: Vec<Candidate>) -> Option<Candidate> {
        candidates.retain(|c| c.pid != self.self_pid);
        if candidates.is_empty() {
            return None;
        }
        // Down-rank (but do not discard) candidates matching the
        // auxiliary-process list; prefer the first non-auxiliary one in
        // native enumeration order, falling back to the first overall.
        let non_aux = candidates
            .iter()
            .position(|c| !self.looks_auxiliary(&c.command_line));
        let index = non_aux.unwrap_or(0);
        Some(candidates.remove(index))
    }

    fn looks_auxiliary(&self, command_line: &str) -> bool {
        let lower = command_line.to_lowercase();
        self.aux_patterns.iter().any(|p| lower.contains(p))
    }
}

fn default_aux_patterns() -> Vec<String> {
    vec![
        "launcher".to_string(),
        "installer".to_string(),
        "updater".to_string(),
        "crashhandler".to_string(),
        "crash_handler".to_string(),
    ]
}

/// Parses `pid<space>command...` lines, one candidate per line.
fn parse_candidates(output: &str) -> Vec<Candidate> {
    output
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            let (pid_str, rest) = line.split_once(char::is_whitespace)?;
            let pid: u32 = pid_str.trim().parse().ok()?;
            Some(Candidate {
                pid,
                command_line: rest.trim().to_string(),
            })
        })
        .collect()
}

#[async_trait]
impl ProcessProbe for RealProcessProbe {
    async fn probe(&self) -> Result<ProbeResult, ProcessProbeError> {
        if let Some(candidates) = self.strategy_by_name().await {
            if let Some(chosen) = self.select_candidate(candidates) {
                return Ok(ProbeResult {
                    present: true,
                    pid: Some(chosen.pid),
                    method: "ps_by_name".to_string(),
                });
            }
        }

        if let Some(candidates) = self.strategy_by_command_line().await {
            if let Some(chosen) = self.select_candidate(candidates) {
                return Ok(ProbeResult {
                    present: true,
                    pid: Some(chosen.pid),
                    method: "pgrep_command_line".to_string(),
                });
            }
        }

        Ok(ProbeResult::absent())
    }
}
