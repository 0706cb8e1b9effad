// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Process Prober (§4.1): periodically asks the OS whether the target
//! executable is running.

mod fake;
mod real;

pub use fake::{FakeProcessProbe, ProbeCall};
pub use real::RealProcessProbe;

use async_trait::async_trait;
use thiserror::Error;

/// Result of a single probe attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeResult {
    pub present: bool,
    pub pid: Option<u32>,
    pub method: String,
}

impl ProbeResult {
    pub fn absent() -> Self {
        Self {
            present: false,
            pid: None,
            method: String::new(),
        }
    }
}

#[derive(Debug, Error)]
pub enum ProcessProbeError {
    #[error("all detection strategies failed")]
    AllStrategiesFailed,
}

/// Capability interface for process liveness detection (§9: "process
/// prober as a capability"). Taken as a trait so tests can inject a
/// deterministic stub; production wraps OS-specific commands behind it.
#[async_trait]
pub trait ProcessProbe: Send + Sync {
    /// Attempts detection, returning `{present: false}` rather than an
    /// error when every strategy fails — a probe failure is never fatal
    /// (§4.1 error semantics); the error variant is reserved for cases
    /// the caller wants to distinguish for diagnostics.
    async fn probe(&self) -> Result<ProbeResult, ProcessProbeError>;
}
