// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use super::{ProbeResult, ProcessProbe, ProcessProbeError};

/// One call observed by [`FakeProcessProbe`], for test assertions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProbeCall {
    Probe,
}

struct FakeState {
    result: ProbeResult,
    fail_next: bool,
    calls: Vec<ProbeCall>,
}

/// Deterministic [`ProcessProbe`] stub for Source Supervisor tests,
/// mirroring the teacher's `FakeSessionAdapter` call-recording shape.
#[derive(Clone)]
pub struct FakeProcessProbe {
    state: Arc<Mutex<FakeState>>,
}

impl Default for FakeProcessProbe {
    fn default() -> Self {
        Self {
            state: Arc::new(Mutex::new(FakeState {
                result: ProbeResult::absent(),
                fail_next: false,
                calls: Vec::new(),
            })),
        }
    }
}

impl FakeProcessProbe {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_present(&self, pid: u32) {
        self.state.lock().result = ProbeResult {
            present: true,
            pid: Some(pid),
            method: "fake".to_string(),
        };
    }

    pub fn set_absent(&self) {
        self.state.lock().result = ProbeResult::absent();
    }

    pub fn fail_next_probe(&self) {
        self.state.lock().fail_next = true;
    }

    pub fn calls(&self) -> Vec<ProbeCall> {
        self.state.lock().calls.clone()
    }
}

#[async_trait]
impl ProcessProbe for FakeProcessProbe {
    async fn probe(&self) -> Result<ProbeResult, ProcessProbeError> {
        let mut state = self.state.lock();
        state.calls.push(ProbeCall::Probe);
        if state.fail_next {
            state.fail_next = false;
            return Err(ProcessProbeError::AllStrategiesFailed);
        }
        Ok(state.result.clone())
    }
}
