// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]
// Enable coverage(off) attribute for excluding test infrastructure
#![cfg_attr(coverage_nightly, feature(coverage_attribute))]

//! Adapters for external I/O: process detection, file tailing, and
//! directory watching.

pub mod dirwatch;
pub mod env;
pub mod process_probe;
pub mod subprocess;
pub mod tailer;

pub use dirwatch::{spawn_dirwatch, DirEvent, DirWatchHandle};
pub use process_probe::{ProbeResult, ProcessProbe, ProcessProbeError, RealProcessProbe};
pub use tailer::{spawn_tailer, StartPosition, TailerError, TailerHandle};

// Test support - only compiled for tests or when explicitly requested
#[cfg(any(test, feature = "test-support"))]
pub use process_probe::{FakeProcessProbe, ProbeCall};
