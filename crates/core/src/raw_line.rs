// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The unit produced by a file tailer, before parsing.

use std::path::PathBuf;
use std::time::Instant;

/// A single newline-delimited line read from a source file.
///
/// Immutable once produced. `observed_at` is monotonic-clock-derived and
/// used only for in-process latency measurement; it is never serialized
/// onto the wire.
#[derive(Debug, Clone)]
pub struct RawLine {
    pub text: String,
    pub source_path: PathBuf,
    pub observed_at: Instant,
}

impl RawLine {
    pub fn new(text: impl Into<String>, source_path: PathBuf) -> Self {
        Self {
            text: text.into(),
            source_path,
            observed_at: Instant::now(),
        }
    }
}
