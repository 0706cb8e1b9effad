// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File Tailer (§4.2): streams newly appended lines from a single file
//! from its current end-of-file, surviving rotation and mid-line writes.

use std::io::{BufRead, BufReader, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use thiserror::Error;
use tokio::sync::mpsc;
use tokio::sync::oneshot;
use tracing::{debug, warn};
use vrlog_core::RawLine;

use crate::env::{dirwatch_poll_interval, tailer_initial_backoff, tailer_max_backoff};

#[derive(Debug, Error)]
pub enum TailerError {
    #[error("I/O error reading {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("path gone: {0}")]
    PathGone(PathBuf),
}

/// Where to start reading a file from.
#[derive(Debug, Clone, Copy)]
pub enum StartPosition {
    EndOfFile,
    Offset(u64),
}

/// Incremental, offset-tracked reader for one file. Detects truncation
/// (or replacement under the same path) by comparing the file's current
/// length against the last-read offset: a shrink means the file was
/// rotated or truncated, so reading resumes from 0.
struct IncrementalReader {
    path: PathBuf,
    offset: u64,
    partial_line: Vec<u8>,
}

impl IncrementalReader {
    fn new(path: PathBuf, start: StartPosition) -> std::io::Result<Self> {
        let offset = match start {
            StartPosition::Offset(o) => o,
            StartPosition::EndOfFile => std::fs::metadata(&path)?.len(),
        };
        Ok(Self {
            path,
            offset,
            partial_line: Vec::new(),
        })
    }

    /// Reads all newly completed lines since the last call. Any trailing
    /// fragment with no terminating newline is buffered, not returned.
    fn read_new_lines(&mut self) -> std::io::Result<Vec<String>> {
        let file_len = std::fs::metadata(&self.path)?.len();

        if file_len < self.offset {
            debug!(path = %self.path.display(), "file shrank, resuming at offset 0");
            self.offset = 0;
            self.partial_line.clear();
        }

        if file_len == self.offset {
            return Ok(Vec::new());
        }

        let mut file = std::fs::File::open(&self.path)?;
        file.seek(SeekFrom::Start(self.offset))?;
        let mut reader = BufReader::new(file);

        let mut lines = Vec::new();
        loop {
            let mut buf = Vec::new();
            let bytes_read = reader.read_until(b'\n', &mut buf)?;
            if bytes_read == 0 {
                break;
            }
            self.offset += bytes_read as u64;
            if buf.last() == Some(&b'\n') {
                if !self.partial_line.is_empty() {
                    self.partial_line.extend_from_slice(&buf);
                    buf = std::mem::take(&mut self.partial_line);
                }
                buf.pop(); // drop trailing \n
                if buf.last() == Some(&b'\r') {
                    buf.pop();
                }
                lines.push(String::from_utf8_lossy(&buf).into_owned());
            } else {
                // Partial trailing fragment: buffer until the newline arrives.
                self.partial_line.extend_from_slice(&buf);
            }
        }

        Ok(lines)
    }
}

/// Handle returned by [`spawn_tailer`]; dropping it does not stop the
/// tailer — call [`TailerHandle::stop`] explicitly, matching the rest of
/// this codebase's explicit-shutdown-signal style.
pub struct TailerHandle {
    stop_tx: Option<oneshot::Sender<()>>,
}

impl TailerHandle {
    pub fn stop(mut self) {
        if let Some(tx) = self.stop_tx.take() {
            let _ = tx.send(());
        }
    }
}

/// Spawns one independent tailer task for `path`, emitting [`RawLine`]s
/// onto `line_tx` until stopped or the path disappears.
pub fn spawn_tailer(
    path: PathBuf,
    start: StartPosition,
    line_tx: mpsc::Sender<RawLine>,
) -> TailerHandle {
    let (stop_tx, stop_rx) = oneshot::channel();
    tokio::spawn(run_tailer(path, start, line_tx, stop_rx));
    TailerHandle {
        stop_tx: Some(stop_tx),
    }
}

async fn run_tailer(
    path: PathBuf,
    start: StartPosition,
    line_tx: mpsc::Sender<RawLine>,
    mut stop_rx: oneshot::Receiver<()>,
) {
    let mut reader = match IncrementalReader::new(path.clone(), start) {
        Ok(r) => r,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "tailer could not open file, giving up");
            return;
        }
    };

    let (watch_tx, mut watch_rx) = mpsc::channel::<()>(16);
    let _watcher = create_file_watcher(&path, watch_tx);

    let mut backoff = tailer_initial_backoff();
    let max_backoff = tailer_max_backoff();
    let mut poll_interval = tokio::time::interval(dirwatch_poll_interval());

    loop {
        tokio::select! {
            biased;
            _ = &mut stop_rx => {
                debug!(path = %path.display(), "tailer stopping on request");
                return;
            }
            _ = watch_rx.recv() => {}
            _ = poll_interval.tick() => {}
        }

        if !path.exists() {
            debug!(path = %path.display(), "tailer path gone");
            return;
        }

        match reader.read_new_lines() {
            Ok(lines) => {
                backoff = tailer_initial_backoff();
                for line in lines {
                    let raw = RawLine::new(line, path.clone());
                    if line_tx.send(raw).await.is_err() {
                        // Receiver gone: parser/dispatcher shut down first.
                        return;
                    }
                }
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, backoff_ms = backoff.as_millis(), "tailer read error, retrying");
                tokio::time::sleep(backoff).await;
                backoff = std::cmp::min(backoff * 2, max_backoff);
            }
        }
    }
}

fn create_file_watcher(
    path: &Path,
    tx: mpsc::Sender<()>,
) -> Option<RecommendedWatcher> {
    let mut watcher = notify::recommended_watcher(move |res: notify::Result<notify::Event>| {
        if res.is_ok() {
            let _ = tx.try_send(());
        }
    })
    .ok()?;
    watcher.watch(path, RecursiveMode::NonRecursive).ok()?;
    Some(watcher)
}

#[cfg(test)]
#[path = "tailer_tests.rs"]
mod tests;
