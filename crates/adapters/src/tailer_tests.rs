// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::io::Write as _;
use std::time::Duration;

use tempfile::NamedTempFile;
use tokio::sync::mpsc;

use super::*;

async fn recv_within(rx: &mut mpsc::Receiver<RawLine>, timeout: Duration) -> Option<RawLine> {
    tokio::time::timeout(timeout, rx.recv()).await.ok().flatten()
}

#[tokio::test]
async fn tails_lines_appended_after_start() {
    let mut file = NamedTempFile::new().expect("tempfile");
    writeln!(file, "existing line, should not be emitted").unwrap();
    let path = file.path().to_path_buf();

    let (tx, mut rx) = mpsc::channel(16);
    let handle = spawn_tailer(path.clone(), StartPosition::EndOfFile, tx);

    writeln!(file, "2026.1.2 3:04:05 Debug - hello").unwrap();

    let raw = recv_within(&mut rx, Duration::from_secs(2))
        .await
        .expect("expected a line");
    assert_eq!(raw.text, "2026.1.2 3:04:05 Debug - hello");

    handle.stop();
}

#[tokio::test]
async fn ignores_preexisting_content_when_starting_at_eof() {
    let mut file = NamedTempFile::new().expect("tempfile");
    writeln!(file, "old line 1").unwrap();
    writeln!(file, "old line 2").unwrap();
    let path = file.path().to_path_buf();

    let (tx, mut rx) = mpsc::channel(16);
    let handle = spawn_tailer(path, StartPosition::EndOfFile, tx);

    let nothing = recv_within(&mut rx, Duration::from_millis(300)).await;
    assert!(nothing.is_none());

    handle.stop();
}

#[tokio::test]
async fn resumes_from_explicit_offset() {
    let mut file = NamedTempFile::new().expect("tempfile");
    write!(file, "aaaa\nbbbb\n").unwrap();
    let path = file.path().to_path_buf();

    let (tx, mut rx) = mpsc::channel(16);
    // "aaaa\n" is 5 bytes; starting there should skip the first line only.
    let handle = spawn_tailer(path.clone(), StartPosition::Offset(5), tx);

    writeln!(file, "cccc").unwrap();

    let first = recv_within(&mut rx, Duration::from_secs(2)).await.expect("line");
    assert_eq!(first.text, "bbbb");
    let second = recv_within(&mut rx, Duration::from_secs(2)).await.expect("line");
    assert_eq!(second.text, "cccc");

    handle.stop();
}

#[tokio::test]
async fn detects_truncation_and_resumes_at_zero() {
    let mut file = NamedTempFile::new().expect("tempfile");
    writeln!(file, "line one").unwrap();
    let path = file.path().to_path_buf();

    let (tx, mut rx) = mpsc::channel(16);
    let handle = spawn_tailer(path.clone(), StartPosition::EndOfFile, tx);

    // Truncate then write fresh content shorter than the original offset.
    {
        let f = std::fs::OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&path)
            .unwrap();
        drop(f);
    }
    let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    writeln!(f, "fresh").unwrap();

    let raw = recv_within(&mut rx, Duration::from_secs(2)).await.expect("line");
    assert_eq!(raw.text, "fresh");

    handle.stop();
}

#[test]
fn incremental_reader_buffers_partial_lines_without_trailing_newline() {
    let mut file = NamedTempFile::new().expect("tempfile");
    write!(file, "complete\n").unwrap();
    let path = file.path().to_path_buf();

    let mut reader = IncrementalReader::new(path.clone(), StartPosition::Offset(0)).unwrap();
    let lines = reader.read_new_lines().unwrap();
    assert_eq!(lines, vec!["complete".to_string()]);

    let mut f = std::fs::OpenOptions::new().append(true).open(&path).unwrap();
    write!(f, "partial-no-newline-yet").unwrap();
    let lines = reader.read_new_lines().unwrap();
    assert!(lines.is_empty());

    writeln!(f, " now-finished").unwrap();
    let lines = reader.read_new_lines().unwrap();
    assert_eq!(lines, vec!["partial-no-newline-yet now-finished".to_string()]);
}
