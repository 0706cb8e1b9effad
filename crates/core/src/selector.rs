// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! File Selector — the session-grouping rule (§4.3).

use std::path::{Path, PathBuf};
use std::sync::OnceLock;
use std::time::{Duration, SystemTime};

use regex::Regex;

use crate::timestamp::parse_game_timestamp;

fn file_name_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^output_log_(\d{4})-(\d{2})-(\d{2})_(\d{2})-(\d{2})-(\d{2})\.txt$")
            .expect("static regex is valid")
    })
}

/// A candidate log file with its parsed session timestamp.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionFile {
    pub path: PathBuf,
    pub timestamp: SystemTime,
}

/// Parses a directory listing into the subset matching
/// `output_log_YYYY-MM-DD_HH-MM-SS.txt`; non-matching names are ignored.
pub fn candidate_session_files(entries: &[PathBuf]) -> Vec<SessionFile> {
    entries
        .iter()
        .filter_map(|path| {
            let name = path.file_name()?.to_str()?;
            let caps = file_name_re().captures(name)?;
            let year: i64 = caps[1].parse().ok()?;
            let month: u32 = caps[2].parse().ok()?;
            let day: u32 = caps[3].parse().ok()?;
            let hour: u32 = caps[4].parse().ok()?;
            let minute: u32 = caps[5].parse().ok()?;
            let second: u32 = caps[6].parse().ok()?;
            let timestamp = parse_game_timestamp(year, month, day, hour, minute, second)?;
            Some(SessionFile {
                path: path.clone(),
                timestamp,
            })
        })
        .collect()
}

/// Applies the session-grouping rule to an already-filtered, already
/// directory-scanned list of candidate files.
///
/// Sorts newest first, always includes the newest file, then walks
/// forward including each next file whose timestamp is within
/// `group_period` of the *previously included* file, stopping at the
/// first gap that exceeds it or once `max_files` have been taken.
/// Returns the result oldest-first, so `file_index_in_selection` is
/// stable and increasing with time.
pub fn select_session_files(
    mut candidates: Vec<SessionFile>,
    group_period: Duration,
    max_files: usize,
) -> Vec<SessionFile> {
    if candidates.is_empty() || max_files == 0 {
        return Vec::new();
    }

    candidates.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let mut selected = vec![candidates[0].clone()];
    let mut last_included = candidates[0].timestamp;

    for candidate in candidates.into_iter().skip(1) {
        if selected.len() >= max_files {
            break;
        }
        let gap = last_included
            .duration_since(candidate.timestamp)
            .unwrap_or_else(|e| e.duration());
        if gap > group_period {
            break;
        }
        last_included = candidate.timestamp;
        selected.push(candidate);
    }

    selected.reverse();
    selected
}

/// Convenience wrapper: scans an already-listed directory's entries and
/// applies the grouping rule in one call.
pub fn select_from_listing(
    entries: &[PathBuf],
    group_period: Duration,
    max_files: usize,
) -> Vec<PathBuf> {
    let candidates = candidate_session_files(entries);
    select_session_files(candidates, group_period, max_files)
        .into_iter()
        .map(|f| f.path)
        .collect()
}

/// Helper used by adapters that only have bare paths, not `Path` refs.
pub fn is_session_file_name(path: &Path) -> bool {
    path.file_name()
        .and_then(|n| n.to_str())
        .map(|n| file_name_re().is_match(n))
        .unwrap_or(false)
}

#[cfg(test)]
#[path = "selector_tests.rs"]
mod tests;
