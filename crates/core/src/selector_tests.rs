// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;
use std::time::Duration;

use super::*;

const DEFAULT_GROUP_PERIOD: Duration = Duration::from_secs(30);
const DEFAULT_MAX_FILES: usize = 4;

fn file(name: &str) -> PathBuf {
    PathBuf::from(name)
}

#[test]
fn empty_directory_selects_nothing() {
    let result = select_from_listing(&[], DEFAULT_GROUP_PERIOD, DEFAULT_MAX_FILES);
    assert!(result.is_empty());
}

#[test]
fn single_matching_file_is_selected_alone() {
    let entries = vec![file("output_log_2025-06-30_15-30-10.txt")];
    let result = select_from_listing(&entries, DEFAULT_GROUP_PERIOD, DEFAULT_MAX_FILES);
    assert_eq!(result, entries);
}

#[test]
fn non_matching_names_are_ignored() {
    let entries = vec![
        file("output_log_2025-06-30_15-30-10.txt"),
        file("notes.txt"),
        file("output_log_bogus.txt"),
    ];
    let result = select_from_listing(&entries, DEFAULT_GROUP_PERIOD, DEFAULT_MAX_FILES);
    assert_eq!(result, vec![file("output_log_2025-06-30_15-30-10.txt")]);
}

#[test]
fn files_29_seconds_apart_are_both_selected() {
    let entries = vec![
        file("output_log_2025-06-30_15-30-00.txt"),
        file("output_log_2025-06-30_15-30-29.txt"),
    ];
    let result = select_from_listing(&entries, DEFAULT_GROUP_PERIOD, DEFAULT_MAX_FILES);
    assert_eq!(result.len(), 2);
    // oldest-first
    assert_eq!(result[0], file("output_log_2025-06-30_15-30-00.txt"));
    assert_eq!(result[1], file("output_log_2025-06-30_15-30-29.txt"));
}

#[test]
fn files_31_seconds_apart_only_the_newer_is_selected() {
    let entries = vec![
        file("output_log_2025-06-30_15-30-00.txt"),
        file("output_log_2025-06-30_15-30-31.txt"),
    ];
    let result = select_from_listing(&entries, DEFAULT_GROUP_PERIOD, DEFAULT_MAX_FILES);
    assert_eq!(result, vec![file("output_log_2025-06-30_15-30-31.txt")]);
}

#[test]
fn stops_at_max_files_even_within_group_period() {
    let entries = vec![
        file("output_log_2025-06-30_15-30-00.txt"),
        file("output_log_2025-06-30_15-30-10.txt"),
        file("output_log_2025-06-30_15-30-20.txt"),
        file("output_log_2025-06-30_15-30-30.txt"),
        file("output_log_2025-06-30_15-30-40.txt"),
    ];
    let result = select_from_listing(&entries, DEFAULT_GROUP_PERIOD, DEFAULT_MAX_FILES);
    assert_eq!(result.len(), DEFAULT_MAX_FILES);
    // Newest file must always be included, and the result stays oldest-first.
    assert_eq!(result.last().unwrap(), &file("output_log_2025-06-30_15-30-40.txt"));
}

#[test]
fn selection_is_idempotent_over_its_own_output() {
    let entries = vec![
        file("output_log_2025-06-30_15-30-00.txt"),
        file("output_log_2025-06-30_15-30-10.txt"),
        file("output_log_2025-07-01_09-00-00.txt"),
    ];
    let once = select_from_listing(&entries, DEFAULT_GROUP_PERIOD, DEFAULT_MAX_FILES);
    let twice = select_from_listing(&once, DEFAULT_GROUP_PERIOD, DEFAULT_MAX_FILES);
    assert_eq!(once, twice);
}

#[test]
fn a_gap_beyond_group_period_excludes_the_rest_of_the_older_session() {
    let entries = vec![
        file("output_log_2025-06-30_09-00-00.txt"), // prior session, excluded
        file("output_log_2025-06-30_15-30-00.txt"),
        file("output_log_2025-06-30_15-30-10.txt"),
    ];
    let result = select_from_listing(&entries, DEFAULT_GROUP_PERIOD, DEFAULT_MAX_FILES);
    assert_eq!(
        result,
        vec![
            file("output_log_2025-06-30_15-30-00.txt"),
            file("output_log_2025-06-30_15-30-10.txt"),
        ]
    );
}
