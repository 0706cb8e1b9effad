// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use std::path::PathBuf;

use super::*;
use crate::parser::parse;
use crate::raw_line::RawLine;

fn record_with_level(line: &str) -> ProcessedRecord {
    let raw = RawLine::new(line, PathBuf::from("output_log_2025-06-30_15-30-10.txt"));
    parse(&raw, "id".into(), 0).unwrap()
}

fn clause(dimension: FilterDimension, operator: FilterOperator, operand: FilterOperand) -> FilterClause {
    FilterClause {
        id: "f1".to_string(),
        dimension,
        operator,
        operand,
        case_sensitive: false,
    }
}

#[test]
fn scenario_filter_by_level_in_list() {
    let c = clause(
        FilterDimension::Level,
        FilterOperator::In,
        FilterOperand::Many(vec!["error".to_string(), "warning".to_string()]),
    );
    let compiled = CompiledFilter::compile(&c).unwrap();

    let info = record_with_level("2025.6.30 16:00:00 Log - plain info line");
    let warning = record_with_level("2025.6.30 16:00:01 Warning - careful now");
    let error = record_with_level("2025.6.30 16:00:02 Error - something broke");

    assert!(!compiled.matches(&info));
    assert!(compiled.matches(&warning));
    assert!(compiled.matches(&error));
}

#[test]
fn content_contains_is_case_insensitive_by_default() {
    let c = clause(
        FilterDimension::Content,
        FilterOperator::Contains,
        FilterOperand::Single("JOINED".to_string()),
    );
    let compiled = CompiledFilter::compile(&c).unwrap();
    let record = record_with_level(
        "2025.6.30 15:31:25 Log - [Behaviour] OnPlayerJoined Someone (usr_abcdef12)",
    );
    assert!(compiled.matches(&record));
}

#[test]
fn regex_dimension_compiles_at_add_time_and_rejects_bad_pattern() {
    let bad = clause(
        FilterDimension::Regex,
        FilterOperator::Regex,
        FilterOperand::Single("(unclosed".to_string()),
    );
    assert!(CompiledFilter::compile(&bad).is_err());
}

#[test]
fn regex_dimension_matches_raw_line() {
    let c = clause(
        FilterDimension::Regex,
        FilterOperator::Regex,
        FilterOperand::Single(r"wrld_\w+".to_string()),
    );
    let compiled = CompiledFilter::compile(&c).unwrap();
    let record = record_with_level(
        "2025.6.30 15:30:15 Debug - [Behaviour] Joining wrld_abc123~private(usr_def456)~region(jp)",
    );
    assert!(compiled.matches(&record));
}

#[test]
fn empty_filter_set_matches_everything() {
    // An empty filter set is modeled by the registry as zero clauses;
    // this exercises the degenerate single-clause cases that compose it.
    let c = clause(
        FilterDimension::Source,
        FilterOperator::Equals,
        FilterOperand::Single("game".to_string()),
    );
    let compiled = CompiledFilter::compile(&c).unwrap();
    let record = record_with_level(
        "2025.6.30 15:31:25 Log - [Behaviour] OnPlayerJoined Someone (usr_abcdef12)",
    );
    assert!(compiled.matches(&record));
}
