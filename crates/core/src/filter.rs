// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Subscriber filter clauses and their compiled form (§3, §4.6, §9).
//!
//! A filter clause is accepted at the protocol boundary as data and
//! compiled once, at `add_filter` time, into a closure-backed predicate.
//! Compilation failure (a bad regex) is rejected then and there with
//! `invalid_filter`; it is never retried at dispatch time.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::record::ProcessedRecord;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterDimension {
    Level,
    Source,
    Content,
    Regex,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FilterOperator {
    Equals,
    Contains,
    Regex,
    In,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FilterOperand {
    Single(String),
    Many(Vec<String>),
}

/// A single AND-composed condition, as received from `add_filter`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FilterClause {
    pub id: String,
    pub dimension: FilterDimension,
    pub operator: FilterOperator,
    pub operand: FilterOperand,
    #[serde(default)]
    pub case_sensitive: bool,
}

#[derive(Debug, Error)]
pub enum FilterError {
    #[error("regex operand does not compile: {0}")]
    InvalidRegex(#[from] regex::Error),
    #[error("operator {operator:?} requires a list operand")]
    OperandShapeMismatch { operator: FilterOperator },
}

enum CompiledPredicate {
    Level(Vec<String>),
    Source(Vec<String>),
    ContentEquals(Vec<String>),
    ContentContains(Vec<String>),
    Regex(regex::Regex),
}

/// A clause compiled once at `add_filter` time into a cheap-to-evaluate
/// predicate. Built fresh on every mutation; a subscriber's full filter
/// set is the AND of every clause's [`CompiledFilter::matches`].
pub struct CompiledFilter {
    pub clause_id: String,
    predicate: CompiledPredicate,
    case_sensitive: bool,
}

fn normalize(s: &str, case_sensitive: bool) -> String {
    if case_sensitive {
        s.to_string()
    } else {
        s.to_lowercase()
    }
}

fn operand_values(operand: &FilterOperand) -> Vec<String> {
    match operand {
        FilterOperand::Single(s) => vec![s.clone()],
        FilterOperand::Many(v) => v.clone(),
    }
}

impl CompiledFilter {
    pub fn compile(clause: &FilterClause) -> Result<Self, FilterError> {
        let case_sensitive = clause.case_sensitive;
        let values: Vec<String> = operand_values(&clause.operand)
            .into_iter()
            .map(|v| normalize(&v, case_sensitive))
            .collect();

        let predicate = match (clause.dimension, clause.operator) {
            (FilterDimension::Level, _) => CompiledPredicate::Level(values),
            (FilterDimension::Source, _) => CompiledPredicate::Source(values),
            (FilterDimension::Content, FilterOperator::Contains) => {
                CompiledPredicate::ContentContains(values)
            }
            (FilterDimension::Content, FilterOperator::Equals)
            | (FilterDimension::Content, FilterOperator::In) => {
                CompiledPredicate::ContentEquals(values)
            }
            (FilterDimension::Content, FilterOperator::Regex)
            | (FilterDimension::Regex, _) => {
                let pattern = match &clause.operand {
                    FilterOperand::Single(s) => s.clone(),
                    FilterOperand::Many(_) => {
                        return Err(FilterError::OperandShapeMismatch {
                            operator: clause.operator,
                        })
                    }
                };
                let compiled = if case_sensitive {
                    regex::Regex::new(&pattern)?
                } else {
                    regex::RegexBuilder::new(&pattern)
                        .case_insensitive(true)
                        .build()?
                };
                CompiledPredicate::Regex(compiled)
            }
        };

        Ok(Self {
            clause_id: clause.id.clone(),
            predicate,
            case_sensitive,
        })
    }

    pub fn matches(&self, record: &ProcessedRecord) -> bool {
        match &self.predicate {
            CompiledPredicate::Level(values) => {
                let level = normalize(record.level.as_str(), self.case_sensitive);
                values.iter().any(|v| v == &level)
            }
            CompiledPredicate::Source(values) => {
                let source = normalize(record.source_tag.as_str(), self.case_sensitive);
                values.iter().any(|v| v == &source)
            }
            CompiledPredicate::ContentEquals(values) => {
                let raw = normalize(&record.raw, self.case_sensitive);
                values.iter().any(|v| v == &raw)
            }
            CompiledPredicate::ContentContains(values) => {
                let raw = normalize(&record.raw, self.case_sensitive);
                values.iter().any(|v| raw.contains(v.as_str()))
            }
            CompiledPredicate::Regex(re) => re.is_match(&record.raw),
        }
    }
}

#[cfg(test)]
#[path = "filter_tests.rs"]
mod tests;
