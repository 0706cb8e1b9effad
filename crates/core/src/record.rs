// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The processed record produced by the parser (§3, §4.5).

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use crate::level::Level;
use crate::parsed::Parsed;
use crate::source_tag::SourceTag;

/// Where a record's raw line came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Origin {
    pub file_path: PathBuf,
    pub file_basename: String,
    pub file_index_in_selection: usize,
}

impl Origin {
    pub fn new(file_path: PathBuf, file_index_in_selection: usize) -> Self {
        let file_basename = file_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            file_path,
            file_basename,
            file_index_in_selection,
        }
    }
}

/// A fully tagged, parsed record ready for fan-out.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedRecord {
    pub id: String,
    pub timestamp_observed: SystemTime,
    pub timestamp_from_line: Option<SystemTime>,
    pub level: Level,
    pub source_tag: SourceTag,
    pub raw: String,
    pub parsed: Option<Parsed>,
    pub origin: Origin,
    pub tags: BTreeSet<String>,
}

impl ProcessedRecord {
    /// Computes the tag set per I4: `tags ⊇ {"level:<level>", "type:<kind>"}`.
    pub fn compute_tags(level: Level, parsed: Option<&Parsed>) -> BTreeSet<String> {
        let mut tags = BTreeSet::new();
        tags.insert(format!("level:{level}"));
        if let Some(p) = parsed {
            tags.insert(format!("type:{}", p.kind));
        }
        tags
    }

    pub fn file_path(&self) -> &Path {
        &self.origin.file_path
    }
}
