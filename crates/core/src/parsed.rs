// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! The semantic-match payload of a processed record (§4.5 step 3).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ParsedKind {
    WorldChange,
    UserJoin,
    UserLeave,
    Other,
}

impl ParsedKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ParsedKind::WorldChange => "world_change",
            ParsedKind::UserJoin => "user_join",
            ParsedKind::UserLeave => "user_leave",
            ParsedKind::Other => "other",
        }
    }
}

impl std::fmt::Display for ParsedKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// A flat string-keyed map of kind-specific fields, plus the kind itself.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parsed {
    pub kind: ParsedKind,
    pub fields: BTreeMap<String, String>,
}

impl Parsed {
    pub fn new(kind: ParsedKind, fields: BTreeMap<String, String>) -> Self {
        Self { kind, fields }
    }
}
