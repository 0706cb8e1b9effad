// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Pure line-to-record parsing (§4.5). No I/O and no clock reads other
//! than the single `timestamp_observed` stamp, which is the one "time
//! lookup" the component contract allows.

use std::collections::BTreeMap;
use std::collections::BTreeSet;
use std::sync::OnceLock;
use std::time::SystemTime;

use regex::Regex;

use crate::level::Level;
use crate::parsed::{Parsed, ParsedKind};
use crate::raw_line::RawLine;
use crate::record::{Origin, ProcessedRecord};
use crate::source_tag::SourceTag;
use crate::timestamp::parse_game_timestamp;

fn surface_with_level_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(\d{4})\.(\d{1,2})\.(\d{1,2}) (\d{1,2}):(\d{2}):(\d{2}) (Debug|Log|Warning|Error|Exception) - (.*)$",
        )
        .expect("static regex is valid")
    })
}

fn surface_bare_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d{4})\.(\d{1,2})\.(\d{1,2}) (\d{1,2}):(\d{2}):(\d{2}) (.*)$")
            .expect("static regex is valid")
    })
}

fn world_change_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^\[Behaviour\] Joining wrld_([0-9A-Za-z-]+)(?::([^~]+))?~private\(usr_([0-9A-Za-z-]+)\)(?:~canRequestInvite)?~region\(([A-Za-z0-9]+)\)",
        )
        .expect("static regex is valid")
    })
}

fn user_join_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[Behaviour\] OnPlayerJoined (.+) \(usr_([0-9A-Za-z-]+)\)$")
            .expect("static regex is valid")
    })
}

fn user_leave_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^\[Behaviour\] OnPlayerLeft (.+) \(usr_([0-9A-Za-z-]+)\)$")
            .expect("static regex is valid")
    })
}

struct SurfaceMatch {
    timestamp_from_line: Option<SystemTime>,
    level: Level,
    content: String,
}

/// §4.5 step 2: surface match.
fn surface_match(line: &str) -> SurfaceMatch {
    if let Some(caps) = surface_with_level_re().captures(line) {
        let ts = capture_timestamp(&caps);
        let level = Level::from_surface_word(&caps[7]);
        return SurfaceMatch {
            timestamp_from_line: ts,
            level,
            content: caps[8].to_string(),
        };
    }
    if let Some(caps) = surface_bare_re().captures(line) {
        let ts = capture_timestamp(&caps);
        return SurfaceMatch {
            timestamp_from_line: ts,
            level: Level::Info,
            content: caps[7].to_string(),
        };
    }
    SurfaceMatch {
        timestamp_from_line: None,
        level: Level::Info,
        content: line.to_string(),
    }
}

fn capture_timestamp(caps: &regex::Captures) -> Option<SystemTime> {
    let year: i64 = caps[1].parse().ok()?;
    let month: u32 = caps[2].parse().ok()?;
    let day: u32 = caps[3].parse().ok()?;
    let hour: u32 = caps[4].parse().ok()?;
    let minute: u32 = caps[5].parse().ok()?;
    let second: u32 = caps[6].parse().ok()?;
    parse_game_timestamp(year, month, day, hour, minute, second)
}

/// §4.5 step 3: semantic match, first match wins.
fn semantic_match(content: &str) -> Option<Parsed> {
    if let Some(caps) = world_change_re().captures(content) {
        let mut fields = BTreeMap::new();
        fields.insert("world_id".to_string(), caps[1].to_string());
        if let Some(instance) = caps.get(2) {
            fields.insert("instance".to_string(), instance.as_str().to_string());
        }
        fields.insert("user_id".to_string(), caps[3].to_string());
        fields.insert("region".to_string(), caps[4].to_string());
        return Some(Parsed::new(ParsedKind::WorldChange, fields));
    }
    if let Some(caps) = user_join_re().captures(content) {
        let mut fields = BTreeMap::new();
        fields.insert("user_name".to_string(), caps[1].to_string());
        fields.insert("user_id".to_string(), caps[2].to_string());
        return Some(Parsed::new(ParsedKind::UserJoin, fields));
    }
    if let Some(caps) = user_leave_re().captures(content) {
        let mut fields = BTreeMap::new();
        fields.insert("user_name".to_string(), caps[1].to_string());
        fields.insert("user_id".to_string(), caps[2].to_string());
        return Some(Parsed::new(ParsedKind::UserLeave, fields));
    }
    let mut fields = BTreeMap::new();
    fields.insert("content".to_string(), content.to_string());
    Some(Parsed::new(ParsedKind::Other, fields))
}

/// §4.5 step 4: source tagging.
fn source_tag_for(content: &str, parsed: &Parsed) -> SourceTag {
    match parsed.kind {
        ParsedKind::WorldChange | ParsedKind::UserJoin | ParsedKind::UserLeave => SourceTag::Game,
        ParsedKind::Other => {
            if content.starts_with("[Network]") {
                SourceTag::Network
            } else if content.starts_with("[UdonBehaviour]") {
                SourceTag::Scripted
            } else {
                SourceTag::Other
            }
        }
    }
}

/// Parses one raw line into a [`ProcessedRecord`].
///
/// Pure modulo `id` and `timestamp_observed` (I5): the same `raw.text`
/// always yields the same `level`, `source_tag`, `parsed`, and `tags` for
/// a fixed `file_index_in_selection`.
pub fn parse(raw: &RawLine, id: String, file_index_in_selection: usize) -> Option<ProcessedRecord> {
    // §4.5 step 1: trim/reject.
    if raw.text.trim().is_empty() {
        return None;
    }

    let surface = surface_match(&raw.text);
    let parsed = semantic_match(&surface.content);
    let source_tag = parsed
        .as_ref()
        .map(|p| source_tag_for(&surface.content, p))
        .unwrap_or(SourceTag::Other);

    let tags: BTreeSet<String> = ProcessedRecord::compute_tags(surface.level, parsed.as_ref());

    Some(ProcessedRecord {
        id,
        timestamp_observed: SystemTime::now(),
        timestamp_from_line: surface.timestamp_from_line,
        level: surface.level,
        source_tag,
        raw: raw.text.clone(),
        parsed,
        origin: Origin::new(raw.source_path.clone(), file_index_in_selection),
        tags,
    })
}

#[cfg(test)]
#[path = "parser_tests.rs"]
mod tests;
