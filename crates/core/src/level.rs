// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log severity level, as carried on a processed record.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warning,
    Error,
    Fatal,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warning => "warning",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }

    /// Parses the surface-match level word (`Debug`, `Log`, `Warning`,
    /// `Error`, `Exception`) from the game's own log line syntax.
    pub fn from_surface_word(word: &str) -> Level {
        match word {
            "Debug" => Level::Debug,
            "Warning" => Level::Warning,
            "Error" => Level::Error,
            "Exception" => Level::Fatal,
            // "Log" and anything else observed in this position defaults to info.
            _ => Level::Info,
        }
    }
}

impl std::fmt::Display for Level {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_surface_word_maps_known_words() {
        assert_eq!(Level::from_surface_word("Warning"), Level::Warning);
        assert_eq!(Level::from_surface_word("Error"), Level::Error);
        assert_eq!(Level::from_surface_word("Exception"), Level::Fatal);
        assert_eq!(Level::from_surface_word("Log"), Level::Info);
        assert_eq!(Level::from_surface_word("Debug"), Level::Debug);
    }

    #[test]
    fn serializes_lowercase() {
        assert_eq!(serde_json::to_string(&Level::Warning).unwrap(), "\"warning\"");
    }
}
