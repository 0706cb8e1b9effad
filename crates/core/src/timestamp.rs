// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Converts the game log's `YYYY.M.D H:M:S` timestamp syntax to
//! [`SystemTime`], without pulling in a calendar crate.
//!
//! The game writes local wall-clock time with no timezone offset in the
//! line itself; this treats it as UTC, which is sufficient for the
//! relative ordering and display purposes the daemon needs it for.

use std::time::{Duration, SystemTime};

/// Days from the civil epoch (1970-01-01) for a given y/m/d, using the
/// Howard Hinnant `days_from_civil` algorithm.
fn days_from_civil(y: i64, m: u32, d: u32) -> i64 {
    let y = if m <= 2 { y - 1 } else { y };
    let era = if y >= 0 { y } else { y - 399 } / 400;
    let yoe = (y - era * 400) as i64; // [0, 399]
    let mp = ((m as i64 + 9) % 12) as i64; // [0, 11]
    let doy = (153 * mp + 2) / 5 + d as i64 - 1; // [0, 365]
    let doe = yoe * 365 + yoe / 4 - yoe / 100 + doy; // [0, 146096]
    era * 146097 + doe - 719468
}

/// Parses `YYYY.M.D H:M:S` into a [`SystemTime`]. Returns `None` on any
/// out-of-range field rather than panicking.
pub fn parse_game_timestamp(
    year: i64,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
    second: u32,
) -> Option<SystemTime> {
    if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
        return None;
    }
    if hour > 23 || minute > 59 || second > 60 {
        return None;
    }
    let days = days_from_civil(year, month, day);
    let secs = days
        .checked_mul(86_400)?
        .checked_add(hour as i64 * 3600)?
        .checked_add(minute as i64 * 60)?
        .checked_add(second as i64)?;
    if secs >= 0 {
        SystemTime::UNIX_EPOCH.checked_add(Duration::from_secs(secs as u64))
    } else {
        SystemTime::UNIX_EPOCH.checked_sub(Duration::from_secs((-secs) as u64))
    }
}

/// Converts a [`SystemTime`] to milliseconds since the Unix epoch, as
/// used by every timestamp on the wire protocol (§6).
pub fn to_epoch_millis(t: SystemTime) -> i64 {
    match t.duration_since(SystemTime::UNIX_EPOCH) {
        Ok(d) => d.as_millis() as i64,
        Err(e) => -(e.duration().as_millis() as i64),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_a_known_date() {
        // 2025-06-30 15:30:15 UTC
        let t = parse_game_timestamp(2025, 6, 30, 15, 30, 15).unwrap();
        let millis = to_epoch_millis(t);
        // Recomputed independently via days-since-epoch for 2025-06-30.
        let expected_days = days_from_civil(2025, 6, 30);
        let expected_secs = expected_days * 86_400 + 15 * 3600 + 30 * 60 + 15;
        assert_eq!(millis, expected_secs * 1000);
    }

    #[test]
    fn rejects_invalid_month() {
        assert!(parse_game_timestamp(2025, 13, 1, 0, 0, 0).is_none());
    }

    #[test]
    fn epoch_is_zero() {
        let t = parse_game_timestamp(1970, 1, 1, 0, 0, 0).unwrap();
        assert_eq!(to_epoch_millis(t), 0);
    }
}
