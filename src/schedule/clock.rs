use chrono::{Duration, NaiveTime};

use crate::schedule::ScheduleError;

const SECS_PER_DAY: i64 = 86_400;

/// Parse a strict 24-hour `HH:MM` string. Single-digit hours, seconds and
/// out-of-range components are rejected.
pub fn parse_hhmm(s: &str) -> Result<NaiveTime, ScheduleError> {
    let bytes = s.as_bytes();
    let well_formed = bytes.len() == 5
        && bytes[2] == b':'
        && bytes
            .iter()
            .enumerate()
            .all(|(i, b)| i == 2 || b.is_ascii_digit());
    if !well_formed {
        return Err(ScheduleError::Format(format!("'{}' is not HH:MM", s)));
    }
    NaiveTime::parse_from_str(s, "%H:%M")
        .map_err(|e| ScheduleError::Format(format!("'{}': {}", s, e)))
}

pub fn format_hhmm(t: NaiveTime) -> String {
    t.format("%H:%M").to_string()
}

/// Shift a clock time by a signed number of minutes, wrapping modulo 24h.
/// Also returns the day carry: -1 when the result lands on the previous
/// day's clock, +1 on the next day's, 0 otherwise.
pub fn shift(time: NaiveTime, offset_minutes: i32) -> (NaiveTime, i64) {
    let (shifted, wrapped_secs) =
        time.overflowing_add_signed(Duration::minutes(offset_minutes as i64));
    (shifted, wrapped_secs / SECS_PER_DAY)
}

/// Add `offset_minutes` to an `HH:MM` string and return the new `HH:MM`.
/// Day rollover is not tracked: `00:10` minus 90 minutes is `22:40`.
pub fn add_minutes(base: &str, offset_minutes: i32) -> Result<String, ScheduleError> {
    let time = parse_hhmm(base)?;
    let (shifted, _) = shift(time, offset_minutes);
    Ok(format_hhmm(shifted))
}
