//! Text format for stored durations.
//!
//! Durations are written in the constant time-span layout
//! `[-][d.]hh:mm:ss[.fffffff]`: the day component only when non-zero, the
//! fraction only when non-zero and always with seven digits (100 ns ticks).
//!
//! Parsing accepts `d`, `hh:mm`, `hh:mm:ss`, `d.hh:mm`, `d.hh:mm:ss`, each with
//! an optional leading `-`, and a seconds fraction of one to seven digits.

use chrono::TimeDelta;

const SECS_PER_MINUTE: i64 = 60;
const SECS_PER_HOUR: i64 = 60 * SECS_PER_MINUTE;
const SECS_PER_DAY: i64 = 24 * SECS_PER_HOUR;
const NANOS_PER_TICK: u32 = 100;
const FRACTION_DIGITS: usize = 7;

/// Largest day count representable by the format.
pub const MAX_DAYS: i64 = 10_675_199;

/// Format a duration. Precision below one tick (100 ns) is truncated.
pub fn format(delta: TimeDelta) -> String {
    let negative = delta < TimeDelta::zero();
    let abs = if negative { -delta } else { delta };

    let secs = abs.num_seconds();
    let ticks = abs.subsec_nanos().unsigned_abs() / NANOS_PER_TICK;

    let days = secs / SECS_PER_DAY;
    let hours = (secs % SECS_PER_DAY) / SECS_PER_HOUR;
    let minutes = (secs % SECS_PER_HOUR) / SECS_PER_MINUTE;
    let seconds = secs % SECS_PER_MINUTE;

    let mut out = String::with_capacity(24);
    if negative && (secs > 0 || ticks > 0) {
        out.push('-');
    }
    if days > 0 {
        out.push_str(&format!("{days}."));
    }
    out.push_str(&format!("{hours:02}:{minutes:02}:{seconds:02}"));
    if ticks > 0 {
        out.push_str(&format!(".{ticks:07}"));
    }
    out
}

/// Parse a duration. Returns `None` for anything outside the accepted layouts
/// or with out-of-range components.
pub fn parse(text: &str) -> Option<TimeDelta> {
    let text = text.trim();
    let (negative, body) = match text.strip_prefix('-') {
        Some(rest) => (true, rest),
        None => (false, text),
    };
    if body.is_empty() {
        return None;
    }

    let parts: Vec<&str> = body.split(':').collect();
    let (days, hours, minutes, seconds, ticks) = match parts.as_slice() {
        [days] => (parse_number(days, MAX_DAYS)?, 0, 0, 0, 0),
        [head, minutes] => {
            let (days, hours) = parse_day_hour(head)?;
            (days, hours, parse_number(minutes, 59)?, 0, 0)
        }
        [head, minutes, seconds] => {
            let (days, hours) = parse_day_hour(head)?;
            let (seconds, ticks) = parse_seconds(seconds)?;
            (days, hours, parse_number(minutes, 59)?, seconds, ticks)
        }
        _ => return None,
    };

    let total_secs =
        days * SECS_PER_DAY + hours * SECS_PER_HOUR + minutes * SECS_PER_MINUTE + seconds;
    let delta = TimeDelta::seconds(total_secs)
        + TimeDelta::nanoseconds(i64::from(ticks * NANOS_PER_TICK));

    Some(if negative { -delta } else { delta })
}

/// `d.hh` or `hh`.
fn parse_day_hour(head: &str) -> Option<(i64, i64)> {
    match head.split_once('.') {
        Some((days, hours)) => Some((parse_number(days, MAX_DAYS)?, parse_number(hours, 23)?)),
        None => Some((0, parse_number(head, 23)?)),
    }
}

/// `ss` or `ss.f` with one to seven fraction digits.
fn parse_seconds(text: &str) -> Option<(i64, u32)> {
    match text.split_once('.') {
        Some((seconds, fraction)) => {
            if fraction.is_empty()
                || fraction.len() > FRACTION_DIGITS
                || !fraction.bytes().all(|b| b.is_ascii_digit())
            {
                return None;
            }
            let scale = 10u32.pow((FRACTION_DIGITS - fraction.len()) as u32);
            let ticks = fraction.parse::<u32>().ok()? * scale;
            Some((parse_number(seconds, 59)?, ticks))
        }
        None => Some((parse_number(text, 59)?, 0)),
    }
}

fn parse_number(text: &str, max: i64) -> Option<i64> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let value = text.parse::<i64>().ok()?;
    (value <= max).then_some(value)
}
