//! Platform abstraction layer
//!
//! Handles browser/native differences for:
//! - Time (creation timestamps)
//! - Storage (LocalStorage on web)
//! - Confirmation prompts

#[cfg(target_arch = "wasm32")]
pub mod web;

use chrono::{DateTime, Local, TimeZone};

/// Wall clock in ms since the Unix epoch
#[cfg(target_arch = "wasm32")]
pub fn now_ms() -> i64 {
    js_sys::Date::now() as i64
}

/// Wall clock in ms since the Unix epoch
#[cfg(not(target_arch = "wasm32"))]
pub fn now_ms() -> i64 {
    use std::time::{SystemTime, UNIX_EPOCH};

    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Creation date as shown on the card (`dd/mm/yyyy`, local time)
pub fn format_creation_date(ms: i64) -> String {
    format_date_in(&Local, ms)
}

/// `dd/mm/yyyy` in the given zone, empty for out-of-range timestamps
pub fn format_date_in<Tz>(tz: &Tz, ms: i64) -> String
where
    Tz: TimeZone,
    Tz::Offset: std::fmt::Display,
{
    tz.timestamp_millis_opt(ms)
        .earliest()
        .map(|dt: DateTime<Tz>| dt.format("%d/%m/%Y").to_string())
        .unwrap_or_default()
}

/// Leading base-10 integer of a form value, like `parseInt(text, 10)`.
///
/// Whitespace and an optional sign are skipped, trailing garbage ignored.
/// `None` when there are no digits or the value overflows.
pub fn parse_int(text: &str) -> Option<i64> {
    let text = text.trim_start();
    let (negative, rest) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let digits = rest.bytes().take_while(u8::is_ascii_digit).count();
    if digits == 0 {
        return None;
    }
    let value: i64 = rest[..digits].parse().ok()?;
    Some(if negative { -value } else { value })
}
