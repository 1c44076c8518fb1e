//! Date, time-of-day and duration parsing for rule records.
//!
//! Every parser returns `None` on malformed text; callers treat that as
//! "never matches".

use chrono::{Datelike, NaiveDate, NaiveDateTime, NaiveTime};

/// `YYYY-MM-DD`
pub fn parse_date(text: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(text, "%Y-%m-%d").ok()
}

/// `HH:MM` or `HH:MM:SS`
pub fn parse_time_of_day(text: &str) -> Option<NaiveTime> {
    NaiveTime::parse_from_str(text, "%H:%M:%S")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .ok()
}

/// `hh:mm:ss` to milliseconds.  Hours may exceed 23; zero is rejected.
pub fn parse_duration_ms(text: &str) -> Option<u32> {
    let mut parts = text.split(':');
    let h: u32 = parts.next()?.parse().ok()?;
    let m: u32 = parts.next()?.parse().ok()?;
    let s: u32 = parts.next()?.parse().ok()?;
    if parts.next().is_some() || m > 59 || s > 59 {
        return None;
    }
    let secs = h.checked_mul(3600)?.checked_add(m * 60 + s)?;
    secs.checked_mul(1000).filter(|&ms| ms > 0)
}

/// Half-open `[start, end)`.  `start > end` wraps past midnight;
/// `start == end` is empty.
pub fn window_contains(start: NaiveTime, end: NaiveTime, t: NaiveTime) -> bool {
    if start <= end {
        t >= start && t < end
    } else {
        t >= start || t < end
    }
}

/// Monday = 0 … Sunday = 6.
pub fn weekday_index(at: &NaiveDateTime) -> usize {
    at.weekday().num_days_from_monday() as usize
}

/// January = 0 … December = 11.
pub fn month_index(at: &NaiveDateTime) -> usize {
    at.month0() as usize
}
