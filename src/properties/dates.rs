//! Date helpers for projected properties

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};

/// Round a timestamp up to the next whole second.
pub fn round_up_to_second(time: DateTime<Utc>) -> DateTime<Utc> {
    let millis = time.timestamp_millis();
    let rounded = (millis + 999).div_euclid(1000) * 1000;
    Utc.timestamp_millis_opt(rounded).single().unwrap_or(time)
}

/// Parse a descriptive-metadata date.
///
/// Accepts `yyyy-MM-dd`, `yyyy-MM-dd HH:mm:ss` and RFC 3339; anything else
/// yields `None`.
pub fn parse_descriptive_date(raw: &str) -> Option<DateTime<Utc>> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    if let Ok(date) = NaiveDate::parse_from_str(raw, "%Y-%m-%d") {
        return date.and_hms_opt(0, 0, 0).map(|dt| Utc.from_utc_datetime(&dt));
    }
    if let Ok(dt) = NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&dt));
    }
    DateTime::parse_from_rfc3339(raw)
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}
