//! Utility functions for parsing timestamp and UTC offset strings into chrono types.

use super::error::TimeError;
use super::structs::{
    EXIF_TIMESTAMP_FORMAT, EXIF_TIMESTAMP_LEN, ExifStatus, LOCAL_TIMESTAMP_FORMAT,
};
use chrono::{NaiveDateTime, Timelike};
use log::debug;

/// Parses a strict EXIF timestamp (`YYYY:MM:DD HH:MM:SS`).
///
/// There is no lenient fallback: subseconds, other separators or out-of-range
/// calendar fields are all rejected.
pub fn parse_exif_timestamp(s: &str) -> Result<NaiveDateTime, TimeError> {
    // chrono accepts a few layouts the EXIF grammar does not (e.g. single digit fields).
    if s.len() != EXIF_TIMESTAMP_LEN {
        return Err(TimeError::Format {
            input: s.to_string(),
        });
    }
    NaiveDateTime::parse_from_str(s, EXIF_TIMESTAMP_FORMAT)
        .ok()
        // `%S` reads second 60 as a leap second, stored as an overflowing nanosecond.
        .filter(|dt| dt.nanosecond() < 1_000_000_000)
        .ok_or_else(|| TimeError::Format {
            input: s.to_string(),
        })
}

pub fn is_timestamp_valid(s: &str) -> bool {
    parse_exif_timestamp(s).is_ok()
}

/// Picks the most trustworthy timestamp from candidates given in priority order.
///
/// The caller passes "original" before "digitized": digitized timestamps can be a
/// scan date, so they are only used when the original is missing or malformed.
/// Scanning continues after a present but invalid candidate.
pub fn select_best_timestamp<'a>(candidates: &[Option<&'a str>]) -> (Option<&'a str>, ExifStatus) {
    let mut status = ExifStatus::NoDateTime;
    for candidate in candidates.iter().flatten() {
        if candidate.is_empty() {
            continue;
        }
        status = ExifStatus::InvalidDateTime;
        if is_timestamp_valid(candidate) {
            return (Some(candidate), ExifStatus::ValidExif);
        }
    }
    (None, status)
}

/// Parses a UTC offset whose last six characters encode `±HH:MM`, in signed hours.
///
/// Anything malformed is logged and yields `None`; offset parsing never aborts
/// timestamp resolution.
pub fn parse_utc_offset(raw: &str) -> Option<f64> {
    let parsed = raw
        .len()
        .checked_sub(6)
        .and_then(|start| raw.get(start..))
        .and_then(parse_offset_tail);
    if parsed.is_none() && !raw.is_empty() {
        debug!("Could not parse UTC offset {raw:?}");
    }
    parsed
}

fn parse_offset_tail(tail: &str) -> Option<f64> {
    if !tail.is_ascii() {
        return None;
    }
    let bytes = tail.as_bytes();
    let sign = match bytes[0] {
        b'+' => 1.0,
        b'-' => -1.0,
        _ => return None,
    };
    if bytes[3] != b':' {
        return None;
    }
    let hours = parse_two_digits(&tail[1..3])?;
    let minutes = parse_two_digits(&tail[4..6])?;
    if hours > 14 || minutes > 59 {
        return None;
    }
    Some(sign * (f64::from(hours) + f64::from(minutes) / 60.0))
}

fn parse_two_digits(s: &str) -> Option<u8> {
    if s.bytes().all(|b| b.is_ascii_digit()) {
        s.parse().ok()
    } else {
        None
    }
}

/// Splits a combined value such as `2020:04:24 12:07:46+03:00` into its timestamp
/// and its UTC offset.
///
/// The first 19 characters are the timestamp; whatever follows (subseconds and/or
/// an offset) is handed to [`parse_utc_offset`].
pub fn parse_unified_timestamp(s: &str) -> (Option<NaiveDateTime>, Option<f64>) {
    let Some(prefix) = s.get(..EXIF_TIMESTAMP_LEN) else {
        debug!("Timestamp {s:?} is shorter than {EXIF_TIMESTAMP_LEN} characters");
        return (None, None);
    };
    let offset = s
        .get(EXIF_TIMESTAMP_LEN..)
        .filter(|rest| !rest.is_empty())
        .and_then(parse_utc_offset);
    match parse_exif_timestamp(prefix) {
        Ok(dt) => (Some(dt), offset),
        Err(e) => {
            debug!("{e}");
            (None, offset)
        }
    }
}

/// Parses the `YYYY-MM-DD HH:MM:SS` layout reported by container tools.
pub fn parse_local_timestamp(s: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(s.trim(), LOCAL_TIMESTAMP_FORMAT).ok()
}

/// Rewrites a container time (`2020-04-24T12:07:46.000000Z`, `UTC 2020-04-24 12:07:46`,
/// `2020-04-24 12:07:46 UTC`) into the EXIF layout.
pub fn normalize_container_timestamp(s: &str) -> Option<String> {
    let cleaned = s.replace("UTC", "");
    let cleaned = cleaned.trim().replacen('T', " ", 1);
    let cleaned = cleaned.trim_end_matches('Z');
    let cleaned = cleaned.split('.').next().unwrap_or(cleaned).trim();
    if is_timestamp_valid(cleaned) {
        return Some(cleaned.to_string());
    }
    parse_local_timestamp(cleaned).map(|dt| dt.format(EXIF_TIMESTAMP_FORMAT).to_string())
}
