//! Decoding of EXIF GPS rationals and ISO 6709 strings into decimal degrees and metres.

use regex::Regex;
use std::sync::OnceLock;

/// An unsigned EXIF rational as `(numerator, denominator)`.
pub type Rational = (u32, u32);

pub fn rational_to_f64((numerator, denominator): Rational) -> Option<f64> {
    (denominator != 0).then(|| f64::from(numerator) / f64::from(denominator))
}

pub fn round_to(value: f64, digits: i32) -> f64 {
    let factor = 10f64.powi(digits);
    (value * factor).round() / factor
}

/// Converts a degrees/minutes/seconds triple plus hemisphere reference into a signed
/// decimal coordinate. `S` and `W` references give negative values.
///
/// No rounding is applied.
pub fn parse_gps_coordinate(dms: Option<&[Rational]>, hemisphere: &[u8]) -> Option<f64> {
    let [degrees, minutes, seconds, ..] = dms? else {
        return None;
    };
    let value = rational_to_f64(*degrees)?
        + rational_to_f64(*minutes)? / 60.0
        + rational_to_f64(*seconds)? / 3600.0;
    let is_negative = hemisphere
        .iter()
        .find(|b| !b.is_ascii_whitespace())
        .is_some_and(|b| matches!(b.to_ascii_uppercase(), b'S' | b'W'));
    Some(if is_negative { -value } else { value })
}

/// Altitude in metres, rounded to one decimal.
pub fn parse_altitude(value: Option<Rational>, below_sea_level: bool) -> Option<f64> {
    let metres = round_to(rational_to_f64(value?)?, 1);
    Some(if below_sea_level { -metres } else { metres })
}

/// A decimal degree position as written by phones into video containers,
/// e.g. `+52.3792+004.8994+012.345/`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Iso6709 {
    pub latitude: f64,
    pub longitude: f64,
    pub altitude: Option<f64>,
}

static ISO6709_RE: OnceLock<Regex> = OnceLock::new();

/// Parses the decimal-degree form of ISO 6709. Altitude is rounded to one decimal.
pub fn parse_iso6709(s: &str) -> Option<Iso6709> {
    let re = ISO6709_RE.get_or_init(|| {
        Regex::new(r"^([+-]\d{1,2}(?:\.\d+)?)([+-]\d{1,3}(?:\.\d+)?)([+-]\d+(?:\.\d+)?)?(?:CRS[^/]*)?/?$")
            .expect("valid ISO 6709 regex")
    });
    let caps = re.captures(s.trim())?;
    let latitude: f64 = caps[1].parse().ok()?;
    let longitude: f64 = caps[2].parse().ok()?;
    if latitude.abs() > 90.0 || longitude.abs() > 180.0 {
        return None;
    }
    let altitude = caps
        .get(3)
        .and_then(|m| m.as_str().parse::<f64>().ok())
        .map(|alt| round_to(alt, 1));
    Some(Iso6709 {
        latitude,
        longitude,
        altitude,
    })
}
