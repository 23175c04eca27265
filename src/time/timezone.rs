//! Expected UTC offset for a place and a local date, used to cross-check metadata offsets.

use chrono::{LocalResult, NaiveDateTime, Offset, TimeZone};
use chrono_tz::Tz;
use std::str::FromStr;
use std::sync::LazyLock;
use tzf_rs::DefaultFinder;

static FINDER: LazyLock<DefaultFinder> = LazyLock::new(DefaultFinder::new);

/// Resolves the UTC offset (in signed hours) in effect at a location and local time.
pub trait TimezoneLookup: Send + Sync {
    fn utc_offset_hours(&self, latitude: f64, longitude: f64, local: NaiveDateTime) -> Option<f64>;

    /// Same as [`utc_offset_hours`](Self::utc_offset_hours) for a time given in UTC.
    fn utc_offset_hours_at_utc(&self, latitude: f64, longitude: f64, utc: NaiveDateTime) -> Option<f64> {
        self.utc_offset_hours(latitude, longitude, utc)
    }
}

/// Offline lookup backed by the tzf timezone polygons and the IANA database.
#[derive(Debug, Default, Clone, Copy)]
pub struct TzfLookup;

impl TzfLookup {
    /// The IANA timezone name for a coordinate, if one is found.
    pub fn timezone_name(latitude: f64, longitude: f64) -> Option<Tz> {
        Tz::from_str(FINDER.get_tz_name(longitude, latitude)).ok()
    }
}

impl TimezoneLookup for TzfLookup {
    fn utc_offset_hours(&self, latitude: f64, longitude: f64, local: NaiveDateTime) -> Option<f64> {
        let tz = Self::timezone_name(latitude, longitude)?;
        match tz.from_local_datetime(&local) {
            LocalResult::Single(zoned) | LocalResult::Ambiguous(zoned, _) => {
                Some(f64::from(zoned.offset().fix().local_minus_utc()) / 3600.0)
            }
            LocalResult::None => None,
        }
    }

    fn utc_offset_hours_at_utc(&self, latitude: f64, longitude: f64, utc: NaiveDateTime) -> Option<f64> {
        let tz = Self::timezone_name(latitude, longitude)?;
        let zoned = tz.from_utc_datetime(&utc);
        Some(f64::from(zoned.offset().fix().local_minus_utc()) / 3600.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn local(y: i32, m: u32, d: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn test_amsterdam_follows_dst() {
        let lookup = TzfLookup;
        assert_eq!(lookup.utc_offset_hours(52.379_189, 4.899_431, local(2023, 1, 15)), Some(1.0));
        assert_eq!(lookup.utc_offset_hours(52.379_189, 4.899_431, local(2023, 7, 15)), Some(2.0));
    }

    #[test]
    fn test_utc_input_across_dst_start() {
        // Amsterdam switches to +02:00 at 01:00 UTC on 2023-03-26.
        let at = NaiveDate::from_ymd_opt(2023, 3, 26).unwrap();
        let lookup = TzfLookup;
        let (lat, lng) = (52.379_189, 4.899_431);
        assert_eq!(lookup.utc_offset_hours(lat, lng, at.and_hms_opt(1, 30, 0).unwrap()), Some(1.0));
        assert_eq!(lookup.utc_offset_hours_at_utc(lat, lng, at.and_hms_opt(1, 30, 0).unwrap()), Some(2.0));
        assert_eq!(lookup.utc_offset_hours(lat, lng, at.and_hms_opt(2, 30, 0).unwrap()), None);
        assert_eq!(lookup.utc_offset_hours_at_utc(lat, lng, at.and_hms_opt(2, 30, 0).unwrap()), Some(2.0));
    }

    #[test]
    fn test_fractional_offset() {
        // Mumbai
        assert_eq!(
            TzfLookup.utc_offset_hours(19.0760, 72.8777, local(2020, 4, 24)),
            Some(5.5)
        );
    }

    #[test]
    fn test_timezone_name() {
        assert_eq!(
            TzfLookup::timezone_name(40.7128, -74.0060),
            Some(chrono_tz::America::New_York)
        );
    }
}
