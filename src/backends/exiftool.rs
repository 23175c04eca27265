use super::{BackendError, BackendKind, MetadataBackend};
use crate::gps::round_to;
use crate::record::RawMetadata;
use crate::time::parsing::{parse_unified_timestamp, parse_utc_offset};
use crate::time::structs::EXIF_TIMESTAMP_FORMAT;
use ::exiftool::ExifTool;
use serde_json::Value;
use std::path::Path;
use std::sync::{Mutex, PoisonError};

/// Capture time keys in the order they are trusted. `QuickTime:CreateDate` is UTC.
const CAPTURE_KEYS: &[&str] = &[
    "MakerNotes:TimeStamp",
    "EXIF:DateTimeOriginal",
    "QuickTime:CreateDate",
];

/// Reads metadata through one long-running exiftool process.
pub struct ExifToolBackend {
    exiftool: Mutex<ExifTool>,
}

impl ExifToolBackend {
    /// Starts exiftool, from `executable` when given and from `PATH` otherwise.
    ///
    /// # Errors
    ///
    /// Fails when the exiftool process cannot be started.
    pub fn new(executable: Option<&Path>) -> Result<Self, BackendError> {
        let exiftool = match executable {
            Some(path) => ExifTool::with_executable(path)?,
            None => ExifTool::new()?,
        };
        Ok(Self {
            exiftool: Mutex::new(exiftool),
        })
    }
}

impl MetadataBackend for ExifToolBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::ExifTool
    }

    fn read_raw(&self, path: &Path) -> Result<Option<RawMetadata>, BackendError> {
        let json = self
            .exiftool
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .json(path, &["-G", "-n"])?;
        Ok(parse_exiftool_json(&json))
    }
}

fn text(json: &Value, key: &str) -> Option<String> {
    match json.get(key)? {
        Value::String(s) => {
            let s = s.trim();
            (!s.is_empty()).then(|| s.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn uint(json: &Value, key: &str) -> Option<u32> {
    match json.get(key)? {
        Value::Number(n) => n.as_u64().and_then(|n| u32::try_from(n).ok()),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn float(json: &Value, key: &str) -> Option<f64> {
    match json.get(key)? {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

/// Maps the grouped numeric (`-G -n`) exiftool output of one file onto raw fields.
///
/// The capture time may carry an offset suffix (`2020:04:24 12:07:46+03:00`); it is
/// split off and used when `OffsetTimeOriginal` is missing.
pub fn parse_exiftool_json(json: &Value) -> Option<RawMetadata> {
    if !json.is_object() {
        return None;
    }
    let present: Vec<(&str, String)> = CAPTURE_KEYS
        .iter()
        .filter_map(|key| text(json, key).map(|value| (*key, value)))
        .collect();
    // The first key holding a valid time wins. A zeroed maker-note time must not
    // hide a good `DateTimeOriginal`.
    let valid = present.iter().find_map(|(key, value)| match parse_unified_timestamp(value) {
        (Some(dt), offset) => Some((*key, dt.format(EXIF_TIMESTAMP_FORMAT).to_string(), offset)),
        (None, _) => None,
    });

    let (timestamp_original, offset_suffix, capture_is_utc) = match (valid, present.first()) {
        (Some((key, timestamp, offset)), _) => {
            (Some(timestamp), offset, key == "QuickTime:CreateDate")
        }
        // Keep unparseable input as-is so the record is classified invalid.
        (None, Some((_, value))) => (Some(value.clone()), None, false),
        (None, None) => (None, None, false),
    };

    let offset = |key: &str| text(json, key).and_then(|s| parse_utc_offset(&s));

    Some(
        RawMetadata::builder()
            .maybe_timestamp_original(timestamp_original)
            .maybe_timestamp_digitized(text(json, "EXIF:CreateDate"))
            .maybe_timestamp_file_modified(text(json, "EXIF:ModifyDate"))
            .capture_is_utc(capture_is_utc)
            .maybe_utc_offset_original(offset("EXIF:OffsetTimeOriginal").or(offset_suffix))
            .maybe_utc_offset_digitized(offset("EXIF:OffsetTimeDigitized"))
            .maybe_utc_offset_file_modified(offset("EXIF:OffsetTime"))
            .maybe_make(text(json, "EXIF:Make").or_else(|| text(json, "QuickTime:Make")))
            .maybe_model(text(json, "EXIF:Model").or_else(|| text(json, "QuickTime:Model")))
            .maybe_pixel_width(uint(json, "EXIF:ExifImageWidth"))
            .maybe_pixel_height(uint(json, "EXIF:ExifImageHeight"))
            .maybe_image_width(uint(json, "File:ImageWidth").or_else(|| uint(json, "QuickTime:ImageWidth")))
            .maybe_image_height(uint(json, "File:ImageHeight").or_else(|| uint(json, "QuickTime:ImageHeight")))
            .maybe_latitude(float(json, "Composite:GPSLatitude"))
            .maybe_longitude(float(json, "Composite:GPSLongitude"))
            .maybe_altitude(float(json, "Composite:GPSAltitude").map(|alt| round_to(alt, 1)))
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_photo() {
        let json = json!({
            "SourceFile": "PXL_20240501_203015123.jpg",
            "File:ImageWidth": 4080,
            "File:ImageHeight": 3072,
            "EXIF:Make": "Google",
            "EXIF:Model": "Pixel 6",
            "EXIF:ModifyDate": "2024:05:01 22:30:15",
            "EXIF:DateTimeOriginal": "2024:05:01 22:30:15",
            "EXIF:CreateDate": "2024:05:01 22:30:15",
            "EXIF:OffsetTime": "+02:00",
            "EXIF:OffsetTimeOriginal": "+02:00",
            "EXIF:OffsetTimeDigitized": "+02:00",
            "EXIF:ExifImageWidth": 4080,
            "EXIF:ExifImageHeight": 3072,
            "Composite:GPSLatitude": 52.379_189,
            "Composite:GPSLongitude": 4.899_431,
            "Composite:GPSAltitude": 12.345
        });
        let raw = parse_exiftool_json(&json).unwrap();

        assert_eq!(raw.timestamp_original.as_deref(), Some("2024:05:01 22:30:15"));
        assert_eq!(raw.timestamp_digitized.as_deref(), Some("2024:05:01 22:30:15"));
        assert_eq!(raw.timestamp_file_modified.as_deref(), Some("2024:05:01 22:30:15"));
        assert!(!raw.capture_is_utc);
        assert_eq!(raw.utc_offset_original, Some(2.0));
        assert_eq!(raw.utc_offset_file_modified, Some(2.0));
        assert_eq!(raw.make.as_deref(), Some("Google"));
        assert_eq!(raw.pixel_width, Some(4080));
        assert_eq!(raw.image_height, Some(3072));
        assert_eq!(raw.latitude, Some(52.379_189));
        assert_eq!(raw.altitude, Some(12.3));
    }

    #[test]
    fn test_maker_notes_timestamp_with_offset() {
        let json = json!({
            "MakerNotes:TimeStamp": "2020:04:24 12:07:46.123+03:00",
            "EXIF:DateTimeOriginal": "2020:04:24 12:07:40"
        });
        let raw = parse_exiftool_json(&json).unwrap();
        assert_eq!(raw.timestamp_original.as_deref(), Some("2020:04:24 12:07:46"));
        assert_eq!(raw.utc_offset_original, Some(3.0));
    }

    #[test]
    fn test_quicktime_create_date_is_utc() {
        let json = json!({
            "QuickTime:CreateDate": "2023:07:15 10:00:00",
            "QuickTime:ImageWidth": 1920,
            "QuickTime:ImageHeight": 1080
        });
        let raw = parse_exiftool_json(&json).unwrap();
        assert_eq!(raw.timestamp_original.as_deref(), Some("2023:07:15 10:00:00"));
        assert!(raw.capture_is_utc);
        assert_eq!(raw.image_width, Some(1920));
        assert_eq!(raw.utc_offset_original, None);
    }

    #[test]
    fn test_zeroed_date_is_kept_raw() {
        let json = json!({ "EXIF:DateTimeOriginal": "0000:00:00 00:00:00" });
        let raw = parse_exiftool_json(&json).unwrap();
        assert_eq!(raw.timestamp_original.as_deref(), Some("0000:00:00 00:00:00"));
    }

    #[test]
    fn test_zeroed_maker_notes_fall_back_to_date_time_original() {
        let json = json!({
            "MakerNotes:TimeStamp": "0000:00:00 00:00:00",
            "EXIF:DateTimeOriginal": "2020:04:24 12:07:46",
            "QuickTime:CreateDate": "2020:04:24 09:07:46",
        });
        let raw = parse_exiftool_json(&json).unwrap();
        assert_eq!(raw.timestamp_original.as_deref(), Some("2020:04:24 12:07:46"));
        assert!(!raw.capture_is_utc);
    }

    #[test]
    fn test_no_fields() {
        assert_eq!(parse_exiftool_json(&json!({})), Some(RawMetadata::default()));
        assert_eq!(parse_exiftool_json(&json!([])), None);
    }
}
