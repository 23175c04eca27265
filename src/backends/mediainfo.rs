use super::command::{probe_program, run_tool};
use super::{BackendError, BackendKind, MetadataBackend};
use crate::gps::parse_iso6709;
use crate::record::RawMetadata;
use crate::time::parsing::normalize_container_timestamp;
use serde_json::Value;
use std::path::{Path, PathBuf};

/// Reads container metadata through `mediainfo --Output=JSON`.
pub struct MediaInfoBackend {
    program: PathBuf,
}

impl MediaInfoBackend {
    pub fn new(program: PathBuf) -> Result<Self, BackendError> {
        probe_program(&program, "--Version")?;
        Ok(Self { program })
    }
}

impl MetadataBackend for MediaInfoBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::MediaInfo
    }

    fn read_raw(&self, path: &Path) -> Result<Option<RawMetadata>, BackendError> {
        let output = run_tool(&self.program, &["--Output=JSON"], path)?;
        let json: Value = serde_json::from_str(&output)?;
        Ok(parse_mediainfo_json(&json))
    }
}

fn track<'a>(json: &'a Value, kind: &str) -> Option<&'a Value> {
    json.pointer("/media/track")?
        .as_array()?
        .iter()
        .find(|t| t.get("@type").and_then(Value::as_str) == Some(kind))
}

fn text<'a>(track: &'a Value, key: &str) -> Option<&'a str> {
    track.get(key)?.as_str().map(str::trim).filter(|s| !s.is_empty())
}

fn uint(track: &Value, key: &str) -> Option<u32> {
    text(track, key)?.parse().ok()
}

/// Maps mediainfo's JSON report onto raw fields. Container times are UTC.
///
/// `None` when there is no `General` track.
pub fn parse_mediainfo_json(json: &Value) -> Option<RawMetadata> {
    let general = track(json, "General")?;
    let video = track(json, "Video").or_else(|| track(json, "Image"));
    let extra = general.get("extra");

    let encoded = text(general, "Encoded_Date")
        .or_else(|| text(general, "Recorded_Date"))
        .map(|s| normalize_container_timestamp(s).unwrap_or_else(|| s.to_string()));
    let tagged = text(general, "Tagged_Date").and_then(normalize_container_timestamp);
    let modified = text(general, "File_Modified_Date").and_then(normalize_container_timestamp);

    let location = text(general, "Recorded_Location")
        .or_else(|| extra.and_then(|e| text(e, "com_apple_quicktime_location_ISO6709")))
        .or_else(|| extra.and_then(|e| text(e, "xyz")))
        .and_then(parse_iso6709);
    let extra_text = |key: &str| extra.and_then(|e| text(e, key)).map(str::to_string);

    Some(
        RawMetadata::builder()
            .capture_is_utc(encoded.is_some())
            .maybe_timestamp_original(encoded)
            .maybe_timestamp_digitized(tagged)
            .maybe_timestamp_file_modified(modified)
            .maybe_make(extra_text("com_apple_quicktime_make"))
            .maybe_model(extra_text("com_apple_quicktime_model"))
            .maybe_image_width(video.and_then(|v| uint(v, "Width")))
            .maybe_image_height(video.and_then(|v| uint(v, "Height")))
            .maybe_latitude(location.map(|l| l.latitude))
            .maybe_longitude(location.map(|l| l.longitude))
            .maybe_altitude(location.and_then(|l| l.altitude))
            .build(),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn report(general: Value) -> Value {
        json!({
            "creatingLibrary": { "name": "MediaInfoLib", "version": "23.04" },
            "media": {
                "@ref": "VID_20230715_120000.mp4",
                "track": [
                    general,
                    { "@type": "Video", "Format": "AVC", "Width": "1920", "Height": "1080" },
                    { "@type": "Audio", "Format": "AAC" }
                ]
            }
        })
    }

    #[test]
    fn test_parse_video() {
        let json = report(json!({
            "@type": "General",
            "Format": "MPEG-4",
            "Encoded_Date": "2023-07-15 10:00:00 UTC",
            "Tagged_Date": "2023-07-15 10:00:05 UTC",
            "File_Modified_Date": "2023-07-16 08:00:00 UTC",
            "extra": { "xyz": "+52.3792+004.8994/" }
        }));
        let raw = parse_mediainfo_json(&json).unwrap();

        assert_eq!(raw.timestamp_original.as_deref(), Some("2023:07:15 10:00:00"));
        assert_eq!(raw.timestamp_digitized.as_deref(), Some("2023:07:15 10:00:05"));
        assert_eq!(raw.timestamp_file_modified.as_deref(), Some("2023:07:16 08:00:00"));
        assert!(raw.capture_is_utc);
        assert_eq!(raw.image_width, Some(1920));
        assert_eq!(raw.image_height, Some(1080));
        assert_eq!(raw.latitude, Some(52.3792));
        assert_eq!(raw.longitude, Some(4.8994));
    }

    #[test]
    fn test_legacy_utc_prefix_and_apple_tags() {
        let json = report(json!({
            "@type": "General",
            "Encoded_Date": "UTC 2021-01-02 03:04:05",
            "extra": {
                "com_apple_quicktime_make": "Apple",
                "com_apple_quicktime_model": "iPhone 12",
                "com_apple_quicktime_location_ISO6709": "+40.7128-074.0060+010.000/"
            }
        }));
        let raw = parse_mediainfo_json(&json).unwrap();

        assert_eq!(raw.timestamp_original.as_deref(), Some("2021:01:02 03:04:05"));
        assert_eq!(raw.make.as_deref(), Some("Apple"));
        assert_eq!(raw.model.as_deref(), Some("iPhone 12"));
        assert_eq!(raw.longitude, Some(-74.006));
        assert_eq!(raw.altitude, Some(10.0));
    }

    #[test]
    fn test_without_encoded_date() {
        let raw = parse_mediainfo_json(&report(json!({ "@type": "General" }))).unwrap();
        assert_eq!(raw.timestamp_original, None);
        assert!(!raw.capture_is_utc);
        assert_eq!(parse_mediainfo_json(&json!({ "media": null })), None);
    }
}
