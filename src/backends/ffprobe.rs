use super::command::{probe_program, run_tool};
use super::{BackendError, BackendKind, MetadataBackend};
use crate::gps::parse_iso6709;
use crate::record::RawMetadata;
use crate::time::parsing::normalize_container_timestamp;
use serde_json::Value;
use std::path::{Path, PathBuf};

const FFPROBE_ARGS: &[&str] = &[
    "-v",
    "quiet",
    "-print_format",
    "json",
    "-show_format",
    "-show_streams",
];

/// Reads container tags through `ffprobe`.
pub struct FfProbeBackend {
    program: PathBuf,
}

impl FfProbeBackend {
    pub fn new(program: PathBuf) -> Result<Self, BackendError> {
        probe_program(&program, "-version")?;
        Ok(Self { program })
    }
}

impl MetadataBackend for FfProbeBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::FfProbe
    }

    fn read_raw(&self, path: &Path) -> Result<Option<RawMetadata>, BackendError> {
        let output = run_tool(&self.program, FFPROBE_ARGS, path)?;
        let json: Value = serde_json::from_str(&output)?;
        Ok(parse_ffprobe_json(&json))
    }
}

fn tag<'a>(tags: Option<&'a Value>, key: &str) -> Option<&'a str> {
    tags?.get(key)?.as_str().map(str::trim).filter(|s| !s.is_empty())
}

/// Maps ffprobe's `-show_format -show_streams` JSON onto raw fields.
/// `creation_time` is UTC.
///
/// `None` when the output has no `format` section.
pub fn parse_ffprobe_json(json: &Value) -> Option<RawMetadata> {
    let format = json.get("format")?;
    let tags = format.get("tags");
    let video = json
        .get("streams")
        .and_then(Value::as_array)
        .and_then(|streams| {
            streams
                .iter()
                .find(|s| s.get("codec_type").and_then(Value::as_str) == Some("video"))
        });
    let dimension = |key: &str| {
        video
            .and_then(|v| v.get(key))
            .and_then(Value::as_u64)
            .and_then(|n| u32::try_from(n).ok())
    };

    let creation = tag(tags, "creation_time")
        .or_else(|| tag(video.and_then(|v| v.get("tags")), "creation_time"))
        .map(|s| normalize_container_timestamp(s).unwrap_or_else(|| s.to_string()));
    let location = tag(tags, "location")
        .or_else(|| tag(tags, "com.apple.quicktime.location.ISO6709"))
        .and_then(parse_iso6709);
    let text = |keys: &[&str]| keys.iter().find_map(|key| tag(tags, key)).map(str::to_string);

    Some(
        RawMetadata::builder()
            .capture_is_utc(creation.is_some())
            .maybe_timestamp_original(creation)
            .maybe_make(text(&["com.apple.quicktime.make", "make"]))
            .maybe_model(text(&["com.apple.quicktime.model", "model"]))
            .maybe_image_width(dimension("width"))
            .maybe_image_height(dimension("height"))
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

    #[test]
    fn test_parse_android_video() {
        let json = json!({
            "streams": [
                { "index": 0, "codec_type": "audio", "codec_name": "aac" },
                {
                    "index": 1,
                    "codec_type": "video",
                    "codec_name": "h264",
                    "width": 1920,
                    "height": 1080,
                    "tags": { "creation_time": "2023-07-15T10:00:00.000000Z" }
                }
            ],
            "format": {
                "filename": "PXL_20230715_100000123.mp4",
                "format_name": "mov,mp4,m4a,3gp,3g2,mj2",
                "tags": {
                    "major_brand": "isom",
                    "creation_time": "2023-07-15T10:00:00.000000Z",
                    "location": "+52.3792+004.8994/",
                    "location-eng": "+52.3792+004.8994/"
                }
            }
        });
        let raw = parse_ffprobe_json(&json).unwrap();

        assert_eq!(raw.timestamp_original.as_deref(), Some("2023:07:15 10:00:00"));
        assert!(raw.capture_is_utc);
        assert_eq!(raw.image_width, Some(1920));
        assert_eq!(raw.image_height, Some(1080));
        assert_eq!(raw.latitude, Some(52.3792));
        assert_eq!(raw.make, None);
    }

    #[test]
    fn test_apple_tags_and_stream_time() {
        let json = json!({
            "streams": [{
                "codec_type": "video",
                "width": 3840,
                "height": 2160,
                "tags": { "creation_time": "2022-12-24T18:30:00.000000Z" }
            }],
            "format": {
                "tags": {
                    "com.apple.quicktime.make": "Apple",
                    "com.apple.quicktime.model": "iPhone 13 Pro"
                }
            }
        });
        let raw = parse_ffprobe_json(&json).unwrap();

        assert_eq!(raw.timestamp_original.as_deref(), Some("2022:12:24 18:30:00"));
        assert_eq!(raw.make.as_deref(), Some("Apple"));
        assert_eq!(raw.model.as_deref(), Some("iPhone 13 Pro"));
        assert_eq!(raw.image_width, Some(3840));
    }

    #[test]
    fn test_without_creation_time() {
        let raw = parse_ffprobe_json(&json!({ "format": { "tags": {} } })).unwrap();
        assert_eq!(raw.timestamp_original, None);
        assert!(!raw.capture_is_utc);
        assert_eq!(parse_ffprobe_json(&json!({})), None);
    }
}
