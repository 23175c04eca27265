use super::{BackendError, BackendKind, MetadataBackend};
use crate::gps::{Rational, parse_altitude, parse_gps_coordinate};
use crate::record::RawMetadata;
use crate::time::parsing::parse_utc_offset;
use exif::{Exif, In, Reader, Tag, Value};
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Reads the EXIF block of still images with the `kamadak-exif` parser.
#[derive(Debug, Default, Clone, Copy)]
pub struct KamadakBackend;

impl MetadataBackend for KamadakBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Kamadak
    }

    fn read_raw(&self, path: &Path) -> Result<Option<RawMetadata>, BackendError> {
        let mut reader = BufReader::new(File::open(path)?);
        match Reader::new().read_from_container(&mut reader) {
            Ok(exif) => Ok(Some(raw_from_exif(&exif))),
            Err(exif::Error::NotFound(_)) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }
}

fn ascii(exif: &Exif, tag: Tag) -> Option<String> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Ascii(parts) => {
            let text = String::from_utf8_lossy(parts.first()?);
            let text = text.trim_matches(|c: char| c == '\0' || c.is_whitespace());
            (!text.is_empty()).then(|| text.to_string())
        }
        _ => None,
    }
}

fn ascii_bytes(exif: &Exif, tag: Tag) -> Vec<u8> {
    match exif.get_field(tag, In::PRIMARY).map(|f| &f.value) {
        Some(Value::Ascii(parts)) => parts.first().cloned().unwrap_or_default(),
        _ => Vec::new(),
    }
}

fn uint(exif: &Exif, tag: Tag) -> Option<u32> {
    exif.get_field(tag, In::PRIMARY)?.value.get_uint(0)
}

fn rationals(exif: &Exif, tag: Tag) -> Option<Vec<Rational>> {
    match &exif.get_field(tag, In::PRIMARY)?.value {
        Value::Rational(values) => Some(values.iter().map(|r| (r.num, r.denom)).collect()),
        _ => None,
    }
}

fn raw_from_exif(exif: &Exif) -> RawMetadata {
    let offset = |tag| ascii(exif, tag).and_then(|s| parse_utc_offset(&s));
    let below_sea_level = uint(exif, Tag::GPSAltitudeRef) == Some(1);

    RawMetadata::builder()
        .maybe_timestamp_original(ascii(exif, Tag::DateTimeOriginal))
        .maybe_timestamp_digitized(ascii(exif, Tag::DateTimeDigitized))
        .maybe_timestamp_file_modified(ascii(exif, Tag::DateTime))
        .maybe_utc_offset_original(offset(Tag::OffsetTimeOriginal))
        .maybe_utc_offset_digitized(offset(Tag::OffsetTimeDigitized))
        .maybe_utc_offset_file_modified(offset(Tag::OffsetTime))
        .maybe_make(ascii(exif, Tag::Make))
        .maybe_model(ascii(exif, Tag::Model))
        .maybe_pixel_width(uint(exif, Tag::PixelXDimension))
        .maybe_pixel_height(uint(exif, Tag::PixelYDimension))
        .maybe_image_width(uint(exif, Tag::ImageWidth))
        .maybe_image_height(uint(exif, Tag::ImageLength))
        .maybe_latitude(parse_gps_coordinate(
            rationals(exif, Tag::GPSLatitude).as_deref(),
            &ascii_bytes(exif, Tag::GPSLatitudeRef),
        ))
        .maybe_longitude(parse_gps_coordinate(
            rationals(exif, Tag::GPSLongitude).as_deref(),
            &ascii_bytes(exif, Tag::GPSLongitudeRef),
        ))
        .maybe_altitude(parse_altitude(
            rationals(exif, Tag::GPSAltitude).and_then(|v| v.first().copied()),
            below_sea_level,
        ))
        .build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::BackendOutcome;
    use crate::backends::fixtures::{TAG_DATE_TIME_ORIGINAL, exif_tiff, write_camera_jpeg};
    use crate::time::structs::ExifStatus;
    use tempfile::TempDir;

    #[test]
    fn test_raw_fields_from_tiff() {
        let tiff = exif_tiff(&[], &[(TAG_DATE_TIME_ORIGINAL, "2020:04:24 12:07:46")]);
        let exif = Reader::new().read_raw(tiff).unwrap();
        let raw = raw_from_exif(&exif);

        assert_eq!(raw.timestamp_original.as_deref(), Some("2020:04:24 12:07:46"));
        assert_eq!(raw.timestamp_digitized, None);
        assert_eq!(raw.make, None);
        assert_eq!(raw.latitude, None);
    }

    #[test]
    fn test_extract_camera_jpeg() {
        let dir = TempDir::new().unwrap();
        let path = write_camera_jpeg(&dir, "PXL_20240501_203015123.jpg");

        let BackendOutcome::Found(record) = KamadakBackend.extract(&path) else {
            panic!("expected a record");
        };
        assert_eq!(record.backend, BackendKind::Kamadak);
        assert_eq!(record.status, ExifStatus::ValidExif);
        assert_eq!(record.extension, ".jpg");
        assert_eq!(record.timestamp_original.as_deref(), Some("2024:05:01 22:30:15"));
        assert_eq!(record.utc_offset_original, Some(2.0));
        assert_eq!(record.make.as_deref(), Some("Google"));
        assert_eq!(record.model.as_deref(), Some("Pixel-6"));
        assert!(record.timestamp_from_filename.is_some());
    }

    #[test]
    fn test_jpeg_without_exif_is_not_found() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("plain.jpg");
        std::fs::write(&path, [0xff, 0xd8, 0xff, 0xd9]).unwrap();
        assert!(matches!(KamadakBackend.extract(&path), BackendOutcome::NotFound));
    }

    #[test]
    fn test_unreadable_inputs_fail() {
        let dir = TempDir::new().unwrap();
        let text = dir.path().join("notes.jpg");
        std::fs::write(&text, "not an image").unwrap();
        assert!(matches!(KamadakBackend.extract(&text), BackendOutcome::Failed(_)));

        let missing = dir.path().join("missing.jpg");
        assert!(matches!(
            KamadakBackend.extract(&missing),
            BackendOutcome::Failed(BackendError::Io(_))
        ));
    }
}
