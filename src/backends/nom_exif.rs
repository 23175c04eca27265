use super::{BackendError, BackendKind, MetadataBackend};
use crate::gps::{Rational, parse_altitude, parse_gps_coordinate};
use crate::record::RawMetadata;
use crate::time::parsing::{is_timestamp_valid, normalize_container_timestamp, parse_utc_offset};
use crate::time::structs::EXIF_TIMESTAMP_FORMAT;
use ::nom_exif::{EntryValue, Exif, ExifIter, GPSInfo, LatLng, MediaParser, MediaSource};
use chrono::DateTime;
use log::debug;
use std::path::Path;

const TAG_MAKE: u16 = 0x010f;
const TAG_MODEL: u16 = 0x0110;
const TAG_IMAGE_WIDTH: u16 = 0x0100;
const TAG_IMAGE_LENGTH: u16 = 0x0101;
const TAG_DATE_TIME: u16 = 0x0132;
const TAG_DATE_TIME_ORIGINAL: u16 = 0x9003;
const TAG_DATE_TIME_DIGITIZED: u16 = 0x9004;
const TAG_OFFSET_TIME: u16 = 0x9010;
const TAG_OFFSET_TIME_ORIGINAL: u16 = 0x9011;
const TAG_OFFSET_TIME_DIGITIZED: u16 = 0x9012;
const TAG_PIXEL_X_DIMENSION: u16 = 0xa002;
const TAG_PIXEL_Y_DIMENSION: u16 = 0xa003;

/// Reads EXIF from any container `nom-exif` recognizes (JPEG, HEIF, TIFF and RAW).
#[derive(Debug, Default, Clone, Copy)]
pub struct NomExifBackend;

impl MetadataBackend for NomExifBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::NomExif
    }

    fn read_raw(&self, path: &Path) -> Result<Option<RawMetadata>, BackendError> {
        let mut parser = MediaParser::new();
        let ms = MediaSource::file_path(path)?;
        if !ms.has_exif() {
            debug!("No EXIF data in {}", path.display());
            return Ok(None);
        }
        let iter: ExifIter = parser.parse(ms)?;
        // GPS has to be read before the iterator is turned into `Exif`.
        let gps = iter.parse_gps_info().unwrap_or_else(|e| {
            debug!("Unreadable GPS block in {}: {e}", path.display());
            None
        });
        let exif: Exif = iter.into();
        Ok(Some(raw_from_exif(&exif, gps.as_ref())))
    }
}

fn entry(exif: &Exif, code: u16) -> Option<&EntryValue> {
    exif.get_by_ifd_tag_code(0, code)
}

fn text(exif: &Exif, code: u16) -> Option<String> {
    let s = match entry(exif, code)? {
        EntryValue::Text(s) => s.clone(),
        other => other.to_string(),
    };
    let s = s.trim_matches(|c: char| c == '\0' || c == '"' || c.is_whitespace());
    (!s.is_empty()).then(|| s.to_string())
}

fn uint(exif: &Exif, code: u16) -> Option<u32> {
    match entry(exif, code)? {
        EntryValue::U16(v) => Some(u32::from(*v)),
        EntryValue::U32(v) => Some(*v),
        other => other.to_string().trim().parse().ok(),
    }
}

/// nom-exif may already have turned a date tag into a zoned time. Fold every
/// representation back onto the EXIF layout, keeping unknown input verbatim.
fn exif_timestamp(value: String) -> String {
    if is_timestamp_valid(&value) {
        return value;
    }
    if let Ok(zoned) = DateTime::parse_from_rfc3339(&value) {
        return zoned.naive_local().format(EXIF_TIMESTAMP_FORMAT).to_string();
    }
    normalize_container_timestamp(&value).unwrap_or(value)
}

fn lat_lng(value: &LatLng) -> [Rational; 3] {
    [
        (value.0.0, value.0.1),
        (value.1.0, value.1.1),
        (value.2.0, value.2.1),
    ]
}

fn raw_from_exif(exif: &Exif, gps: Option<&GPSInfo>) -> RawMetadata {
    let timestamp = |code| text(exif, code).map(exif_timestamp);
    let offset = |code| text(exif, code).and_then(|s| parse_utc_offset(&s));

    let latitude = gps.and_then(|g| {
        parse_gps_coordinate(Some(lat_lng(&g.latitude).as_slice()), g.latitude_ref.to_string().as_bytes())
    });
    let longitude = gps.and_then(|g| {
        parse_gps_coordinate(Some(lat_lng(&g.longitude).as_slice()), g.longitude_ref.to_string().as_bytes())
    });
    let altitude = gps.and_then(|g| parse_altitude(Some((g.altitude.0, g.altitude.1)), g.altitude_ref == 1));

    RawMetadata::builder()
        .maybe_timestamp_original(timestamp(TAG_DATE_TIME_ORIGINAL))
        .maybe_timestamp_digitized(timestamp(TAG_DATE_TIME_DIGITIZED))
        .maybe_timestamp_file_modified(timestamp(TAG_DATE_TIME))
        .maybe_utc_offset_original(offset(TAG_OFFSET_TIME_ORIGINAL))
        .maybe_utc_offset_digitized(offset(TAG_OFFSET_TIME_DIGITIZED))
        .maybe_utc_offset_file_modified(offset(TAG_OFFSET_TIME))
        .maybe_make(text(exif, TAG_MAKE))
        .maybe_model(text(exif, TAG_MODEL))
        .maybe_pixel_width(uint(exif, TAG_PIXEL_X_DIMENSION))
        .maybe_pixel_height(uint(exif, TAG_PIXEL_Y_DIMENSION))
        .maybe_image_width(uint(exif, TAG_IMAGE_WIDTH))
        .maybe_image_height(uint(exif, TAG_IMAGE_LENGTH))
        .maybe_latitude(latitude)
        .maybe_longitude(longitude)
        .maybe_altitude(altitude)
        .build()
}
