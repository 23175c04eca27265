use crate::backends::BackendKind;
use crate::camera::fix_make_model;
use crate::time::parsing::{parse_exif_timestamp, select_best_timestamp};
use crate::time::structs::ExifStatus;
use crate::time::timezone::TimezoneLookup;
use bon::Builder;
use chrono::NaiveDateTime;
use log::warn;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fields a backend read from its source, before any reconciliation.
///
/// Backends fill what their source knows about and leave the rest `None`.
#[derive(Debug, Clone, Default, PartialEq, Builder)]
pub struct RawMetadata {
    pub timestamp_original: Option<String>,
    pub timestamp_digitized: Option<String>,
    pub timestamp_file_modified: Option<String>,
    /// Container times (QuickTime, Matroska) are stored in UTC.
    #[builder(default)]
    pub capture_is_utc: bool,

    pub utc_offset_original: Option<f64>,
    pub utc_offset_digitized: Option<f64>,
    pub utc_offset_file_modified: Option<f64>,

    pub make: Option<String>,
    pub model: Option<String>,

    pub pixel_width: Option<u32>,
    pub pixel_height: Option<u32>,
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,

    pub timestamp_from_filename: Option<NaiveDateTime>,
}

/// The unified, normalized metadata of one file, produced by exactly one backend.
#[derive(Deserialize, Serialize, Debug, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MetadataRecord {
    /// Lower-cased extension with a leading dot, aliases normalized (`.jpeg` -> `.jpg`).
    pub extension: String,
    pub backend: BackendKind,
    pub status: ExifStatus,

    /// Best known capture time; set iff the original or digitized timestamp is valid.
    pub capture_timestamp: Option<NaiveDateTime>,
    pub capture_is_utc: bool,
    pub timestamp_original: Option<String>,
    pub timestamp_digitized: Option<String>,
    pub timestamp_file_modified: Option<String>,
    pub timestamp_from_filename: Option<NaiveDateTime>,

    pub utc_offset_original: Option<f64>,
    pub utc_offset_digitized: Option<f64>,
    pub utc_offset_file_modified: Option<f64>,
    /// Offset expected at the GPS position; only filled by [`MetadataRecord::validate_consistency`].
    pub utc_offset_from_location: Option<f64>,

    pub make: Option<String>,
    pub model: Option<String>,

    /// Dimensions from the EXIF `PixelXDimension`/`PixelYDimension` family.
    pub pixel_width: Option<u32>,
    pub pixel_height: Option<u32>,
    /// Dimensions from the file structure (`ImageWidth`/`ImageLength`, video streams).
    pub image_width: Option<u32>,
    pub image_height: Option<u32>,

    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub altitude: Option<f64>,
}

/// A metadata UTC offset that disagrees with the offset expected at the GPS position.
#[derive(Error, Debug, Clone, PartialEq)]
#[error("time offset mismatch: {field} is {metadata_offset:+} h, location says {location_offset:+} h")]
pub struct ConsistencyWarning {
    pub field: &'static str,
    pub metadata_offset: f64,
    pub location_offset: f64,
}

impl MetadataRecord {
    /// Reconciles raw backend fields into a record.
    ///
    /// Picks the capture time (original before digitized) and normalizes make and
    /// model. This step is pure; the location cross-check is a separate call.
    pub fn from_raw(backend: BackendKind, extension: impl Into<String>, raw: RawMetadata) -> Self {
        let (best, status) = select_best_timestamp(&[
            raw.timestamp_original.as_deref(),
            raw.timestamp_digitized.as_deref(),
        ]);
        let capture_timestamp = best.and_then(|s| parse_exif_timestamp(s).ok());
        let (make, model) = fix_make_model(raw.make.as_deref(), raw.model.as_deref());

        Self {
            extension: extension.into(),
            backend,
            status,
            capture_timestamp,
            capture_is_utc: raw.capture_is_utc,
            timestamp_original: raw.timestamp_original,
            timestamp_digitized: raw.timestamp_digitized,
            timestamp_file_modified: raw.timestamp_file_modified,
            timestamp_from_filename: raw.timestamp_from_filename,
            utc_offset_original: raw.utc_offset_original,
            utc_offset_digitized: raw.utc_offset_digitized,
            utc_offset_file_modified: raw.utc_offset_file_modified,
            utc_offset_from_location: None,
            make,
            model,
            pixel_width: raw.pixel_width,
            pixel_height: raw.pixel_height,
            image_width: raw.image_width,
            image_height: raw.image_height,
            latitude: raw.latitude,
            longitude: raw.longitude,
            altitude: raw.altitude,
        }
    }

    pub fn is_usable(&self) -> bool {
        self.capture_timestamp.is_some()
    }

    /// The offset declared by metadata, preferring the original over the others.
    pub fn metadata_utc_offset(&self) -> Option<f64> {
        self.utc_offset_original
            .or(self.utc_offset_digitized)
            .or(self.utc_offset_file_modified)
    }

    /// Computes the UTC offset expected at the GPS position and compares it with the
    /// offsets declared by metadata.
    ///
    /// The location offset is stored next to the metadata offsets, never in place of
    /// them. A disagreement is logged and returned; the record stays valid.
    pub fn validate_consistency(&mut self, lookup: &dyn TimezoneLookup) -> Option<ConsistencyWarning> {
        let (Some(latitude), Some(longitude), Some(capture)) =
            (self.latitude, self.longitude, self.capture_timestamp)
        else {
            return None;
        };
        let location_offset = if self.capture_is_utc {
            lookup.utc_offset_hours_at_utc(latitude, longitude, capture)
        } else {
            lookup.utc_offset_hours(latitude, longitude, capture)
        };
        let Some(location_offset) = location_offset else {
            warn!("Failed to fetch time offset for {latitude}, {longitude} at {capture}");
            return None;
        };
        self.utc_offset_from_location = Some(location_offset);

        let declared = [
            ("utcOffsetOriginal", self.utc_offset_original),
            ("utcOffsetDigitized", self.utc_offset_digitized),
            ("utcOffsetFileModified", self.utc_offset_file_modified),
        ];
        let warning = declared.into_iter().find_map(|(field, offset)| {
            offset
                .filter(|offset| *offset != location_offset)
                .map(|metadata_offset| ConsistencyWarning {
                    field,
                    metadata_offset,
                    location_offset,
                })
        })?;
        warn!("{warning} ({} record taken at {capture})", self.backend);
        Some(warning)
    }
}
