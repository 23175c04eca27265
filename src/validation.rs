//! Cross-check of the capture time hidden in a filename against the metadata.

use crate::record::MetadataRecord;
use chrono::{NaiveDateTime, TimeDelta};
use log::debug;

/// Result of comparing the filename time with the metadata capture time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FilenameCheck {
    /// No filename time, no capture time, signs of editing, or no offset to
    /// bridge local and UTC time.
    NotApplicable,
    Consistent,
    Mismatch {
        from_filename: NaiveDateTime,
        from_metadata: NaiveDateTime,
    },
}

/// Google cameras name files after the UTC capture time; others use local time.
fn filename_time_is_utc(record: &MetadataRecord) -> bool {
    record
        .make
        .as_deref()
        .is_some_and(|make| make.to_lowercase().contains("google"))
}

fn shift(time: NaiveDateTime, hours: f64) -> Option<NaiveDateTime> {
    let seconds = (hours * 3600.0).round() as i64;
    time.checked_add_signed(TimeDelta::try_seconds(seconds)?)
}

/// Compares `timestamp_from_filename` with `capture_timestamp`.
///
/// Only applies when the modification time equals the original time; a
/// differing one suggests an edited file whose name no longer says when it was
/// taken. Filename and capture times are brought to the same clock with the
/// metadata UTC offset when one of them is UTC.
pub fn cross_check_filename_timestamp(record: &MetadataRecord) -> FilenameCheck {
    let (Some(from_filename), Some(from_metadata)) =
        (record.timestamp_from_filename, record.capture_timestamp)
    else {
        return FilenameCheck::NotApplicable;
    };
    if record.timestamp_file_modified != record.timestamp_original {
        debug!("File was modified after capture, skipping filename check");
        return FilenameCheck::NotApplicable;
    }

    let offset = record.metadata_utc_offset();
    let expected = match (filename_time_is_utc(record), record.capture_is_utc) {
        (true, false) => offset.and_then(|hours| shift(from_filename, hours)),
        (false, true) => offset.and_then(|hours| shift(from_filename, -hours)),
        _ => Some(from_filename),
    };
    let Some(expected) = expected else {
        return FilenameCheck::NotApplicable;
    };

    if expected == from_metadata {
        FilenameCheck::Consistent
    } else {
        debug!("Filename says {from_filename}, metadata says {from_metadata}");
        FilenameCheck::Mismatch {
            from_filename,
            from_metadata,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backends::BackendKind;
    use crate::record::RawMetadata;
    use crate::time::filename_parsing::extract_datetime_from_filename;

    fn record(filename: &str, make: &str, original: &str, offset: Option<f64>) -> MetadataRecord {
        let raw = RawMetadata::builder()
            .timestamp_original(original.to_string())
            .timestamp_file_modified(original.to_string())
            .maybe_utc_offset_original(offset)
            .make(make.to_string())
            .maybe_timestamp_from_filename(extract_datetime_from_filename(filename))
            .build();
        MetadataRecord::from_raw(BackendKind::NomExif, ".jpg", raw)
    }

    #[test]
    fn test_local_filename_consistent() {
        let r = record("IMG_20240501_203015.jpg", "samsung", "2024:05:01 20:30:15", Some(2.0));
        assert_eq!(cross_check_filename_timestamp(&r), FilenameCheck::Consistent);
    }

    #[test]
    fn test_google_filename_is_utc() {
        let r = record("PXL_20240501_183015123.jpg", "Google", "2024:05:01 20:30:15", Some(2.0));
        assert_eq!(cross_check_filename_timestamp(&r), FilenameCheck::Consistent);

        let r = record("PXL_20240501_183015123.jpg", "Google", "2024:05:01 20:30:15", None);
        assert_eq!(cross_check_filename_timestamp(&r), FilenameCheck::NotApplicable);
    }

    #[test]
    fn test_mismatch() {
        let r = record("IMG_20240501_183015.jpg", "samsung", "2024:05:01 20:30:15", Some(2.0));
        assert!(matches!(
            cross_check_filename_timestamp(&r),
            FilenameCheck::Mismatch { .. }
        ));
    }

    #[test]
    fn test_edited_file_is_skipped() {
        let mut r = record("IMG_20240501_183015.jpg", "samsung", "2024:05:01 20:30:15", None);
        r.timestamp_file_modified = Some("2024:06:01 10:00:00".to_string());
        assert_eq!(cross_check_filename_timestamp(&r), FilenameCheck::NotApplicable);
    }

    #[test]
    fn test_utc_container_time() {
        let mut r = record("VID_20230715_120000.mp4", "samsung", "2023:07:15 10:00:00", Some(2.0));
        r.capture_is_utc = true;
        assert_eq!(cross_check_filename_timestamp(&r), FilenameCheck::Consistent);
    }

    #[test]
    fn test_without_filename_time() {
        let r = record("holiday.jpg", "samsung", "2024:05:01 20:30:15", None);
        assert_eq!(cross_check_filename_timestamp(&r), FilenameCheck::NotApplicable);
    }
}
