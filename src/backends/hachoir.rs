use super::command::{probe_program, run_tool};
use super::{BackendError, BackendKind, MetadataBackend};
use crate::gps::round_to;
use crate::record::RawMetadata;
use log::debug;
use std::path::{Path, PathBuf};

/// Reads the plaintext report of the `hachoir-metadata` program.
pub struct HachoirBackend {
    program: PathBuf,
}

impl HachoirBackend {
    pub fn new(program: PathBuf) -> Result<Self, BackendError> {
        probe_program(&program, "--version")?;
        Ok(Self { program })
    }
}

impl MetadataBackend for HachoirBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Hachoir
    }

    fn read_raw(&self, path: &Path) -> Result<Option<RawMetadata>, BackendError> {
        let report = run_tool(&self.program, &[], path)?;
        Ok(parse_hachoir_plaintext(&report))
    }
}

/// Strips a unit suffix such as ` pixels` and parses the number before it.
fn number_with_unit<T: std::str::FromStr>(value: &str, unit: &str) -> Option<T> {
    value.trim().trim_end_matches(unit).trim().parse().ok()
}

/// hachoir prints dates as `2020-04-24 12:07:46`.
fn exif_date(value: &str) -> String {
    value.trim().replace('-', ":")
}

/// Parses `- Name: value` lines. `None` when the report lists no capture time.
pub fn parse_hachoir_plaintext(report: &str) -> Option<RawMetadata> {
    let mut raw = RawMetadata::default();
    for line in report.lines() {
        let Some((name, value)) = line.trim().strip_prefix("- ").and_then(|l| l.split_once(": ")) else {
            continue;
        };
        match name {
            "Image width" => raw.image_width = number_with_unit(value, "pixels"),
            "Image height" => raw.image_height = number_with_unit(value, "pixels"),
            "Camera model" => raw.model = Some(value.trim().to_string()),
            "Camera manufacturer" => raw.make = Some(value.trim().to_string()),
            "Date-time original" => raw.timestamp_original = Some(exif_date(value)),
            "Date-time digitized" => raw.timestamp_digitized = Some(exif_date(value)),
            "Creation date" => raw.timestamp_file_modified = Some(exif_date(value)),
            "Latitude" => raw.latitude = value.trim().parse().ok(),
            "Longitude" => raw.longitude = value.trim().parse().ok(),
            "Altitude" => {
                raw.altitude = number_with_unit::<f64>(value, "meters").map(|alt| round_to(alt, 1));
            }
            _ => {}
        }
    }
    if raw.timestamp_original.is_none() && raw.timestamp_digitized.is_none() {
        debug!("hachoir report has no capture time");
        return None;
    }
    Some(raw)
}
