//! Metadata backends: one per library or external tool that can read capture times.

pub mod command;
pub mod exiftool;
pub mod ffprobe;
pub mod hachoir;
pub mod kamadak;
pub mod mediainfo;
pub mod nom_exif;

use crate::record::{MetadataRecord, RawMetadata};
use crate::time::filename_parsing::extract_datetime_from_filename;
use crate::time::structs::ExifStatus;
use log::debug;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::process::ExitStatus;
use thiserror::Error;

/// Image extensions that can carry an EXIF block.
pub const IMAGE_EXT_WITH_EXIF: &[&str] = &[".jpg", ".tif", ".heic", ".heif", ".png", ".webp"];

const EXTENSION_ALIASES: &[(&str, &str)] = &[
    (".jpeg", ".jpg"),
    (".jpe", ".jpg"),
    (".tiff", ".tif"),
    (".mpeg", ".mpg"),
];

/// Lower-cased extension of `path` with its leading dot, aliases folded onto one
/// spelling. Files without an extension give an empty string.
pub fn normalized_extension(path: &Path) -> String {
    let Some(ext) = path.extension().and_then(|e| e.to_str()) else {
        return String::new();
    };
    let ext = format!(".{}", ext.to_lowercase());
    EXTENSION_ALIASES
        .iter()
        .find(|(alias, _)| *alias == ext)
        .map_or(ext, |(_, canonical)| (*canonical).to_string())
}

/// The known backends, listed in their default priority order.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum BackendKind {
    NomExif,
    Kamadak,
    ExifTool,
    Hachoir,
    MediaInfo,
    FfProbe,
}

impl BackendKind {
    pub const ALL: [Self; 6] = [
        Self::NomExif,
        Self::Kamadak,
        Self::ExifTool,
        Self::Hachoir,
        Self::MediaInfo,
        Self::FfProbe,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            Self::NomExif => "nom-exif",
            Self::Kamadak => "kamadak-exif",
            Self::ExifTool => "exiftool",
            Self::Hachoir => "hachoir",
            Self::MediaInfo => "mediainfo",
            Self::FfProbe => "ffprobe",
        }
    }

    /// Extensions the backend can read, `None` meaning any.
    pub const fn supported_extensions(self) -> Option<&'static [&'static str]> {
        match self {
            Self::Kamadak => Some(IMAGE_EXT_WITH_EXIF),
            _ => None,
        }
    }

    /// Builds the backend, checking that the program it depends on can run.
    ///
    /// # Errors
    ///
    /// Returns the spawn or exit failure of the dependency when it is unavailable.
    pub fn probe(self, tools: &ToolPaths) -> Result<Box<dyn MetadataBackend>, BackendError> {
        let backend: Box<dyn MetadataBackend> = match self {
            Self::NomExif => Box::new(self::nom_exif::NomExifBackend),
            Self::Kamadak => Box::new(self::kamadak::KamadakBackend),
            Self::ExifTool => Box::new(self::exiftool::ExifToolBackend::new(tools.exiftool.as_deref())?),
            Self::Hachoir => Box::new(self::hachoir::HachoirBackend::new(tools.hachoir.clone())?),
            Self::MediaInfo => Box::new(self::mediainfo::MediaInfoBackend::new(tools.mediainfo.clone())?),
            Self::FfProbe => Box::new(self::ffprobe::FfProbeBackend::new(tools.ffprobe.clone())?),
        };
        Ok(backend)
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Locations of the external programs some backends drive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ToolPaths {
    /// `None` lets the exiftool crate search `PATH`.
    pub exiftool: Option<PathBuf>,
    pub hachoir: PathBuf,
    pub mediainfo: PathBuf,
    pub ffprobe: PathBuf,
}

impl Default for ToolPaths {
    fn default() -> Self {
        Self {
            exiftool: None,
            hachoir: PathBuf::from("hachoir-metadata"),
            mediainfo: PathBuf::from("mediainfo"),
            ffprobe: PathBuf::from("ffprobe"),
        }
    }
}

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("EXIF parsing failed: {0}")]
    Exif(#[from] exif::Error),

    #[error("nom-exif parsing failed: {0}")]
    NomExif(#[from] ::nom_exif::Error),

    #[error("Exiftool failed to execute or process the file")]
    ExifTool(#[from] ::exiftool::ExifToolError),

    #[error("Tool output is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),

    #[error("{program} exited with {status}: {stderr}")]
    Command {
        program: String,
        status: ExitStatus,
        stderr: String,
    },
}

/// What a single backend made of a file.
#[derive(Debug)]
pub enum BackendOutcome {
    /// A record with a valid capture timestamp.
    Found(MetadataRecord),
    /// The backend ran but had no usable timestamp.
    NotFound,
    Failed(BackendError),
}

pub trait MetadataBackend: Send + Sync {
    fn kind(&self) -> BackendKind;

    fn supported_extensions(&self) -> Option<&'static [&'static str]> {
        self.kind().supported_extensions()
    }

    fn supports(&self, extension: &str) -> bool {
        self.supported_extensions()
            .is_none_or(|extensions| extensions.contains(&extension))
    }

    /// Reads the raw fields of `path`. `Ok(None)` means the file holds nothing
    /// this backend understands.
    ///
    /// # Errors
    ///
    /// I/O, parser, process or JSON failures of the underlying source.
    fn read_raw(&self, path: &Path) -> Result<Option<RawMetadata>, BackendError>;

    /// Reads `path` and turns the result into a record, adding the time found in
    /// the filename. Records without a valid capture timestamp become `NotFound`.
    fn extract(&self, path: &Path) -> BackendOutcome {
        let mut raw = match self.read_raw(path) {
            Ok(Some(raw)) => raw,
            Ok(None) => return BackendOutcome::NotFound,
            Err(e) => return BackendOutcome::Failed(e),
        };
        raw.timestamp_from_filename = path
            .file_name()
            .and_then(|name| name.to_str())
            .and_then(extract_datetime_from_filename);

        let record = MetadataRecord::from_raw(self.kind(), normalized_extension(path), raw);
        if record.status == ExifStatus::ValidExif {
            BackendOutcome::Found(record)
        } else {
            debug!("{} reported {:?} for {}", self.kind(), record.status, path.display());
            BackendOutcome::NotFound
        }
    }
}
