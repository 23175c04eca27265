//! # medren
//!
//! Resolve when, where and with what camera a photo or video was taken, so media
//! files can be renamed deterministically.
//!
//! Metadata is read by a prioritized list of backends. The first backend that
//! finds a valid capture time produces the record; later ones are not consulted.
//!
//! ## Key Features
//!
//! - **Multiple backends**: `nom-exif` and `kamadak-exif` in-process, plus the
//!   `exiftool`, `hachoir-metadata`, `mediainfo` and `ffprobe` programs when installed.
//! - **Timestamp selection**: prefers `DateTimeOriginal` over `DateTimeDigitized`,
//!   with strict EXIF timestamp and UTC offset parsing.
//! - **Camera names**: make and model cleaned into short filename-safe strings.
//! - **Location check**: the UTC offset at the GPS position is compared with the
//!   offset stored in the file.
//! - **Filename times**: capture times recovered from phone and camera filenames.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use medren::{MedrenError, Resolver};
//! use std::path::PathBuf;
//!
//! fn main() -> Result<(), MedrenError> {
//!     let resolver = Resolver::builder().parallel(true).build()?;
//!     let files = vec![PathBuf::from("assets/PXL_20240501_203015123.jpg")];
//!
//!     for file in resolver.resolve_all(&files) {
//!         println!("{}: {:?} {:?}", file.path.display(), file.record.capture_timestamp, file.record.model);
//!     }
//!     Ok(())
//! }
//! ```

pub mod backends;
pub mod camera;
mod error;
pub mod gps;
pub mod record;
pub mod resolver;
pub mod time;
pub mod utils;
pub mod validation;

pub use backends::{BackendError, BackendKind, BackendOutcome, MetadataBackend};
pub use error::MedrenError;
pub use record::{ConsistencyWarning, MetadataRecord, RawMetadata};
pub use resolver::{ResolvedFile, Resolver};
pub use time::structs::ExifStatus;
pub use validation::{FilenameCheck, cross_check_filename_timestamp};
