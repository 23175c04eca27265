use serde::{Deserialize, Serialize};

/// Classification of the timestamp candidates a backend reported for a file.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[serde(rename_all = "camelCase")]
pub enum ExifStatus {
    /// No candidate timestamp was present at all.
    NoDateTime,
    /// At least one candidate was present, but none of them parsed.
    InvalidDateTime,
    /// A present candidate parsed as `YYYY:MM:DD HH:MM:SS`.
    ValidExif,
}

/// The layout EXIF uses for `DateTimeOriginal`, `DateTimeDigitized` and `DateTime`.
pub const EXIF_TIMESTAMP_FORMAT: &str = "%Y:%m:%d %H:%M:%S";

/// The layout container tools (ffprobe, mediainfo, hachoir) report times in.
pub const LOCAL_TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

/// Length of a `YYYY:MM:DD HH:MM:SS` prefix.
pub const EXIF_TIMESTAMP_LEN: usize = 19;
