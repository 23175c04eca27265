use thiserror::Error;

/// The primary error type for the medren crate.
///
/// Per-file problems never surface here; they are logged and the file is skipped.
#[derive(Error, Debug)]
pub enum MedrenError {
    #[error("None of the requested metadata backends is available")]
    NoBackendsAvailable,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Listing files failed: {0}")]
    Walk(#[from] walkdir::Error),

    #[error("JSON serialization failed: {0}")]
    Json(#[from] serde_json::Error),
}
