use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum TimeError {
    #[error("Timestamp {input:?} does not match the EXIF layout YYYY:MM:DD HH:MM:SS")]
    Format { input: String },
}
