//! Timestamp, UTC offset and filename time parsing.
pub mod error;
pub mod filename_parsing;
pub mod parsing;
pub mod structs;
pub mod timezone;
