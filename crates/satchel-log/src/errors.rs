//! Error types for log reading.

use std::path::PathBuf;

use thiserror::Error;

use satchel_dynamic::UnpackError;
use satchel_schema::SchemaError;

/// Errors raised while opening or streaming a log file.
#[derive(Error, Debug)]
pub enum LogError {
    /// The file contains no schema/body delimiter.
    #[error("no log delimiter found in {path}")]
    MissingDelimiter {
        /// The offending file
        path: PathBuf,
    },

    /// The embedded schema header failed to parse.
    #[error("log schema header: {0}")]
    Schema(#[from] SchemaError),

    /// The body ended mid-header or mid-record.
    #[error("corrupted log end at offset {offset}")]
    CorruptedLogEnd {
        /// File offset of the truncated record
        offset: u64,
    },

    /// A record failed header validation against its descriptor.
    #[error("bad record: {0}")]
    Record(#[from] UnpackError),

    /// Underlying file I/O failed.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Convenient Result alias for log operations.
pub type Result<T> = std::result::Result<T, LogError>;
