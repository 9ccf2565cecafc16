//! Error types for dynamic value access and message unpacking.

use thiserror::Error;

/// Errors raised by dynamic value accessors.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AccessError {
    /// The requested field does not exist on the struct.
    #[error("field \"{field}\" not found")]
    FieldNotFound {
        /// The missing field name
        field: String,
    },

    /// The field exists but holds a different kind of value than requested.
    #[error("field \"{field}\" is not a {expected}")]
    TypeMismatch {
        /// The field (or array index) that was accessed
        field: String,
        /// What the caller asked for
        expected: &'static str,
    },

    /// An array access past the end.
    #[error("index {index} out of range for array of {len}")]
    IndexOutOfRange {
        /// The requested index
        index: usize,
        /// The array length
        len: usize,
    },
}

/// Errors raised while unpacking wire bytes into a value tree.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UnpackError {
    /// The buffer length does not match what the header or descriptor
    /// requires.
    #[error("invalid length: expected {expected} bytes, got {actual}")]
    InvalidLen {
        /// Required byte count
        expected: usize,
        /// Byte count on hand
        actual: usize,
    },

    /// The record header names a UID no known message has.
    #[error("unknown message uid {uid:#010x}")]
    InvalidUid {
        /// The unresolvable UID
        uid: u32,
    },
}
