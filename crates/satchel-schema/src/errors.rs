//! Error types for schema parsing and graph construction.
//!
//! All variants are structural: a schema error means the input document (or
//! the code that generated it) is wrong, so none of these are recoverable by
//! retrying. They carry enough context to point at the offending
//! declaration.

use thiserror::Error;

/// Errors raised while parsing a schema into a descriptor graph.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SchemaError {
    /// The document is not valid YAML, or its root is not a mapping.
    #[error("failed to parse schema YAML: {0}")]
    Parse(String),

    /// A field referenced a type name with no prior declaration.
    #[error("unknown type \"{name}\" referenced by \"{referrer}\"")]
    UnknownType {
        /// The unresolved type name
        name: String,
        /// The declaration that referenced it
        referrer: String,
    },

    /// A top-level `type:` tag was not one of Struct/Message/Enum/Bitfield.
    #[error("unknown type tag \"{tag}\" on \"{name}\"")]
    UnknownTypeTag {
        /// The declaration carrying the tag
        name: String,
        /// The unrecognised tag
        tag: String,
    },

    /// Two top-level declarations (or a declaration and a built-in) share a
    /// name.
    #[error("duplicate type name \"{name}\"")]
    DuplicateType {
        /// The repeated name
        name: String,
    },

    /// Two fields of one struct, bitfield, or enum share a name.
    #[error("duplicate field \"{field}\" in \"{parent}\"")]
    DuplicateField {
        /// The declaration containing the repeat
        parent: String,
        /// The repeated field name
        field: String,
    },

    /// A field description was neither a scalar type name nor a
    /// `[type, size]` sequence.
    #[error("unrecognized description for field \"{field}\" in \"{parent}\"")]
    MalformedField {
        /// The declaration containing the field
        parent: String,
        /// The malformed field name
        field: String,
    },

    /// An array specifier was not a 2-element `[type, size]` sequence with a
    /// non-negative integer size.
    #[error("malformed array specifier in \"{referrer}\"")]
    MalformedArray {
        /// The declaration containing the array
        referrer: String,
    },

    /// A bitfield's fields do not fit its widest container word (64 bits).
    #[error("bitfield \"{name}\" needs {bits} bits, more than the 64 available")]
    BitfieldOverflow {
        /// The bitfield declaration
        name: String,
        /// Total bits requested
        bits: u32,
    },

    /// An enum declared more values than the widest signed integer can
    /// index.
    #[error("enum \"{name}\" has too many values")]
    EnumOverflow {
        /// The enum declaration
        name: String,
    },

    /// Reading a schema file from disk failed.
    #[error("i/o error reading schema: {0}")]
    Io(String),
}

/// Convenient Result alias for schema operations.
pub type Result<T> = std::result::Result<T, SchemaError>;
