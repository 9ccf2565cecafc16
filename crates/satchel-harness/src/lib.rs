//! Test harness for the satchel codec.
//!
//! The production crates only ever *read* the wire format; encoding is the
//! job of statically generated code outside this workspace. Tests still need
//! bytes, so this crate carries the test-side inverse of the dynamic
//! unpacker ([`packer`]), a minimal log writer ([`writer`]), the reference
//! schema the original conformance suite was built around ([`fixtures`]),
//! and proptest strategies producing random valid value trees
//! ([`strategy`]).
//!
//! Everything here is test tooling: no production code path depends on this
//! crate.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod fixtures;
pub mod packer;
pub mod strategy;
pub mod writer;

pub use fixtures::reference_schema;
pub use packer::{finalize_message, pack_to_vec, pack_value};
pub use strategy::{message_strategy, value_strategy};
pub use writer::LogWriter;
