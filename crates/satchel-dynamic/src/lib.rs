//! # Satchel Dynamic: Runtime Value Trees
//!
//! This crate materialises values conforming to any descriptor in a type
//! graph, without generated code. A [`Value`] is a tagged tree mirroring the
//! descriptor's shape: scalars stay inline, structs and arrays own their
//! children. One recursive [`unpack`](Value::unpack) fills a tree in place
//! from the big-endian wire representation.
//!
//! Dynamic trees trade speed for schema-driven flexibility: they are the
//! right tool for log inspection and generic tooling, not for hot decode
//! paths (generated decoders cover those).
//!
//! ## Access Policy
//!
//! Accessors come in strict and tolerant pairs so policy stays with the
//! caller (see [`StructValue::get`] vs [`StructValue::get_if`], and
//! [`StructValue::convert`] vs [`StructValue::convert_if`]). The strict
//! forms fail loudly on a missing field; both forms fail on a type mismatch,
//! which is always a programming error.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod errors;
pub mod message;
pub mod value;

pub use errors::{AccessError, UnpackError};
pub use message::unpack_message;
pub use value::{ArrayValue, FromScalar, StructValue, Value, ValueSlot};
