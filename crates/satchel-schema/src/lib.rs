//! # Satchel Schema: Type-Descriptor Graph
//!
//! This crate turns a YAML message schema into an immutable, UID-stamped
//! graph of type descriptors.
//!
//! ## Model
//!
//! A schema declares a closed universe of types: the eleven built-in
//! primitives, enums, bit-packed records, fixed-size arrays, and structures.
//! [`DescriptorBuilder`] parses the declarations in document order and
//! produces one [`TypeDescriptor`] node per type. Each node carries:
//!
//! - a canonical `name`, unique within the builder,
//! - a `packed_size`, its fixed byte footprint on the wire,
//! - a `uid`, a CRC-32 structural hash that is a pure function of the node's
//!   subgraph. Two builders parsing the same schema produce identical UIDs
//!   for every node.
//!
//! The graph is a DAG: declaration order forbids forward references, so a
//! node can only point at nodes declared before it. Arrays are interned by
//! canonical name (`Elem[3][2]` is the same node everywhere it appears).
//!
//! ## Ownership
//!
//! Descriptor nodes are `Arc`-shared and immutable once the builder returns.
//! The builder's type table holds the canonical references; every edge in
//! the graph (`Array` element, struct field type) is another reference to
//! the same node, so interning is observable through [`std::sync::Arc::ptr_eq`]
//! and the whole graph can be shared across threads without synchronisation.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod builder;
pub mod descriptor;
pub mod errors;
pub mod uid;

pub use builder::DescriptorBuilder;
pub use descriptor::{BitfieldField, PrimType, StructField, TypeDescriptor, TypeKind, TypeRef};
pub use errors::{Result, SchemaError};
