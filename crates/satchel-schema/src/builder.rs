//! Schema parsing and graph construction.
//!
//! [`DescriptorBuilder`] makes a single pass over the schema document in
//! declaration order. Types may only reference types declared above them, so
//! every reference resolves against the table built so far and the finished
//! graph is a DAG by construction.
//!
//! The builder pre-seeds the table with the eleven primitives and the
//! implicit `SsHeader` struct before reading the document, then dispatches
//! each top-level entry on its `type:` tag. Any map key with a leading
//! underscore is authoring metadata and is skipped wherever it appears.

use std::collections::HashMap;
use std::path::Path;
use std::sync::Arc;

use indexmap::IndexMap;
use serde_yaml::Value;

use crate::descriptor::{
    BitfieldField, PrimType, StructField, TypeDescriptor, TypeKind, TypeRef,
};
use crate::errors::{Result, SchemaError};
use crate::uid;

/// Name of the implicit header struct prepended to every message.
pub const HEADER_TYPE_NAME: &str = "SsHeader";

/// Name of the implicit header field on messages.
pub const HEADER_FIELD_NAME: &str = "ss_header";

/// Wire footprint of the header: `uid: u32` + `len: u16`.
pub const HEADER_PACKED_SIZE: usize = 6;

/// Top-level key holding the authoring tool's expected message UIDs.
pub const UID_MAP_KEY: &str = "SsMessageUidMap";

/// Owner of an immutable, fully-resolved type graph.
///
/// All descriptor nodes are owned (via `Arc`) by the builder's type table.
/// Lookups hand out shared references; nothing is mutated after
/// construction.
pub struct DescriptorBuilder {
    types: IndexMap<String, TypeRef>,
    messages: Vec<TypeRef>,
    messages_by_uid: HashMap<u32, TypeRef>,
    declared_uids: Option<IndexMap<String, u32>>,
}

impl DescriptorBuilder {
    /// Parse a schema from YAML text.
    ///
    /// An empty document yields a builder holding only the built-in types.
    ///
    /// # Errors
    ///
    /// Returns [`SchemaError`] on malformed YAML, unresolved type
    /// references, duplicate names, or width overflows. Parsing aborts at
    /// the first error; a half-parsed schema is never observable.
    pub fn from_str(text: &str) -> Result<Self> {
        if text.trim().is_empty() {
            return Ok(Self::seeded());
        }
        let root: Value =
            serde_yaml::from_str(text).map_err(|err| SchemaError::Parse(err.to_string()))?;
        Self::from_yaml(&root)
    }

    /// Parse a schema from a file on disk.
    ///
    /// # Errors
    ///
    /// As [`from_str`](Self::from_str), plus [`SchemaError::Io`] if the file
    /// cannot be read.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path.as_ref())
            .map_err(|err| SchemaError::Io(err.to_string()))?;
        Self::from_str(&text)
    }

    /// Parse a schema from an already-loaded YAML document.
    ///
    /// # Errors
    ///
    /// As [`from_str`](Self::from_str).
    pub fn from_yaml(root: &Value) -> Result<Self> {
        let mut builder = Self::seeded();

        let mapping = match root {
            // An empty document parses as null: nothing to declare.
            Value::Null => return Ok(builder),
            Value::Mapping(mapping) => mapping,
            _ => return Err(SchemaError::Parse("schema root is not a mapping".to_string())),
        };

        for (key, node) in mapping {
            let Some(name) = key.as_str() else {
                return Err(SchemaError::Parse("non-string top-level key".to_string()));
            };

            if name == UID_MAP_KEY {
                builder.declared_uids = Some(parse_uid_map(node));
                continue;
            }

            // Entries without a `type:` tag are free-form metadata.
            let Some(tag_node) = node.get("type") else {
                continue;
            };
            let Some(tag) = tag_node.as_str() else {
                return Err(SchemaError::UnknownTypeTag {
                    name: name.to_string(),
                    tag: String::new(),
                });
            };

            match tag {
                "Struct" => {
                    builder.parse_struct(name, node, false)?;
                }
                "Message" => {
                    let msg = builder.parse_struct(name, node, true)?;
                    builder.messages_by_uid.insert(msg.uid(), Arc::clone(&msg));
                    builder.messages.push(msg);
                }
                "Enum" => {
                    builder.parse_enum(name, node)?;
                }
                "Bitfield" => {
                    builder.parse_bitfield(name, node)?;
                }
                _ => {
                    return Err(SchemaError::UnknownTypeTag {
                        name: name.to_string(),
                        tag: tag.to_string(),
                    });
                }
            }
        }

        Ok(builder)
    }

    /// Look up a descriptor by canonical name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&TypeRef> {
        self.types.get(name)
    }

    /// The full type table in declaration order (built-ins first).
    #[must_use]
    pub fn types(&self) -> &IndexMap<String, TypeRef> {
        &self.types
    }

    /// Message descriptors in declaration order.
    #[must_use]
    pub fn messages(&self) -> &[TypeRef] {
        &self.messages
    }

    /// Resolve a message descriptor from the UID carried in a record
    /// header.
    #[must_use]
    pub fn message_by_uid(&self, uid: u32) -> Option<&TypeRef> {
        self.messages_by_uid.get(&uid)
    }

    /// The schema's own `SsMessageUidMap`, if it declared one.
    ///
    /// The builder never consults this (UIDs are always recomputed from
    /// structure), but readers may cross-check it against the computed
    /// values to detect a stale authoring tool.
    #[must_use]
    pub fn declared_uid_map(&self) -> Option<&IndexMap<String, u32>> {
        self.declared_uids.as_ref()
    }

    /// A builder holding only the built-in primitives and `SsHeader`.
    fn seeded() -> Self {
        let mut builder = Self {
            types: IndexMap::new(),
            messages: Vec::new(),
            messages_by_uid: HashMap::new(),
            declared_uids: None,
        };

        for prim in PrimType::ALL {
            let name = prim.wire_name();
            let desc = TypeDescriptor {
                name: name.to_string(),
                packed_size: prim.packed_size(),
                uid: uid::primitive_uid(name, prim.packed_size()),
                kind: TypeKind::Primitive { prim },
            };
            builder.types.insert(name.to_string(), Arc::new(desc));
        }

        let mut header = StructBuilder::new(HEADER_TYPE_NAME, false);
        header
            .add_field("uid", Arc::clone(&builder.types["uint32"]))
            .unwrap_or_else(|_| unreachable!("header field names are distinct"));
        header
            .add_field("len", Arc::clone(&builder.types["uint16"]))
            .unwrap_or_else(|_| unreachable!("header field names are distinct"));
        let header = header.finish();
        debug_assert_eq!(header.packed_size, HEADER_PACKED_SIZE);
        builder.types.insert(HEADER_TYPE_NAME.to_string(), Arc::new(header));

        builder
    }

    fn insert(&mut self, desc: TypeDescriptor) -> Result<TypeRef> {
        if self.types.contains_key(&desc.name) {
            return Err(SchemaError::DuplicateType { name: desc.name });
        }
        let desc = Arc::new(desc);
        self.types.insert(desc.name.clone(), Arc::clone(&desc));
        Ok(desc)
    }

    fn parse_struct(&mut self, name: &str, node: &Value, is_message: bool) -> Result<TypeRef> {
        let mut builder = StructBuilder::new(name, is_message);

        if is_message {
            builder.add_field(HEADER_FIELD_NAME, Arc::clone(&self.types[HEADER_TYPE_NAME]))?;
        }

        for field_node in sequence_items(node.get("fields")) {
            for (field_name, type_node) in declared_entries(field_node, name)? {
                let ty = match type_node {
                    Value::String(type_name) => Arc::clone(self.resolve(type_name, name)?),
                    Value::Sequence(spec) => self.parse_array(spec, name)?,
                    _ => {
                        return Err(SchemaError::MalformedField {
                            parent: name.to_string(),
                            field: field_name.to_string(),
                        });
                    }
                };
                builder.add_field(field_name, ty)?;
            }
        }

        self.insert(builder.finish())
    }

    /// Resolve an array specifier `[elem, size]`, interning the result.
    ///
    /// Structurally identical arrays collapse onto one node: the canonical
    /// name (`Elem[3]`, `Elem[3][2]`, …) is the intern key, so a second
    /// declaration anywhere in the schema resolves to the already-built
    /// descriptor.
    fn parse_array(&mut self, spec: &[Value], referrer: &str) -> Result<TypeRef> {
        let malformed = || SchemaError::MalformedArray { referrer: referrer.to_string() };

        let [elem_node, size_node] = spec else {
            return Err(malformed());
        };
        let size = size_node
            .as_u64()
            .and_then(|n| usize::try_from(n).ok())
            .ok_or_else(malformed)?;

        let elem = match elem_node {
            Value::String(type_name) => Arc::clone(self.resolve(type_name, referrer)?),
            Value::Sequence(inner) => self.parse_array(inner, referrer)?,
            _ => return Err(malformed()),
        };

        let canonical = format!("{}[{}]", elem.name(), size);
        if let Some(existing) = self.types.get(&canonical) {
            return Ok(Arc::clone(existing));
        }

        let desc = TypeDescriptor {
            name: canonical,
            packed_size: elem.packed_size() * size,
            uid: uid::array_uid(elem.uid(), size),
            kind: TypeKind::Array { elem, size },
        };
        self.insert(desc)
    }

    fn parse_enum(&mut self, name: &str, node: &Value) -> Result<TypeRef> {
        let mut values: Vec<String> = Vec::new();

        for value_node in sequence_items(node.get("values")) {
            for (value_name, _) in declared_entries(value_node, name)? {
                if values.iter().any(|v| v == value_name) {
                    return Err(SchemaError::DuplicateField {
                        parent: name.to_string(),
                        field: value_name.to_string(),
                    });
                }
                values.push(value_name.to_string());
            }
        }

        let prim = PrimType::enum_width(values.len() as u64)
            .ok_or_else(|| SchemaError::EnumOverflow { name: name.to_string() })?;

        let value_uids: Vec<u32> = values
            .iter()
            .enumerate()
            .map(|(index, value)| uid::enum_value_uid(value, index))
            .collect();

        self.insert(TypeDescriptor {
            name: name.to_string(),
            packed_size: prim.packed_size(),
            uid: uid::composite_uid(name, &value_uids),
            kind: TypeKind::Enum { prim, values },
        })
    }

    fn parse_bitfield(&mut self, name: &str, node: &Value) -> Result<TypeRef> {
        let mut fields: Vec<BitfieldField> = Vec::new();
        let mut bit_offset = 0u32;

        for field_node in sequence_items(node.get("fields")) {
            for (field_name, size_node) in declared_entries(field_node, name)? {
                let bit_size = size_node
                    .as_u64()
                    .and_then(|n| u32::try_from(n).ok())
                    .filter(|&n| n >= 1)
                    .ok_or_else(|| SchemaError::MalformedField {
                        parent: name.to_string(),
                        field: field_name.to_string(),
                    })?;

                if fields.iter().any(|f| f.name == field_name) {
                    return Err(SchemaError::DuplicateField {
                        parent: name.to_string(),
                        field: field_name.to_string(),
                    });
                }

                let prim = PrimType::bitfield_word(bit_size).ok_or_else(|| {
                    SchemaError::BitfieldOverflow { name: name.to_string(), bits: bit_size }
                })?;

                fields.push(BitfieldField {
                    name: field_name.to_string(),
                    prim,
                    bit_offset,
                    bit_size,
                    uid: uid::bitfield_field_uid(field_name, bit_size),
                });
                bit_offset += bit_size;
            }
        }

        let word = PrimType::bitfield_word(bit_offset.max(1)).ok_or_else(|| {
            SchemaError::BitfieldOverflow { name: name.to_string(), bits: bit_offset }
        })?;

        let field_uids: Vec<u32> = fields.iter().map(BitfieldField::uid).collect();

        self.insert(TypeDescriptor {
            name: name.to_string(),
            packed_size: word.packed_size(),
            uid: uid::composite_uid(name, &field_uids),
            kind: TypeKind::Bitfield { word, fields },
        })
    }

    fn resolve(&self, type_name: &str, referrer: &str) -> Result<&TypeRef> {
        self.types.get(type_name).ok_or_else(|| SchemaError::UnknownType {
            name: type_name.to_string(),
            referrer: referrer.to_string(),
        })
    }
}

impl std::fmt::Debug for DescriptorBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DescriptorBuilder")
            .field("types", &self.types.len())
            .field("messages", &self.messages.len())
            .finish_non_exhaustive()
    }
}

/// Incremental struct construction: fields append at the running packed
/// size, so offsets are the cumulative sum of prior field widths.
struct StructBuilder {
    name: String,
    is_message: bool,
    fields: Vec<StructField>,
    packed_size: usize,
}

impl StructBuilder {
    fn new(name: &str, is_message: bool) -> Self {
        Self { name: name.to_string(), is_message, fields: Vec::new(), packed_size: 0 }
    }

    fn add_field(&mut self, field_name: &str, ty: TypeRef) -> Result<()> {
        if self.fields.iter().any(|f| f.name == field_name) {
            return Err(SchemaError::DuplicateField {
                parent: self.name.clone(),
                field: field_name.to_string(),
            });
        }

        let field_size = ty.packed_size();
        self.fields.push(StructField {
            name: field_name.to_string(),
            uid: uid::struct_field_uid(field_name, ty.uid()),
            offset: self.packed_size,
            ty,
        });
        self.packed_size += field_size;
        Ok(())
    }

    fn finish(self) -> TypeDescriptor {
        let field_uids: Vec<u32> = self.fields.iter().map(StructField::uid).collect();
        TypeDescriptor {
            uid: uid::composite_uid(&self.name, &field_uids),
            name: self.name,
            packed_size: self.packed_size,
            kind: TypeKind::Struct { fields: self.fields, is_message: self.is_message },
        }
    }
}

/// Iterate the items of an optional sequence node; absent or non-sequence
/// nodes contribute nothing.
fn sequence_items(node: Option<&Value>) -> impl Iterator<Item = &Value> {
    node.and_then(Value::as_sequence).map(|seq| seq.iter()).into_iter().flatten()
}

/// The non-metadata entries of one field/value list element.
///
/// Each element is a single-key mapping, possibly accompanied by
/// underscore-prefixed metadata keys. Yields `(name, value)` for every key
/// without a leading underscore.
fn declared_entries<'a>(
    node: &'a Value,
    parent: &str,
) -> Result<Vec<(&'a str, &'a Value)>> {
    let Some(mapping) = node.as_mapping() else {
        return Err(SchemaError::MalformedField {
            parent: parent.to_string(),
            field: "(non-mapping list element)".to_string(),
        });
    };

    let mut entries = Vec::new();
    for (key, value) in mapping {
        let Some(key) = key.as_str() else {
            return Err(SchemaError::MalformedField {
                parent: parent.to_string(),
                field: "(non-string key)".to_string(),
            });
        };
        if key.starts_with('_') {
            continue;
        }
        entries.push((key, value));
    }
    Ok(entries)
}

/// Best-effort parse of the `SsMessageUidMap` mapping. Entries that are not
/// `name: u32` pairs are dropped; the map is advisory only.
fn parse_uid_map(node: &Value) -> IndexMap<String, u32> {
    let mut map = IndexMap::new();
    if let Some(mapping) = node.as_mapping() {
        for (key, value) in mapping {
            if let (Some(name), Some(uid)) = (key.as_str(), value.as_u64()) {
                if let Ok(uid) = u32::try_from(uid) {
                    map.insert(name.to_string(), uid);
                }
            }
        }
    }
    map
}
