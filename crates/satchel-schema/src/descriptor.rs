//! Descriptor nodes of the type graph.
//!
//! [`TypeDescriptor`] is a closed tagged union over the five kinds of wire
//! type. Every node knows its canonical name, its fixed wire footprint, and
//! its structural UID; the kind-specific payload lives in [`TypeKind`].
//! Nodes are immutable and `Arc`-shared once the builder has produced them.

use std::sync::Arc;

/// Shared handle to an immutable descriptor node.
pub type TypeRef = Arc<TypeDescriptor>;

/// The eleven primitive wire scalars.
///
/// Wire names are the lower-case C-style spellings (`uint8` … `double`) that
/// schemas use to reference them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimType {
    /// `uint8`: unsigned 8-bit integer
    U8,
    /// `uint16`: unsigned 16-bit integer
    U16,
    /// `uint32`: unsigned 32-bit integer
    U32,
    /// `uint64`: unsigned 64-bit integer
    U64,
    /// `int8`: signed 8-bit integer
    I8,
    /// `int16`: signed 16-bit integer
    I16,
    /// `int32`: signed 32-bit integer
    I32,
    /// `int64`: signed 64-bit integer
    I64,
    /// `bool`: one byte, zero is false
    Bool,
    /// `float`: IEEE-754 binary32
    F32,
    /// `double`: IEEE-754 binary64
    F64,
}

impl PrimType {
    /// All primitives in schema seeding order.
    pub const ALL: [PrimType; 11] = [
        PrimType::U8,
        PrimType::U16,
        PrimType::U32,
        PrimType::U64,
        PrimType::I8,
        PrimType::I16,
        PrimType::I32,
        PrimType::I64,
        PrimType::Bool,
        PrimType::F32,
        PrimType::F64,
    ];

    /// Wire footprint in bytes.
    #[must_use]
    pub const fn packed_size(self) -> usize {
        match self {
            PrimType::U8 | PrimType::I8 | PrimType::Bool => 1,
            PrimType::U16 | PrimType::I16 => 2,
            PrimType::U32 | PrimType::I32 | PrimType::F32 => 4,
            PrimType::U64 | PrimType::I64 | PrimType::F64 => 8,
        }
    }

    /// The name schemas use to reference this primitive.
    #[must_use]
    pub const fn wire_name(self) -> &'static str {
        match self {
            PrimType::U8 => "uint8",
            PrimType::U16 => "uint16",
            PrimType::U32 => "uint32",
            PrimType::U64 => "uint64",
            PrimType::I8 => "int8",
            PrimType::I16 => "int16",
            PrimType::I32 => "int32",
            PrimType::I64 => "int64",
            PrimType::Bool => "bool",
            PrimType::F32 => "float",
            PrimType::F64 => "double",
        }
    }

    /// The smallest unsigned word able to hold one bitfield field of
    /// `bits` bits, or `None` above 64.
    #[must_use]
    pub const fn bitfield_word(bits: u32) -> Option<Self> {
        match bits {
            1..=8 => Some(PrimType::U8),
            9..=16 => Some(PrimType::U16),
            17..=32 => Some(PrimType::U32),
            33..=64 => Some(PrimType::U64),
            _ => None,
        }
    }

    /// The smallest signed integer able to index an enum of `cardinality`
    /// values, or `None` if no signed 64-bit integer can.
    #[must_use]
    pub const fn enum_width(cardinality: u64) -> Option<Self> {
        if cardinality <= (1 << 7) - 1 {
            Some(PrimType::I8)
        } else if cardinality <= (1 << 15) - 1 {
            Some(PrimType::I16)
        } else if cardinality <= (1 << 31) - 1 {
            Some(PrimType::I32)
        } else if cardinality <= (1 << 63) - 1 {
            Some(PrimType::I64)
        } else {
            None
        }
    }
}

/// One field of a struct: a name, a resolved type, and a fixed byte offset
/// within the parent's wire representation.
#[derive(Debug, Clone)]
pub struct StructField {
    pub(crate) name: String,
    pub(crate) ty: TypeRef,
    pub(crate) offset: usize,
    pub(crate) uid: u32,
}

impl StructField {
    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The field's resolved type.
    #[must_use]
    pub fn ty(&self) -> &TypeRef {
        &self.ty
    }

    /// Byte offset within the parent struct's wire representation.
    #[must_use]
    pub fn offset(&self) -> usize {
        self.offset
    }

    /// Structural hash of `(name, type uid)`.
    #[must_use]
    pub fn uid(&self) -> u32 {
        self.uid
    }
}

/// One field of a bitfield: a named bit range within the container word.
///
/// `bit_offset` is LSB-indexed within the big-endian-decoded word;
/// successive fields occupy ascending offsets.
#[derive(Debug, Clone)]
pub struct BitfieldField {
    pub(crate) name: String,
    pub(crate) prim: PrimType,
    pub(crate) bit_offset: u32,
    pub(crate) bit_size: u32,
    pub(crate) uid: u32,
}

impl BitfieldField {
    /// Field name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The smallest primitive that holds the extracted field.
    #[must_use]
    pub fn prim(&self) -> PrimType {
        self.prim
    }

    /// First bit of the field, counted from the container word's LSB.
    #[must_use]
    pub fn bit_offset(&self) -> u32 {
        self.bit_offset
    }

    /// Width of the field in bits.
    #[must_use]
    pub fn bit_size(&self) -> u32 {
        self.bit_size
    }

    /// Structural hash of `(name, bit_size)`.
    #[must_use]
    pub fn uid(&self) -> u32 {
        self.uid
    }
}

/// Kind-specific payload of a descriptor node.
#[derive(Debug)]
pub enum TypeKind {
    /// A built-in scalar.
    Primitive {
        /// The scalar type
        prim: PrimType,
    },

    /// An ordered set of named values, stored as its index in the smallest
    /// signed integer that fits the cardinality.
    Enum {
        /// Storage scalar (always signed)
        prim: PrimType,
        /// Value names in declaration order
        values: Vec<String>,
    },

    /// Named bit ranges packed into one unsigned container word.
    Bitfield {
        /// The container word (1, 2, 4, or 8 bytes)
        word: PrimType,
        /// Fields in ascending bit order
        fields: Vec<BitfieldField>,
    },

    /// An ordered sequence of typed fields at fixed offsets.
    Struct {
        /// Fields in declaration order
        fields: Vec<StructField>,
        /// Whether this struct is registered for wire-level framing (its
        /// first field is the implicit `ss_header`)
        is_message: bool,
    },

    /// A fixed-size homogeneous sequence.
    Array {
        /// Element type
        elem: TypeRef,
        /// Element count
        size: usize,
    },
}

/// An immutable node of the type graph.
#[derive(Debug)]
pub struct TypeDescriptor {
    pub(crate) name: String,
    pub(crate) packed_size: usize,
    pub(crate) uid: u32,
    pub(crate) kind: TypeKind,
}

impl TypeDescriptor {
    /// Canonical type name, unique within the builder.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Fixed wire footprint in bytes.
    #[must_use]
    pub fn packed_size(&self) -> usize {
        self.packed_size
    }

    /// Structural CRC-32 identifier.
    #[must_use]
    pub fn uid(&self) -> u32 {
        self.uid
    }

    /// Kind-specific payload.
    #[must_use]
    pub fn kind(&self) -> &TypeKind {
        &self.kind
    }

    /// True for built-in scalars.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        matches!(self.kind, TypeKind::Primitive { .. })
    }

    /// True for enums.
    #[must_use]
    pub fn is_enum(&self) -> bool {
        matches!(self.kind, TypeKind::Enum { .. })
    }

    /// True for bitfields.
    #[must_use]
    pub fn is_bitfield(&self) -> bool {
        matches!(self.kind, TypeKind::Bitfield { .. })
    }

    /// True for structs (including messages).
    #[must_use]
    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct { .. })
    }

    /// True for fixed-size arrays.
    #[must_use]
    pub fn is_array(&self) -> bool {
        matches!(self.kind, TypeKind::Array { .. })
    }

    /// True for structs registered for wire-level framing.
    #[must_use]
    pub fn is_message(&self) -> bool {
        matches!(self.kind, TypeKind::Struct { is_message: true, .. })
    }

    /// Storage scalar, for the kinds that have one: the primitive itself,
    /// an enum's index type, or a bitfield's container word.
    #[must_use]
    pub fn prim_type(&self) -> Option<PrimType> {
        match &self.kind {
            TypeKind::Primitive { prim } | TypeKind::Enum { prim, .. } => Some(*prim),
            TypeKind::Bitfield { word, .. } => Some(*word),
            TypeKind::Struct { .. } | TypeKind::Array { .. } => None,
        }
    }

    /// Enum value names in declaration order, if this is an enum.
    #[must_use]
    pub fn enum_values(&self) -> Option<&[String]> {
        match &self.kind {
            TypeKind::Enum { values, .. } => Some(values),
            _ => None,
        }
    }

    /// Struct fields in declaration order, if this is a struct.
    #[must_use]
    pub fn struct_fields(&self) -> Option<&[StructField]> {
        match &self.kind {
            TypeKind::Struct { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Bitfield fields in ascending bit order, if this is a bitfield.
    #[must_use]
    pub fn bitfield_fields(&self) -> Option<&[BitfieldField]> {
        match &self.kind {
            TypeKind::Bitfield { fields, .. } => Some(fields),
            _ => None,
        }
    }

    /// Look up a struct field by name.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&StructField> {
        self.struct_fields()?.iter().find(|f| f.name == name)
    }

    /// Look up a bitfield field by name.
    #[must_use]
    pub fn bitfield_field(&self, name: &str) -> Option<&BitfieldField> {
        self.bitfield_fields()?.iter().find(|f| f.name == name)
    }

    /// Element type, if this is an array.
    #[must_use]
    pub fn array_elem(&self) -> Option<&TypeRef> {
        match &self.kind {
            TypeKind::Array { elem, .. } => Some(elem),
            _ => None,
        }
    }

    /// Element count, if this is an array.
    #[must_use]
    pub fn array_size(&self) -> Option<usize> {
        match &self.kind {
            TypeKind::Array { size, .. } => Some(*size),
            _ => None,
        }
    }
}
