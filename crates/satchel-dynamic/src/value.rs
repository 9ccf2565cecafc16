//! Tagged value trees mirroring descriptor subgraphs.
//!
//! [`Value`] is a closed sum over the eleven wire scalars plus the two
//! container shapes. Scalars live inline in the enum; only containers carry
//! heap storage (their child vectors/maps), which also breaks the recursive
//! type definition.
//!
//! A tree is built zeroed from a descriptor and filled in place by
//! [`Value::unpack`]. Cloning deep-copies the tree; the descriptor
//! back-references are shared, not copied.

use indexmap::IndexMap;

use satchel_schema::{PrimType, TypeKind, TypeRef};
use satchel_wire::{unpack_bits, WireScalar};

use crate::errors::{AccessError, UnpackError};

mod sealed {
    pub trait Sealed {}
}

/// A runtime value conforming to some descriptor.
///
/// Enums materialise as their underlying index scalar; bitfields materialise
/// as a [`StructValue`] of unsigned scalars.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    /// `uint8` scalar
    U8(u8),
    /// `uint16` scalar
    U16(u16),
    /// `uint32` scalar
    U32(u32),
    /// `uint64` scalar
    U64(u64),
    /// `int8` scalar
    I8(i8),
    /// `int16` scalar
    I16(i16),
    /// `int32` scalar
    I32(i32),
    /// `int64` scalar
    I64(i64),
    /// `bool` scalar
    Bool(bool),
    /// `float` scalar
    F32(f32),
    /// `double` scalar
    F64(f64),
    /// Struct or bitfield value
    Struct(StructValue),
    /// Fixed-size array value
    Array(ArrayValue),
}

impl Value {
    /// Build a zeroed value tree conforming to `descriptor`.
    #[must_use]
    pub fn new(descriptor: &TypeRef) -> Self {
        match descriptor.kind() {
            TypeKind::Primitive { prim } | TypeKind::Enum { prim, .. } => Self::zero(*prim),
            TypeKind::Struct { .. } | TypeKind::Bitfield { .. } => {
                Value::Struct(StructValue::new(descriptor))
            }
            TypeKind::Array { .. } => Value::Array(ArrayValue::new(descriptor)),
        }
    }

    /// The zero value of one scalar type.
    #[must_use]
    pub fn zero(prim: PrimType) -> Self {
        match prim {
            PrimType::U8 => Value::U8(0),
            PrimType::U16 => Value::U16(0),
            PrimType::U32 => Value::U32(0),
            PrimType::U64 => Value::U64(0),
            PrimType::I8 => Value::I8(0),
            PrimType::I16 => Value::I16(0),
            PrimType::I32 => Value::I32(0),
            PrimType::I64 => Value::I64(0),
            PrimType::Bool => Value::Bool(false),
            PrimType::F32 => Value::F32(0.0),
            PrimType::F64 => Value::F64(0.0),
        }
    }

    /// Fill this tree in place from its big-endian wire representation.
    ///
    /// # Errors
    ///
    /// Returns [`UnpackError::InvalidLen`] if `buf` is shorter than the
    /// value's packed size. Extra trailing bytes are ignored.
    pub fn unpack(&mut self, buf: &[u8]) -> Result<(), UnpackError> {
        match self {
            Value::U8(v) => *v = unpack_scalar(buf)?,
            Value::U16(v) => *v = unpack_scalar(buf)?,
            Value::U32(v) => *v = unpack_scalar(buf)?,
            Value::U64(v) => *v = unpack_scalar(buf)?,
            Value::I8(v) => *v = unpack_scalar(buf)?,
            Value::I16(v) => *v = unpack_scalar(buf)?,
            Value::I32(v) => *v = unpack_scalar(buf)?,
            Value::I64(v) => *v = unpack_scalar(buf)?,
            Value::Bool(v) => *v = unpack_scalar(buf)?,
            Value::F32(v) => *v = unpack_scalar(buf)?,
            Value::F64(v) => *v = unpack_scalar(buf)?,
            Value::Struct(s) => s.unpack(buf)?,
            Value::Array(a) => a.unpack(buf)?,
        }
        Ok(())
    }
}

fn unpack_scalar<T: WireScalar>(buf: &[u8]) -> Result<T, UnpackError> {
    if buf.len() < T::WIDTH {
        return Err(UnpackError::InvalidLen { expected: T::WIDTH, actual: buf.len() });
    }
    Ok(T::unpack_be(buf))
}

/// A struct or bitfield value: an insertion-ordered mapping from field name
/// to child value, plus a reference to its descriptor.
#[derive(Clone)]
pub struct StructValue {
    descriptor: TypeRef,
    fields: IndexMap<String, Value>,
}

impl StructValue {
    /// Build a zeroed struct value conforming to `descriptor`.
    ///
    /// `descriptor` must be a struct or bitfield node; child values are
    /// created recursively in declaration order.
    #[must_use]
    pub fn new(descriptor: &TypeRef) -> Self {
        let fields = match descriptor.kind() {
            TypeKind::Struct { fields, .. } => fields
                .iter()
                .map(|f| (f.name().to_string(), Value::new(f.ty())))
                .collect(),
            TypeKind::Bitfield { fields, .. } => fields
                .iter()
                .map(|f| (f.name().to_string(), Value::zero(f.prim())))
                .collect(),
            _ => unreachable!("struct values mirror struct or bitfield descriptors"),
        };
        Self { descriptor: descriptor.clone(), fields }
    }

    /// The descriptor this value conforms to.
    #[must_use]
    pub fn descriptor(&self) -> &TypeRef {
        &self.descriptor
    }

    /// Fill all fields in place from the struct's wire representation.
    ///
    /// Plain structs recurse per field at that field's fixed offset. A
    /// bitfield decodes its container word once and extracts each bit range
    /// from it.
    ///
    /// # Errors
    ///
    /// Returns [`UnpackError::InvalidLen`] if `buf` is shorter than the
    /// descriptor's packed size.
    pub fn unpack(&mut self, buf: &[u8]) -> Result<(), UnpackError> {
        let needed = self.descriptor.packed_size();
        if buf.len() < needed {
            return Err(UnpackError::InvalidLen { expected: needed, actual: buf.len() });
        }

        match self.descriptor.kind() {
            TypeKind::Struct { fields, .. } => {
                for (field, (_, child)) in fields.iter().zip(self.fields.iter_mut()) {
                    let start = field.offset();
                    child.unpack(&buf[start..start + field.ty().packed_size()])?;
                }
            }
            TypeKind::Bitfield { word, fields } => {
                let word = match word {
                    PrimType::U8 => u64::from(u8::unpack_be(buf)),
                    PrimType::U16 => u64::from(u16::unpack_be(buf)),
                    PrimType::U32 => u64::from(u32::unpack_be(buf)),
                    PrimType::U64 => u64::unpack_be(buf),
                    _ => unreachable!("bitfield container is an unsigned word"),
                };
                for (field, (_, child)) in fields.iter().zip(self.fields.iter_mut()) {
                    let raw = unpack_bits(word, field.bit_offset(), field.bit_size());
                    set_unsigned(child, raw);
                }
            }
            _ => unreachable!("struct values mirror struct or bitfield descriptors"),
        }
        Ok(())
    }

    /// Borrow a field's value at the requested type.
    ///
    /// # Errors
    ///
    /// [`AccessError::FieldNotFound`] if no field has this name;
    /// [`AccessError::TypeMismatch`] if the field holds a different variant
    /// than `T`.
    pub fn get<T: ValueSlot>(&self, field: &str) -> Result<&T, AccessError> {
        let value = self
            .fields
            .get(field)
            .ok_or_else(|| AccessError::FieldNotFound { field: field.to_string() })?;
        T::from_value(value).ok_or_else(|| AccessError::TypeMismatch {
            field: field.to_string(),
            expected: T::slot_name(),
        })
    }

    /// Mutably borrow a field's value at the requested type.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    pub fn get_mut<T: ValueSlot>(&mut self, field: &str) -> Result<&mut T, AccessError> {
        let value = self
            .fields
            .get_mut(field)
            .ok_or_else(|| AccessError::FieldNotFound { field: field.to_string() })?;
        T::from_value_mut(value).ok_or_else(|| AccessError::TypeMismatch {
            field: field.to_string(),
            expected: T::slot_name(),
        })
    }

    /// Tolerant form of [`get`](Self::get): `Ok(None)` for a missing field.
    /// A type mismatch on a present field still fails.
    ///
    /// # Errors
    ///
    /// [`AccessError::TypeMismatch`] if the field exists with a different
    /// variant than `T`.
    pub fn get_if<T: ValueSlot>(&self, field: &str) -> Result<Option<&T>, AccessError> {
        let Some(value) = self.fields.get(field) else {
            return Ok(None);
        };
        T::from_value(value)
            .map(Some)
            .ok_or_else(|| AccessError::TypeMismatch {
                field: field.to_string(),
                expected: T::slot_name(),
            })
    }

    /// Read a scalar field, converting it to `T` by the usual numeric
    /// widening/narrowing rules.
    ///
    /// # Errors
    ///
    /// [`AccessError::FieldNotFound`] for a missing field;
    /// [`AccessError::TypeMismatch`] if the field holds a struct or array.
    pub fn convert<T: FromScalar>(&self, field: &str) -> Result<T, AccessError> {
        let value = self
            .fields
            .get(field)
            .ok_or_else(|| AccessError::FieldNotFound { field: field.to_string() })?;
        T::from_scalar(value).ok_or_else(|| AccessError::TypeMismatch {
            field: field.to_string(),
            expected: "scalar",
        })
    }

    /// Tolerant form of [`convert`](Self::convert): `Ok(None)` for a missing
    /// field.
    ///
    /// # Errors
    ///
    /// [`AccessError::TypeMismatch`] if the field holds a struct or array.
    pub fn convert_if<T: FromScalar>(&self, field: &str) -> Result<Option<T>, AccessError> {
        let Some(value) = self.fields.get(field) else {
            return Ok(None);
        };
        T::from_scalar(value)
            .map(Some)
            .ok_or_else(|| AccessError::TypeMismatch {
                field: field.to_string(),
                expected: "scalar",
            })
    }

    /// Replace a field's value wholesale.
    ///
    /// The replacement must be the same variant as the current value; a
    /// field's shape is fixed by the descriptor.
    ///
    /// # Errors
    ///
    /// [`AccessError::FieldNotFound`] for a missing field;
    /// [`AccessError::TypeMismatch`] if `value` is a different variant.
    pub fn set(&mut self, field: &str, value: Value) -> Result<(), AccessError> {
        let slot = self
            .fields
            .get_mut(field)
            .ok_or_else(|| AccessError::FieldNotFound { field: field.to_string() })?;
        if std::mem::discriminant(slot) != std::mem::discriminant(&value) {
            return Err(AccessError::TypeMismatch {
                field: field.to_string(),
                expected: "matching variant",
            });
        }
        *slot = value;
        Ok(())
    }

    /// Borrow a field's value untyped.
    #[must_use]
    pub fn value(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Iterate `(name, value)` pairs in declaration order.
    pub fn fields(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.fields.iter().map(|(name, value)| (name.as_str(), value))
    }
}

impl PartialEq for StructValue {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.uid() == other.descriptor.uid() && self.fields == other.fields
    }
}

impl std::fmt::Debug for StructValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut s = f.debug_struct(self.descriptor.name());
        for (name, value) in &self.fields {
            s.field(name, value);
        }
        s.finish()
    }
}

/// A fixed-size array value: children of the element type, plus a reference
/// to the array descriptor.
#[derive(Clone)]
pub struct ArrayValue {
    descriptor: TypeRef,
    elems: Vec<Value>,
}

impl ArrayValue {
    /// Build a zeroed array value conforming to `descriptor`.
    #[must_use]
    pub fn new(descriptor: &TypeRef) -> Self {
        let elems = match descriptor.kind() {
            TypeKind::Array { elem, size } => (0..*size).map(|_| Value::new(elem)).collect(),
            _ => unreachable!("array values mirror array descriptors"),
        };
        Self { descriptor: descriptor.clone(), elems }
    }

    /// The descriptor this value conforms to.
    #[must_use]
    pub fn descriptor(&self) -> &TypeRef {
        &self.descriptor
    }

    /// Element count.
    #[must_use]
    pub fn len(&self) -> usize {
        self.elems.len()
    }

    /// True for zero-length arrays.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    /// Fill all elements in place from contiguous wire bytes, element 0
    /// first.
    ///
    /// # Errors
    ///
    /// Returns [`UnpackError::InvalidLen`] if `buf` is shorter than the
    /// array's packed size.
    pub fn unpack(&mut self, buf: &[u8]) -> Result<(), UnpackError> {
        let needed = self.descriptor.packed_size();
        if buf.len() < needed {
            return Err(UnpackError::InvalidLen { expected: needed, actual: buf.len() });
        }

        let elem_size = match self.descriptor.kind() {
            TypeKind::Array { elem, .. } => elem.packed_size(),
            _ => unreachable!("array values mirror array descriptors"),
        };
        for (i, child) in self.elems.iter_mut().enumerate() {
            child.unpack(&buf[i * elem_size..(i + 1) * elem_size])?;
        }
        Ok(())
    }

    /// Borrow an element at the requested type.
    ///
    /// # Errors
    ///
    /// [`AccessError::IndexOutOfRange`] past the end;
    /// [`AccessError::TypeMismatch`] if elements are a different variant
    /// than `T`.
    pub fn get<T: ValueSlot>(&self, index: usize) -> Result<&T, AccessError> {
        let len = self.elems.len();
        let value = self
            .elems
            .get(index)
            .ok_or(AccessError::IndexOutOfRange { index, len })?;
        T::from_value(value).ok_or_else(|| AccessError::TypeMismatch {
            field: format!("[{index}]"),
            expected: T::slot_name(),
        })
    }

    /// Mutably borrow an element at the requested type.
    ///
    /// # Errors
    ///
    /// As [`get`](Self::get).
    pub fn get_mut<T: ValueSlot>(&mut self, index: usize) -> Result<&mut T, AccessError> {
        let len = self.elems.len();
        let value = self
            .elems
            .get_mut(index)
            .ok_or(AccessError::IndexOutOfRange { index, len })?;
        T::from_value_mut(value).ok_or_else(|| AccessError::TypeMismatch {
            field: format!("[{index}]"),
            expected: T::slot_name(),
        })
    }

    /// Read a scalar element, converting it to `T`.
    ///
    /// # Errors
    ///
    /// [`AccessError::IndexOutOfRange`] past the end;
    /// [`AccessError::TypeMismatch`] if elements are structs or arrays.
    pub fn convert<T: FromScalar>(&self, index: usize) -> Result<T, AccessError> {
        let len = self.elems.len();
        let value = self
            .elems
            .get(index)
            .ok_or(AccessError::IndexOutOfRange { index, len })?;
        T::from_scalar(value).ok_or_else(|| AccessError::TypeMismatch {
            field: format!("[{index}]"),
            expected: "scalar",
        })
    }

    /// Replace an element wholesale.
    ///
    /// # Errors
    ///
    /// [`AccessError::IndexOutOfRange`] past the end;
    /// [`AccessError::TypeMismatch`] if `value` is a different variant than
    /// the element type.
    pub fn set(&mut self, index: usize, value: Value) -> Result<(), AccessError> {
        let len = self.elems.len();
        let slot = self
            .elems
            .get_mut(index)
            .ok_or(AccessError::IndexOutOfRange { index, len })?;
        if std::mem::discriminant(slot) != std::mem::discriminant(&value) {
            return Err(AccessError::TypeMismatch {
                field: format!("[{index}]"),
                expected: "matching variant",
            });
        }
        *slot = value;
        Ok(())
    }

    /// Borrow an element untyped.
    #[must_use]
    pub fn value(&self, index: usize) -> Option<&Value> {
        self.elems.get(index)
    }

    /// Iterate elements in order.
    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.elems.iter()
    }
}

impl PartialEq for ArrayValue {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor.uid() == other.descriptor.uid() && self.elems == other.elems
    }
}

impl std::fmt::Debug for ArrayValue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_list().entries(&self.elems).finish()
    }
}

fn set_unsigned(child: &mut Value, raw: u64) {
    match child {
        Value::U8(v) => *v = raw as u8,
        Value::U16(v) => *v = raw as u16,
        Value::U32(v) => *v = raw as u32,
        Value::U64(v) => *v = raw,
        _ => unreachable!("bitfield fields are unsigned scalars"),
    }
}

/// Types that can sit in a [`Value`] slot: the eleven scalars plus
/// [`StructValue`] and [`ArrayValue`]. Sealed.
pub trait ValueSlot: sealed::Sealed + Sized {
    #[doc(hidden)]
    fn slot_name() -> &'static str;
    #[doc(hidden)]
    fn from_value(value: &Value) -> Option<&Self>;
    #[doc(hidden)]
    fn from_value_mut(value: &mut Value) -> Option<&mut Self>;
}

macro_rules! impl_value_slot {
    ($($variant:ident => $ty:ty),* $(,)?) => {$(
        impl sealed::Sealed for $ty {}

        impl ValueSlot for $ty {
            fn slot_name() -> &'static str {
                stringify!($ty)
            }

            fn from_value(value: &Value) -> Option<&Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }

            fn from_value_mut(value: &mut Value) -> Option<&mut Self> {
                match value {
                    Value::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    )*};
}

impl_value_slot!(
    U8 => u8,
    U16 => u16,
    U32 => u32,
    U64 => u64,
    I8 => i8,
    I16 => i16,
    I32 => i32,
    I64 => i64,
    Bool => bool,
    F32 => f32,
    F64 => f64,
    Struct => StructValue,
    Array => ArrayValue,
);

/// Scalar conversion targets for [`StructValue::convert`] and friends.
///
/// Conversions follow Rust's `as` casts: integers truncate, floats to
/// integers saturate, and `bool` sources convert through `0`/`1`. Container
/// values never convert. Sealed.
pub trait FromScalar: sealed::Sealed + Sized {
    #[doc(hidden)]
    fn from_scalar(value: &Value) -> Option<Self>;
}

macro_rules! impl_from_scalar {
    ($($ty:ty),* $(,)?) => {$(
        impl FromScalar for $ty {
            fn from_scalar(value: &Value) -> Option<Self> {
                Some(match value {
                    Value::U8(v) => *v as $ty,
                    Value::U16(v) => *v as $ty,
                    Value::U32(v) => *v as $ty,
                    Value::U64(v) => *v as $ty,
                    Value::I8(v) => *v as $ty,
                    Value::I16(v) => *v as $ty,
                    Value::I32(v) => *v as $ty,
                    Value::I64(v) => *v as $ty,
                    Value::Bool(v) => u8::from(*v) as $ty,
                    Value::F32(v) => *v as $ty,
                    Value::F64(v) => *v as $ty,
                    Value::Struct(_) | Value::Array(_) => return None,
                })
            }
        }
    )*};
}

impl_from_scalar!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl FromScalar for bool {
    fn from_scalar(value: &Value) -> Option<Self> {
        Some(match value {
            Value::U8(v) => *v != 0,
            Value::U16(v) => *v != 0,
            Value::U32(v) => *v != 0,
            Value::U64(v) => *v != 0,
            Value::I8(v) => *v != 0,
            Value::I16(v) => *v != 0,
            Value::I32(v) => *v != 0,
            Value::I64(v) => *v != 0,
            Value::Bool(v) => *v,
            Value::F32(v) => *v != 0.0,
            Value::F64(v) => *v != 0.0,
            Value::Struct(_) | Value::Array(_) => return None,
        })
    }
}
