//! Test-side encoder: the inverse of the dynamic unpacker.
//!
//! Production consumers encode with generated code; tests encode dynamic
//! value trees directly so round-trip properties can run without the
//! generator. Packing walks the tree in declaration order: struct field
//! offsets are the cumulative sum of prior field sizes, so sequential
//! writes land every field at its descriptor offset.

use bytes::BufMut;

use satchel_dynamic::{AccessError, StructValue, Value};
use satchel_schema::{PrimType, TypeKind};
use satchel_wire::pack_bits;

/// Append `value`'s big-endian wire representation to `dst`.
pub fn pack_value(value: &Value, dst: &mut impl BufMut) {
    match value {
        Value::U8(v) => dst.put_u8(*v),
        Value::U16(v) => dst.put_u16(*v),
        Value::U32(v) => dst.put_u32(*v),
        Value::U64(v) => dst.put_u64(*v),
        Value::I8(v) => dst.put_i8(*v),
        Value::I16(v) => dst.put_i16(*v),
        Value::I32(v) => dst.put_i32(*v),
        Value::I64(v) => dst.put_i64(*v),
        Value::Bool(v) => dst.put_u8(u8::from(*v)),
        Value::F32(v) => dst.put_f32(*v),
        Value::F64(v) => dst.put_f64(*v),
        Value::Struct(s) => pack_struct(s, dst),
        Value::Array(a) => {
            for elem in a.iter() {
                pack_value(elem, dst);
            }
        }
    }
}

/// Pack a struct value into a fresh byte vector.
#[must_use]
pub fn pack_to_vec(value: &StructValue) -> Vec<u8> {
    let mut buf = Vec::with_capacity(value.descriptor().packed_size());
    pack_struct(value, &mut buf);
    buf
}

fn pack_struct(value: &StructValue, dst: &mut impl BufMut) {
    match value.descriptor().kind() {
        TypeKind::Struct { .. } => {
            for (_, child) in value.fields() {
                pack_value(child, dst);
            }
        }
        TypeKind::Bitfield { word, fields } => {
            let mut packed = 0u64;
            for (field, (_, child)) in fields.iter().zip(value.fields()) {
                pack_bits(&mut packed, as_unsigned(child), field.bit_offset(), field.bit_size());
            }
            match word {
                PrimType::U8 => dst.put_u8(packed as u8),
                PrimType::U16 => dst.put_u16(packed as u16),
                PrimType::U32 => dst.put_u32(packed as u32),
                PrimType::U64 => dst.put_u64(packed),
                _ => unreachable!("bitfield container is an unsigned word"),
            }
        }
        _ => unreachable!("struct values mirror struct or bitfield descriptors"),
    }
}

fn as_unsigned(value: &Value) -> u64 {
    match value {
        Value::U8(v) => u64::from(*v),
        Value::U16(v) => u64::from(*v),
        Value::U32(v) => u64::from(*v),
        Value::U64(v) => *v,
        _ => unreachable!("bitfield fields are unsigned scalars"),
    }
}

/// Stamp a message's `ss_header` with its descriptor's UID and packed size,
/// the way the generated encoders do before writing.
///
/// # Errors
///
/// [`AccessError::FieldNotFound`] if `msg` is not a message (no `ss_header`
/// field).
pub fn finalize_message(msg: &mut StructValue) -> Result<(), AccessError> {
    let uid = msg.descriptor().uid();
    let len = msg.descriptor().packed_size() as u16;

    let header = msg.get_mut::<StructValue>("ss_header")?;
    *header.get_mut::<u32>("uid")? = uid;
    *header.get_mut::<u16>("len")? = len;
    Ok(())
}
