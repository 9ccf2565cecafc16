//! Proptest strategies producing random valid value trees.
//!
//! Given any descriptor, [`value_strategy`] yields trees whose every scalar
//! is in range for its slot: enum indices stay below the cardinality,
//! bitfield fields fit their bit widths, floats are finite (wire equality
//! is bit-exact, and NaN would break tree comparison in round-trip
//! properties).

use proptest::prelude::*;

use satchel_dynamic::{ArrayValue, StructValue, Value};
use satchel_schema::{PrimType, TypeKind, TypeRef};

use crate::packer::finalize_message;

/// Strategy over random valid values conforming to `descriptor`.
#[must_use]
pub fn value_strategy(descriptor: &TypeRef) -> BoxedStrategy<Value> {
    match descriptor.kind() {
        TypeKind::Primitive { prim } => scalar_strategy(*prim),
        TypeKind::Enum { prim, values } => enum_strategy(*prim, values.len()),
        TypeKind::Struct { .. } | TypeKind::Bitfield { .. } => {
            struct_strategy(descriptor).prop_map(Value::Struct).boxed()
        }
        TypeKind::Array { .. } => array_strategy(descriptor).prop_map(Value::Array).boxed(),
    }
}

/// Strategy over random messages of `descriptor`'s type, headers already
/// stamped with the correct UID and length.
#[must_use]
pub fn message_strategy(descriptor: &TypeRef) -> BoxedStrategy<StructValue> {
    debug_assert!(descriptor.is_message());
    struct_strategy(descriptor)
        .prop_map(|mut msg| {
            finalize_message(&mut msg)
                .unwrap_or_else(|_| unreachable!("message values carry an ss_header"));
            msg
        })
        .boxed()
}

fn scalar_strategy(prim: PrimType) -> BoxedStrategy<Value> {
    match prim {
        PrimType::U8 => any::<u8>().prop_map(Value::U8).boxed(),
        PrimType::U16 => any::<u16>().prop_map(Value::U16).boxed(),
        PrimType::U32 => any::<u32>().prop_map(Value::U32).boxed(),
        PrimType::U64 => any::<u64>().prop_map(Value::U64).boxed(),
        PrimType::I8 => any::<i8>().prop_map(Value::I8).boxed(),
        PrimType::I16 => any::<i16>().prop_map(Value::I16).boxed(),
        PrimType::I32 => any::<i32>().prop_map(Value::I32).boxed(),
        PrimType::I64 => any::<i64>().prop_map(Value::I64).boxed(),
        PrimType::Bool => any::<bool>().prop_map(Value::Bool).boxed(),
        PrimType::F32 => (-1.0e6f32..1.0e6f32).prop_map(Value::F32).boxed(),
        PrimType::F64 => (-1.0e12f64..1.0e12f64).prop_map(Value::F64).boxed(),
    }
}

fn enum_strategy(prim: PrimType, cardinality: usize) -> BoxedStrategy<Value> {
    let max = cardinality.saturating_sub(1) as i64;
    let index = 0..=max;
    match prim {
        PrimType::I8 => index.prop_map(|i| Value::I8(i as i8)).boxed(),
        PrimType::I16 => index.prop_map(|i| Value::I16(i as i16)).boxed(),
        PrimType::I32 => index.prop_map(|i| Value::I32(i as i32)).boxed(),
        PrimType::I64 => index.prop_map(Value::I64).boxed(),
        _ => unreachable!("enum storage is a signed integer"),
    }
}

fn struct_strategy(descriptor: &TypeRef) -> BoxedStrategy<StructValue> {
    match descriptor.kind() {
        TypeKind::Struct { fields, .. } => {
            let names: Vec<String> = fields.iter().map(|f| f.name().to_string()).collect();
            let children: Vec<BoxedStrategy<Value>> =
                fields.iter().map(|f| value_strategy(f.ty())).collect();

            let descriptor = descriptor.clone();
            sequence(children)
                .prop_map(move |values| {
                    let mut tree = StructValue::new(&descriptor);
                    for (name, value) in names.iter().zip(values) {
                        tree.set(name, value)
                            .unwrap_or_else(|_| unreachable!("children follow the descriptor"));
                    }
                    tree
                })
                .boxed()
        }
        TypeKind::Bitfield { fields, .. } => {
            let names: Vec<String> = fields.iter().map(|f| f.name().to_string()).collect();
            let children: Vec<BoxedStrategy<Value>> = fields
                .iter()
                .map(|f| {
                    let prim = f.prim();
                    let mask = if f.bit_size() == 64 {
                        u64::MAX
                    } else {
                        (1u64 << f.bit_size()) - 1
                    };
                    (0..=mask).prop_map(move |raw| bitfield_child(prim, raw)).boxed()
                })
                .collect();

            let descriptor = descriptor.clone();
            sequence(children)
                .prop_map(move |values| {
                    let mut tree = StructValue::new(&descriptor);
                    for (name, value) in names.iter().zip(values) {
                        tree.set(name, value)
                            .unwrap_or_else(|_| unreachable!("children follow the descriptor"));
                    }
                    tree
                })
                .boxed()
        }
        _ => unreachable!("struct strategies require struct or bitfield descriptors"),
    }
}

fn array_strategy(descriptor: &TypeRef) -> BoxedStrategy<ArrayValue> {
    let TypeKind::Array { elem, size } = descriptor.kind() else {
        unreachable!("array strategies require array descriptors");
    };

    let descriptor = descriptor.clone();
    prop::collection::vec(value_strategy(elem), *size)
        .prop_map(move |values| {
            let mut tree = ArrayValue::new(&descriptor);
            for (index, value) in values.into_iter().enumerate() {
                tree.set(index, value)
                    .unwrap_or_else(|_| unreachable!("elements follow the descriptor"));
            }
            tree
        })
        .boxed()
}

fn bitfield_child(prim: PrimType, raw: u64) -> Value {
    match prim {
        PrimType::U8 => Value::U8(raw as u8),
        PrimType::U16 => Value::U16(raw as u16),
        PrimType::U32 => Value::U32(raw as u32),
        PrimType::U64 => Value::U64(raw),
        _ => unreachable!("bitfield fields are unsigned scalars"),
    }
}

/// Combine per-slot strategies into one strategy over the slot vector.
fn sequence(strategies: Vec<BoxedStrategy<Value>>) -> BoxedStrategy<Vec<Value>> {
    let mut combined: BoxedStrategy<Vec<Value>> = Just(Vec::new()).boxed();
    for strategy in strategies {
        combined = (combined, strategy)
            .prop_map(|(mut values, value)| {
                values.push(value);
                values
            })
            .boxed();
    }
    combined
}
