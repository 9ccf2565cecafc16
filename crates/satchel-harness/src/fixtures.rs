//! The reference schema used across the conformance tests.
//!
//! This schema exercises every corner of the type system: all eleven
//! primitives, bitfields on 2- and 4-byte container words, enums on both
//! sides of the one-byte/two-byte width boundary, and arrays nested three
//! deep. Expected UIDs and packed sizes for these declarations are pinned
//! in the test suites.

use std::fmt::Write;

/// Build the reference schema YAML.
///
/// The enum value lists are generated (`Value0` … `ValueN`) to hit the
/// width ladder exactly: `Enum1Bytes` has 127 values (the largest one-byte
/// enum), `Enum2Bytes` has 128 (the smallest two-byte one).
#[must_use]
pub fn reference_schema() -> String {
    let mut schema = String::new();

    schema.push_str(concat!(
        "Bitfield2Bytes:\n",
        "  type: Bitfield\n",
        "  fields:\n",
        "    - field0: 3\n",
        "    - field1: 5\n",
        "    - field2: 8\n",
        "\n",
        "Bitfield4Bytes:\n",
        "  type: Bitfield\n",
        "  fields:\n",
        "    - field0: 3\n",
        "    - field1: 5\n",
        "    - field2: 9\n",
        "\n",
    ));

    for (name, count) in [("Enum1Bytes", 127), ("Enum2Bytes", 128)] {
        let _ = writeln!(schema, "{name}:");
        schema.push_str("  type: Enum\n  values:\n");
        for i in 0..count {
            let _ = writeln!(schema, "    - Value{i}:");
        }
        schema.push('\n');
    }

    schema.push_str(concat!(
        "ArrayElem:\n",
        "  type: Struct\n",
        "  fields:\n",
        "    - field0: bool\n",
        "    - field1: uint16\n",
        "\n",
        "Bitfield2BytesTest:\n",
        "  type: Message\n",
        "  fields:\n",
        "    - bitfield: Bitfield2Bytes\n",
        "\n",
        "Bitfield4BytesTest:\n",
        "  type: Message\n",
        "  fields:\n",
        "    - bitfield: Bitfield4Bytes\n",
        "\n",
        "Enum1BytesTest:\n",
        "  type: Message\n",
        "  fields:\n",
        "    - enumeration: Enum1Bytes\n",
        "\n",
        "Enum2BytesTest:\n",
        "  type: Message\n",
        "  fields:\n",
        "    - enumeration: Enum2Bytes\n",
        "\n",
        "PrimitiveTest:\n",
        "  type: Message\n",
        "  fields:\n",
        "    - uint8: uint8\n",
        "    - uint16: uint16\n",
        "    - uint32: uint32\n",
        "    - uint64: uint64\n",
        "    - int8: int8\n",
        "    - int16: int16\n",
        "    - int32: int32\n",
        "    - int64: int64\n",
        "    - boolean: bool\n",
        "    - float_type: float\n",
        "    - double_type: double\n",
        "\n",
        "ArrayTest:\n",
        "  type: Message\n",
        "  fields:\n",
        "    - array_1d: [ArrayElem, 3]\n",
        "    - array_2d: [[ArrayElem, 3], 2]\n",
        "    - array_3d: [[[ArrayElem, 3], 2], 1]\n",
    ));

    schema
}

#[cfg(test)]
mod tests {
    use satchel_schema::DescriptorBuilder;

    use super::*;

    #[test]
    fn reference_schema_parses() {
        let types = DescriptorBuilder::from_str(&reference_schema())
            .expect("reference schema should parse");
        assert_eq!(types.messages().len(), 6);
    }
}
