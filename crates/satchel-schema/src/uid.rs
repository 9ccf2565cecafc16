//! Canonical UID hashing.
//!
//! Every descriptor node is identified by a CRC-32 digest of a canonical
//! ASCII string built from its name and the UIDs of its constituents. The
//! exact string forms are a wire contract (generated decoders embed these
//! values, and the log reader matches records to descriptors by them), so
//! they must never change:
//!
//! | Kind | Canonical string |
//! |---|---|
//! | Primitive | `"<name>, <packed_size>"` |
//! | Array | `"<elem_uid>, <size>"` |
//! | Enum value | `"<name>, <index>"` |
//! | Bitfield field | `"<name>, <bit_size>"` |
//! | Struct field | `"<name>, <type_uid>"` |
//! | Enum / Struct / Bitfield | `"<name>, <member0_uid>, <member1_uid>, …"` |
//!
//! Nested UIDs are rendered in decimal. Identical subgraphs therefore hash
//! identically, wherever and however often they are declared.

use satchel_wire::crc32;

/// UID of a primitive type.
#[must_use]
pub fn primitive_uid(name: &str, packed_size: usize) -> u32 {
    crc32(format!("{name}, {packed_size}").as_bytes())
}

/// UID of a fixed-size array, from its element's UID.
#[must_use]
pub fn array_uid(elem_uid: u32, size: usize) -> u32 {
    crc32(format!("{elem_uid}, {size}").as_bytes())
}

/// UID of one enum value at its declaration index.
#[must_use]
pub fn enum_value_uid(name: &str, index: usize) -> u32 {
    crc32(format!("{name}, {index}").as_bytes())
}

/// UID of one bitfield field.
#[must_use]
pub fn bitfield_field_uid(name: &str, bit_size: u32) -> u32 {
    crc32(format!("{name}, {bit_size}").as_bytes())
}

/// UID of one struct field, from its resolved type's UID.
#[must_use]
pub fn struct_field_uid(name: &str, type_uid: u32) -> u32 {
    crc32(format!("{name}, {type_uid}").as_bytes())
}

/// UID of a named aggregate (struct, bitfield, or enum) over its members'
/// UIDs in declaration order.
#[must_use]
pub fn composite_uid(name: &str, member_uids: &[u32]) -> u32 {
    let mut canonical = String::from(name);
    for uid in member_uids {
        canonical.push_str(", ");
        canonical.push_str(&uid.to_string());
    }
    crc32(canonical.as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    // Reference values computed by the original generator toolchain.

    #[test]
    fn primitive_reference_values() {
        assert_eq!(primitive_uid("uint8", 1), 1_635_920_604);
        assert_eq!(primitive_uid("uint16", 2), 4_255_558_950);
        assert_eq!(primitive_uid("uint32", 4), 3_781_676_068);
        assert_eq!(primitive_uid("uint64", 8), 89_804_963);
        assert_eq!(primitive_uid("int8", 1), 2_105_324_863);
        assert_eq!(primitive_uid("int16", 2), 3_300_515_963);
        assert_eq!(primitive_uid("int32", 4), 3_631_776_121);
        assert_eq!(primitive_uid("int64", 8), 1_011_162_622);
        assert_eq!(primitive_uid("bool", 1), 3_883_404_294);
        assert_eq!(primitive_uid("float", 4), 58_387_438);
        assert_eq!(primitive_uid("double", 8), 3_385_497_865);
    }

    #[test]
    fn header_struct_reference_value() {
        let uid_field = struct_field_uid("uid", primitive_uid("uint32", 4));
        let len_field = struct_field_uid("len", primitive_uid("uint16", 2));
        assert_eq!(composite_uid("SsHeader", &[uid_field, len_field]), 1_168_420_962);
    }

    #[test]
    fn composite_with_no_members_hashes_name_only() {
        assert_eq!(composite_uid("Empty", &[]), crc32(b"Empty"));
    }
}
