//! Conformance tests for dynamic value trees against pinned wire bytes.

use satchel_dynamic::{unpack_message, ArrayValue, StructValue, UnpackError};
use satchel_harness::{finalize_message, pack_to_vec, reference_schema};
use satchel_schema::DescriptorBuilder;

fn types() -> DescriptorBuilder {
    DescriptorBuilder::from_str(&reference_schema()).expect("reference schema should parse")
}

#[test]
fn field_get_access() {
    let types = types();
    let mut msg = StructValue::new(types.get("PrimitiveTest").unwrap());

    *msg.get_mut::<StructValue>("ss_header").unwrap().get_mut::<u32>("uid").unwrap() = 505;
    *msg.get_mut::<StructValue>("ss_header").unwrap().get_mut::<u16>("len").unwrap() = 50;
    *msg.get_mut::<u8>("uint8").unwrap() = 1;
    *msg.get_mut::<u16>("uint16").unwrap() = 2;
    *msg.get_mut::<u32>("uint32").unwrap() = 3;
    *msg.get_mut::<u64>("uint64").unwrap() = 4;
    *msg.get_mut::<i8>("int8").unwrap() = 5;
    *msg.get_mut::<i16>("int16").unwrap() = 6;
    *msg.get_mut::<i32>("int32").unwrap() = 7;
    *msg.get_mut::<i64>("int64").unwrap() = 8;
    *msg.get_mut::<bool>("boolean").unwrap() = true;
    *msg.get_mut::<f32>("float_type").unwrap() = 10.1;
    *msg.get_mut::<f64>("double_type").unwrap() = 11.1;

    assert_eq!(*msg.get::<StructValue>("ss_header").unwrap().get::<u32>("uid").unwrap(), 505);
    assert_eq!(*msg.get::<StructValue>("ss_header").unwrap().get::<u16>("len").unwrap(), 50);
    assert_eq!(*msg.get::<u8>("uint8").unwrap(), 1);
    assert_eq!(*msg.get::<u16>("uint16").unwrap(), 2);
    assert_eq!(*msg.get::<u32>("uint32").unwrap(), 3);
    assert_eq!(*msg.get::<u64>("uint64").unwrap(), 4);
    assert_eq!(*msg.get::<i8>("int8").unwrap(), 5);
    assert_eq!(*msg.get::<i16>("int16").unwrap(), 6);
    assert_eq!(*msg.get::<i32>("int32").unwrap(), 7);
    assert_eq!(*msg.get::<i64>("int64").unwrap(), 8);
    assert!(*msg.get::<bool>("boolean").unwrap());
    assert!((msg.get::<f32>("float_type").unwrap() - 10.1).abs() < f32::EPSILON);
    assert!((msg.get::<f64>("double_type").unwrap() - 11.1).abs() < f64::EPSILON);
}

#[test]
fn field_convert_access() {
    let types = types();
    let mut msg = StructValue::new(types.get("PrimitiveTest").unwrap());

    *msg.get_mut::<StructValue>("ss_header").unwrap().get_mut::<u32>("uid").unwrap() = 505;
    *msg.get_mut::<u8>("uint8").unwrap() = 1;
    *msg.get_mut::<bool>("boolean").unwrap() = true;
    *msg.get_mut::<f32>("float_type").unwrap() = 10.9;
    *msg.get_mut::<f64>("double_type").unwrap() = 11.9;

    // 505 = 0x1F9; narrowing to u8 keeps the low byte.
    assert_eq!(msg.get::<StructValue>("ss_header").unwrap().convert::<u8>("uid").unwrap(), 249);
    assert!((msg.convert::<f32>("uint8").unwrap() - 1.0).abs() < f32::EPSILON);
    assert_eq!(msg.convert::<u8>("boolean").unwrap(), 1);
    // Float-to-int conversion truncates toward zero.
    assert_eq!(msg.convert::<u8>("float_type").unwrap(), 10);
    assert_eq!(msg.convert::<u8>("double_type").unwrap(), 11);
}

#[test]
fn get_if_and_convert_if() {
    let types = types();
    let mut msg = StructValue::new(types.get("PrimitiveTest").unwrap());
    *msg.get_mut::<u8>("uint8").unwrap() = 1;

    assert_eq!(msg.get_if::<u8>("uint9").unwrap(), None);
    assert_eq!(msg.get_if::<u8>("uint8").unwrap(), Some(&1));
    assert_eq!(msg.convert_if::<f32>("uint9").unwrap(), None);
    assert_eq!(msg.convert_if::<f32>("uint8").unwrap(), Some(1.0));
}

#[test]
fn primitive_test_wire_layout() {
    let types = types();
    let mut msg = StructValue::new(types.get("PrimitiveTest").unwrap());

    *msg.get_mut::<u8>("uint8").unwrap() = 0x01;
    *msg.get_mut::<u16>("uint16").unwrap() = 0x0201;
    *msg.get_mut::<u32>("uint32").unwrap() = 0x0403_0201;
    *msg.get_mut::<u64>("uint64").unwrap() = 0x0807_0605_0403_0201;
    *msg.get_mut::<i8>("int8").unwrap() = 0x01;
    *msg.get_mut::<i16>("int16").unwrap() = 0x0201;
    *msg.get_mut::<i32>("int32").unwrap() = 0x0403_0201;
    *msg.get_mut::<i64>("int64").unwrap() = 0x0807_0605_0403_0201;
    *msg.get_mut::<bool>("boolean").unwrap() = true;
    *msg.get_mut::<f32>("float_type").unwrap() = 3.141_592_6;
    *msg.get_mut::<f64>("double_type").unwrap() = 3.141_592_6;
    finalize_message(&mut msg).unwrap();

    let bytes = pack_to_vec(&msg);
    assert_eq!(bytes.len(), 49);

    // Header: uid 710579723 (0x2A5A960B) then len 49, both big-endian.
    assert_eq!(hex::encode(&bytes[..6]), "2a5a960b0031");
    assert_eq!(hex::encode(&bytes[9..13]), "04030201");
    assert_eq!(hex::encode(&bytes[28..36]), "0807060504030201");
    assert_eq!(hex::encode(&bytes[37..41]), "40490fda");
    assert_eq!(hex::encode(&bytes[41..49]), "400921fb4d12d84a");
    assert_eq!(bytes[36], 0x01); // boolean

    // Unpacking the bytes reproduces the tree exactly.
    let back = unpack_message(&bytes, &types).unwrap();
    assert_eq!(back, msg);
}

#[test]
fn bitfield_wire_layout() {
    let types = types();
    let mut msg = StructValue::new(types.get("Bitfield4BytesTest").unwrap());

    {
        let bitfield = msg.get_mut::<StructValue>("bitfield").unwrap();
        *bitfield.get_mut::<u8>("field0").unwrap() = 6;
        *bitfield.get_mut::<u8>("field1").unwrap() = 27;
        *bitfield.get_mut::<u16>("field2").unwrap() = 264;
    }
    finalize_message(&mut msg).unwrap();

    let bytes = pack_to_vec(&msg);
    assert_eq!(hex::encode(&bytes[6..10]), "000108de");

    let back = unpack_message(&bytes, &types).unwrap();
    let bitfield = back.get::<StructValue>("bitfield").unwrap();
    assert_eq!(*bitfield.get::<u8>("field0").unwrap(), 6);
    assert_eq!(*bitfield.get::<u8>("field1").unwrap(), 27);
    assert_eq!(*bitfield.get::<u16>("field2").unwrap(), 264);
}

#[test]
fn enum_wire_width() {
    let types = types();

    // One-byte enum: a single index byte after the header.
    let mut msg = StructValue::new(types.get("Enum1BytesTest").unwrap());
    *msg.get_mut::<i8>("enumeration").unwrap() = 3;
    finalize_message(&mut msg).unwrap();
    let bytes = pack_to_vec(&msg);
    assert_eq!(bytes.len(), 7);
    assert_eq!(bytes[6], 3);

    // Two-byte enum: index 128 is written big-endian in its width.
    let mut msg = StructValue::new(types.get("Enum2BytesTest").unwrap());
    *msg.get_mut::<i16>("enumeration").unwrap() = 128;
    finalize_message(&mut msg).unwrap();
    let bytes = pack_to_vec(&msg);
    assert_eq!(bytes.len(), 8);
    assert_eq!(&bytes[6..8], &[0x00, 0x80]);
}

#[test]
fn nested_array_access() {
    let types = types();
    let mut msg = StructValue::new(types.get("ArrayTest").unwrap());

    {
        let array_3d = msg.get_mut::<ArrayValue>("array_3d").unwrap();
        let array_2d = array_3d.get_mut::<ArrayValue>(0).unwrap();
        let array_1d = array_2d.get_mut::<ArrayValue>(1).unwrap();
        let elem = array_1d.get_mut::<StructValue>(2).unwrap();
        *elem.get_mut::<u16>("field1").unwrap() = 5;
    }
    finalize_message(&mut msg).unwrap();

    let bytes = pack_to_vec(&msg);
    assert_eq!(bytes.len(), 51);
    // array_3d starts at offset 33; [0][1][2].field1 is its last two bytes.
    assert_eq!(&bytes[49..51], &[0x00, 0x05]);

    let back = unpack_message(&bytes, &types).unwrap();
    let field1 = *back
        .get::<ArrayValue>("array_3d")
        .unwrap()
        .get::<ArrayValue>(0)
        .unwrap()
        .get::<ArrayValue>(1)
        .unwrap()
        .get::<StructValue>(2)
        .unwrap()
        .get::<u16>("field1")
        .unwrap();
    assert_eq!(field1, 5);

    // Untouched elements stay zeroed.
    let zero = *back
        .get::<ArrayValue>("array_1d")
        .unwrap()
        .get::<StructValue>(0)
        .unwrap()
        .get::<u16>("field1")
        .unwrap();
    assert_eq!(zero, 0);
}

#[test]
fn unpack_message_validates_header_first() {
    let types = types();
    let mut msg = StructValue::new(types.get("Enum1BytesTest").unwrap());
    finalize_message(&mut msg).unwrap();
    let bytes = pack_to_vec(&msg);

    // Length disagreement between header and buffer.
    let err = unpack_message(&bytes[..6], &types).unwrap_err();
    assert_eq!(err, UnpackError::InvalidLen { expected: 7, actual: 6 });

    // Unknown UID.
    let mut forged = bytes.clone();
    forged[0] ^= 0xFF;
    assert!(matches!(
        unpack_message(&forged, &types),
        Err(UnpackError::InvalidUid { .. })
    ));
}

#[test]
fn deep_copy_preserves_descriptor_reference() {
    let types = types();
    let mut msg = StructValue::new(types.get("PrimitiveTest").unwrap());
    *msg.get_mut::<u8>("uint8").unwrap() = 1;

    let mut copy = msg.clone();
    *copy.get_mut::<u8>("uint8").unwrap() = 2;

    assert_eq!(*msg.get::<u8>("uint8").unwrap(), 1);
    assert_eq!(*copy.get::<u8>("uint8").unwrap(), 2);
    assert!(std::sync::Arc::ptr_eq(msg.descriptor(), copy.descriptor()));
}
