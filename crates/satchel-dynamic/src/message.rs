//! Schema-driven unpacking of whole messages.
//!
//! Every message on the wire starts with the 6-byte `SsHeader` (`uid: u32`,
//! `len: u16`, both big-endian). [`unpack_message`] validates the header
//! against the type graph and materialises the full record as a
//! [`StructValue`].

use satchel_schema::{builder::HEADER_PACKED_SIZE, DescriptorBuilder};
use satchel_wire::WireScalar;

use crate::errors::UnpackError;
use crate::value::StructValue;

/// Unpack one complete wire record into a dynamic value tree.
///
/// Validation order mirrors the trust chain: the buffer must cover a header,
/// the header's `len` must equal the buffer length, the `uid` must name a
/// known message, and `len` must equal that message's packed size. Only then
/// is the tree built and filled (header field included).
///
/// # Errors
///
/// - [`UnpackError::InvalidLen`] if the buffer is shorter than a header, or
///   disagrees with the header's `len`, or `len` disagrees with the resolved
///   descriptor's packed size.
/// - [`UnpackError::InvalidUid`] if no message in `types` has the header's
///   UID.
pub fn unpack_message(
    buf: &[u8],
    types: &DescriptorBuilder,
) -> Result<StructValue, UnpackError> {
    if buf.len() < HEADER_PACKED_SIZE {
        return Err(UnpackError::InvalidLen { expected: HEADER_PACKED_SIZE, actual: buf.len() });
    }

    let uid = u32::unpack_be(buf);
    let len = usize::from(u16::unpack_be(&buf[4..]));

    if len != buf.len() {
        return Err(UnpackError::InvalidLen { expected: len, actual: buf.len() });
    }

    let descriptor =
        types.message_by_uid(uid).ok_or(UnpackError::InvalidUid { uid })?;

    if descriptor.packed_size() != len {
        return Err(UnpackError::InvalidLen {
            expected: descriptor.packed_size(),
            actual: len,
        });
    }

    let mut msg = StructValue::new(descriptor);
    msg.unpack(buf)?;
    Ok(msg)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn types() -> DescriptorBuilder {
        DescriptorBuilder::from_str(
            "Ping:\n  type: Message\n  fields:\n    - counter: uint32\n",
        )
        .expect("schema should parse")
    }

    fn ping_record(types: &DescriptorBuilder, counter: u32) -> Vec<u8> {
        let ping = types.get("Ping").unwrap();
        let mut buf = vec![0u8; ping.packed_size()];
        ping.uid().pack_be(&mut buf);
        (ping.packed_size() as u16).pack_be(&mut buf[4..]);
        counter.pack_be(&mut buf[6..]);
        buf
    }

    #[test]
    fn well_formed_record_unpacks() {
        let types = types();
        let buf = ping_record(&types, 41);

        let msg = unpack_message(&buf, &types).expect("record should unpack");
        assert_eq!(*msg.get::<u32>("counter").unwrap(), 41);

        let header = msg.get::<StructValue>("ss_header").unwrap();
        assert_eq!(*header.get::<u32>("uid").unwrap(), types.get("Ping").unwrap().uid());
        assert_eq!(*header.get::<u16>("len").unwrap(), 10);
    }

    #[test]
    fn truncated_buffer_is_invalid_len() {
        let types = types();
        let err = unpack_message(&[0x01, 0x02], &types).unwrap_err();
        assert_eq!(err, UnpackError::InvalidLen { expected: 6, actual: 2 });
    }

    #[test]
    fn header_len_must_match_buffer() {
        let types = types();
        let mut buf = ping_record(&types, 1);
        buf.push(0); // one trailing byte the header does not account for

        let err = unpack_message(&buf, &types).unwrap_err();
        assert_eq!(err, UnpackError::InvalidLen { expected: 10, actual: 11 });
    }

    #[test]
    fn unknown_uid_is_surfaced() {
        let types = types();
        let mut buf = ping_record(&types, 1);
        0xDEAD_BEEFu32.pack_be(&mut buf);

        let err = unpack_message(&buf, &types).unwrap_err();
        assert_eq!(err, UnpackError::InvalidUid { uid: 0xDEAD_BEEF });
    }
}
