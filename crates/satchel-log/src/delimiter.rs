//! The schema/body delimiter and its streaming matcher.

use std::io::Read;

/// Sentinel byte sequence separating the YAML schema header from the binary
/// record stream.
///
/// The NUL bytes cannot occur in YAML text (YAML is a textual format over
/// printable UTF-8), so the sentinel needs no escaping and cannot appear
/// early by accident. Writers emit it verbatim after the schema; readers
/// treat it as opaque and resume just past its last byte.
pub const LOG_DELIMITER: &[u8] = b"\x00SsLogDelim\x00";

/// Scan `source` from its current position for [`LOG_DELIMITER`].
///
/// Returns the offset of the byte immediately after the delimiter, or `None`
/// if the stream ends first. The match state survives buffer refills, so a
/// delimiter straddling a read boundary is still found.
///
/// # Errors
///
/// Propagates I/O errors from `source`.
pub fn find_delimiter<R: Read>(source: &mut R) -> std::io::Result<Option<u64>> {
    let mut buf = [0u8; 4096];
    let mut offset: u64 = 0;
    let mut matched = 0usize;

    loop {
        let n = source.read(&mut buf)?;
        if n == 0 {
            return Ok(None);
        }

        for &byte in &buf[..n] {
            if byte != LOG_DELIMITER[matched] {
                matched = 0;
            }
            // The delimiter's interior bytes never equal its first byte, so
            // restarting the match at the current byte is exact.
            if byte == LOG_DELIMITER[matched] {
                matched += 1;
                if matched == LOG_DELIMITER.len() {
                    return Ok(Some(offset + 1));
                }
            }
            offset += 1;
        }
    }
}
