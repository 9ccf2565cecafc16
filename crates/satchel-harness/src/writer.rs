//! Minimal log writer for producing reader inputs in tests.
//!
//! Mirrors the logging side's file layout: schema text, then the delimiter,
//! then packed records back to back. No buffering or rotation; tests write
//! small logs.

use std::io::{self, Write};

use satchel_dynamic::StructValue;
use satchel_log::LOG_DELIMITER;

use crate::packer::{finalize_message, pack_to_vec};

/// Writes the satchel log layout to any byte sink.
#[derive(Debug)]
pub struct LogWriter<W> {
    out: W,
}

impl<W: Write> LogWriter<W> {
    /// Wrap a sink.
    pub fn new(out: W) -> Self {
        Self { out }
    }

    /// Write the schema header followed by the delimiter.
    ///
    /// Must be called exactly once, before any records.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the sink.
    pub fn write_header(&mut self, schema_text: &str) -> io::Result<()> {
        self.out.write_all(schema_text.as_bytes())?;
        self.out.write_all(LOG_DELIMITER)
    }

    /// Stamp `msg`'s header and append its packed record.
    ///
    /// # Errors
    ///
    /// `InvalidInput` if `msg` is not a message type; otherwise I/O errors
    /// from the sink.
    pub fn write_message(&mut self, msg: &mut StructValue) -> io::Result<()> {
        finalize_message(msg)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
        self.out.write_all(&pack_to_vec(msg))
    }

    /// Append raw record bytes verbatim (for crafting corrupt logs).
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the sink.
    pub fn write_raw(&mut self, bytes: &[u8]) -> io::Result<()> {
        self.out.write_all(bytes)
    }

    /// Flush and hand back the sink.
    ///
    /// # Errors
    ///
    /// Propagates I/O errors from the flush.
    pub fn finish(mut self) -> io::Result<W> {
        self.out.flush()?;
        Ok(self.out)
    }
}
