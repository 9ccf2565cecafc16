//! Buffered streaming record extraction.
//!
//! [`BufferedRecordReader`] turns a byte stream into whole records without
//! loading the log into memory. It keeps a shift-and-fill buffer: when too
//! few unread bytes remain for the next header or record, unread bytes move
//! to the front and the tail refills from the source. Headers and records
//! are therefore always contiguous in the buffer; they are never split
//! across a shift boundary.
//!
//! Records larger than the buffer grow it to four times the record length,
//! which amortises the shifting cost when a stream of oversized records
//! would otherwise realign the buffer on every read.

use std::io::Read;

use tracing::trace;
use zerocopy::byteorder::{BigEndian, U16, U32};
use zerocopy::{FromBytes, Immutable, KnownLayout, Unaligned};

use satchel_dynamic::UnpackError;

use crate::errors::{LogError, Result};

/// The 6-byte record header: message UID and total record length, both
/// big-endian. Parsed as a zero-copy view over the buffer.
#[derive(FromBytes, KnownLayout, Immutable, Unaligned)]
#[repr(C)]
pub(crate) struct RecordHeader {
    uid: U32<BigEndian>,
    len: U16<BigEndian>,
}

impl RecordHeader {
    /// Serialized header size.
    pub(crate) const SIZE: usize = 6;

    pub(crate) fn uid(&self) -> u32 {
        self.uid.get()
    }

    pub(crate) fn len(&self) -> u16 {
        self.len.get()
    }
}

/// One extracted record: its UID and its full bytes, header included.
#[derive(Debug)]
pub(crate) struct Record<'a> {
    pub uid: u32,
    pub bytes: &'a [u8],
}

/// Shift-and-fill framer over a byte source.
pub(crate) struct BufferedRecordReader<R> {
    source: R,
    buf: Vec<u8>,
    /// Next unread byte within `buf`.
    index: usize,
    /// Valid bytes in `buf`.
    used: usize,
    /// Absolute stream offset of `buf[index]`, for diagnostics.
    offset: u64,
}

const DEFAULT_BUF_SIZE: usize = 4096;

impl<R: Read> BufferedRecordReader<R> {
    /// Wrap `source`, which must already be positioned at the first record.
    /// `start_offset` is that position, used only in error reports.
    pub(crate) fn new(source: R, start_offset: u64) -> Self {
        Self {
            source,
            buf: vec![0u8; DEFAULT_BUF_SIZE],
            index: 0,
            used: 0,
            offset: start_offset,
        }
    }

    /// Extract the next record, refilling from the source as needed.
    ///
    /// Returns `Ok(None)` on a clean end of stream (no bytes after the last
    /// record).
    ///
    /// # Errors
    ///
    /// [`LogError::CorruptedLogEnd`] if the stream ends mid-header or
    /// mid-record; [`LogError::Record`] if a header's `len` cannot cover the
    /// header itself; I/O errors from the source.
    pub(crate) fn next_record(&mut self) -> Result<Option<Record<'_>>> {
        if self.remaining() < RecordHeader::SIZE {
            self.shift_and_fill()?;

            if self.remaining() == 0 {
                return Ok(None);
            }
            if self.remaining() < RecordHeader::SIZE {
                return Err(LogError::CorruptedLogEnd { offset: self.offset });
            }
        }

        let header = RecordHeader::ref_from_prefix(&self.buf[self.index..])
            .map_err(|_| LogError::CorruptedLogEnd { offset: self.offset })?
            .0;
        let uid = header.uid();
        let len = usize::from(header.len());

        // A record's length covers its own header; anything shorter cannot
        // frame and would stall the stream.
        if len < RecordHeader::SIZE {
            return Err(LogError::Record(UnpackError::InvalidLen {
                expected: RecordHeader::SIZE,
                actual: len,
            }));
        }

        if 4 * len > self.buf.len() {
            trace!(record_len = len, capacity = 4 * len, "growing framer buffer");
            self.buf.resize(4 * len, 0);
        }

        if len > self.remaining() {
            self.shift_and_fill()?;
            if len > self.remaining() {
                return Err(LogError::CorruptedLogEnd { offset: self.offset });
            }
        }

        let start = self.index;
        self.index += len;
        self.offset += len as u64;

        Ok(Some(Record { uid, bytes: &self.buf[start..start + len] }))
    }

    fn remaining(&self) -> usize {
        self.used - self.index
    }

    /// Move unread bytes to the buffer front and refill the tail.
    fn shift_and_fill(&mut self) -> std::io::Result<()> {
        let carried = self.remaining();
        self.buf.copy_within(self.index..self.used, 0);
        self.used = carried;
        self.index = 0;

        while self.used < self.buf.len() {
            let n = self.source.read(&mut self.buf[self.used..])?;
            if n == 0 {
                break;
            }
            self.used += n;
        }
        trace!(offset = self.offset, carried, filled = self.used, "framer refill");
        Ok(())
    }
}
