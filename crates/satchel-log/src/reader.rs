//! The log reader: locate the schema/body boundary, re-parse the schema,
//! stream the body.

use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};

use indexmap::IndexMap;
use tracing::{debug, warn};

use satchel_dynamic::{StructValue, UnpackError};
use satchel_schema::{DescriptorBuilder, SchemaError, TypeRef};

use crate::delimiter::{find_delimiter, LOG_DELIMITER};
use crate::errors::{LogError, Result};
use crate::framer::BufferedRecordReader;

/// A reader over one schema-headed binary log file.
///
/// Opening a reader parses the embedded schema once; each
/// [`load`](Self::load) streams the body from the start. A single reader is
/// not safe for concurrent use; independent readers on the same path are.
pub struct LogReader {
    path: PathBuf,
    file: File,
    binary_start: u64,
    types: DescriptorBuilder,
}

impl LogReader {
    /// Open a log file and parse its schema header.
    ///
    /// Scans for the delimiter, reads the bytes before it as UTF-8 YAML, and
    /// builds the descriptor graph from them. If the schema carries an
    /// `SsMessageUidMap`, each entry is cross-checked against the computed
    /// UID; disagreement means the log was written by a stale toolchain and
    /// is reported at `warn` level, with the computed value remaining
    /// authoritative.
    ///
    /// # Errors
    ///
    /// [`LogError::MissingDelimiter`] if the sentinel never appears;
    /// [`LogError::Schema`] if the header is not UTF-8 or not a valid
    /// schema; I/O errors from opening or reading the file.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut file = File::open(&path)?;

        let Some(binary_start) = find_delimiter(&mut file)? else {
            return Err(LogError::MissingDelimiter { path });
        };

        let header_len = binary_start as usize - LOG_DELIMITER.len();
        file.seek(SeekFrom::Start(0))?;
        let mut header = vec![0u8; header_len];
        file.read_exact(&mut header)?;

        let header = String::from_utf8(header).map_err(|_| {
            LogError::Schema(SchemaError::Parse("log header is not valid UTF-8".to_string()))
        })?;
        let types = DescriptorBuilder::from_str(&header)?;

        if let Some(declared) = types.declared_uid_map() {
            for msg in types.messages() {
                if let Some(&expected) = declared.get(msg.name()) {
                    if expected != msg.uid() {
                        warn!(
                            message = msg.name(),
                            declared = expected,
                            computed = msg.uid(),
                            "schema uid map disagrees with computed uid"
                        );
                    }
                }
            }
        }

        Ok(Self { path, file, binary_start, types })
    }

    /// The descriptor graph parsed from the log's own header.
    #[must_use]
    pub fn types(&self) -> &DescriptorBuilder {
        &self.types
    }

    /// The log's message descriptors, in schema declaration order.
    #[must_use]
    pub fn message_types(&self) -> &[TypeRef] {
        self.types.messages()
    }

    /// The path this reader was opened on.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Stream the body, delivering every record whose type is in `filter`
    /// to `on_record` in strict file order.
    ///
    /// Records of types outside the filter are skipped silently. A record
    /// whose UID *is* in the filter but whose length disagrees with the
    /// descriptor's packed size is corruption and aborts the stream.
    ///
    /// # Errors
    ///
    /// [`LogError::CorruptedLogEnd`] if the body ends mid-header or
    /// mid-record; [`LogError::Record`] on a length mismatch for a filtered
    /// type; any error returned by `on_record`; I/O errors from the file.
    pub fn load<F>(&mut self, filter: &[TypeRef], mut on_record: F) -> Result<()>
    where
        F: FnMut(&TypeRef, &[u8]) -> Result<()>,
    {
        let routes: HashMap<u32, TypeRef> =
            filter.iter().map(|ty| (ty.uid(), ty.clone())).collect();

        self.file.seek(SeekFrom::Start(self.binary_start))?;
        let mut records = BufferedRecordReader::new(&mut self.file, self.binary_start);

        let mut skipped: u64 = 0;
        while let Some(record) = records.next_record()? {
            let Some(descriptor) = routes.get(&record.uid) else {
                skipped += 1;
                continue;
            };

            if record.bytes.len() != descriptor.packed_size() {
                return Err(LogError::Record(UnpackError::InvalidLen {
                    expected: descriptor.packed_size(),
                    actual: record.bytes.len(),
                }));
            }

            on_record(descriptor, record.bytes)?;
        }

        if skipped > 0 {
            debug!(skipped, "records outside the load filter");
        }
        Ok(())
    }

    /// Stream the whole body once and return, for every message type the
    /// schema declares, a dynamic value tree holding that type's most
    /// recent record.
    ///
    /// Types with no record in the body come back zeroed; earlier records
    /// of a type are overwritten in place by later ones.
    ///
    /// # Errors
    ///
    /// As [`load`](Self::load).
    pub fn load_all(&mut self) -> Result<IndexMap<String, StructValue>> {
        let messages: Vec<TypeRef> = self.types.messages().to_vec();
        let mut latest: IndexMap<String, StructValue> = messages
            .iter()
            .map(|msg| (msg.name().to_string(), StructValue::new(msg)))
            .collect();

        self.load(&messages, |descriptor, bytes| {
            if let Some(value) = latest.get_mut(descriptor.name()) {
                value.unpack(bytes).map_err(LogError::Record)?;
            }
            Ok(())
        })?;

        Ok(latest)
    }
}

impl std::fmt::Debug for LogReader {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogReader")
            .field("path", &self.path)
            .field("binary_start", &self.binary_start)
            .field("types", &self.types)
            .finish_non_exhaustive()
    }
}
