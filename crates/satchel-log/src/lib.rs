//! # Satchel Log: Reading Schema-Headed Binary Logs
//!
//! A satchel log file is two concatenated regions:
//!
//! ```text
//! [YAML schema bytes]
//! [delimiter]                    <- fixed sentinel, see LOG_DELIMITER
//! [record 0][record 1]...        <- length-prefixed packed messages
//! ```
//!
//! The header is the schema itself, so a log is self-describing: the reader
//! re-parses it into a descriptor graph, then streams the body through a
//! buffered framer that resolves each record's UID against that graph and
//! hands matching records to the consumer in strict file order.
//!
//! ## Failure Policy
//!
//! A record whose UID nothing registered is not an error: logs routinely
//! carry message types a given consumer does not care about; those records
//! are skipped (and counted at `debug` level). A record whose UID *is*
//! registered but whose length disagrees with the descriptor is corruption
//! and is surfaced. A body that ends mid-header or mid-record is corruption;
//! a body that ends exactly on a record boundary is clean termination.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod delimiter;
pub mod dispatch;
pub mod errors;
pub mod framer;
pub mod reader;

pub use delimiter::LOG_DELIMITER;
pub use dispatch::Dispatcher;
pub use errors::{LogError, Result};
pub use reader::LogReader;
