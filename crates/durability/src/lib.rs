//! RecordIO streams for recio
//!
//! A RecordIO stream is a sequence of opaque byte records, each prefixed with
//! its length as a varint:
//!
//! ```text
//! stream := record*
//! record := varuint(length) payload[length]
//! ```
//!
//! There is no header, footer, checksum or record count, so appending is O(1)
//! and never rewrites earlier bytes. Readers tell a clean end of stream
//! (`NotFound`) apart from a record cut short by a torn write
//! (`IncompleteEntry`), and [`RecordReader::scan`] locates the last complete
//! record so the tail can be truncated before appending resumes.
//!
//! - Writer: [`RecordWriter`] appends frames at the sink cursor
//! - Reader: [`RecordReader`] reads, skips and scans forward
//! - Config: [`RecordIoConfig`] record size limit and sync policy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod reader;
pub mod writer;

pub use config::{RecordIoConfig, RecordIoConfigError};
pub use reader::{RecordReader, Records, ScanReport, StopReason};
pub use writer::{RecordCounters, RecordWriter};
