//! recio - length-prefixed record streams over mountable storage
//!
//! # Quick Start
//!
//! ```no_run
//! use recio::{AccessMode, MountId, MountTable, OpenMode, RecordReader, RecordWriter, VPath};
//!
//! let table = MountTable::new();
//! table.mount(MountId(0), "/var/lib/app", AccessMode::ReadWrite)?;
//! let path = VPath::parse("events.rio")?;
//!
//! let mut sink = table.open(MountId(0), &path, OpenMode::Append)?;
//! RecordWriter::new(&mut sink)?.append(b"Hello World")?;
//! drop(sink);
//!
//! let mut sink = table.open(MountId(0), &path, OpenMode::Read)?;
//! for record in RecordReader::new(&mut sink)?.records() {
//!     println!("{} bytes", record?.len());
//! }
//! # Ok::<(), recio::Error>(())
//! ```
//!
//! # Architecture
//!
//! - `recio-core`: varint codec, [`Sink`], the [`Wire`] protocol, errors
//! - `recio-durability`: [`RecordWriter`] / [`RecordReader`]
//! - `recio-storage`: [`VPath`], [`MountTable`], backends
//!
//! This crate re-exports all three and adds [`recover`] for cutting a torn
//! tail off a mounted stream.

pub use recio_core::{
    from_bytes, status_of, to_bytes, Error, ErrorClass, MemorySink, Result, Sink, SliceSink,
    Status, VarInt, VarUInt, Wire,
};
pub use recio_durability::{
    RecordCounters, RecordIoConfig, RecordIoConfigError, RecordReader, RecordWriter, ScanReport,
    StopReason,
};
pub use recio_storage::{
    AccessMode, Backend, BackendKind, BoxSink, Capabilities, DirIter, DirNode, FileSink,
    MemoryBackend, MountConfig, MountEntry, MountId, MountInfo, MountTable, OpenMode,
    ResolvedPath, StdFsBackend, VPath,
};

use tracing::{info, warn};

/// Scan the stream at `path` on mount `id` and truncate anything after the
/// last complete record.
///
/// Run this before appending to a stream that may have been cut short by a
/// crash. A clean stream is left untouched. The mount must be read-write.
pub fn recover(table: &MountTable, id: MountId, path: &VPath) -> Result<ScanReport> {
    let mut sink = table.open(id, path, OpenMode::ReadWrite)?;
    let report = RecordReader::new(&mut sink)?.scan()?;

    if !report.is_clean() {
        warn!(
            mount = id.0,
            path = %path,
            valid_end = report.valid_end,
            bytes = report.bytes_to_truncate(),
            stop_reason = ?report.stop_reason,
            "Truncating damaged stream tail"
        );
        sink.truncate()?;
        sink.flush()?;
    }
    info!(mount = id.0, path = %path, records = report.records, "Recovered stream");
    Ok(report)
}

/// Read every record of the stream at `path` on mount `id`.
pub fn read_all(table: &MountTable, id: MountId, path: &VPath) -> Result<Vec<Vec<u8>>> {
    let mut sink = table.open(id, path, OpenMode::Read)?;
    let mut reader = RecordReader::new(&mut sink)?;
    let records = reader.records().collect::<Result<Vec<_>>>()?;
    Ok(records)
}
