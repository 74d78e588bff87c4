//! Storage layer for recio
//!
//! This crate resolves mount-relative paths to backend-native locations and
//! opens them as sinks:
//! - VPath: normalized, mount-relative paths
//! - MountTable: mount id -> (root, access mode, backend)
//! - Backend: capability-based trait (open, iterate, stat)
//! - Backends: host filesystem (`StdFsBackend`) and in-process (`MemoryBackend`)
//! - MountConfig: `[[mount]]` tables loaded from TOML
//!
//! # Example
//!
//! ```no_run
//! use recio_storage::{AccessMode, MountId, MountTable, OpenMode, VPath};
//!
//! let table = MountTable::new();
//! table.mount(MountId(0), "/var/lib/app", AccessMode::ReadWrite)?;
//! let _sink = table.open(MountId(0), &VPath::parse("records/today.rio")?, OpenMode::Append)?;
//! # Ok::<(), recio_core::Error>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod backend;
pub mod backends;
pub mod config;
pub mod mount;
pub mod path;

pub use backend::{Backend, BoxSink, Capabilities, DirIter, DirNode, OpenMode};
pub use backends::{FileSink, MemFileSink, MemoryBackend, StdFsBackend};
pub use config::{BackendKind, MountConfig, MountConfigError, MountEntry};
pub use mount::{AccessMode, MountId, MountInfo, MountTable, ResolvedPath};
pub use path::VPath;
