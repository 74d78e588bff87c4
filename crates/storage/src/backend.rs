//! Storage backend trait.
//!
//! A backend turns a [`ResolvedPath`] into sinks and directory listings.
//! Backends implement only what they support; the default method bodies
//! report `Unsupported`, and [`Capabilities`] lets the mount table refuse an
//! operation before the backend is called.

use crate::mount::ResolvedPath;
use crate::path::VPath;
use recio_core::{Error, Result, Sink};
use std::fmt;
use std::path::PathBuf;
use std::time::SystemTime;

/// Boxed sink handed out by [`Backend::open`].
pub type BoxSink = Box<dyn Sink + Send>;

/// Lazy, finite, forward-only sequence of directory nodes.
///
/// A backend may fix the set of entries when iteration starts; node details
/// are read as each node is reached.
pub type DirIter = Box<dyn Iterator<Item = Result<DirNode>> + Send>;

/// How a file is opened.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OpenMode {
    /// Existing file, read only, cursor at the start
    Read,
    /// Create or truncate, cursor at the start
    Write,
    /// Create if missing, cursor at the end
    Append,
    /// Existing file, read and write, cursor at the start
    ReadWrite,
}

impl OpenMode {
    /// Whether this mode can modify the file.
    pub fn is_write(self) -> bool {
        !matches!(self, OpenMode::Read)
    }

    /// Whether this mode creates a missing file.
    pub fn creates(self) -> bool {
        matches!(self, OpenMode::Write | OpenMode::Append)
    }
}

/// Operations a backend supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    /// Open for reading
    pub read: bool,
    /// Open for writing, appending or read-write
    pub write: bool,
    /// Directory iteration
    pub iterate: bool,
    /// Stat
    pub stat: bool,
}

impl Capabilities {
    /// Everything.
    pub const ALL: Capabilities = Capabilities {
        read: true,
        write: true,
        iterate: true,
        stat: true,
    };

    /// Everything except writes.
    pub const READ_ONLY: Capabilities = Capabilities {
        read: true,
        write: false,
        iterate: true,
        stat: true,
    };

    /// Whether a file may be opened in `mode`.
    pub fn allows(&self, mode: OpenMode) -> bool {
        if mode.is_write() {
            self.write
        } else {
            self.read
        }
    }
}

/// Snapshot of one filesystem entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirNode {
    /// Mount-relative path
    pub path: VPath,
    /// Backend-native location
    pub location: PathBuf,
    /// Whether the entry is a directory
    pub is_dir: bool,
    /// Size in bytes (0 for directories)
    pub size: u64,
    /// Last modification time, when the backend knows it
    pub modified: Option<SystemTime>,
}

/// A storage backend.
pub trait Backend: Send + Sync + fmt::Debug {
    /// Short name for logs and mount listings.
    fn name(&self) -> &'static str;

    /// Supported operations.
    fn capabilities(&self) -> Capabilities;

    /// Open the file at `path` as a sink.
    fn open(&self, path: &ResolvedPath, mode: OpenMode) -> Result<BoxSink> {
        let _ = mode;
        Err(Error::unsupported(format!("{} cannot open {}", self.name(), path)))
    }

    /// List the directory at `path`. With `recursive`, nested directories are
    /// expanded depth-first right after their own node; otherwise they are
    /// reported as single nodes.
    fn iterate(&self, path: &ResolvedPath, recursive: bool) -> Result<DirIter> {
        let _ = recursive;
        Err(Error::unsupported(format!(
            "{} cannot iterate {}",
            self.name(),
            path
        )))
    }

    /// Describe the entry at `path`.
    fn stat(&self, path: &ResolvedPath) -> Result<DirNode> {
        Err(Error::unsupported(format!("{} cannot stat {}", self.name(), path)))
    }
}
