//! In-process backend.
//!
//! Files live in a map keyed by location, so several mounts can share one
//! backend under different roots. All data is lost on drop. A read-only
//! instance behaves like an archive: it serves whatever was inserted before
//! it was mounted and refuses writes.

use crate::backend::{Backend, BoxSink, Capabilities, DirIter, DirNode, OpenMode};
use crate::mount::ResolvedPath;
use crate::path::VPath;
use parking_lot::RwLock;
use recio_core::sink::seek_target;
use recio_core::{Error, Result, Sink};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

#[derive(Debug)]
struct MemFile {
    data: Vec<u8>,
    modified: SystemTime,
}

#[derive(Debug, Clone)]
enum Entry {
    File(Arc<RwLock<MemFile>>),
    Dir { modified: SystemTime },
}

/// In-memory backend.
#[derive(Debug, Default)]
pub struct MemoryBackend {
    entries: RwLock<BTreeMap<PathBuf, Entry>>,
    read_only: bool,
}

impl MemoryBackend {
    /// Create an empty, writable backend.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create an empty backend that refuses writes through sinks.
    ///
    /// [`insert`](Self::insert) and [`create_dir`](Self::create_dir) still
    /// work, for populating it before mounting.
    pub fn read_only() -> Self {
        MemoryBackend {
            entries: RwLock::new(BTreeMap::new()),
            read_only: true,
        }
    }

    /// Store `data` at `location`, creating parent directories.
    pub fn insert(&self, location: impl Into<PathBuf>, data: impl Into<Vec<u8>>) {
        let location = location.into();
        let mut entries = self.entries.write();
        ensure_parents(&mut entries, &location);
        entries.insert(
            location,
            Entry::File(Arc::new(RwLock::new(MemFile {
                data: data.into(),
                modified: SystemTime::now(),
            }))),
        );
    }

    /// Create a directory and its parents.
    pub fn create_dir(&self, location: impl Into<PathBuf>) {
        let location = location.into();
        let mut entries = self.entries.write();
        ensure_parents(&mut entries, &location);
        entries.entry(location).or_insert(Entry::Dir {
            modified: SystemTime::now(),
        });
    }

    /// Contents of the file at `location`.
    pub fn file_bytes(&self, location: impl AsRef<Path>) -> Option<Vec<u8>> {
        match self.entries.read().get(location.as_ref()) {
            Some(Entry::File(file)) => Some(file.read().data.clone()),
            _ => None,
        }
    }
}

fn ensure_parents(entries: &mut BTreeMap<PathBuf, Entry>, location: &Path) {
    for ancestor in location.ancestors().skip(1) {
        if ancestor.as_os_str().is_empty() {
            break;
        }
        entries
            .entry(ancestor.to_path_buf())
            .or_insert(Entry::Dir {
                modified: SystemTime::now(),
            });
    }
}

/// Iterator over the entries a directory held when iteration started.
///
/// Entries added or removed later are not seen. Nodes are built on demand,
/// so a file's size and modification time are read when it is reached.
struct MemDirIter {
    dir: VPath,
    base: PathBuf,
    listed: std::vec::IntoIter<(PathBuf, Entry)>,
}

impl Iterator for MemDirIter {
    type Item = Result<DirNode>;

    fn next(&mut self) -> Option<Self::Item> {
        let (location, entry) = self.listed.next()?;
        let rel = match location.strip_prefix(&self.base) {
            Ok(rel) => rel.to_string_lossy().into_owned(),
            Err(_) => return Some(Err(Error::invalid_path(location.display().to_string()))),
        };
        Some(self.dir.join(&rel).map(|path| node_of(path, location, &entry)))
    }
}

fn node_of(path: VPath, location: PathBuf, entry: &Entry) -> DirNode {
    match entry {
        Entry::File(file) => {
            let file = file.read();
            DirNode {
                path,
                location,
                is_dir: false,
                size: file.data.len() as u64,
                modified: Some(file.modified),
            }
        }
        Entry::Dir { modified } => DirNode {
            path,
            location,
            is_dir: true,
            size: 0,
            modified: Some(*modified),
        },
    }
}

impl Backend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn capabilities(&self) -> Capabilities {
        if self.read_only {
            Capabilities::READ_ONLY
        } else {
            Capabilities::ALL
        }
    }

    fn open(&self, path: &ResolvedPath, mode: OpenMode) -> Result<BoxSink> {
        if mode.is_write() && self.read_only {
            return Err(Error::permission_denied(format!(
                "memory backend is read-only: {path}"
            )));
        }

        let location = path.location();
        let mut entries = self.entries.write();
        let file = match entries.get(&location) {
            Some(Entry::File(file)) => Arc::clone(file),
            Some(Entry::Dir { .. }) => {
                return Err(Error::invalid_operation(format!("{path} is a directory")))
            }
            None if mode.creates() => {
                ensure_parents(&mut entries, &location);
                let file = Arc::new(RwLock::new(MemFile {
                    data: Vec::new(),
                    modified: SystemTime::now(),
                }));
                entries.insert(location, Entry::File(Arc::clone(&file)));
                file
            }
            None => return Err(Error::not_found(path.to_string())),
        };
        drop(entries);

        let mut pos = 0;
        match mode {
            OpenMode::Write => {
                let mut guard = file.write();
                guard.data.clear();
                guard.modified = SystemTime::now();
            }
            OpenMode::Append => pos = file.read().data.len(),
            OpenMode::Read | OpenMode::ReadWrite => {}
        }

        Ok(Box::new(MemFileSink {
            file,
            pos,
            writable: mode.is_write(),
        }))
    }

    fn iterate(&self, path: &ResolvedPath, recursive: bool) -> Result<DirIter> {
        let base = path.location();
        let entries = self.entries.read();
        match entries.get(&base) {
            Some(Entry::Dir { .. }) => {}
            Some(Entry::File(_)) => {
                return Err(Error::invalid_operation(format!("{path} is not a directory")))
            }
            None if path.path.is_root() => {}
            None => return Err(Error::not_found(path.to_string())),
        }

        // Locations sort component-wise, so a range walk is already pre-order.
        let mut listed = Vec::new();
        for (location, entry) in entries.range(base.clone()..) {
            let depth = match location.strip_prefix(&base) {
                Ok(rel) => rel.components().count(),
                Err(_) => break,
            };
            if depth == 0 || (!recursive && depth > 1) {
                continue;
            }
            listed.push((location.clone(), entry.clone()));
        }
        Ok(Box::new(MemDirIter {
            dir: path.path.clone(),
            base,
            listed: listed.into_iter(),
        }))
    }

    fn stat(&self, path: &ResolvedPath) -> Result<DirNode> {
        let location = path.location();
        let entries = self.entries.read();
        match entries.get(&location) {
            Some(entry) => Ok(node_of(path.path.clone(), location, entry)),
            None if path.path.is_root() => Ok(DirNode {
                path: path.path.clone(),
                location,
                is_dir: true,
                size: 0,
                modified: None,
            }),
            None => Err(Error::not_found(path.to_string())),
        }
    }
}

/// Sink over a file in a [`MemoryBackend`].
///
/// Writes land in the backend immediately, so another handle on the same
/// file sees them.
#[derive(Debug)]
pub struct MemFileSink {
    file: Arc<RwLock<MemFile>>,
    pos: usize,
    writable: bool,
}

impl MemFileSink {
    fn check_writable(&self) -> Result<()> {
        if self.writable {
            Ok(())
        } else {
            Err(Error::permission_denied("file was opened for reading"))
        }
    }
}

impl Sink for MemFileSink {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.check_writable()?;
        let mut file = self.file.write();
        // Another handle may have truncated below our cursor.
        let start = self.pos.min(file.data.len());
        let overlap = data.len().min(file.data.len() - start);
        file.data[start..start + overlap].copy_from_slice(&data[..overlap]);
        file.data.extend_from_slice(&data[overlap..]);
        file.modified = SystemTime::now();
        self.pos = start + data.len();
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let file = self.file.read();
        let start = self.pos.min(file.data.len());
        let n = buf.len().min(file.data.len() - start);
        buf[..n].copy_from_slice(&file.data[start..start + n]);
        self.pos = start + n;
        Ok(n)
    }

    fn seek(&mut self, distance: i64) -> Result<()> {
        let len = self.file.read().data.len() as u64;
        self.pos = seek_target(self.pos as u64, distance, len)? as usize;
        Ok(())
    }

    fn remaining(&self) -> u64 {
        self.file.read().data.len().saturating_sub(self.pos) as u64
    }

    fn truncate(&mut self) -> Result<()> {
        self.check_writable()?;
        let mut file = self.file.write();
        if self.pos < file.data.len() {
            file.data.truncate(self.pos);
            file.modified = SystemTime::now();
        }
        Ok(())
    }
}
