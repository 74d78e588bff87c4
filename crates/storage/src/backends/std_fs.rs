//! Host filesystem backend over `std::fs`.

use crate::backend::{Backend, BoxSink, Capabilities, DirIter, DirNode, OpenMode};
use crate::mount::ResolvedPath;
use crate::path::VPath;
use recio_core::sink::seek_target;
use recio_core::{Error, Result, Sink};
use std::fs::{self, File, Metadata, OpenOptions, ReadDir};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Backend that maps mounts onto directories of the host filesystem.
#[derive(Debug, Clone, Copy, Default)]
pub struct StdFsBackend;

impl StdFsBackend {
    /// Create the backend.
    pub fn new() -> Self {
        StdFsBackend
    }
}

impl Backend for StdFsBackend {
    fn name(&self) -> &'static str {
        "std"
    }

    fn capabilities(&self) -> Capabilities {
        Capabilities::ALL
    }

    fn open(&self, path: &ResolvedPath, mode: OpenMode) -> Result<BoxSink> {
        let location = path.location();
        if mode.creates() {
            if let Some(parent) = location.parent() {
                fs::create_dir_all(parent)
                    .map_err(|e| Error::from_io(e, parent.display()))?;
            }
        }

        let mut options = OpenOptions::new();
        match mode {
            OpenMode::Read => options.read(true),
            OpenMode::Write => options.read(true).write(true).create(true).truncate(true),
            OpenMode::Append => options.read(true).write(true).create(true),
            OpenMode::ReadWrite => options.read(true).write(true),
        };
        let file = options
            .open(&location)
            .map_err(|e| Error::from_io(e, location.display()))?;

        let mut sink = FileSink::new(file, location)?;
        if mode == OpenMode::Append {
            sink.seek_to_end()?;
        }
        debug!(path = %path, ?mode, len = sink.len(), "Opened file");
        Ok(Box::new(sink))
    }

    fn iterate(&self, path: &ResolvedPath, recursive: bool) -> Result<DirIter> {
        let location = path.location();
        let entries = fs::read_dir(&location).map_err(|e| Error::from_io(e, location.display()))?;
        Ok(Box::new(StdDirIter {
            stack: vec![(entries, path.path.clone())],
            recursive,
            pending: None,
        }))
    }

    fn stat(&self, path: &ResolvedPath) -> Result<DirNode> {
        let location = path.location();
        let meta = fs::metadata(&location).map_err(|e| Error::from_io(e, location.display()))?;
        Ok(node_from_metadata(path.path.clone(), location, &meta))
    }
}

fn node_from_metadata(path: VPath, location: PathBuf, meta: &Metadata) -> DirNode {
    let is_dir = meta.is_dir();
    DirNode {
        path,
        location,
        is_dir,
        size: if is_dir { 0 } else { meta.len() },
        modified: meta.modified().ok(),
    }
}

/// Lazy directory walk.
///
/// Keeps one open `ReadDir` per level being expanded. Symlinks are reported
/// as entries but never followed. A directory that cannot be opened for
/// expansion is still yielded; the open error follows it.
struct StdDirIter {
    stack: Vec<(ReadDir, VPath)>,
    recursive: bool,
    pending: Option<Error>,
}

impl Iterator for StdDirIter {
    type Item = Result<DirNode>;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(e) = self.pending.take() {
            return Some(Err(e));
        }
        loop {
            let (entries, dir) = self.stack.last_mut()?;
            let entry = match entries.next() {
                None => {
                    self.stack.pop();
                    continue;
                }
                Some(Err(e)) => return Some(Err(Error::Io(e))),
                Some(Ok(entry)) => entry,
            };

            let location = entry.path();
            let name = match entry.file_name().into_string() {
                Ok(name) => name,
                Err(raw) => {
                    return Some(Err(Error::invalid_path(format!(
                        "{raw:?} is not valid UTF-8"
                    ))))
                }
            };
            let path = match dir.join(&name) {
                Ok(path) => path,
                Err(e) => return Some(Err(e)),
            };

            // DirEntry::metadata does not traverse symlinks.
            let meta = match entry.metadata() {
                Ok(meta) => meta,
                Err(e) => return Some(Err(Error::from_io(e, location.display()))),
            };
            let node = node_from_metadata(path, location, &meta);

            if self.recursive && node.is_dir {
                match fs::read_dir(&node.location) {
                    Ok(children) => self.stack.push((children, node.path.clone())),
                    Err(e) => self.pending = Some(Error::from_io(e, node.location.display())),
                }
            }
            return Some(Ok(node));
        }
    }
}

/// Sink over a host file.
///
/// The first I/O failure is latched: every later call fails with
/// `SinkFailed` without touching the file, until
/// [`clear_failure`](Sink::clear_failure) re-reads the position and length
/// from the handle. The file is closed on drop.
#[derive(Debug)]
pub struct FileSink {
    file: File,
    location: PathBuf,
    pos: u64,
    len: u64,
    failure: Option<String>,
}

impl FileSink {
    /// Wrap an open file, cursor at the start.
    pub fn new(mut file: File, location: impl Into<PathBuf>) -> Result<Self> {
        let location = location.into();
        let len = file
            .metadata()
            .map_err(|e| Error::from_io(e, location.display()))?
            .len();
        file.seek(SeekFrom::Start(0))?;
        Ok(FileSink {
            file,
            location,
            pos: 0,
            len,
            failure: None,
        })
    }

    /// Native location of the file.
    pub fn location(&self) -> &Path {
        &self.location
    }

    /// Current file length.
    pub fn len(&self) -> u64 {
        self.len
    }

    /// Whether the file is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Cursor position.
    pub fn position(&self) -> u64 {
        self.pos
    }

    /// Sync data and metadata, then close the file.
    pub fn close(mut self) -> Result<()> {
        self.check()?;
        if let Err(e) = self.file.sync_all() {
            return Err(self.latch("close", e));
        }
        Ok(())
    }

    fn check(&self) -> Result<()> {
        match &self.failure {
            Some(reason) => Err(Error::SinkFailed(reason.clone())),
            None => Ok(()),
        }
    }

    fn latch(&mut self, op: &str, err: io::Error) -> Error {
        warn!(
            location = %self.location.display(),
            op,
            error = %err,
            "File sink failed"
        );
        self.failure = Some(format!("{op} on {} failed: {err}", self.location.display()));
        Error::Io(err)
    }
}

impl Sink for FileSink {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        self.check()?;
        if let Err(e) = self.file.write_all(data) {
            return Err(self.latch("write", e));
        }
        self.pos += data.len() as u64;
        self.len = self.len.max(self.pos);
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        self.check()?;
        match self.file.read(buf) {
            Ok(n) => {
                self.pos += n as u64;
                Ok(n)
            }
            Err(e) => Err(self.latch("read", e)),
        }
    }

    fn seek(&mut self, distance: i64) -> Result<()> {
        self.check()?;
        let target = seek_target(self.pos, distance, self.len)?;
        if let Err(e) = self.file.seek(SeekFrom::Start(target)) {
            return Err(self.latch("seek", e));
        }
        self.pos = target;
        Ok(())
    }

    fn remaining(&self) -> u64 {
        self.len.saturating_sub(self.pos)
    }

    fn flush(&mut self) -> Result<()> {
        self.check()?;
        if let Err(e) = self.file.sync_data() {
            return Err(self.latch("sync", e));
        }
        Ok(())
    }

    fn truncate(&mut self) -> Result<()> {
        self.check()?;
        if let Err(e) = self.file.set_len(self.pos) {
            return Err(self.latch("truncate", e));
        }
        self.len = self.pos;
        Ok(())
    }

    fn is_failed(&self) -> bool {
        self.failure.is_some()
    }

    fn clear_failure(&mut self) {
        if self.failure.take().is_none() {
            return;
        }
        if let Ok(pos) = self.file.stream_position() {
            self.pos = pos;
        }
        if let Ok(meta) = self.file.metadata() {
            self.len = meta.len();
        }
        debug!(location = %self.location.display(), pos = self.pos, "File sink failure cleared");
    }
}
