//! Mount table.
//!
//! Maps small integer mount ids to a root location, an access mode and a
//! backend. A [`MountTable`] is an ordinary value: pass it to whatever needs
//! path resolution, and build as many independent tables as you like.
//!
//! Lookups take a read lock and (un)mounting takes a write lock. The lock is
//! released before any backend call, so a slow filesystem never blocks
//! other resolutions.

use crate::backend::{Backend, BoxSink, DirIter, DirNode, OpenMode};
use crate::backends::{MemoryBackend, StdFsBackend};
use crate::config::{BackendKind, MountConfig};
use crate::path::VPath;
use parking_lot::RwLock;
use recio_core::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{debug, warn};

/// Mount identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct MountId(pub u32);

impl fmt::Display for MountId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "mount:{}", self.0)
    }
}

impl From<u32> for MountId {
    fn from(id: u32) -> Self {
        MountId(id)
    }
}

/// Whether a mount accepts writes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum AccessMode {
    /// Reads only (default)
    #[default]
    ReadOnly,
    /// Reads and writes
    ReadWrite,
}

impl AccessMode {
    /// Whether writes are allowed.
    pub fn allows_write(self) -> bool {
        matches!(self, AccessMode::ReadWrite)
    }
}

/// Public description of a registered mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MountInfo {
    /// Mount id
    pub id: MountId,
    /// Root location inside the backend
    pub root: PathBuf,
    /// Access mode
    pub access: AccessMode,
    /// Backend name
    pub backend: &'static str,
}

#[derive(Debug, Clone)]
struct MountPoint {
    root: PathBuf,
    access: AccessMode,
    backend: Arc<dyn Backend>,
}

/// A path resolved against a mount.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedPath {
    /// Mount the path was resolved against
    pub mount: MountId,
    /// Root of that mount
    pub root: PathBuf,
    /// Mount-relative path
    pub path: VPath,
}

impl ResolvedPath {
    /// Create a resolved path.
    pub fn new(mount: MountId, root: impl Into<PathBuf>, path: VPath) -> Self {
        ResolvedPath {
            mount,
            root: root.into(),
            path,
        }
    }

    /// Backend-native location: the root followed by the path segments.
    pub fn location(&self) -> PathBuf {
        self.path.to_native(&self.root)
    }
}

impl fmt::Display for ResolvedPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.mount, self.path)
    }
}

/// Registry of mounts.
pub struct MountTable {
    mounts: RwLock<BTreeMap<MountId, MountPoint>>,
}

impl fmt::Debug for MountTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MountTable")
            .field("mounts", &self.mounts.read().len())
            .finish()
    }
}

impl Default for MountTable {
    fn default() -> Self {
        Self::new()
    }
}

impl MountTable {
    /// Create an empty mount table.
    pub fn new() -> Self {
        MountTable {
            mounts: RwLock::new(BTreeMap::new()),
        }
    }

    /// Build a table from a mount configuration.
    ///
    /// Memory-backed entries each get their own empty [`MemoryBackend`].
    pub fn from_config(config: &MountConfig) -> Result<Self> {
        config.validate()?;
        let table = Self::new();
        for entry in &config.mounts {
            let backend: Arc<dyn Backend> = match entry.backend {
                BackendKind::Std => Arc::new(StdFsBackend::new()),
                BackendKind::Memory => Arc::new(MemoryBackend::new()),
            };
            table.mount_backend(MountId(entry.id), entry.root.clone(), entry.access, backend)?;
        }
        Ok(table)
    }

    /// Mount a directory of the host filesystem.
    pub fn mount(&self, id: MountId, root: impl Into<PathBuf>, access: AccessMode) -> Result<()> {
        self.mount_backend(id, root, access, Arc::new(StdFsBackend::new()))
    }

    /// Mount `root` inside an arbitrary backend.
    ///
    /// Fails with `InvalidOperation` if `id` is already registered.
    pub fn mount_backend(
        &self,
        id: MountId,
        root: impl Into<PathBuf>,
        access: AccessMode,
        backend: Arc<dyn Backend>,
    ) -> Result<()> {
        let root = root.into();
        let mut mounts = self.mounts.write();
        if mounts.contains_key(&id) {
            return Err(Error::invalid_operation(format!("{id} is already mounted")));
        }

        debug!(
            mount = id.0,
            root = %root.display(),
            ?access,
            backend = backend.name(),
            "Mounted"
        );
        mounts.insert(
            id,
            MountPoint {
                root,
                access,
                backend,
            },
        );
        Ok(())
    }

    /// Remove a mount. Returns `false` if nothing was mounted under `id`.
    ///
    /// Sinks and iterators already handed out keep working.
    pub fn unmount(&self, id: MountId) -> bool {
        let removed = self.mounts.write().remove(&id).is_some();
        if removed {
            debug!(mount = id.0, "Unmounted");
        }
        removed
    }

    /// Whether `id` is registered.
    pub fn is_mounted(&self, id: MountId) -> bool {
        self.mounts.read().contains_key(&id)
    }

    /// All mounts, ordered by id.
    pub fn list_mounts(&self) -> Vec<MountInfo> {
        self.mounts
            .read()
            .iter()
            .map(|(id, point)| MountInfo {
                id: *id,
                root: point.root.clone(),
                access: point.access,
                backend: point.backend.name(),
            })
            .collect()
    }

    /// Resolve `path` against mount `id`.
    pub fn resolve(&self, id: MountId, path: &VPath) -> Result<ResolvedPath> {
        let (resolved, _) = self.lookup(id, path)?;
        Ok(resolved)
    }

    /// Open the file at `path` on mount `id`.
    ///
    /// Writes on a read-only mount, or on a backend without write support,
    /// fail with `PermissionDenied` before the backend is touched.
    pub fn open(&self, id: MountId, path: &VPath, mode: OpenMode) -> Result<BoxSink> {
        let (resolved, point) = self.lookup(id, path)?;

        if mode.is_write() && !point.access.allows_write() {
            warn!(mount = id.0, path = %path, ?mode, "Write refused on read-only mount");
            return Err(Error::permission_denied(format!(
                "{resolved} is on a read-only mount"
            )));
        }
        if !point.backend.capabilities().allows(mode) {
            return Err(Error::permission_denied(format!(
                "backend {} cannot open {resolved} as {mode:?}",
                point.backend.name()
            )));
        }

        debug!(mount = id.0, path = %path, ?mode, "Opening");
        point.backend.open(&resolved, mode)
    }

    /// List the directory at `path` on mount `id`.
    pub fn iterate(&self, id: MountId, path: &VPath, recursive: bool) -> Result<DirIter> {
        let (resolved, point) = self.lookup(id, path)?;
        if !point.backend.capabilities().iterate {
            return Err(Error::unsupported(format!(
                "backend {} cannot iterate {resolved}",
                point.backend.name()
            )));
        }
        point.backend.iterate(&resolved, recursive)
    }

    /// Describe the entry at `path` on mount `id`.
    pub fn stat(&self, id: MountId, path: &VPath) -> Result<DirNode> {
        let (resolved, point) = self.lookup(id, path)?;
        if !point.backend.capabilities().stat {
            return Err(Error::unsupported(format!(
                "backend {} cannot stat {resolved}",
                point.backend.name()
            )));
        }
        point.backend.stat(&resolved)
    }

    /// Resolve and clone the mount point so the lock can be dropped.
    fn lookup(&self, id: MountId, path: &VPath) -> Result<(ResolvedPath, MountPoint)> {
        let mounts = self.mounts.read();
        let point = mounts
            .get(&id)
            .ok_or_else(|| Error::not_found(format!("{id} is not mounted")))?
            .clone();
        Ok((ResolvedPath::new(id, point.root.clone(), path.clone()), point))
    }
}
