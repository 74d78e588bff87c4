//! Mount configuration via TOML
//!
//! A mount file lists the mounts to register at startup, one `[[mount]]`
//! table each. Build a [`MountTable`](crate::MountTable) from it with
//! [`MountTable::from_config`](crate::MountTable::from_config).

use crate::mount::AccessMode;
use recio_core::Error;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// Which backend serves a mount.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum BackendKind {
    /// Host filesystem (default)
    #[default]
    Std,
    /// Fresh in-process backend
    Memory,
}

/// One mount entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountEntry {
    /// Mount id
    pub id: u32,
    /// Root location inside the backend
    pub root: PathBuf,
    /// `"read-only"` (default) or `"read-write"`
    #[serde(default)]
    pub access: AccessMode,
    /// `"std"` (default) or `"memory"`
    #[serde(default)]
    pub backend: BackendKind,
}

/// Mount configuration.
///
/// # Example
///
/// ```toml
/// [[mount]]
/// id = 0
/// root = "/var/lib/app/records"
/// access = "read-write"
///
/// [[mount]]
/// id = 1
/// root = "/usr/share/app/assets"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MountConfig {
    /// Mounts in declaration order
    #[serde(default, rename = "mount")]
    pub mounts: Vec<MountEntry>,
}

impl MountConfig {
    /// Parse a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, MountConfigError> {
        let config: MountConfig =
            toml::from_str(content).map_err(|e| MountConfigError::Parse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Read and parse a config file.
    pub fn from_file(path: &Path) -> Result<Self, MountConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| MountConfigError::Io {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    /// Serialize to TOML and write to `path`.
    pub fn write_to_file(&self, path: &Path) -> Result<(), MountConfigError> {
        let content =
            toml::to_string_pretty(self).map_err(|e| MountConfigError::Serialize(e.to_string()))?;
        std::fs::write(path, content).map_err(|e| MountConfigError::Io {
            path: path.to_path_buf(),
            detail: e.to_string(),
        })
    }

    /// Check ids are unique and roots non-empty.
    pub fn validate(&self) -> Result<(), MountConfigError> {
        let mut seen = BTreeSet::new();
        for entry in &self.mounts {
            if !seen.insert(entry.id) {
                return Err(MountConfigError::DuplicateId(entry.id));
            }
            if entry.root.as_os_str().is_empty() {
                return Err(MountConfigError::EmptyRoot(entry.id));
            }
        }
        Ok(())
    }
}

/// Mount configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MountConfigError {
    /// Config file could not be read or written
    #[error("mount config {}: {detail}", path.display())]
    Io {
        /// Config file path
        path: PathBuf,
        /// Underlying error
        detail: String,
    },

    /// Invalid TOML or unknown values
    #[error("failed to parse mount config: {0}")]
    Parse(String),

    /// Config could not be rendered as TOML
    #[error("failed to serialize mount config: {0}")]
    Serialize(String),

    /// Two entries share an id
    #[error("mount id {0} is declared twice")]
    DuplicateId(u32),

    /// Entry without a root
    #[error("mount {0} has an empty root")]
    EmptyRoot(u32),
}

impl From<MountConfigError> for Error {
    fn from(e: MountConfigError) -> Self {
        Error::Config(e.to_string())
    }
}
