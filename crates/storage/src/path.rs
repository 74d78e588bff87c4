//! Mount-relative virtual paths.
//!
//! A [`VPath`] is normalized once, at construction:
//!
//! - `\` is treated as `/`
//! - empty and `.` segments are dropped
//! - `..` removes the previous segment
//! - a leading `/` is ignored, since every path is relative to a mount root
//!
//! `..` above the root and embedded NUL bytes are rejected with
//! `InvalidPath`. Two paths are equal exactly when their normalized forms
//! are, so `a//b/./c`, `a\b\c` and `/a/x/../b/c` all name the same location.

use recio_core::{Error, Result};
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

/// Normalized, `/`-separated, mount-relative path. The empty path is the
/// mount root.
#[derive(Debug, Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct VPath {
    normalized: String,
}

impl VPath {
    /// The mount root.
    pub fn root() -> Self {
        Self::default()
    }

    /// Parse and normalize `raw`.
    pub fn parse(raw: &str) -> Result<Self> {
        if raw.contains('\0') {
            return Err(Error::invalid_path(format!("{raw:?} contains NUL")));
        }

        let mut segments: Vec<&str> = Vec::new();
        for segment in raw.split(['/', '\\']) {
            match segment {
                "" | "." => {}
                ".." => {
                    if segments.pop().is_none() {
                        return Err(Error::invalid_path(format!(
                            "{raw:?} escapes the mount root"
                        )));
                    }
                }
                name => segments.push(name),
            }
        }

        Ok(VPath {
            normalized: segments.join("/"),
        })
    }

    /// Normalized form, without a leading `/`. Empty for the root.
    pub fn as_str(&self) -> &str {
        &self.normalized
    }

    /// Whether this is the mount root.
    pub fn is_root(&self) -> bool {
        self.normalized.is_empty()
    }

    /// Path segments in order.
    pub fn components(&self) -> impl Iterator<Item = &str> {
        self.normalized.split('/').filter(|s| !s.is_empty())
    }

    /// Number of segments.
    pub fn depth(&self) -> usize {
        self.components().count()
    }

    /// Append `rel` and normalize the result. `..` in `rel` may climb back
    /// through this path but never above the root.
    pub fn join(&self, rel: &str) -> Result<Self> {
        if self.is_root() {
            return Self::parse(rel);
        }
        Self::parse(&format!("{}/{}", self.normalized, rel))
    }

    /// Path with the last segment removed; `None` for the root.
    pub fn parent(&self) -> Option<Self> {
        if self.is_root() {
            return None;
        }
        let parent = match self.normalized.rsplit_once('/') {
            Some((head, _)) => head.to_string(),
            None => String::new(),
        };
        Some(VPath { normalized: parent })
    }

    /// Last segment; `None` for the root.
    pub fn file_name(&self) -> Option<&str> {
        self.components().last()
    }

    /// Text after the last `.` of the file name. Dotfiles such as `.hidden`
    /// have no extension.
    pub fn extension(&self) -> Option<&str> {
        let name = self.file_name()?;
        match name.rsplit_once('.') {
            Some((stem, ext)) if !stem.is_empty() => Some(ext),
            _ => None,
        }
    }

    /// Whether `base` is this path or one of its ancestors, compared
    /// segment by segment.
    pub fn starts_with(&self, base: &VPath) -> bool {
        let mut mine = self.components();
        base.components().all(|segment| mine.next() == Some(segment))
    }

    /// Native location of this path under `root`.
    pub fn to_native(&self, root: &Path) -> PathBuf {
        let mut location = root.to_path_buf();
        for segment in self.components() {
            location.push(segment);
        }
        location
    }
}

impl fmt::Display for VPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "/{}", self.normalized)
    }
}

impl FromStr for VPath {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

impl TryFrom<&str> for VPath {
    type Error = Error;

    fn try_from(value: &str) -> Result<Self> {
        Self::parse(value)
    }
}

impl TryFrom<String> for VPath {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        Self::parse(&value)
    }
}

impl AsRef<str> for VPath {
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}
