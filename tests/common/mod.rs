//! Shared test utilities for the integration suites.
//!
//! Import via `#[path = "../common/mod.rs"] mod common;` from a suite's main.rs.

#![allow(dead_code)]

use recio::{AccessMode, MountId, MountTable, OpenMode, RecordWriter, Result, VPath};
use std::path::PathBuf;
use std::sync::Once;
use tempfile::TempDir;

static INIT_TRACING: Once = Once::new();

/// Route `tracing` output through the test harness. `RUST_LOG` selects
/// the level.
pub fn init_tracing() {
    INIT_TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
            .with_test_writer()
            .try_init();
    });
}

/// Mount id used by [`TestMount`].
pub const DATA: MountId = MountId(0);

/// A temporary directory mounted read-write as [`DATA`].
pub struct TestMount {
    pub table: MountTable,
    pub dir: TempDir,
}

impl TestMount {
    pub fn new() -> Self {
        init_tracing();
        let dir = TempDir::new().expect("tempdir");
        let table = MountTable::new();
        table
            .mount(DATA, dir.path(), AccessMode::ReadWrite)
            .expect("mount");
        TestMount { table, dir }
    }

    /// Native location of a mount-relative path.
    pub fn native(&self, raw: &str) -> PathBuf {
        path(raw).to_native(self.dir.path())
    }

    /// Append `records` to the stream at `raw`, creating it if needed.
    pub fn append(&self, raw: &str, records: &[&[u8]]) -> Result<()> {
        let mut sink = self.table.open(DATA, &path(raw), OpenMode::Append)?;
        let mut writer = RecordWriter::new(&mut sink)?;
        writer.append_all(records.iter().copied())?;
        writer.flush()
    }
}

/// Parse a path, panicking on invalid input.
pub fn path(raw: &str) -> VPath {
    VPath::parse(raw).expect("valid path")
}
