//! Built-in storage backends.

pub mod memory;
pub mod std_fs;

pub use memory::{MemFileSink, MemoryBackend};
pub use std_fs::{FileSink, StdFsBackend};
