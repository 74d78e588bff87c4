//! Integration tests for mounts and storage backends.

#[path = "../common/mod.rs"]
mod common;

mod config_file;
mod iteration;
mod mounts;
