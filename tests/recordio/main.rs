//! Integration tests for RecordIO streams.
//!
//! Streams are written to and read from files on a mounted temporary
//! directory, so every test crosses the sink, mount and backend layers.

#[path = "../common/mod.rs"]
mod common;

mod file_streams;
mod properties;
mod recovery;
mod typed_records;
