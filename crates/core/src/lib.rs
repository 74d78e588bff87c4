//! Core types for recio
//!
//! This crate defines the pieces every other layer builds on:
//! - Error: error enum, status codes and error classes
//! - Varint: unsigned/signed variable-length integers and zigzag
//! - Sink: cursor-based byte medium (slice, growable memory)
//! - Wire: binary serialization protocol over a sink

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod sink;
pub mod varint;
pub mod wire;

pub use error::{status_of, Error, ErrorClass, Result, Status};
pub use sink::{MemorySink, Sink, SliceSink};
pub use varint::{
    decode_varuint, encode_varuint, varuint_len, zigzag_decode, zigzag_encode, VarInt, VarUInt,
    MAX_VARINT_LEN,
};
pub use wire::{
    from_bytes, read_bytes, read_varuint, to_bytes, write_bytes, write_varuint, Wire,
    MAX_STRING_LEN,
};
