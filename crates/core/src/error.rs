//! Error types for recio
//!
//! Every fallible operation in the workspace returns [`Result`]. Callers that
//! only need to branch on the coarse outcome use [`Error::status`] or
//! [`status_of`], which collapse an error into one of the three [`Status`]
//! codes surfaced to users.

use std::io;
use thiserror::Error;

/// Result type alias for recio operations
pub type Result<T> = std::result::Result<T, Error>;

/// Error types for recio
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the underlying medium
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// End of stream, missing record, missing file or unregistered mount
    #[error("Not found: {0}")]
    NotFound(String),

    /// Data corruption detected
    #[error("Data corruption: {0}")]
    Corruption(String),

    /// A record whose declared length runs past the end of the stream
    #[error("Incomplete entry at offset {offset}: have {have} bytes, need {needed}")]
    IncompleteEntry {
        /// Stream offset where the entry starts
        offset: u64,
        /// Bytes available from `offset` to the end of the stream
        have: u64,
        /// Bytes the entry declares (prefix included)
        needed: u64,
    },

    /// Decoded integer does not fit the requested width
    #[error("Varint overflow: value does not fit in {bits} bits")]
    VarIntOverflow {
        /// Width of the requested integer type
        bits: u32,
    },

    /// Sink could not supply the requested number of bytes
    #[error("Short read: needed {needed} bytes, {available} available")]
    ShortRead {
        /// Bytes requested
        needed: u64,
        /// Bytes the sink could supply
        available: u64,
    },

    /// Sink rejected a write that does not fit
    #[error("Short write: {requested} bytes requested, {remaining} remaining")]
    ShortWrite {
        /// Bytes the caller tried to write
        requested: u64,
        /// Capacity left in the sink
        remaining: u64,
    },

    /// Caller-supplied buffer cannot hold the record
    #[error("Buffer too small: record needs {needed} bytes, buffer holds {capacity}")]
    BufferTooSmall {
        /// Declared record length
        needed: u64,
        /// Caller buffer length
        capacity: usize,
    },

    /// Access mode or backend does not permit the operation
    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    /// Backend lacks the requested capability
    #[error("Unsupported operation: {0}")]
    Unsupported(String),

    /// Path could not be normalized
    #[error("Invalid path: {0}")]
    InvalidPath(String),

    /// Invalid operation or state
    #[error("Invalid operation: {0}")]
    InvalidOperation(String),

    /// Sink latched an earlier failure and refuses further work
    #[error("Sink failed: {0}")]
    SinkFailed(String),

    /// Configuration could not be loaded or is invalid
    #[error("Configuration error: {0}")]
    Config(String),
}

/// Status code surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Status {
    /// Operation succeeded
    Ok,
    /// Expected exhaustion: end of stream, missing record, unknown mount
    NotFound,
    /// Malformed data, capability mismatch or I/O failure
    Failure,
}

impl Status {
    /// Returns true for [`Status::Ok`].
    pub fn is_ok(&self) -> bool {
        matches!(self, Status::Ok)
    }
}

/// Broad error category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorClass {
    /// End of data; not fatal
    Exhaustion,
    /// Bytes or arguments that violate the format
    Malformed,
    /// Mount or backend does not allow the operation
    Capability,
    /// Failure of the underlying medium
    Io,
}

impl Error {
    /// Create a NotFound error.
    pub fn not_found(what: impl Into<String>) -> Self {
        Error::NotFound(what.into())
    }

    /// Create a Corruption error.
    pub fn corruption(detail: impl Into<String>) -> Self {
        Error::Corruption(detail.into())
    }

    /// Create an InvalidOperation error.
    pub fn invalid_operation(detail: impl Into<String>) -> Self {
        Error::InvalidOperation(detail.into())
    }

    /// Create a PermissionDenied error.
    pub fn permission_denied(detail: impl Into<String>) -> Self {
        Error::PermissionDenied(detail.into())
    }

    /// Create an Unsupported error.
    pub fn unsupported(detail: impl Into<String>) -> Self {
        Error::Unsupported(detail.into())
    }

    /// Create an InvalidPath error.
    pub fn invalid_path(detail: impl Into<String>) -> Self {
        Error::InvalidPath(detail.into())
    }

    /// Category of this error.
    pub fn class(&self) -> ErrorClass {
        match self {
            Error::NotFound(_) => ErrorClass::Exhaustion,
            Error::Corruption(_)
            | Error::IncompleteEntry { .. }
            | Error::VarIntOverflow { .. }
            | Error::BufferTooSmall { .. }
            | Error::InvalidPath(_)
            | Error::InvalidOperation(_)
            | Error::Config(_) => ErrorClass::Malformed,
            Error::PermissionDenied(_) | Error::Unsupported(_) => ErrorClass::Capability,
            Error::Io(_)
            | Error::SinkFailed(_)
            | Error::ShortRead { .. }
            | Error::ShortWrite { .. } => ErrorClass::Io,
        }
    }

    /// Status code for this error. Only exhaustion maps to `NotFound`.
    pub fn status(&self) -> Status {
        match self.class() {
            ErrorClass::Exhaustion => Status::NotFound,
            _ => Status::Failure,
        }
    }

    /// Returns true if this error is the expected end-of-data condition.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound(_))
    }

    /// Translate an I/O error from a backend, keeping the not-found and
    /// permission classes distinguishable.
    pub fn from_io(err: io::Error, context: impl std::fmt::Display) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => Error::NotFound(context.to_string()),
            io::ErrorKind::PermissionDenied => Error::PermissionDenied(context.to_string()),
            _ => Error::Io(err),
        }
    }
}

/// Status code of a result.
pub fn status_of<T>(result: &Result<T>) -> Status {
    match result {
        Ok(_) => Status::Ok,
        Err(e) => e.status(),
    }
}
