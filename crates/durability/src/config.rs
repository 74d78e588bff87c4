//! RecordIO configuration.

use recio_core::{Error, MAX_STRING_LEN};

/// RecordIO stream configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordIoConfig {
    /// Largest payload a writer accepts and a reader trusts (default: 4GiB - 1).
    ///
    /// A declared length above this limit is treated as corruption by
    /// readers rather than as a truncated record.
    pub max_record_len: u64,

    /// Call the sink's durability barrier after every append (default: false).
    pub sync_on_append: bool,
}

impl Default for RecordIoConfig {
    fn default() -> Self {
        RecordIoConfig {
            max_record_len: MAX_STRING_LEN,
            sync_on_append: false,
        }
    }
}

impl RecordIoConfig {
    /// Create a new configuration with default values.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the record length limit (builder pattern).
    pub fn with_max_record_len(mut self, len: u64) -> Self {
        self.max_record_len = len;
        self
    }

    /// Enable or disable syncing after every append (builder pattern).
    pub fn with_sync_on_append(mut self, sync: bool) -> Self {
        self.sync_on_append = sync;
        self
    }

    /// Validate configuration.
    pub fn validate(&self) -> Result<(), RecordIoConfigError> {
        if self.max_record_len == 0 {
            return Err(RecordIoConfigError::ZeroRecordLimit);
        }
        if self.max_record_len > i64::MAX as u64 {
            return Err(RecordIoConfigError::RecordLimitTooLarge(self.max_record_len));
        }
        Ok(())
    }

    /// Create a configuration for tests (small limit, sync on every append).
    pub fn for_testing() -> Self {
        RecordIoConfig {
            max_record_len: 64 * 1024,
            sync_on_append: true,
        }
    }
}

/// RecordIO configuration errors.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RecordIoConfigError {
    /// A zero limit would reject every non-empty record.
    #[error("max_record_len must be at least 1")]
    ZeroRecordLimit,

    /// Record lengths must stay seekable.
    #[error("max_record_len {0} exceeds the seekable range")]
    RecordLimitTooLarge(u64),
}

impl From<RecordIoConfigError> for Error {
    fn from(e: RecordIoConfigError) -> Self {
        Error::Config(e.to_string())
    }
}
