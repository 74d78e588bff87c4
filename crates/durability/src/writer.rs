//! RecordIO writer.
//!
//! The writer borrows a sink and appends `varuint(len) ++ payload` frames.
//! [`RecordWriter::new`] and [`RecordWriter::with_config`] move the cursor to
//! the end of the sink first, so records already in the stream are never
//! rewritten, whatever mode the sink was opened in.
//! [`RecordWriter::at_cursor`] starts at the current cursor instead, for
//! fixed-capacity buffers such as `SliceSink` whose `remaining()` is free
//! space rather than existing data. Each frame is committed with one
//! `write_all`, so a sink that refuses the write receives no bytes of it.

use crate::config::RecordIoConfig;
use recio_core::{encode_varuint, Error, Result, Sink, Wire, MAX_VARINT_LEN};
use tracing::{debug, trace};

/// Cumulative writer counters.
///
/// These accumulate over the lifetime of the writer and are never reset.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordCounters {
    /// Records appended successfully
    pub records_appended: u64,
    /// Bytes written, length prefixes included
    pub bytes_written: u64,
    /// Durability barrier calls
    pub sync_calls: u64,
}

/// Append-only RecordIO writer.
pub struct RecordWriter<'a, S: Sink + ?Sized> {
    sink: &'a mut S,
    config: RecordIoConfig,
    counters: RecordCounters,
}

impl<'a, S: Sink + ?Sized> RecordWriter<'a, S> {
    /// Create a writer at the end of the sink with the default configuration.
    pub fn new(sink: &'a mut S) -> Result<Self> {
        Self::with_config(sink, RecordIoConfig::default())
    }

    /// Create a writer at the end of the sink with an explicit configuration.
    ///
    /// Existing bytes are kept; appending resumes after them.
    pub fn with_config(sink: &'a mut S, config: RecordIoConfig) -> Result<Self> {
        Self::check_start(sink, &config)?;
        let existing = sink.remaining();
        sink.seek_to_end()?;
        if existing > 0 {
            debug!(skipped_bytes = existing, "RecordIO writer positioned at end");
        }
        Ok(Self::build(sink, config))
    }

    /// Create a writer that starts at the current sink cursor.
    ///
    /// Whatever lies after the cursor is overwritten. Use this for
    /// fixed-capacity sinks, where seeking to the end would leave no room.
    pub fn at_cursor(sink: &'a mut S, config: RecordIoConfig) -> Result<Self> {
        Self::check_start(sink, &config)?;
        Ok(Self::build(sink, config))
    }

    fn check_start(sink: &S, config: &RecordIoConfig) -> Result<()> {
        config.validate()?;
        if sink.is_failed() {
            return Err(Error::SinkFailed(
                "cannot start a writer on a failed sink".to_string(),
            ));
        }
        Ok(())
    }

    fn build(sink: &'a mut S, config: RecordIoConfig) -> Self {
        RecordWriter {
            sink,
            config,
            counters: RecordCounters::default(),
        }
    }

    /// Append one record.
    pub fn append(&mut self, payload: &[u8]) -> Result<()> {
        let len = payload.len() as u64;
        if len > self.config.max_record_len {
            return Err(Error::invalid_operation(format!(
                "record of {} bytes exceeds max_record_len {}",
                len, self.config.max_record_len
            )));
        }

        let mut frame = Vec::with_capacity(MAX_VARINT_LEN + payload.len());
        encode_varuint(len, &mut frame);
        frame.extend_from_slice(payload);
        self.sink.write_all(&frame)?;

        self.counters.records_appended += 1;
        self.counters.bytes_written += frame.len() as u64;
        trace!(len, frame_len = frame.len(), "Appended record");

        if self.config.sync_on_append {
            self.flush()?;
        }
        Ok(())
    }

    /// Serialize `value` with the wire protocol and append it as one record.
    pub fn append_value<T: Wire>(&mut self, value: &T) -> Result<()> {
        let payload = recio_core::to_bytes(value)?;
        self.append(&payload)
    }

    /// Append every payload in order, stopping at the first failure.
    pub fn append_all<I, P>(&mut self, payloads: I) -> Result<()>
    where
        I: IntoIterator<Item = P>,
        P: AsRef<[u8]>,
    {
        for payload in payloads {
            self.append(payload.as_ref())?;
        }
        Ok(())
    }

    /// Run the sink's durability barrier.
    pub fn flush(&mut self) -> Result<()> {
        self.sink.flush()?;
        self.counters.sync_calls += 1;
        Ok(())
    }

    /// Counters accumulated so far.
    pub fn counters(&self) -> &RecordCounters {
        &self.counters
    }

    /// Active configuration.
    pub fn config(&self) -> &RecordIoConfig {
        &self.config
    }
}
