//! RecordIO reader.
//!
//! A forward-only cursor over `varuint(len) ++ payload` frames. Records are
//! consumed by [`RecordReader::read_next_record`] / [`RecordReader::read_next`]
//! or passed over by [`RecordReader::skip_forward`].
//!
//! ## Outcomes
//!
//! | Situation | Error | Status |
//! |-----------|-------|--------|
//! | No prefix left | `NotFound` | `NotFound` |
//! | Stream ends inside the prefix or payload | `IncompleteEntry` | `Failure` |
//! | Declared length above `max_record_len` | `Corruption` | `Failure` |
//! | Caller buffer shorter than the payload | `BufferTooSmall` | `Failure` |
//!
//! Every failure except a sink I/O error leaves the cursor at the start of
//! the offending record. Offsets are counted from the cursor position the
//! reader was created at.

use crate::config::RecordIoConfig;
use recio_core::{read_varuint, Error, Result, Sink, Wire};
use tracing::{debug, trace, warn};

/// Why [`RecordReader::scan`] stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Every byte belonged to a complete record
    EndOfData,
    /// The last record is cut short (expected after a torn append)
    PartialRecord {
        /// Offset where the partial record starts
        offset: u64,
    },
    /// A length prefix that cannot be a record
    Corrupted {
        /// Offset of the bad prefix
        offset: u64,
        /// Human-readable description
        detail: String,
    },
}

/// Result of scanning a stream to its end.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScanReport {
    /// Complete records passed over
    pub records: u64,

    /// Offset just past the last complete record
    pub valid_end: u64,

    /// Offset of the end of the stream
    pub total_len: u64,

    /// Why scanning stopped
    pub stop_reason: StopReason,
}

impl ScanReport {
    /// Whether the stream ended on a record boundary.
    pub fn is_clean(&self) -> bool {
        self.stop_reason == StopReason::EndOfData
    }

    /// Bytes after the last complete record.
    pub fn bytes_to_truncate(&self) -> u64 {
        self.total_len - self.valid_end
    }
}

/// Length prefix of the record under the cursor.
struct Frame {
    len: u64,
    prefix: usize,
}

/// Forward-only RecordIO reader.
pub struct RecordReader<'a, S: Sink + ?Sized> {
    sink: &'a mut S,
    config: RecordIoConfig,
    offset: u64,
    records_read: u64,
}

impl<'a, S: Sink + ?Sized> RecordReader<'a, S> {
    /// Create a reader at the sink cursor with the default configuration.
    pub fn new(sink: &'a mut S) -> Result<Self> {
        Self::with_config(sink, RecordIoConfig::default())
    }

    /// Create a reader at the sink cursor with an explicit configuration.
    pub fn with_config(sink: &'a mut S, config: RecordIoConfig) -> Result<Self> {
        config.validate()?;
        if sink.is_failed() {
            return Err(Error::SinkFailed(
                "cannot start a reader on a failed sink".to_string(),
            ));
        }

        Ok(RecordReader {
            sink,
            config,
            offset: 0,
            records_read: 0,
        })
    }

    /// Read the next record into `buf`, returning the payload length.
    ///
    /// On `BufferTooSmall` nothing is consumed; retry with a buffer of at
    /// least `needed` bytes.
    pub fn read_next_record(&mut self, buf: &mut [u8]) -> Result<usize> {
        let frame = self.next_frame()?;
        if frame.len > buf.len() as u64 {
            self.sink.seek(-(frame.prefix as i64))?;
            return Err(Error::BufferTooSmall {
                needed: frame.len,
                capacity: buf.len(),
            });
        }

        let len = frame.len as usize;
        self.sink.read_exact(&mut buf[..len])?;
        self.advance(&frame);
        Ok(len)
    }

    /// Read the next record into a fresh buffer.
    pub fn read_next(&mut self) -> Result<Vec<u8>> {
        let frame = self.next_frame()?;
        let len = match usize::try_from(frame.len) {
            Ok(len) => len,
            Err(_) => {
                self.sink.seek(-(frame.prefix as i64))?;
                return Err(Error::BufferTooSmall {
                    needed: frame.len,
                    capacity: usize::MAX,
                });
            }
        };

        let mut payload = vec![0u8; len];
        self.sink.read_exact(&mut payload)?;
        self.advance(&frame);
        Ok(payload)
    }

    /// Read the next record and decode it as a `T`.
    ///
    /// The record is consumed even if decoding fails.
    pub fn read_value<T: Wire>(&mut self) -> Result<T> {
        let payload = self.read_next()?;
        recio_core::from_bytes(&payload)
    }

    /// Pass over the next `count` records without materializing them.
    ///
    /// Stops at the first failure. Records skipped before it stay skipped.
    pub fn skip_forward(&mut self, count: u64) -> Result<()> {
        for skipped in 0..count {
            let frame = match self.next_frame() {
                Ok(frame) => frame,
                Err(e) => {
                    trace!(requested = count, skipped, "Skip stopped early");
                    return Err(e);
                }
            };
            self.sink.skip(frame.len)?;
            self.advance(&frame);
        }
        Ok(())
    }

    /// Iterate over the remaining records as owned payloads.
    ///
    /// The iterator ends at the end of the stream and fuses after yielding an
    /// error.
    pub fn records(&mut self) -> Records<'_, 'a, S> {
        Records {
            reader: self,
            done: false,
        }
    }

    /// Walk the rest of the stream without materializing payloads.
    ///
    /// Leaves the cursor at `valid_end`, so a caller holding a truncatable
    /// sink can cut a torn tail off and resume appending there.
    pub fn scan(&mut self) -> Result<ScanReport> {
        let mut records = 0u64;

        let stop_reason = loop {
            match self.next_frame() {
                Ok(frame) => {
                    self.sink.skip(frame.len)?;
                    self.advance(&frame);
                    records += 1;
                }
                Err(Error::NotFound(_)) => break StopReason::EndOfData,
                Err(Error::IncompleteEntry { offset, have, needed }) => {
                    warn!(offset, have, needed, "Partial record at end of stream");
                    break StopReason::PartialRecord { offset };
                }
                Err(Error::Corruption(detail)) => {
                    warn!(offset = self.offset, %detail, "Corrupted record prefix");
                    break StopReason::Corrupted {
                        offset: self.offset,
                        detail,
                    };
                }
                Err(e) => return Err(e),
            }
        };

        let report = ScanReport {
            records,
            valid_end: self.offset,
            total_len: self.offset + self.sink.remaining(),
            stop_reason,
        };
        debug!(
            records = report.records,
            valid_end = report.valid_end,
            total_len = report.total_len,
            "Scanned RecordIO stream"
        );
        Ok(report)
    }

    /// Offset of the next record.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    /// Records consumed so far, read or skipped.
    pub fn records_read(&self) -> u64 {
        self.records_read
    }

    /// Active configuration.
    pub fn config(&self) -> &RecordIoConfig {
        &self.config
    }

    /// Decode and validate the prefix under the cursor.
    ///
    /// On success the cursor sits on the first payload byte and the whole
    /// payload is known to be present. On failure it is back at the prefix.
    fn next_frame(&mut self) -> Result<Frame> {
        let start = self.offset;
        let (len, prefix) = match read_varuint(&mut *self.sink) {
            Ok(decoded) => decoded,
            Err(Error::ShortRead { .. }) => {
                let have = self.sink.remaining();
                return Err(Error::IncompleteEntry {
                    offset: start,
                    have,
                    needed: have + 1,
                });
            }
            Err(Error::VarIntOverflow { .. }) => {
                return Err(Error::corruption(format!(
                    "length prefix at offset {start} exceeds 64 bits"
                )));
            }
            Err(e) => return Err(e),
        };

        if len > self.config.max_record_len {
            self.sink.seek(-(prefix as i64))?;
            return Err(Error::corruption(format!(
                "record at offset {start} declares {len} bytes, limit is {}",
                self.config.max_record_len
            )));
        }

        let available = self.sink.remaining();
        if len > available {
            self.sink.seek(-(prefix as i64))?;
            return Err(Error::IncompleteEntry {
                offset: start,
                have: prefix as u64 + available,
                needed: prefix as u64 + len,
            });
        }

        Ok(Frame { len, prefix })
    }

    fn advance(&mut self, frame: &Frame) {
        self.offset += frame.prefix as u64 + frame.len;
        self.records_read += 1;
        trace!(len = frame.len, offset = self.offset, "Consumed record");
    }
}

/// Iterator returned by [`RecordReader::records`].
pub struct Records<'r, 'a, S: Sink + ?Sized> {
    reader: &'r mut RecordReader<'a, S>,
    done: bool,
}

impl<S: Sink + ?Sized> Iterator for Records<'_, '_, S> {
    type Item = Result<Vec<u8>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        match self.reader.read_next() {
            Ok(payload) => Some(Ok(payload)),
            Err(Error::NotFound(_)) => {
                self.done = true;
                None
            }
            Err(e) => {
                self.done = true;
                Some(Err(e))
            }
        }
    }
}
