//! Binary sink abstraction.
//!
//! All serialization runs against the [`Sink`] trait, so the same format
//! code works over borrowed buffers, growable memory and files.
//!
//! A sink has a cursor. `write` and `read` move it forward, `seek` moves it by
//! a signed distance and `remaining` reports how many bytes lie between the
//! cursor and the end of the medium.
//!
//! Byte views are plain slices: `&[u8]` for data going in, `&mut [u8]` for
//! data coming out. The borrow checker keeps a view from outliving the buffer
//! it points into.
//!
//! # Failure
//!
//! Every operation returns a [`Result`]. Sinks over an external medium latch
//! the first I/O failure: afterwards they return [`Error::SinkFailed`] for
//! every call without touching the medium, until [`Sink::clear_failure`].
//! In-memory sinks check bounds before mutating, so a failed call leaves them
//! exactly as they were.

use crate::error::{Error, Result};
use std::fmt;

/// Byte-addressable medium with a cursor.
pub trait Sink: fmt::Debug {
    /// Write `data` at the cursor and advance past it.
    ///
    /// Sinks in this workspace are all-or-nothing: either every byte is
    /// committed and `data.len()` is returned, or nothing is and an error is.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read up to `buf.len()` bytes at the cursor, returning the count read.
    /// Returns 0 only at the end of the medium or for an empty `buf`.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Move the cursor by `distance` bytes. The target must stay within
    /// `[0, len]`.
    fn seek(&mut self, distance: i64) -> Result<()>;

    /// Bytes between the cursor and the end of the medium.
    fn remaining(&self) -> u64;

    /// Write all of `data` or fail. A sink that commits only part of `data`
    /// is reported with the room left after that partial write.
    fn write_all(&mut self, data: &[u8]) -> Result<()> {
        let written = self.write(data)?;
        if written != data.len() {
            return Err(Error::ShortWrite {
                requested: data.len() as u64,
                remaining: self.remaining(),
            });
        }
        Ok(())
    }

    /// Fill `buf` completely or fail without consuming anything.
    fn read_exact(&mut self, buf: &mut [u8]) -> Result<()> {
        let available = self.remaining();
        if available < buf.len() as u64 {
            return Err(Error::ShortRead {
                needed: buf.len() as u64,
                available,
            });
        }

        let mut filled = 0;
        while filled < buf.len() {
            let n = self.read(&mut buf[filled..])?;
            if n == 0 {
                return Err(Error::ShortRead {
                    needed: buf.len() as u64,
                    available: filled as u64,
                });
            }
            filled += n;
        }
        Ok(())
    }

    /// Advance the cursor by `count` bytes without materializing them.
    fn skip(&mut self, count: u64) -> Result<()> {
        let available = self.remaining();
        if count > available {
            return Err(Error::ShortRead {
                needed: count,
                available,
            });
        }
        let distance = i64::try_from(count)
            .map_err(|_| Error::invalid_operation(format!("skip of {count} bytes")))?;
        self.seek(distance)
    }

    /// Move the cursor to the end of the medium.
    fn seek_to_end(&mut self) -> Result<()> {
        let remaining = self.remaining();
        self.skip(remaining)
    }

    /// Durability barrier. No-op for in-memory sinks.
    fn flush(&mut self) -> Result<()> {
        Ok(())
    }

    /// Discard everything after the cursor.
    fn truncate(&mut self) -> Result<()> {
        Err(Error::unsupported("truncate"))
    }

    /// Whether the sink latched a failure.
    fn is_failed(&self) -> bool {
        false
    }

    /// Clear a latched failure.
    fn clear_failure(&mut self) {}
}

impl<S: Sink + ?Sized> Sink for &mut S {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn seek(&mut self, distance: i64) -> Result<()> {
        (**self).seek(distance)
    }

    fn remaining(&self) -> u64 {
        (**self).remaining()
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn truncate(&mut self) -> Result<()> {
        (**self).truncate()
    }

    fn is_failed(&self) -> bool {
        (**self).is_failed()
    }

    fn clear_failure(&mut self) {
        (**self).clear_failure()
    }
}

impl<S: Sink + ?Sized> Sink for Box<S> {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        (**self).write(data)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        (**self).read(buf)
    }

    fn seek(&mut self, distance: i64) -> Result<()> {
        (**self).seek(distance)
    }

    fn remaining(&self) -> u64 {
        (**self).remaining()
    }

    fn flush(&mut self) -> Result<()> {
        (**self).flush()
    }

    fn truncate(&mut self) -> Result<()> {
        (**self).truncate()
    }

    fn is_failed(&self) -> bool {
        (**self).is_failed()
    }

    fn clear_failure(&mut self) {
        (**self).clear_failure()
    }
}

/// Resolve `position + distance` inside `[0, len]`.
pub fn seek_target(position: u64, distance: i64, len: u64) -> Result<u64> {
    let target = position as i128 + distance as i128;
    if target < 0 || target > len as i128 {
        return Err(Error::invalid_operation(format!(
            "seek by {distance} from {position} leaves [0, {len}]"
        )));
    }
    Ok(target as u64)
}

/// Fixed-capacity sink over a borrowed buffer.
///
/// Writes that do not fit in `remaining()` are rejected without committing
/// any byte.
#[derive(Debug)]
pub struct SliceSink<'a> {
    buf: &'a mut [u8],
    pos: usize,
}

impl<'a> SliceSink<'a> {
    /// Wrap `buf` with the cursor at the start.
    pub fn new(buf: &'a mut [u8]) -> Self {
        SliceSink { buf, pos: 0 }
    }

    /// Cursor position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Bytes before the cursor.
    pub fn filled(&self) -> &[u8] {
        &self.buf[..self.pos]
    }
}

impl Sink for SliceSink<'_> {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let remaining = self.buf.len() - self.pos;
        if data.len() > remaining {
            return Err(Error::ShortWrite {
                requested: data.len() as u64,
                remaining: remaining as u64,
            });
        }
        self.buf[self.pos..self.pos + data.len()].copy_from_slice(data);
        self.pos += data.len();
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = buf.len().min(self.buf.len() - self.pos);
        buf[..n].copy_from_slice(&self.buf[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn seek(&mut self, distance: i64) -> Result<()> {
        self.pos = seek_target(self.pos as u64, distance, self.buf.len() as u64)? as usize;
        Ok(())
    }

    fn remaining(&self) -> u64 {
        (self.buf.len() - self.pos) as u64
    }
}

/// Growable in-memory sink.
///
/// Writes overwrite bytes under the cursor and extend the buffer past its
/// end. An optional limit caps the total size.
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    data: Vec<u8>,
    pos: usize,
    limit: Option<usize>,
}

impl MemorySink {
    /// Empty sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sink over existing bytes, cursor at the start.
    pub fn from_bytes(data: impl Into<Vec<u8>>) -> Self {
        MemorySink {
            data: data.into(),
            pos: 0,
            limit: None,
        }
    }

    /// Cap the total size of the buffer (builder pattern).
    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = Some(limit);
        self
    }

    /// Cursor position.
    pub fn position(&self) -> usize {
        self.pos
    }

    /// Move the cursor back to the start.
    pub fn rewind(&mut self) {
        self.pos = 0;
    }

    /// All bytes in the buffer.
    pub fn as_bytes(&self) -> &[u8] {
        &self.data
    }

    /// Consume the sink, returning its buffer.
    pub fn into_inner(self) -> Vec<u8> {
        self.data
    }

    /// Total buffer length.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the buffer is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

impl Sink for MemorySink {
    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let end = self.pos + data.len();
        if let Some(limit) = self.limit {
            if end > limit {
                return Err(Error::ShortWrite {
                    requested: data.len() as u64,
                    remaining: limit.saturating_sub(self.pos) as u64,
                });
            }
        }

        let overlap = data.len().min(self.data.len() - self.pos);
        self.data[self.pos..self.pos + overlap].copy_from_slice(&data[..overlap]);
        self.data.extend_from_slice(&data[overlap..]);
        self.pos = end;
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let n = buf.len().min(self.data.len() - self.pos);
        buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
        self.pos += n;
        Ok(n)
    }

    fn seek(&mut self, distance: i64) -> Result<()> {
        self.pos = seek_target(self.pos as u64, distance, self.data.len() as u64)? as usize;
        Ok(())
    }

    fn remaining(&self) -> u64 {
        (self.data.len() - self.pos) as u64
    }

    fn truncate(&mut self) -> Result<()> {
        self.data.truncate(self.pos);
        Ok(())
    }
}
