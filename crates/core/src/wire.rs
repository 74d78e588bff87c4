//! Wire serialization protocol
//!
//! Values are serialized onto a [`Sink`] through the [`Wire`] trait. Each
//! type has a hand-written impl; there is no derive and no reflection.
//!
//! ## Formats
//!
//! | Type | Bytes |
//! |------|-------|
//! | `u8..u64`, `i8..i64`, `f32`, `f64` | fixed width, little-endian |
//! | `bool` | one byte, `0` or `1` |
//! | [`VarUInt`] / [`VarInt`] | varint / zigzag varint |
//! | `String`, `Vec<u8>` | `varuint(len)` then `len` raw bytes |
//! | `Option<T>` | presence byte, then `T` if present |
//! | tuples | fields in order |
//!
//! A struct is the ordered concatenation of its fields. Writer and reader
//! must visit fields in the same order.
//!
//! ## Failure
//!
//! A failed read leaves no partially built value behind and restores the
//! cursor to where the value started. Strings are framed in memory and
//! committed with a single `write_all`, so a sink that refuses the write
//! never sees half a string.

use crate::error::{Error, Result};
use crate::sink::{MemorySink, Sink};
use crate::varint::{decode_varuint, encode_varuint, VarInt, VarUInt, MAX_VARINT_LEN};

/// Largest string or byte-string length accepted on the wire.
pub const MAX_STRING_LEN: u64 = u32::MAX as u64;

/// A value with a binary wire format.
pub trait Wire: Sized {
    /// Serialize `self` at the sink cursor.
    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()>;

    /// Deserialize a value at the sink cursor.
    fn read_from<S: Sink + ?Sized>(sink: &mut S) -> Result<Self>;
}

/// Serialize a value into a fresh buffer.
pub fn to_bytes<T: Wire>(value: &T) -> Result<Vec<u8>> {
    let mut sink = MemorySink::new();
    value.write_to(&mut sink)?;
    Ok(sink.into_inner())
}

/// Deserialize a value that must span all of `data`.
pub fn from_bytes<T: Wire>(data: &[u8]) -> Result<T> {
    let mut sink = MemorySink::from_bytes(data.to_vec());
    let value = T::read_from(&mut sink)?;
    if sink.remaining() != 0 {
        return Err(Error::corruption(format!(
            "{} trailing bytes after value",
            sink.remaining()
        )));
    }
    Ok(value)
}

/// Read a varint at the cursor.
///
/// Pulls up to [`MAX_VARINT_LEN`] bytes in one read and seeks back over the
/// unused tail. On failure the cursor is where it started.
///
/// # Errors
///
/// * `NotFound` if the sink is exhausted before the first byte
/// * `ShortRead` if the sink ends mid-varint
/// * `VarIntOverflow` if the value exceeds 64 bits
pub fn read_varuint<S: Sink + ?Sized>(sink: &mut S) -> Result<(u64, usize)> {
    let available = sink.remaining().min(MAX_VARINT_LEN as u64) as usize;
    if available == 0 {
        return Err(Error::not_found("end of stream"));
    }

    let mut buf = [0u8; MAX_VARINT_LEN];
    sink.read_exact(&mut buf[..available])?;
    match decode_varuint(&buf[..available]) {
        Ok((value, used)) => {
            sink.seek(-((available - used) as i64))?;
            Ok((value, used))
        }
        Err(e) => {
            sink.seek(-(available as i64))?;
            Err(e)
        }
    }
}

/// Run `read`, seeking back over whatever it consumed if it fails.
fn rewind_on_err<S, T, F>(sink: &mut S, read: F) -> Result<T>
where
    S: Sink + ?Sized,
    F: FnOnce(&mut S) -> Result<T>,
{
    let start = sink.remaining();
    match read(sink) {
        Ok(value) => Ok(value),
        Err(e) => {
            let consumed = start.saturating_sub(sink.remaining());
            sink.seek(-(consumed as i64))?;
            Err(e)
        }
    }
}

/// Write a varint at the cursor, returning the number of bytes written.
pub fn write_varuint<S: Sink + ?Sized>(sink: &mut S, value: u64) -> Result<usize> {
    let mut buf = Vec::with_capacity(MAX_VARINT_LEN);
    encode_varuint(value, &mut buf);
    sink.write_all(&buf)?;
    Ok(buf.len())
}

/// Write a length-prefixed byte string as a single commit.
pub fn write_bytes<S: Sink + ?Sized>(sink: &mut S, bytes: &[u8]) -> Result<()> {
    if bytes.len() as u64 > MAX_STRING_LEN {
        return Err(Error::invalid_operation(format!(
            "byte string of {} bytes exceeds wire maximum {}",
            bytes.len(),
            MAX_STRING_LEN
        )));
    }
    let mut frame = Vec::with_capacity(MAX_VARINT_LEN + bytes.len());
    encode_varuint(bytes.len() as u64, &mut frame);
    frame.extend_from_slice(bytes);
    sink.write_all(&frame)
}

/// Read a length-prefixed byte string.
///
/// A missing length, a length above [`MAX_STRING_LEN`] or fewer bytes than
/// declared all fail, with the cursor restored to the start of the string.
pub fn read_bytes<S: Sink + ?Sized>(sink: &mut S) -> Result<Vec<u8>> {
    let (len, prefix) = match read_varuint(sink) {
        Ok(v) => v,
        Err(Error::NotFound(_)) => {
            return Err(Error::ShortRead {
                needed: 1,
                available: 0,
            })
        }
        Err(e) => return Err(e),
    };

    if len > MAX_STRING_LEN {
        sink.seek(-(prefix as i64))?;
        return Err(Error::VarIntOverflow { bits: 32 });
    }

    let available = sink.remaining();
    if len > available {
        sink.seek(-(prefix as i64))?;
        return Err(Error::ShortRead {
            needed: len,
            available,
        });
    }

    let mut bytes = vec![0u8; len as usize];
    sink.read_exact(&mut bytes)?;
    Ok(bytes)
}

macro_rules! wire_fixed {
    ($($ty:ty),*) => {
        $(
            impl Wire for $ty {
                fn write_to<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()> {
                    sink.write_all(&self.to_le_bytes())
                }

                fn read_from<S: Sink + ?Sized>(sink: &mut S) -> Result<Self> {
                    let mut buf = [0u8; std::mem::size_of::<$ty>()];
                    sink.read_exact(&mut buf)?;
                    Ok(<$ty>::from_le_bytes(buf))
                }
            }
        )*
    };
}

wire_fixed!(u8, u16, u32, u64, i8, i16, i32, i64, f32, f64);

impl Wire for bool {
    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        sink.write_all(&[*self as u8])
    }

    fn read_from<S: Sink + ?Sized>(sink: &mut S) -> Result<Self> {
        let mut buf = [0u8; 1];
        sink.read_exact(&mut buf)?;
        match buf[0] {
            0 => Ok(false),
            1 => Ok(true),
            other => {
                sink.seek(-1)?;
                Err(Error::corruption(format!("invalid bool byte {other:#04x}")))
            }
        }
    }
}

impl Wire for VarUInt {
    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        write_varuint(sink, self.get()).map(|_| ())
    }

    fn read_from<S: Sink + ?Sized>(sink: &mut S) -> Result<Self> {
        read_varuint(sink).map(|(v, _)| VarUInt::new(v))
    }
}

impl Wire for VarInt {
    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        self.to_zigzag().write_to(sink)
    }

    fn read_from<S: Sink + ?Sized>(sink: &mut S) -> Result<Self> {
        VarUInt::read_from(sink).map(VarInt::from_zigzag)
    }
}

impl Wire for Vec<u8> {
    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        write_bytes(sink, self)
    }

    fn read_from<S: Sink + ?Sized>(sink: &mut S) -> Result<Self> {
        read_bytes(sink)
    }
}

impl Wire for String {
    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        write_bytes(sink, self.as_bytes())
    }

    fn read_from<S: Sink + ?Sized>(sink: &mut S) -> Result<Self> {
        let bytes = read_bytes(sink)?;
        let consumed = bytes.len() + crate::varint::varuint_len(bytes.len() as u64);
        String::from_utf8(bytes).map_err(|e| {
            // Leave the cursor where the string began.
            match sink.seek(-(consumed as i64)) {
                Ok(()) => Error::corruption(format!("string is not UTF-8: {e}")),
                Err(seek_err) => seek_err,
            }
        })
    }
}

impl<T: Wire> Wire for Option<T> {
    fn write_to<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()> {
        match self {
            None => false.write_to(sink),
            Some(value) => {
                true.write_to(sink)?;
                value.write_to(sink)
            }
        }
    }

    fn read_from<S: Sink + ?Sized>(sink: &mut S) -> Result<Self> {
        rewind_on_err(sink, |sink| {
            if bool::read_from(sink)? {
                T::read_from(sink).map(Some)
            } else {
                Ok(None)
            }
        })
    }
}

macro_rules! wire_tuple {
    ($($name:ident),+) => {
        impl<$($name: Wire),+> Wire for ($($name,)+) {
            #[allow(non_snake_case)]
            fn write_to<S: Sink + ?Sized>(&self, sink: &mut S) -> Result<()> {
                let ($($name,)+) = self;
                $($name.write_to(sink)?;)+
                Ok(())
            }

            fn read_from<S: Sink + ?Sized>(sink: &mut S) -> Result<Self> {
                rewind_on_err(sink, |sink| Ok(($($name::read_from(sink)?,)+)))
            }
        }
    };
}

wire_tuple!(A, B);
wire_tuple!(A, B, C);
wire_tuple!(A, B, C, D);
