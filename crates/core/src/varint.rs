//! Variable-length integer codec
//!
//! ## Encoding
//!
//! ```text
//! 300 = 0b1_0010_1100  ->  [1010_1100] [0000_0010]
//!                            ^ continuation
//! ```
//!
//! Seven bits per byte, low-order group first. Every byte except the last has
//! the high bit set. A `u64` needs at most [`MAX_VARINT_LEN`] bytes.
//!
//! Signed values go through zigzag first so that small negative numbers stay
//! short: `0 -> 0, -1 -> 1, 1 -> 2, -2 -> 3, ...`
//!
//! Encoding is deterministic: equal values always produce equal bytes.

use crate::error::{Error, Result};

/// Maximum encoded length of a 64-bit varint.
pub const MAX_VARINT_LEN: usize = 10;

/// Map a signed value onto the unsigned domain.
pub fn zigzag_encode(value: i64) -> u64 {
    ((value << 1) ^ (value >> 63)) as u64
}

/// Inverse of [`zigzag_encode`].
pub fn zigzag_decode(value: u64) -> i64 {
    ((value >> 1) as i64) ^ -((value & 1) as i64)
}

/// Number of bytes `value` occupies once encoded.
pub fn varuint_len(value: u64) -> usize {
    let bits = 64 - value.leading_zeros() as usize;
    (bits.max(1) + 6) / 7
}

/// Append the varint encoding of `value` to `buf`.
pub fn encode_varuint(mut value: u64, buf: &mut Vec<u8>) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value != 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a varint from the front of `data`, returning (value, bytes_consumed).
///
/// # Errors
///
/// * `NotFound` if `data` is empty
/// * `ShortRead` if `data` ends in the middle of a varint
/// * `VarIntOverflow` if the value does not fit in 64 bits
pub fn decode_varuint(data: &[u8]) -> Result<(u64, usize)> {
    if data.is_empty() {
        return Err(Error::not_found("no varint: input is empty"));
    }

    let mut value: u64 = 0;
    for (i, &byte) in data.iter().take(MAX_VARINT_LEN).enumerate() {
        let group = (byte & 0x7F) as u64;
        // The tenth byte only has room for the top bit of a u64.
        if i == MAX_VARINT_LEN - 1 && (group > 1 || byte & 0x80 != 0) {
            return Err(Error::VarIntOverflow { bits: 64 });
        }
        value |= group << (7 * i);
        if byte & 0x80 == 0 {
            return Ok((value, i + 1));
        }
    }

    Err(Error::ShortRead {
        needed: (data.len() + 1) as u64,
        available: data.len() as u64,
    })
}

/// Unsigned variable-length integer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VarUInt(u64);

impl VarUInt {
    /// Wrap a value.
    pub const fn new(value: u64) -> Self {
        VarUInt(value)
    }

    /// The wrapped value.
    pub const fn get(self) -> u64 {
        self.0
    }

    /// Encoded byte length.
    pub fn encoded_len(self) -> usize {
        varuint_len(self.0)
    }

    /// Encode into a fresh buffer.
    pub fn encode(self) -> Vec<u8> {
        let mut buf = Vec::with_capacity(self.encoded_len());
        encode_varuint(self.0, &mut buf);
        buf
    }

    /// Decode from the front of `data`. See [`decode_varuint`].
    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        decode_varuint(data).map(|(v, n)| (VarUInt(v), n))
    }
}

/// Signed variable-length integer, zigzag encoded.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct VarInt(i64);

impl VarInt {
    /// Wrap a value.
    pub const fn new(value: i64) -> Self {
        VarInt(value)
    }

    /// The wrapped value.
    pub const fn get(self) -> i64 {
        self.0
    }

    /// Zigzag image of this value.
    pub fn to_zigzag(self) -> VarUInt {
        VarUInt(zigzag_encode(self.0))
    }

    /// Value whose zigzag image is `unsigned`.
    pub fn from_zigzag(unsigned: VarUInt) -> Self {
        VarInt(zigzag_decode(unsigned.0))
    }

    /// Encoded byte length.
    pub fn encoded_len(self) -> usize {
        self.to_zigzag().encoded_len()
    }

    /// Encode into a fresh buffer.
    pub fn encode(self) -> Vec<u8> {
        self.to_zigzag().encode()
    }

    /// Decode from the front of `data`.
    pub fn decode(data: &[u8]) -> Result<(Self, usize)> {
        VarUInt::decode(data).map(|(u, n)| (VarInt::from_zigzag(u), n))
    }
}

macro_rules! widen_from {
    ($wrapper:ident, $inner:ty, $($src:ty),*) => {
        $(
            impl From<$src> for $wrapper {
                fn from(value: $src) -> Self {
                    $wrapper(value as $inner)
                }
            }
        )*
    };
}

widen_from!(VarUInt, u64, u8, u16, u32, u64, usize);
widen_from!(VarInt, i64, i8, i16, i32, i64, isize);

macro_rules! narrow_into {
    ($wrapper:ident, $($dst:ty),*) => {
        $(
            impl TryFrom<$wrapper> for $dst {
                type Error = Error;

                fn try_from(value: $wrapper) -> Result<$dst> {
                    <$dst>::try_from(value.0).map_err(|_| Error::VarIntOverflow {
                        bits: <$dst>::BITS,
                    })
                }
            }
        )*
    };
}

narrow_into!(VarUInt, u8, u16, u32, usize);
narrow_into!(VarInt, i8, i16, i32, isize);

impl From<VarUInt> for u64 {
    fn from(value: VarUInt) -> Self {
        value.0
    }
}

impl From<VarInt> for i64 {
    fn from(value: VarInt) -> Self {
        value.0
    }
}
