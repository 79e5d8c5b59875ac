//! Bit-granular sink and source over an in-memory byte buffer
//!
//! Bits are packed MSB first with no alignment between writes. The finished
//! buffer remembers its exact bit length so the zero padding of the last byte
//! is never handed to a decoder.

use std::io::Cursor;

use bitstream_io::{BigEndian, BitRead, BitReader, BitWrite, BitWriter};
use serde::{Deserialize, Serialize};

use crate::error::{CodecError, Result};

fn check_count(count: u32) -> Result<()> {
    if count == 0 || count > 64 {
        return Err(CodecError::InvalidBitCount(count));
    }
    Ok(())
}

/// Encoded output: packed bytes plus the number of meaningful bits.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawBitBuffer")]
pub struct BitBuffer {
    bytes: Vec<u8>,
    bit_len: u64,
}

/// Deserialized fields before the length check.
#[derive(Deserialize)]
struct RawBitBuffer {
    bytes: Vec<u8>,
    bit_len: u64,
}

impl TryFrom<RawBitBuffer> for BitBuffer {
    type Error = CodecError;

    fn try_from(raw: RawBitBuffer) -> Result<Self> {
        Self::from_parts(raw.bytes, raw.bit_len)
    }
}

impl BitBuffer {
    /// Wrap raw bytes, treating every bit (padding included) as payload.
    pub fn from_bytes(bytes: Vec<u8>) -> Self {
        let bit_len = bytes.len() as u64 * 8;
        Self { bytes, bit_len }
    }

    /// Wrap raw bytes whose logical length is known to be `bit_len` bits.
    pub fn from_parts(bytes: Vec<u8>, bit_len: u64) -> Result<Self> {
        let capacity = bytes.len() as u64 * 8;
        if bit_len > capacity {
            return Err(CodecError::SeekOutOfRange {
                position: bit_len,
                len: capacity,
            });
        }
        Ok(Self { bytes, bit_len })
    }

    pub fn bit_len(&self) -> u64 {
        self.bit_len
    }

    pub fn is_empty(&self) -> bool {
        self.bit_len == 0
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.bytes
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }

    /// Byte at `index`, if present.
    pub fn get(&self, index: usize) -> Option<u8> {
        self.bytes.get(index).copied()
    }

    /// A fresh source positioned at bit 0.
    pub fn reader(&self) -> BitSource<'_> {
        BitSource {
            bytes: &self.bytes,
            reader: BitReader::endian(Cursor::new(&self.bytes[..]), BigEndian),
            position: 0,
            len: self.bit_len,
        }
    }
}

/// Append-only bit writer.
pub struct BitSink {
    writer: BitWriter<Vec<u8>, BigEndian>,
    bits: u64,
}

impl Default for BitSink {
    fn default() -> Self {
        Self::new()
    }
}

impl BitSink {
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Pre-size the backing buffer for roughly `bytes` bytes of output.
    pub fn with_capacity(bytes: usize) -> Self {
        Self {
            writer: BitWriter::endian(Vec::with_capacity(bytes), BigEndian),
            bits: 0,
        }
    }

    /// Append the low `count` bits of `value`, most significant first.
    pub fn write_bits(&mut self, value: u64, count: u32) -> Result<()> {
        check_count(count)?;
        let masked = if count == 64 {
            value
        } else {
            value & ((1u64 << count) - 1)
        };
        self.writer.write(count, masked)?;
        self.bits += u64::from(count);
        Ok(())
    }

    pub fn write_bit(&mut self, bit: bool) -> Result<()> {
        self.writer.write_bit(bit)?;
        self.bits += 1;
        Ok(())
    }

    /// Number of bits written so far.
    pub fn cursor(&self) -> u64 {
        self.bits
    }

    /// Zero-pad to a byte boundary and hand back the buffer.
    pub fn finish(mut self) -> Result<BitBuffer> {
        let bit_len = self.bits;
        self.writer.byte_align()?;
        Ok(BitBuffer {
            bytes: self.writer.into_writer(),
            bit_len,
        })
    }
}

/// Bounded bit reader with save/restore positioning.
pub struct BitSource<'a> {
    bytes: &'a [u8],
    reader: BitReader<Cursor<&'a [u8]>, BigEndian>,
    position: u64,
    len: u64,
}

impl<'a> BitSource<'a> {
    /// Read `count` bits MSB first.
    pub fn read_bits(&mut self, count: u32) -> Result<u64> {
        check_count(count)?;
        self.ensure(count)?;
        let value = self.reader.read::<u64>(count)?;
        self.position += u64::from(count);
        Ok(value)
    }

    pub fn read_bit(&mut self) -> Result<bool> {
        self.ensure(1)?;
        let bit = self.reader.read_bit()?;
        self.position += 1;
        Ok(bit)
    }

    fn ensure(&self, count: u32) -> Result<()> {
        let remaining = self.remaining();
        if u64::from(count) > remaining {
            return Err(CodecError::EndOfStream {
                requested: count,
                remaining,
            });
        }
        Ok(())
    }

    pub fn cursor(&self) -> u64 {
        self.position
    }

    pub fn len(&self) -> u64 {
        self.len
    }

    pub fn remaining(&self) -> u64 {
        self.len - self.position
    }

    pub fn is_exhausted(&self) -> bool {
        self.position == self.len
    }

    /// Move to an absolute bit position; `len()` itself is a valid target.
    pub fn seek(&mut self, position: u64) -> Result<()> {
        if position > self.len {
            return Err(CodecError::SeekOutOfRange {
                position,
                len: self.len,
            });
        }
        let mut cursor = Cursor::new(self.bytes);
        cursor.set_position(position / 8);
        let mut reader = BitReader::endian(cursor, BigEndian);
        let offset = (position % 8) as u32;
        if offset > 0 {
            reader.skip(offset)?;
        }
        self.reader = reader;
        self.position = position;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.reader = BitReader::endian(Cursor::new(self.bytes), BigEndian);
        self.position = 0;
    }
}
