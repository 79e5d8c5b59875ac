//! Variable-length integers written through the bit layer
//!
//! ```text
//! Each group: [continuation (bit 7)] [7-bit payload], least significant group first
//! 300 -> AC 02
//!
//! Signed: the last group has bit 7 clear, bit 6 = sign, bits 0..5 = payload
//! -1 -> 41    64 -> C0 00    -64 -> C0 40
//! ```
//!
//! Groups are 8-bit units on the bit stream, so they need not be byte aligned.

use crate::bitio::{BitSink, BitSource};
use crate::error::{CodecError, Result};

const CONTINUATION: u64 = 0x80;
const PAYLOAD: u64 = 0x7F;
const SIGN: u64 = 0x40;
const LAST_PAYLOAD: u64 = 0x3F;

pub fn write_unsigned(sink: &mut BitSink, mut value: u64) -> Result<()> {
    while value > PAYLOAD {
        sink.write_bits(CONTINUATION | (value & PAYLOAD), 8)?;
        value >>= 7;
    }
    sink.write_bits(value, 8)
}

pub fn read_unsigned(source: &mut BitSource<'_>) -> Result<u64> {
    let mut value = 0u64;
    let mut shift = 0u32;
    loop {
        let group = source.read_bits(8)?;
        value = accumulate(value, group & PAYLOAD, shift)?;
        if group & CONTINUATION == 0 {
            return Ok(value);
        }
        shift += 7;
    }
}

pub fn write_signed(sink: &mut BitSink, value: i64) -> Result<()> {
    let mut magnitude = value.unsigned_abs();
    while magnitude > LAST_PAYLOAD {
        sink.write_bits(CONTINUATION | (magnitude & PAYLOAD), 8)?;
        magnitude >>= 7;
    }
    let sign = if value < 0 { SIGN } else { 0 };
    sink.write_bits(sign | magnitude, 8)
}

pub fn read_signed(source: &mut BitSource<'_>) -> Result<i64> {
    let mut magnitude = 0u64;
    let mut shift = 0u32;
    loop {
        let group = source.read_bits(8)?;
        if group & CONTINUATION != 0 {
            magnitude = accumulate(magnitude, group & PAYLOAD, shift)?;
            shift += 7;
            continue;
        }
        magnitude = accumulate(magnitude, group & LAST_PAYLOAD, shift)?;
        // i64::MIN has magnitude 2^63, which only fits with the sign set
        return if group & SIGN != 0 {
            if magnitude > 1 << 63 {
                return Err(overflow());
            }
            Ok((magnitude as i64).wrapping_neg())
        } else {
            i64::try_from(magnitude).map_err(|_| overflow())
        };
    }
}

fn accumulate(value: u64, payload: u64, shift: u32) -> Result<u64> {
    if shift >= 64 {
        return Err(overflow());
    }
    if payload.leading_zeros() < shift {
        return Err(overflow());
    }
    Ok(value | (payload << shift))
}

fn overflow() -> CodecError {
    CodecError::CorruptStream("varint exceeds 64 bits".into())
}
