//! Character codec: the base alphabet the string and list codecs build on
//!
//! Untrained characters follow the escape code as a fixed 21-bit Unicode
//! scalar value, wide enough for every `char`, terminated by a 21-bit end
//! marker. The marker lies above U+10FFFF so it never reads as a code point.

use crate::bitio::{BitBuffer, BitSink, BitSource};
use crate::codec::{Codec, EscapeStrategy};
use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::frequency::FrequencyTable;

pub const CODE_POINT_BITS: u32 = 21;

pub const DEFAULT_END_MARKER: u32 = 0x1F_FFFF;

#[derive(Debug, Clone, Copy)]
pub struct CharEscape {
    end_marker: u32,
}

impl Default for CharEscape {
    fn default() -> Self {
        Self {
            end_marker: DEFAULT_END_MARKER,
        }
    }
}

impl CharEscape {
    /// `end_marker` must fit the payload width without being a Unicode scalar.
    pub fn new(end_marker: u32) -> Result<Self> {
        if end_marker <= u32::from(char::MAX) || end_marker >> CODE_POINT_BITS != 0 {
            return Err(CodecError::InvalidAlphabet(format!(
                "char end marker {end_marker:#x} must lie in 0x110000..=0x1fffff"
            )));
        }
        Ok(Self { end_marker })
    }

    pub fn end_marker(&self) -> u32 {
        self.end_marker
    }
}

impl EscapeStrategy<char> for CharEscape {
    fn write_raw(&self, symbol: &char, sink: &mut BitSink) -> Result<()> {
        sink.write_bits(u64::from(u32::from(*symbol)), CODE_POINT_BITS)?;
        sink.write_bits(u64::from(self.end_marker), CODE_POINT_BITS)
    }

    fn read_raw(&self, source: &mut BitSource<'_>) -> Result<char> {
        let raw = source.read_bits(CODE_POINT_BITS)? as u32;
        let symbol = char::from_u32(raw)
            .ok_or_else(|| CodecError::CorruptStream(format!("invalid code point {raw:#x}")))?;
        let marker = source.read_bits(CODE_POINT_BITS)? as u32;
        if marker != self.end_marker {
            return Err(CodecError::CorruptStream(format!(
                "expected char end marker {:#x}, found {marker:#x}",
                self.end_marker
            )));
        }
        Ok(symbol)
    }
}

pub type CharCodec = Codec<char, CharEscape>;

impl Codec<char, CharEscape> {
    pub fn from_table(table: &FrequencyTable<char>) -> Result<Self> {
        Codec::new(table, CharEscape::default())
    }

    /// Like [`CharCodec::from_table`] with the end marker taken from `config`.
    pub fn from_config(table: &FrequencyTable<char>, config: &CodecConfig) -> Result<Self> {
        Codec::new(table, CharEscape::new(config.char_end_marker)?)
    }

    /// Train on every character of `sample` using the config's escape and threshold.
    pub fn train<I>(sample: I, config: &CodecConfig) -> Result<Self>
    where
        I: IntoIterator<Item = char>,
    {
        let table = FrequencyTable::train(sample, config.char_escape, config.minimum_occurrences);
        Self::from_config(&table, config)
    }

    pub fn encode_str(&self, text: &str) -> Result<BitBuffer> {
        self.encode(text.chars())
    }

    pub fn decode_string(&self, data: &BitBuffer) -> Result<String> {
        self.decoder(data)
            .map(|item| item.map(|(_, c)| c))
            .collect()
    }
}
