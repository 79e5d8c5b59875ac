//! String codec: whole strings as symbols, characters as the fallback
//!
//! Escape payload: varint char count, each char through the char codec (which
//! may escape again), then the end-of-string char.

use std::collections::BTreeMap;

use crate::bitio::{BitSink, BitSource};
use crate::char_codec::CharCodec;
use crate::codec::{Codec, EscapeStrategy};
use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::frequency::FrequencyTable;
use crate::varint;

#[derive(Debug, Clone)]
pub struct StringEscape {
    chars: CharCodec,
    end_of_string: char,
    max_length: usize,
}

impl StringEscape {
    pub fn new(chars: CharCodec, end_of_string: char, max_length: usize) -> Self {
        Self {
            chars,
            end_of_string,
            max_length,
        }
    }

    pub fn chars(&self) -> &CharCodec {
        &self.chars
    }

    pub fn end_of_string(&self) -> char {
        self.end_of_string
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }
}

impl EscapeStrategy<String> for StringEscape {
    fn write_raw(&self, symbol: &String, sink: &mut BitSink) -> Result<()> {
        let length = symbol.chars().count();
        if length > self.max_length {
            return Err(CodecError::UnrepresentableSymbol(format!(
                "string of {length} chars exceeds the escape limit of {}",
                self.max_length
            )));
        }
        varint::write_unsigned(sink, length as u64)?;
        for c in symbol.chars() {
            self.chars.write_symbol(&c, sink)?;
        }
        self.chars.write_symbol(&self.end_of_string, sink)
    }

    fn read_raw(&self, source: &mut BitSource<'_>) -> Result<String> {
        let length = varint::read_unsigned(source)?;
        if length > self.max_length as u64 {
            return Err(CodecError::CorruptStream(format!(
                "escaped string length {length} exceeds the limit of {}",
                self.max_length
            )));
        }
        // the count is untrusted until the chars have actually been read
        let mut text = String::with_capacity((length as usize).min(64));
        for _ in 0..length {
            text.push(self.chars.read_symbol(source)?);
        }
        let end = self.chars.read_symbol(source)?;
        if end != self.end_of_string {
            return Err(CodecError::CorruptStream(format!(
                "expected end-of-string marker, found {end:?}"
            )));
        }
        Ok(text)
    }
}

pub type StringCodec = Codec<String, StringEscape>;

impl Codec<String, StringEscape> {
    pub fn from_tables(
        strings: &FrequencyTable<String>,
        chars: &FrequencyTable<char>,
        config: &CodecConfig,
    ) -> Result<Self> {
        let escape = StringEscape::new(
            CharCodec::from_config(chars, config)?,
            config.end_of_string,
            config.max_escaped_length,
        );
        Codec::new(strings, escape)
    }

    /// Train the string alphabet and its base character alphabet from one sample.
    pub fn train<I, T>(sample: I, config: &CodecConfig) -> Result<Self>
    where
        I: IntoIterator<Item = T>,
        T: AsRef<str>,
    {
        let (strings, chars) = string_tables(sample, config);
        Self::from_tables(&strings, &chars, config)
    }

    pub fn char_codec(&self) -> &CharCodec {
        self.escape_strategy().chars()
    }
}

/// Count whole strings and their characters. Each string also counts one
/// end-of-string marker, so the marker gets a trained code.
pub(crate) fn string_tables<I, T>(
    sample: I,
    config: &CodecConfig,
) -> (FrequencyTable<String>, FrequencyTable<char>)
where
    I: IntoIterator<Item = T>,
    T: AsRef<str>,
{
    let mut strings: BTreeMap<String, u64> = BTreeMap::new();
    let mut chars: BTreeMap<char, u64> = BTreeMap::new();
    for text in sample {
        let text = text.as_ref();
        *strings.entry(text.to_string()).or_insert(0) += 1;
        for c in text.chars() {
            *chars.entry(c).or_insert(0) += 1;
        }
        *chars.entry(config.end_of_string).or_insert(0) += 1;
    }
    (
        FrequencyTable::from_counts(
            strings,
            config.string_escape.clone(),
            config.minimum_occurrences,
        ),
        FrequencyTable::from_counts(chars, config.char_escape, config.char_minimum_occurrences),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tags() -> StringCodec {
        let sample = ["highway", "highway", "highway", "name", "name", "oneway"];
        StringCodec::train(sample, &CodecConfig::default()).unwrap()
    }

    #[test]
    fn test_trained_and_escaped_strings() {
        let codec = tags();
        let input: Vec<String> = ["highway", "surface", "", "name", "高速"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        let encoded = codec.encode(&input).unwrap();
        assert_eq!(codec.decode_all(&encoded).unwrap(), input);
    }

    #[test]
    fn test_marker_chars_inside_strings() {
        let codec = tags();
        let config = CodecConfig::default();
        let input = vec![
            format!("a{}b", config.end_of_string),
            config.string_escape.clone(),
            format!("{}{}", config.char_escape, config.char_escape),
        ];
        let encoded = codec.encode(&input).unwrap();
        assert_eq!(codec.decode_all(&encoded).unwrap(), input);
    }

    #[test]
    fn test_length_limit() {
        let config = CodecConfig {
            max_escaped_length: 4,
            ..CodecConfig::default()
        };
        let codec = StringCodec::train(["ab"], &config).unwrap();
        let fits = vec!["abba".to_string()];
        let encoded = codec.encode(&fits).unwrap();
        assert_eq!(codec.decode_all(&encoded).unwrap(), fits);

        let err = codec.encode(["abbab".to_string()]).unwrap_err();
        assert!(matches!(err, CodecError::UnrepresentableSymbol(_)));
    }

    #[test]
    fn test_missing_end_marker_is_corrupt() {
        let codec = tags();
        let mut sink = BitSink::new();
        codec.code().escape_code().write(&mut sink).unwrap();
        varint::write_unsigned(&mut sink, 1).unwrap();
        codec.char_codec().write_symbol(&'h', &mut sink).unwrap();
        codec.char_codec().write_symbol(&'h', &mut sink).unwrap();
        let buffer = sink.finish().unwrap();
        assert!(matches!(
            codec.decode_all(&buffer),
            Err(CodecError::CorruptStream(_))
        ));
    }

    #[test]
    fn test_huge_declared_length_fails_without_allocating() {
        let config = CodecConfig {
            max_escaped_length: usize::MAX,
            ..CodecConfig::default()
        };
        let codec = StringCodec::train(["ab"], &config).unwrap();
        let mut sink = BitSink::new();
        codec.code().escape_code().write(&mut sink).unwrap();
        varint::write_unsigned(&mut sink, u64::MAX >> 2).unwrap();
        let buffer = sink.finish().unwrap();
        assert!(matches!(
            codec.decode_all(&buffer),
            Err(CodecError::TruncatedStream { symbol_index: 0, .. })
        ));
    }

    #[test]
    fn test_string_tables_count_end_markers() {
        let config = CodecConfig::default();
        let (strings, chars) = string_tables(["ab", "b"], &config);
        assert_eq!(strings.weight("ab"), Some(1));
        assert_eq!(chars.weight(&'b'), Some(2));
        assert_eq!(chars.weight(&config.end_of_string), Some(2));
    }
}
