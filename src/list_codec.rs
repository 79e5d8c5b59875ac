//! List codec: whole string lists as symbols
//!
//! Escape payload: varint element count, then each element through the string
//! codec. The list escape symbol is the one-element list holding the string
//! escape symbol.

use std::collections::BTreeMap;

use crate::bitio::{BitSink, BitSource};
use crate::codec::{Codec, EscapeStrategy};
use crate::config::CodecConfig;
use crate::error::{CodecError, Result};
use crate::frequency::FrequencyTable;
use crate::string_codec::{string_tables, StringCodec};
use crate::varint;

#[derive(Debug, Clone)]
pub struct ListEscape {
    strings: StringCodec,
    max_length: usize,
}

impl ListEscape {
    pub fn new(strings: StringCodec, max_length: usize) -> Self {
        Self {
            strings,
            max_length,
        }
    }

    pub fn strings(&self) -> &StringCodec {
        &self.strings
    }
}

impl EscapeStrategy<Vec<String>> for ListEscape {
    fn write_raw(&self, symbol: &Vec<String>, sink: &mut BitSink) -> Result<()> {
        if symbol.len() > self.max_length {
            return Err(CodecError::UnrepresentableSymbol(format!(
                "list of {} elements exceeds the escape limit of {}",
                symbol.len(),
                self.max_length
            )));
        }
        varint::write_unsigned(sink, symbol.len() as u64)?;
        for element in symbol {
            self.strings.write_symbol(element, sink)?;
        }
        Ok(())
    }

    fn read_raw(&self, source: &mut BitSource<'_>) -> Result<Vec<String>> {
        let count = varint::read_unsigned(source)?;
        if count > self.max_length as u64 {
            return Err(CodecError::CorruptStream(format!(
                "escaped list length {count} exceeds the limit of {}",
                self.max_length
            )));
        }
        // the count is untrusted until the elements have actually been read
        let mut list = Vec::with_capacity((count as usize).min(64));
        for _ in 0..count {
            list.push(self.strings.read_symbol(source)?);
        }
        Ok(list)
    }
}

pub type ListCodec = Codec<Vec<String>, ListEscape>;

/// The list escape symbol derived from a config.
pub fn list_escape(config: &CodecConfig) -> Vec<String> {
    vec![config.string_escape.clone()]
}

impl Codec<Vec<String>, ListEscape> {
    pub fn from_tables(
        lists: &FrequencyTable<Vec<String>>,
        strings: &FrequencyTable<String>,
        chars: &FrequencyTable<char>,
        config: &CodecConfig,
    ) -> Result<Self> {
        let escape = ListEscape::new(
            StringCodec::from_tables(strings, chars, config)?,
            config.max_escaped_length,
        );
        Codec::new(lists, escape)
    }

    /// Train list, string and character alphabets from one sample of lists.
    pub fn train<I>(sample: I, config: &CodecConfig) -> Result<Self>
    where
        I: IntoIterator<Item = Vec<String>>,
    {
        let mut lists: BTreeMap<Vec<String>, u64> = BTreeMap::new();
        for list in sample {
            *lists.entry(list).or_insert(0) += 1;
        }
        let elements = lists
            .iter()
            .flat_map(|(list, &count)| list.iter().flat_map(move |s| std::iter::repeat(s).take(count as usize)));
        let (strings, chars) = string_tables(elements, config);
        let lists = FrequencyTable::from_counts(lists, list_escape(config), config.minimum_occurrences);
        Self::from_tables(&lists, &strings, &chars, config)
    }

    pub fn string_codec(&self) -> &StringCodec {
        self.escape_strategy().strings()
    }
}
