//! Frozen symbol weights plus the escape symbol
//!
//! A table is built once, from observed counts or from a persisted
//! `symbol=count` listing, and never changes afterwards. Entries iterate in
//! ascending symbol order, which fixes the leaf order seen by the code builder.

use std::borrow::{Borrow, Cow};
use std::collections::BTreeMap;
use std::fmt::Debug;
use std::hash::Hash;
use std::io::{BufRead, Write};

use tracing::debug;

use crate::error::{CodecError, Result};
use crate::properties;

/// Anything that can sit in a trained alphabet.
pub trait Symbol: Clone + Eq + Hash + Ord + Debug {}

impl<T: Clone + Eq + Hash + Ord + Debug> Symbol for T {}

/// Symbols with a textual form for the persisted table format.
pub trait TextSymbol: Symbol {
    fn to_text(&self) -> Result<Cow<'_, str>>;
    fn from_text(text: &str) -> std::result::Result<Self, String>;
}

impl TextSymbol for char {
    fn to_text(&self) -> Result<Cow<'_, str>> {
        Ok(Cow::Owned(self.to_string()))
    }

    fn from_text(text: &str) -> std::result::Result<Self, String> {
        let mut chars = text.chars();
        match (chars.next(), chars.next()) {
            (Some(c), None) => Ok(c),
            _ => Err(format!("expected a single character, got {text:?}")),
        }
    }
}

impl TextSymbol for String {
    fn to_text(&self) -> Result<Cow<'_, str>> {
        Ok(Cow::Borrowed(self))
    }

    fn from_text(text: &str) -> std::result::Result<Self, String> {
        Ok(text.to_string())
    }
}

/// Prefixes every list element in the text form, so `[]` and `[""]` differ.
pub const LIST_SEPARATOR: char = '\u{1F}';

impl TextSymbol for Vec<String> {
    fn to_text(&self) -> Result<Cow<'_, str>> {
        let mut text = String::new();
        for element in self {
            if element.contains(LIST_SEPARATOR) {
                return Err(CodecError::UnrepresentableSymbol(format!(
                    "list element {element:?} contains the list separator"
                )));
            }
            text.push(LIST_SEPARATOR);
            text.push_str(element);
        }
        Ok(Cow::Owned(text))
    }

    fn from_text(text: &str) -> std::result::Result<Self, String> {
        if text.is_empty() {
            return Ok(Vec::new());
        }
        match text.strip_prefix(LIST_SEPARATOR) {
            Some(rest) => Ok(rest.split(LIST_SEPARATOR).map(str::to_string).collect()),
            None => Err("list text must start with the list separator".to_string()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrequencyTable<S: Symbol> {
    weights: BTreeMap<S, u64>,
    escape: S,
    minimum_occurrences: u64,
    dropped: usize,
}

impl<S: Symbol> FrequencyTable<S> {
    /// Build from (symbol, count) pairs. Duplicates are summed, zero counts and
    /// counts below `minimum_occurrences` are dropped. The escape symbol is always
    /// kept, with weight 1 when it was never counted.
    pub fn from_counts<I>(counts: I, escape: S, minimum_occurrences: u64) -> Self
    where
        I: IntoIterator<Item = (S, u64)>,
    {
        let mut raw: BTreeMap<S, u64> = BTreeMap::new();
        for (symbol, count) in counts {
            let weight = raw.entry(symbol).or_insert(0);
            *weight = weight.saturating_add(count);
        }

        let threshold = minimum_occurrences.max(1);
        let escape_weight = raw.remove(&escape).filter(|&w| w > 0).unwrap_or(1);
        let before = raw.len();
        raw.retain(|_, weight| *weight >= threshold);
        let dropped = before - raw.len();
        raw.insert(escape.clone(), escape_weight);

        debug!(
            kept = raw.len(),
            dropped,
            minimum_occurrences = threshold,
            "built frequency table"
        );
        Self {
            weights: raw,
            escape,
            minimum_occurrences: threshold,
            dropped,
        }
    }

    /// Count every symbol in a training sample.
    pub fn train<I>(symbols: I, escape: S, minimum_occurrences: u64) -> Self
    where
        I: IntoIterator<Item = S>,
    {
        let mut counts: BTreeMap<S, u64> = BTreeMap::new();
        for symbol in symbols {
            *counts.entry(symbol).or_insert(0) += 1;
        }
        Self::from_counts(counts, escape, minimum_occurrences)
    }

    /// Entries in ascending symbol order, escape included.
    pub fn iter(&self) -> impl Iterator<Item = (&S, u64)> + '_ {
        self.weights.iter().map(|(symbol, &weight)| (symbol, weight))
    }

    pub fn len(&self) -> usize {
        self.weights.len()
    }

    pub fn is_empty(&self) -> bool {
        self.weights.is_empty()
    }

    pub fn contains<Q>(&self, symbol: &Q) -> bool
    where
        S: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.weights.contains_key(symbol)
    }

    pub fn weight<Q>(&self, symbol: &Q) -> Option<u64>
    where
        S: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.weights.get(symbol).copied()
    }

    pub fn escape(&self) -> &S {
        &self.escape
    }

    pub fn minimum_occurrences(&self) -> u64 {
        self.minimum_occurrences
    }

    /// How many counted symbols fell under the threshold.
    pub fn dropped(&self) -> usize {
        self.dropped
    }
}

impl<S: TextSymbol> FrequencyTable<S> {
    /// Read a `symbol=count` listing. The escape symbol and threshold are not
    /// part of the file and must be supplied by the caller.
    pub fn load<R: BufRead>(reader: R, escape: S, minimum_occurrences: u64) -> Result<Self> {
        let mut counts = Vec::new();
        for (number, line) in reader.lines().enumerate() {
            let line = line?;
            let number = number + 1;
            if properties::is_blank_or_comment(&line) {
                continue;
            }
            let malformed = |reason: String| CodecError::MalformedTable {
                line: number,
                reason,
            };
            let (key, value) = properties::split_entry(properties::trim_indent(&line))
                .ok_or_else(|| malformed("missing '=' separator".to_string()))?;
            let text = properties::unescape_key(key).map_err(malformed)?;
            let symbol = S::from_text(&text).map_err(malformed)?;
            let count = value
                .trim()
                .parse::<u64>()
                .map_err(|e| malformed(format!("bad count {:?}: {e}", value.trim())))?;
            counts.push((symbol, count));
        }
        debug!(entries = counts.len(), "loaded frequency table");
        Ok(Self::from_counts(counts, escape, minimum_occurrences))
    }

    /// Write one `symbol=count` line per entry, in table order.
    pub fn save<W: Write>(&self, mut writer: W) -> Result<()> {
        for (symbol, weight) in self.iter() {
            let text = symbol.to_text()?;
            writeln!(writer, "{}={}", properties::escape_key(&text), weight)?;
        }
        writer.flush()?;
        debug!(entries = self.len(), "saved frequency table");
        Ok(())
    }
}
