//! Generic Huffman symbol codec
//!
//! Trained symbols are sent as their Huffman code. Anything else, including the
//! escape symbol itself, is sent as the escape code followed by a raw payload
//! whose format belongs to the [`EscapeStrategy`] of the specialization.
//!
//! Streams carry no header. [`Codec::decode`] stops where the buffer's bit
//! length ends; [`Codec::decode_counted`] stops after a caller-supplied number
//! of symbols, which also works for bare bytes that still hold their padding.

use std::borrow::Borrow;

use tracing::trace;

use crate::bitio::{BitBuffer, BitSink, BitSource};
use crate::error::{CodecError, Result};
use crate::frequency::{FrequencyTable, Symbol};
use crate::huffman::HuffmanCode;

/// Returned by a decode consumer after each symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Continue,
    Stop,
}

/// Raw serialization of symbols that have no trained code.
pub trait EscapeStrategy<S> {
    fn write_raw(&self, symbol: &S, sink: &mut BitSink) -> Result<()>;
    fn read_raw(&self, source: &mut BitSource<'_>) -> Result<S>;
}

#[derive(Debug, Clone)]
pub struct Codec<S: Symbol, E> {
    code: HuffmanCode<S>,
    escape: E,
}

impl<S: Symbol, E: EscapeStrategy<S>> Codec<S, E> {
    pub fn new(table: &FrequencyTable<S>, escape: E) -> Result<Self> {
        Ok(Self::with_code(HuffmanCode::build(table)?, escape))
    }

    pub fn with_code(code: HuffmanCode<S>, escape: E) -> Self {
        Self { code, escape }
    }

    pub fn code(&self) -> &HuffmanCode<S> {
        &self.code
    }

    pub fn escape_strategy(&self) -> &E {
        &self.escape
    }

    /// Append one symbol, falling back to escape + raw payload when untrained.
    pub fn write_symbol(&self, symbol: &S, sink: &mut BitSink) -> Result<()> {
        match self.code.code_of(symbol) {
            Some(code) if code != self.code.escape_code() => code.write(sink),
            _ => {
                self.code.escape_code().write(sink)?;
                self.escape.write_raw(symbol, sink)
            }
        }
    }

    /// Read exactly one symbol. Running out of bits surfaces as `EndOfStream`.
    pub fn read_symbol(&self, source: &mut BitSource<'_>) -> Result<S> {
        let index = self.code.read_index(source)?;
        if self.code.is_escape_index(index) {
            return self.escape.read_raw(source);
        }
        self.code
            .symbol(index)
            .cloned()
            .ok_or_else(|| CodecError::CorruptStream(format!("trie leaf {index} has no symbol")))
    }

    /// Pull symbols until the producer is exhausted and pack them.
    pub fn encode<I>(&self, symbols: I) -> Result<BitBuffer>
    where
        I: IntoIterator,
        I::Item: Borrow<S>,
    {
        let mut sink = BitSink::new();
        for symbol in symbols {
            self.write_symbol(symbol.borrow(), &mut sink)?;
        }
        sink.finish()
    }

    /// Pull-style decoding over the whole bit length of `data`.
    pub fn decoder<'a>(&'a self, data: &'a BitBuffer) -> Decoder<'a, S, E> {
        Decoder {
            codec: self,
            source: data.reader(),
            index: 0,
            limit: None,
            done: false,
        }
    }

    /// Pull-style decoding of exactly `count` symbols.
    pub fn decoder_counted<'a>(&'a self, data: &'a BitBuffer, count: usize) -> Decoder<'a, S, E> {
        Decoder {
            limit: Some(count),
            ..self.decoder(data)
        }
    }

    /// Push every symbol to `consumer` until the stream ends or it returns
    /// [`Directive::Stop`]. Returns the number of consumer calls.
    pub fn decode<F>(&self, data: &BitBuffer, consumer: F) -> Result<usize>
    where
        F: FnMut(usize, S) -> Directive,
    {
        drive(self.decoder(data), consumer)
    }

    /// Like [`Codec::decode`] but bounded by a known symbol count.
    pub fn decode_counted<F>(&self, data: &BitBuffer, count: usize, consumer: F) -> Result<usize>
    where
        F: FnMut(usize, S) -> Directive,
    {
        drive(self.decoder_counted(data, count), consumer)
    }

    pub fn decode_all(&self, data: &BitBuffer) -> Result<Vec<S>> {
        self.decoder(data)
            .map(|item| item.map(|(_, symbol)| symbol))
            .collect()
    }
}

fn drive<S, E, F>(decoder: Decoder<'_, S, E>, mut consumer: F) -> Result<usize>
where
    S: Symbol,
    E: EscapeStrategy<S>,
    F: FnMut(usize, S) -> Directive,
{
    let mut calls = 0;
    for item in decoder {
        let (index, symbol) = item?;
        calls += 1;
        if consumer(index, symbol) == Directive::Stop {
            trace!(symbols = calls, "decode stopped by consumer");
            break;
        }
    }
    Ok(calls)
}

/// Iterator of `(index, symbol)` pairs. After the first error it yields nothing.
pub struct Decoder<'a, S: Symbol, E> {
    codec: &'a Codec<S, E>,
    source: BitSource<'a>,
    index: usize,
    limit: Option<usize>,
    done: bool,
}

impl<'a, S: Symbol, E> Decoder<'a, S, E> {
    /// Bit position of the next symbol.
    pub fn cursor(&self) -> u64 {
        self.source.cursor()
    }
}

impl<'a, S: Symbol, E: EscapeStrategy<S>> Iterator for Decoder<'a, S, E> {
    type Item = Result<(usize, S)>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }
        let finished = match self.limit {
            Some(limit) => self.index >= limit,
            None => self.source.is_exhausted(),
        };
        if finished {
            self.done = true;
            return None;
        }

        let start = self.source.cursor();
        match self.codec.read_symbol(&mut self.source) {
            Ok(symbol) => {
                let index = self.index;
                self.index += 1;
                Some(Ok((index, symbol)))
            }
            Err(err) => {
                self.done = true;
                Some(Err(match err {
                    CodecError::EndOfStream { .. } => CodecError::TruncatedStream {
                        symbol_index: self.index,
                        bit_offset: start,
                    },
                    other => other,
                }))
            }
        }
    }
}
