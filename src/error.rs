//! Error types for symbol-huffman

use thiserror::Error;

pub type Result<T> = std::result::Result<T, CodecError>;

#[derive(Error, Debug)]
pub enum CodecError {
    #[error("invalid alphabet: {0}")]
    InvalidAlphabet(String),

    #[error("stream truncated inside symbol {symbol_index} (symbol started at bit {bit_offset})")]
    TruncatedStream { symbol_index: usize, bit_offset: u64 },

    #[error("end of stream: requested {requested} bits, {remaining} remaining")]
    EndOfStream { requested: u32, remaining: u64 },

    #[error("symbol cannot be represented on the escape path: {0}")]
    UnrepresentableSymbol(String),

    #[error("corrupt stream: {0}")]
    CorruptStream(String),

    #[error("bit count {0} outside 1..=64")]
    InvalidBitCount(u32),

    #[error("bit position {position} outside stream of {len} bits")]
    SeekOutOfRange { position: u64, len: u64 },

    #[error("malformed frequency table at line {line}: {reason}")]
    MalformedTable { line: usize, reason: String },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid configuration: {0}")]
    Config(#[from] serde_json::Error),
}
