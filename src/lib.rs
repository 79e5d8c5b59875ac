//! symbol-huffman: frequency-trained Huffman codecs for discrete symbols.
//!
//! A frozen [`FrequencyTable`] is turned into a deterministic prefix code.
//! Encoding packs each symbol's code into a bit stream with no byte alignment;
//! symbols outside the trained alphabet are sent as an escape code plus a raw
//! payload. Decoding walks the code trie and pushes `(index, symbol)` pairs to
//! a consumer that may stop early.
//!
//! Specializations:
//! - [`CharCodec`] for single characters
//! - [`StringCodec`] for whole strings, escaping through characters
//! - [`ListCodec`] for string lists, escaping through strings
//!
//! ```
//! use symbol_huffman::{CodecConfig, Directive, StringCodec};
//!
//! let codec = StringCodec::train(["bicycle", "barrier", "highway"], &CodecConfig::default()).unwrap();
//! let input = vec!["highway".to_string(), "footway".to_string()];
//! let encoded = codec.encode(&input).unwrap();
//!
//! let mut decoded = Vec::new();
//! codec
//!     .decode(&encoded, |_, symbol| {
//!         decoded.push(symbol);
//!         Directive::Continue
//!     })
//!     .unwrap();
//! assert_eq!(decoded, input);
//! ```

pub mod bitio;
pub mod char_codec;
pub mod codec;
pub mod config;
pub mod error;
pub mod frequency;
pub mod huffman;
pub mod list_codec;
pub mod properties;
pub mod string_codec;
pub mod varint;

pub use crate::bitio::{BitBuffer, BitSink, BitSource};
pub use crate::char_codec::{CharCodec, CharEscape};
pub use crate::codec::{Codec, Decoder, Directive, EscapeStrategy};
pub use crate::config::CodecConfig;
pub use crate::error::{CodecError, Result};
pub use crate::frequency::{FrequencyTable, Symbol, TextSymbol};
pub use crate::huffman::{Code, HuffmanCode, Matcher, Step};
pub use crate::list_codec::{ListCodec, ListEscape};
pub use crate::string_codec::{StringCodec, StringEscape};
