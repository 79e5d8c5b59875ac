//! Configuration for symbol-huffman codecs

use serde::{Deserialize, Serialize};

use crate::error::Result;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Trained symbols seen fewer times than this are left to the escape path.
    pub minimum_occurrences: u64,
    /// Threshold applied to the base character alphabet of string and list codecs.
    pub char_minimum_occurrences: u64,
    pub char_escape: char,
    /// 21-bit pattern closing an escaped char; must lie above U+10FFFF.
    pub char_end_marker: u32,
    pub string_escape: String,
    pub end_of_string: char,
    /// Longest string (in chars) or list (in elements) accepted on the escape path.
    pub max_escaped_length: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            minimum_occurrences: 1,
            char_minimum_occurrences: 1,
            char_escape: '\u{FFFF}',
            char_end_marker: 0x1F_FFFF,
            string_escape: "\u{FFFF}".to_string(),
            end_of_string: '\u{0}',
            max_escaped_length: 1 << 20,
        }
    }
}

impl CodecConfig {
    /// Parse a config from JSON; missing fields take their defaults.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = CodecConfig::from_json(r#"{"minimum_occurrences": 3, "char_escape": "~"}"#).unwrap();
        assert_eq!(config.minimum_occurrences, 3);
        assert_eq!(config.char_escape, '~');
        assert_eq!(config.end_of_string, '\u{0}');
        assert_eq!(config.char_end_marker, 0x1F_FFFF);
        assert_eq!(config.max_escaped_length, 1 << 20);
    }

    #[test]
    fn test_invalid_json() {
        assert!(CodecConfig::from_json("{minimum_occurrences").is_err());
    }

    #[test]
    fn test_json_roundtrip() {
        let config = CodecConfig {
            max_escaped_length: 64,
            ..CodecConfig::default()
        };
        let json = serde_json::to_string(&config).unwrap();
        assert_eq!(CodecConfig::from_json(&json).unwrap(), config);
    }
}
