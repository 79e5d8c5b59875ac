//! Integration tests for symbol-huffman

use std::fs::File;
use std::io::BufReader;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use symbol_huffman::*;

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

fn collect<S: Symbol, E: EscapeStrategy<S>>(
    codec: &Codec<S, E>,
    data: &BitBuffer,
) -> anyhow::Result<(Vec<(usize, S)>, usize)> {
    let mut seen = Vec::new();
    let calls = codec.decode(data, |index, symbol| {
        seen.push((index, symbol));
        Directive::Continue
    })?;
    Ok((seen, calls))
}

fn ascii_codec(config: &CodecConfig) -> anyhow::Result<CharCodec> {
    let table = FrequencyTable::from_counts((0u8..128).map(|b| (char::from(b), 1)), config.char_escape, 1);
    Ok(CharCodec::from_table(&table)?)
}

#[test]
fn test_scenario_a_weighted_strings() -> anyhow::Result<()> {
    let config = CodecConfig::default();
    let table = FrequencyTable::from_counts(
        vec![
            ("abc".to_string(), 1000),
            ("def".to_string(), 100),
            ("ghi".to_string(), 10),
            ("jkl".to_string(), 1),
        ],
        config.string_escape.clone(),
        1,
    );
    // base alphabet holds nothing but its escape
    let chars = FrequencyTable::from_counts(Vec::new(), config.char_escape, 1);
    let codec = StringCodec::from_tables(&table, &chars, &config)?;

    let encoded = codec.encode(strings(&["abc", "def"]))?;
    let (seen, calls) = collect(&codec, &encoded)?;
    assert_eq!(seen, vec![(0, "abc".to_string()), (1, "def".to_string())]);
    assert_eq!(calls, 2);
    Ok(())
}

#[test]
fn test_scenario_b_single_ascii_char() -> anyhow::Result<()> {
    let codec = ascii_codec(&CodecConfig::default())?;
    let encoded = codec.encode(['z'])?;
    let (seen, _) = collect(&codec, &encoded)?;
    assert_eq!(seen, vec![(0, 'z')]);
    Ok(())
}

#[test]
fn test_scenario_c_mixed_trained_and_untrained_chars() -> anyhow::Result<()> {
    let config = CodecConfig::default();
    let table = FrequencyTable::from_counts(
        ('0'..='9').map(|c| (c, 50)).chain([('\'', 3)]),
        config.char_escape,
        1,
    );
    let codec = CharCodec::from_table(&table)?;
    let text = "880號州際公路'";
    let encoded = codec.encode_str(text)?;
    let (seen, calls) = collect(&codec, &encoded)?;
    assert_eq!(calls, text.chars().count());
    let expected: Vec<(usize, char)> = text.chars().enumerate().collect();
    assert_eq!(seen, expected);
    Ok(())
}

#[test]
fn test_scenario_d_trained_strings() -> anyhow::Result<()> {
    let sample = ["bicycle", "barrier", "highway"];
    let codec = StringCodec::train(sample, &CodecConfig::default())?;
    let input = strings(&sample);
    let encoded = codec.encode(&input)?;
    let (seen, calls) = collect(&codec, &encoded)?;
    assert_eq!(calls, 3);
    assert_eq!(seen.last().map(|(index, _)| *index), Some(2));
    let decoded: Vec<String> = seen.into_iter().map(|(_, s)| s).collect();
    assert_eq!(decoded, input);
    Ok(())
}

#[test]
fn test_scenario_e_threshold_symbol_escapes() -> anyhow::Result<()> {
    let config = CodecConfig {
        minimum_occurrences: 2,
        ..CodecConfig::default()
    };
    let mut sample = vec!["common"; 10];
    sample.push("rare");
    let codec = StringCodec::train(sample, &config)?;
    assert!(codec.code().code_of("rare").is_none());
    assert!(codec.code().code_of("common").is_some());

    let input = strings(&["rare", "common", "rare"]);
    let encoded = codec.encode(&input)?;
    assert_eq!(codec.decode_all(&encoded)?, input);
    Ok(())
}

#[test]
fn test_early_stop_never_overreads() -> anyhow::Result<()> {
    let codec = StringCodec::train(["a", "b", "c"], &CodecConfig::default())?;
    let input = strings(&["a", "b", "zz", "c", "a", "unknown"]);
    let encoded = codec.encode(&input)?;
    let mut indices = Vec::new();
    let calls = codec.decode(&encoded, |index, _| {
        indices.push(index);
        if index == 2 {
            Directive::Stop
        } else {
            Directive::Continue
        }
    })?;
    assert_eq!(calls, 3);
    assert_eq!(indices, vec![0, 1, 2]);
    Ok(())
}

#[test]
fn test_escape_boundaries() -> anyhow::Result<()> {
    let config = CodecConfig {
        max_escaped_length: 16,
        ..CodecConfig::default()
    };
    let codec = StringCodec::train(["ab"], &config)?;
    let longest: String = std::iter::repeat('\u{10FFFF}').take(16).collect();
    let input = vec![longest, "\u{0}".to_string(), String::new()];
    let encoded = codec.encode(&input)?;
    assert_eq!(codec.decode_all(&encoded)?, input);

    let too_long: String = std::iter::repeat('x').take(17).collect();
    assert!(matches!(
        codec.encode([too_long]),
        Err(CodecError::UnrepresentableSymbol(_))
    ));
    Ok(())
}

#[test]
fn test_random_roundtrip() -> anyhow::Result<()> {
    let mut rng = StdRng::seed_from_u64(0x5eed);
    let words = ["name", "highway", "building", "surface", "oneway", "ref"];
    let codec = StringCodec::train(words.iter().cycle().take(40), &CodecConfig::default())?;

    for _ in 0..50 {
        let len = rng.gen_range(0..40);
        let input: Vec<String> = (0..len)
            .map(|_| {
                if rng.gen_bool(0.7) {
                    words[rng.gen_range(0..words.len())].to_string()
                } else {
                    let chars = rng.gen_range(0..6);
                    (0..chars).map(|_| rng.gen::<char>()).collect()
                }
            })
            .collect();
        let encoded = codec.encode(&input)?;
        assert_eq!(codec.decode_all(&encoded)?, input);

        let padded = BitBuffer::from_bytes(encoded.as_bytes().to_vec());
        let decoded: Vec<String> = codec
            .decoder_counted(&padded, input.len())
            .map(|item| item.map(|(_, s)| s))
            .collect::<Result<_>>()?;
        assert_eq!(decoded, input);
    }
    Ok(())
}

#[test]
fn test_codes_are_prefix_free_and_deterministic() -> anyhow::Result<()> {
    let sample = ["x", "x", "y", "y", "z", "z", "w", "v", "u", "u"];
    let first = StringCodec::train(sample, &CodecConfig::default())?;
    let second = StringCodec::train(sample, &CodecConfig::default())?;

    let codes: Vec<(String, Code)> = first.code().iter().map(|(s, c)| (s.clone(), c)).collect();
    let again: Vec<(String, Code)> = second.code().iter().map(|(s, c)| (s.clone(), c)).collect();
    assert_eq!(codes, again);
    for (i, (_, a)) in codes.iter().enumerate() {
        for (_, b) in &codes[i + 1..] {
            assert!(!a.is_prefix_of(b) && !b.is_prefix_of(a));
        }
    }

    let input = strings(&["u", "x", "new", "v"]);
    assert_eq!(first.encode(&input)?, second.encode(&input)?);
    Ok(())
}

#[test]
fn test_persisted_tables_rebuild_identical_codec() -> anyhow::Result<()> {
    let config = CodecConfig::default();
    let sample = ["highway", "highway", "name", "ref=A1", "#note"];
    let mut string_counts = std::collections::BTreeMap::new();
    for s in sample {
        *string_counts.entry(s.to_string()).or_insert(0u64) += 1;
    }
    let string_table = FrequencyTable::from_counts(string_counts, config.string_escape.clone(), 1);
    let char_table = FrequencyTable::train(sample.iter().flat_map(|s| s.chars()), config.char_escape, 1);
    let codec = StringCodec::from_tables(&string_table, &char_table, &config)?;

    let dir = tempfile::tempdir()?;
    let strings_path = dir.path().join("strings.properties");
    let chars_path = dir.path().join("chars.properties");
    string_table.save(File::create(&strings_path)?)?;
    char_table.save(File::create(&chars_path)?)?;

    let loaded_strings = FrequencyTable::<String>::load(
        BufReader::new(File::open(&strings_path)?),
        config.string_escape.clone(),
        1,
    )?;
    let loaded_chars =
        FrequencyTable::<char>::load(BufReader::new(File::open(&chars_path)?), config.char_escape, 1)?;
    assert_eq!(loaded_strings, string_table);
    assert_eq!(loaded_chars, char_table);

    let rebuilt = StringCodec::from_tables(&loaded_strings, &loaded_chars, &config)?;
    let input = strings(&["ref=A1", "highway", "bridge"]);
    let encoded = codec.encode(&input)?;
    assert_eq!(rebuilt.encode(&input)?, encoded);
    assert_eq!(rebuilt.decode_all(&encoded)?, input);
    Ok(())
}

#[test]
fn test_list_codec_with_persisted_list_table() -> anyhow::Result<()> {
    let config = CodecConfig::default();
    let sample = vec![
        strings(&["highway", "primary"]),
        strings(&["highway", "primary"]),
        strings(&["amenity", "cafe"]),
    ];
    let codec = ListCodec::train(sample.clone(), &config)?;

    let lists = FrequencyTable::train(sample, list_codec::list_escape(&config), 1);
    let mut persisted = Vec::new();
    lists.save(&mut persisted)?;
    let loaded = FrequencyTable::<Vec<String>>::load(&persisted[..], list_codec::list_escape(&config), 1)?;
    assert_eq!(loaded, lists);

    let input = vec![
        strings(&["highway", "primary"]),
        strings(&["amenity", "bench"]),
        Vec::new(),
    ];
    let encoded = codec.encode(&input)?;
    assert_eq!(codec.decode_all(&encoded)?, input);
    Ok(())
}

#[test]
fn test_ascii_codec_serialized_buffer() -> anyhow::Result<()> {
    let codec = ascii_codec(&CodecConfig::default())?;
    let encoded = codec.encode_str("bit buffers keep their length")?;
    let json = serde_json::to_string(&encoded)?;
    let restored: BitBuffer = serde_json::from_str(&json)?;
    assert_eq!(restored.bit_len(), encoded.bit_len());
    assert_eq!(codec.decode_string(&restored)?, "bit buffers keep their length");
    Ok(())
}

#[test]
fn test_config_from_json_drives_codec() -> anyhow::Result<()> {
    let config = CodecConfig::from_json(r#"{"char_escape": "~", "minimum_occurrences": 2}"#)?;
    let codec = CharCodec::train("aab~~c".chars(), &config)?;
    assert!(codec.code().is_escape(&'~'));
    assert!(codec.code().code_of(&'b').is_none());
    let encoded = codec.encode_str("abc~")?;
    assert_eq!(codec.decode_string(&encoded)?, "abc~");
    Ok(())
}
