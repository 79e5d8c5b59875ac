//! `key=value` line format with properties-style escaping
//!
//! Keys may hold any character: separators, line breaks and leading comment
//! markers are backslash escaped, other control characters become `\uXXXX`.
//! Only ASCII space, tab and form feed count as line indentation; any other
//! whitespace at the start of a key is written as `\uXXXX`.

/// Indentation skipped before a key or comment marker.
const INDENT: [char; 3] = [' ', '\t', '\u{c}'];

fn push_unicode_escape(out: &mut String, c: char) {
    out.push_str(&format!("\\u{:04X}", c as u32));
}

pub fn escape_key(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 2);
    for (i, c) in key.chars().enumerate() {
        match c {
            '\\' => out.push_str("\\\\"),
            '=' => out.push_str("\\="),
            ':' => out.push_str("\\:"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            '\u{c}' => out.push_str("\\f"),
            '#' | '!' | ' ' if i == 0 => {
                out.push('\\');
                out.push(c);
            }
            c if c.is_control() || (i == 0 && c.is_whitespace()) => {
                push_unicode_escape(&mut out, c)
            }
            c => out.push(c),
        }
    }
    out
}

pub fn unescape_key(raw: &str) -> Result<String, String> {
    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('f') => out.push('\u{c}'),
            Some('u') => {
                let hex: String = chars.by_ref().take(4).collect();
                let code = u32::from_str_radix(&hex, 16)
                    .ok()
                    .filter(|_| hex.len() == 4)
                    .and_then(char::from_u32)
                    .ok_or_else(|| format!("bad unicode escape \\u{hex}"))?;
                out.push(code);
            }
            Some(other) => out.push(other),
            None => return Err("dangling backslash".to_string()),
        }
    }
    Ok(out)
}

/// Split an entry line at its first unescaped `=` or `:`.
pub fn split_entry(line: &str) -> Option<(&str, &str)> {
    let mut escaped = false;
    for (i, c) in line.char_indices() {
        match c {
            _ if escaped => escaped = false,
            '\\' => escaped = true,
            '=' | ':' => return Some((&line[..i], &line[i + 1..])),
            _ => {}
        }
    }
    None
}

/// Strip the indentation of a line, leaving other whitespace in place.
pub fn trim_indent(line: &str) -> &str {
    line.trim_start_matches(&INDENT[..])
}

/// Blank lines and `#`/`!` comments carry no entry.
pub fn is_blank_or_comment(line: &str) -> bool {
    let trimmed = trim_indent(line);
    trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with('!')
}
