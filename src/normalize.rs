//! Normalizer - Canonical TML Syntax
//!
//! Pure lexical cleanup: color literals become packed RGB565 hex values,
//! alignment and font keywords become numeric codes, quotes and
//! insignificant whitespace are stripped. The output text is what gets
//! serialized into the artifact byte-for-byte, so every rule here is part
//! of the firmware contract.
//!
//! Unrecognized values are never rejected at this stage; they are kept
//! verbatim and recorded so the pipeline can apply the configured policy.

use serde::{Deserialize, Serialize};

/// Policy for color names and keywords outside the known tables.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum UnknownValuePolicy {
    /// Keep the value verbatim and record a warning.
    #[default]
    PassThrough,
    /// Fail compilation on the first unrecognized value.
    Reject,
}

/// A 16-bit packed pixel value: 5 bits red, 6 bits green, 5 bits blue.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Rgb565(pub u16);

impl Rgb565 {
    /// Pack 8-bit channels, truncating each to its target width.
    pub fn from_rgb888(r: u8, g: u8, b: u8) -> Self {
        Self((u16::from(r & 0xF8) << 8) | (u16::from(g & 0xFC) << 3) | u16::from(b >> 3))
    }

    /// Parse a `#RRGGBB` literal.
    pub fn from_hex(value: &str) -> Option<Self> {
        let hex = value.strip_prefix('#')?;
        if hex.len() != 6 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
            return None;
        }
        let r = u8::from_str_radix(&hex[0..2], 16).ok()?;
        let g = u8::from_str_radix(&hex[2..4], 16).ok()?;
        let b = u8::from_str_radix(&hex[4..6], 16).ok()?;
        Some(Self::from_rgb888(r, g, b))
    }
}

/// The fixed firmware color palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NamedColor {
    White,
    Black,
    Red,
    Green,
    Blue,
    Cyan,
    Magenta,
    Yellow,
    Gray,
    Orange,
}

impl NamedColor {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "white" => Some(Self::White),
            "black" => Some(Self::Black),
            "red" => Some(Self::Red),
            "green" => Some(Self::Green),
            "blue" => Some(Self::Blue),
            "cyan" => Some(Self::Cyan),
            "magenta" => Some(Self::Magenta),
            "yellow" => Some(Self::Yellow),
            "gray" => Some(Self::Gray),
            "orange" => Some(Self::Orange),
            _ => None,
        }
    }

    pub fn packed(self) -> Rgb565 {
        Rgb565(match self {
            Self::White => 0xFFFF,
            Self::Black => 0x0000,
            Self::Red => 0xF800,
            Self::Green => 0x07E0,
            Self::Blue => 0x001F,
            Self::Cyan => 0x07FF,
            Self::Magenta => 0xF81F,
            Self::Yellow => 0xFFE0,
            Self::Gray => 0x8410,
            Self::Orange => 0xFC00,
        })
    }
}

/// Text alignment keywords and their firmware codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Alignment {
    Center,
    Right,
    Left,
}

impl Alignment {
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "center" => Some(Self::Center),
            "right" => Some(Self::Right),
            "left" => Some(Self::Left),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Center => 0x00,
            Self::Right => 0x01,
            Self::Left => 0x02,
        }
    }
}

/// Font class keywords and their firmware codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FontClass {
    Small,
    Medium,
    Large,
}

impl FontClass {
    pub fn parse(keyword: &str) -> Option<Self> {
        match keyword {
            "small" => Some(Self::Small),
            "medium" => Some(Self::Medium),
            "large" => Some(Self::Large),
            _ => None,
        }
    }

    pub fn code(self) -> u8 {
        match self {
            Self::Small => 0x00,
            Self::Medium => 0x01,
            Self::Large => 0x02,
        }
    }
}

/// A value outside the known tables, kept verbatim in the output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UnknownValue {
    pub attribute: String,
    pub value: String,
}

/// Normalizer output: canonical text plus everything it could not map.
#[derive(Debug, Clone)]
pub struct Normalized {
    pub text: String,
    pub unknown_values: Vec<UnknownValue>,
}

/// Normalize raw TML source into canonical form.
///
/// Canonical form: `\n` as the only line separator, no blank lines, no
/// double quotes, no whitespace around structural characters, attribute
/// values rewritten to their numeric codes. Pure transformation; never
/// fails.
pub fn normalize(source: &str) -> Normalized {
    let mut unknown_values = Vec::new();
    let rewritten = rewrite_values(source, &mut unknown_values);
    let tightened = normalize_lines(&rewritten);
    let text = strip_quotes(&tightened);
    Normalized {
        text,
        unknown_values,
    }
}

const VALUE_KEYS: [&str; 4] = ["color", "background", "align", "font"];

fn is_ident_char(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'_'
}

/// Rewrite `color:`/`background:`/`align:`/`font:` values to numeric
/// codes. Quoted spans that are not values of those keys are left alone,
/// so key names inside text content never trigger a rewrite.
fn rewrite_values(source: &str, unknown_values: &mut Vec<UnknownValue>) -> String {
    let bytes = source.as_bytes();
    let mut out = String::with_capacity(source.len());
    let mut in_quote = false;
    let mut i = 0;

    while i < bytes.len() {
        let b = bytes[i];
        if b == b'"' {
            in_quote = !in_quote;
            out.push('"');
            i += 1;
            continue;
        }
        if !in_quote && b.is_ascii_alphabetic() {
            let start = i;
            while i < bytes.len() && is_ident_char(bytes[i]) {
                i += 1;
            }
            let word = &source[start..i];
            if VALUE_KEYS.contains(&word) {
                if let Some((raw, next)) = read_attribute_value(source, i) {
                    out.push_str(word);
                    out.push(':');
                    out.push_str(&map_value(word, &raw, unknown_values));
                    i = next;
                    continue;
                }
            }
            out.push_str(word);
            continue;
        }
        match source[i..].chars().next() {
            Some(ch) => {
                out.push(ch);
                i += ch.len_utf8();
            }
            None => break,
        }
    }

    out
}

/// From the position right after a key, consume `ws* ':' ws*` and the
/// value, either `"..."` or a bare `#`/identifier token. Returns the raw
/// value text and the position after it, or None if no value follows.
fn read_attribute_value(source: &str, after_key: usize) -> Option<(String, usize)> {
    let bytes = source.as_bytes();
    let mut i = after_key;
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    if i >= bytes.len() || bytes[i] != b':' {
        return None;
    }
    i += 1;
    while i < bytes.len() && (bytes[i] == b' ' || bytes[i] == b'\t') {
        i += 1;
    }
    if i >= bytes.len() {
        return None;
    }

    if bytes[i] == b'"' {
        let start = i + 1;
        let close = source[start..].find('"')? + start;
        return Some((source[start..close].to_string(), close + 1));
    }

    let start = i;
    while i < bytes.len() && (is_ident_char(bytes[i]) || bytes[i] == b'#') {
        i += 1;
    }
    if i == start {
        return None;
    }
    Some((source[start..i].to_string(), i))
}

fn map_value(key: &str, raw: &str, unknown_values: &mut Vec<UnknownValue>) -> String {
    match key {
        "color" | "background" => {
            if raw.starts_with('#') {
                if let Some(packed) = Rgb565::from_hex(raw) {
                    return format!("0x{:04X}", packed.0);
                }
            } else if let Some(named) = NamedColor::parse(raw) {
                return format!("0x{:04X}", named.packed().0);
            }
        }
        "align" => {
            if let Some(align) = Alignment::parse(raw) {
                return format!("0x{:02X}", align.code());
            }
        }
        "font" => {
            if let Some(font) = FontClass::parse(raw) {
                return format!("0x{:02X}", font.code());
            }
        }
        _ => {}
    }
    unknown_values.push(UnknownValue {
        attribute: key.to_string(),
        value: raw.to_string(),
    });
    raw.to_string()
}

/// Per-line cleanup: trim, drop blanks, tighten whitespace, join with a
/// single `\n` and no trailing separator.
fn normalize_lines(text: &str) -> String {
    let mut lines = Vec::new();
    for line in text.lines() {
        let stripped = line.trim();
        if stripped.is_empty() {
            continue;
        }
        lines.push(tighten(stripped));
    }
    lines.join("\n")
}

/// Remove whitespace around structural characters (`{`, `}`, `:`) outside
/// quoted spans; whitespace separating two value atoms collapses to one
/// space so adjacent attributes stay distinct.
fn tighten(line: &str) -> String {
    let chars: Vec<char> = line.chars().collect();
    let mut out = String::with_capacity(line.len());
    let mut in_quote = false;
    let mut i = 0;

    while i < chars.len() {
        let c = chars[i];
        if c == '"' {
            in_quote = !in_quote;
            out.push(c);
            i += 1;
            continue;
        }
        if in_quote {
            out.push(c);
            i += 1;
            continue;
        }
        if c == ' ' || c == '\t' {
            let mut j = i;
            while j < chars.len() && (chars[j] == ' ' || chars[j] == '\t') {
                j += 1;
            }
            let prev_atom = out.chars().last().map_or(false, is_atom);
            let next_atom = chars.get(j).copied().map_or(false, is_atom);
            if prev_atom && next_atom {
                out.push(' ');
            }
            i = j;
            continue;
        }
        out.push(c);
        i += 1;
    }

    out
}

fn is_atom(c: char) -> bool {
    c.is_alphanumeric() || matches!(c, '_' | '$' | '#')
}

fn strip_quotes(text: &str) -> String {
    text.chars().filter(|&c| c != '"').collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hex_color_truncates() {
        assert_eq!(Rgb565::from_hex("#FF0000"), Some(Rgb565(0xF800)));
        assert_eq!(Rgb565::from_hex("#00FF00"), Some(Rgb565(0x07E0)));
        assert_eq!(Rgb565::from_hex("#0000FF"), Some(Rgb565(0x001F)));
        assert_eq!(Rgb565::from_hex("#FFFFFF"), Some(Rgb565(0xFFFF)));
        assert_eq!(Rgb565::from_hex("#F00"), None);
        assert_eq!(Rgb565::from_hex("FF0000"), None);
    }

    #[test]
    fn test_named_colors() {
        assert_eq!(NamedColor::parse("white"), Some(NamedColor::White));
        assert_eq!(NamedColor::White.packed(), Rgb565(0xFFFF));
        assert_eq!(NamedColor::Orange.packed(), Rgb565(0xFC00));
        assert_eq!(NamedColor::parse("sparkle"), None);
    }

    #[test]
    fn test_color_rewrite() {
        let n = normalize(r##"color: "#FF0000""##);
        assert_eq!(n.text, "color:0xF800");
        assert!(n.unknown_values.is_empty());

        let n = normalize(r#"background: "white""#);
        assert_eq!(n.text, "background:0xFFFF");
    }

    #[test]
    fn test_keyword_rewrite() {
        let n = normalize("align: center\nfont: large");
        assert_eq!(n.text, "align:0x00\nfont:0x02");
    }

    #[test]
    fn test_unknown_value_passes_through() {
        let n = normalize(r#"color: "sparkle""#);
        assert_eq!(n.text, "color:sparkle");
        assert_eq!(
            n.unknown_values,
            vec![UnknownValue {
                attribute: "color".to_string(),
                value: "sparkle".to_string(),
            }]
        );
    }

    #[test]
    fn test_line_cleanup() {
        let n = normalize("  Root {  \n\n   id :  main  \n }  \n");
        assert_eq!(n.text, "Root{\nid:main\n}");
    }

    #[test]
    fn test_quoted_text_spaces_survive() {
        let n = normalize("text: \"Hello $name\"");
        assert_eq!(n.text, "text:Hello $name");
    }

    #[test]
    fn test_single_line_document() {
        let n = normalize(r#"Root{id:root}Layout{id:screen1 text:"Hello $name"}"#);
        assert_eq!(n.text, "Root{id:root}Layout{id:screen1 text:Hello $name}");
    }

    #[test]
    fn test_key_inside_text_untouched() {
        // "color:" appearing inside a quoted text value is content, not an
        // attribute.
        let n = normalize(r#"text: "pick a color: red""#);
        assert_eq!(n.text, "text:pick a color: red");
        assert!(n.unknown_values.is_empty());
    }

    #[test]
    fn test_no_trailing_newline() {
        let n = normalize("Root {\n}\n\n");
        assert!(!n.text.ends_with('\n'));
    }
}
