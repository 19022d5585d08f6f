//! Block-style YAML rendering used for checksums.
//!
//! The output follows the conventions of the go-yaml v3 encoder with its
//! default settings: four-space indentation, no line wrapping, mapping keys
//! in natural order and the same scalar quoting decisions. Ledger keys that
//! were computed from that encoding keep matching.

use chrono::NaiveDate;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::{Map, Number, Value};
use std::cmp::Ordering;
use thiserror::Error;

const INDENT: usize = 4;

/// Longest key that may still be written in `key: value` form
const MAX_SIMPLE_KEY_LEN: usize = 128;

static BASE60_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?[0-9][0-9_]*(?::[0-5]?[0-9])+(?:\.[0-9_]*)?$")
        .expect("base-60 float pattern is valid")
});

static DECIMAL_FLOAT: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[-+]?(\.[0-9]+|[0-9]+(\.[0-9]*)?)([eE][-+]?[0-9]+)?$")
        .expect("float pattern is valid")
});

/// Plain scalars that read back as something other than a string
const RESERVED_WORDS: [&str; 22] = [
    "true", "True", "TRUE", "false", "False", "FALSE", "~", "null", "Null", "NULL", ".nan",
    ".NaN", ".NAN", ".inf", ".Inf", ".INF", "+.inf", "+.Inf", "+.INF", "-.inf", "-.Inf", "-.INF",
];

/// YAML 1.1 booleans, still quoted so older readers keep them as strings
const OLD_BOOLEANS: [&str; 16] = [
    "y", "Y", "yes", "Yes", "YES", "on", "On", "ON", "n", "N", "no", "No", "NO", "off", "Off",
    "OFF",
];

#[derive(Error, Debug)]
pub enum EncodeError {
    #[error("mapping key {0:?} is too long or spans lines")]
    ComplexKey(String),
}

/// A node of the document being rendered
#[derive(Debug, Clone, PartialEq)]
pub enum Node<'a> {
    /// Null, booleans and numbers, already spelled out
    Plain(String),
    Str(&'a str),
    Seq(Vec<Node<'a>>),
    /// Entries are written in the order given
    Map(Vec<(&'a str, Node<'a>)>),
}

impl<'a> Node<'a> {
    pub fn int(value: i64) -> Self {
        Node::Plain(value.to_string())
    }

    pub fn from_value(value: &'a Value) -> Self {
        match value {
            Value::Null => Node::Plain("null".to_string()),
            Value::Bool(b) => Node::Plain(b.to_string()),
            Value::Number(n) => Node::Plain(format_number(n)),
            Value::String(s) => Node::Str(s),
            Value::Array(items) => Node::Seq(items.iter().map(Node::from_value).collect()),
            Value::Object(map) => Node::object(map),
        }
    }

    /// A JSON object, keys in natural order
    pub fn object(map: &'a Map<String, Value>) -> Self {
        let mut entries: Vec<_> = map
            .iter()
            .map(|(key, value)| (key.as_str(), Node::from_value(value)))
            .collect();
        entries.sort_by(|(a, _), (b, _)| natural_order(a, b));
        Node::Map(entries)
    }

    fn empty_flow(&self) -> Option<&'static str> {
        match self {
            Node::Seq(items) if items.is_empty() => Some("[]"),
            Node::Map(entries) if entries.is_empty() => Some("{}"),
            _ => None,
        }
    }
}

/// Render a top-level mapping as a YAML document
pub fn document(entries: &[(&str, Node<'_>)]) -> Result<String, EncodeError> {
    let mut emitter = Emitter::default();
    if entries.is_empty() {
        emitter.out.push_str("{}\n");
    } else {
        emitter.mapping(entries, 0, false)?;
    }
    Ok(emitter.out)
}

/// Column of a collection nested under a mapping at `indent`
fn next_level(indent: usize) -> usize {
    INDENT * ((indent + INDENT) / INDENT)
}

#[derive(Default)]
struct Emitter {
    out: String,
}

impl Emitter {
    fn pad(&mut self, width: usize) {
        self.out.extend(std::iter::repeat(' ').take(width));
    }

    /// Keys sit at column `indent`; with `inline` the first key continues
    /// the current line after a `- ` indicator.
    fn mapping(
        &mut self,
        entries: &[(&str, Node<'_>)],
        indent: usize,
        inline: bool,
    ) -> Result<(), EncodeError> {
        for (i, (key, value)) in entries.iter().enumerate() {
            if i > 0 || !inline {
                self.pad(indent);
            }
            self.key(key)?;
            self.out.push(':');

            let child = next_level(indent);
            match value {
                _ if value.empty_flow().is_some() => self.flow(value),
                Node::Map(inner) => {
                    self.out.push('\n');
                    self.mapping(inner, child, false)?;
                }
                Node::Seq(items) => {
                    self.out.push('\n');
                    self.sequence(items, child, false)?;
                }
                Node::Plain(text) => self.plain(text),
                Node::Str(s) => self.string(s, child),
            }
        }
        Ok(())
    }

    fn sequence(
        &mut self,
        items: &[Node<'_>],
        indent: usize,
        inline: bool,
    ) -> Result<(), EncodeError> {
        for (i, item) in items.iter().enumerate() {
            if i > 0 || !inline {
                self.pad(indent);
            }
            self.out.push('-');

            let child = indent + 2;
            match item {
                _ if item.empty_flow().is_some() => self.flow(item),
                Node::Map(inner) => {
                    self.out.push(' ');
                    self.mapping(inner, child, true)?;
                }
                Node::Seq(nested) => {
                    self.out.push(' ');
                    self.sequence(nested, child, true)?;
                }
                Node::Plain(text) => self.plain(text),
                Node::Str(s) => self.string(s, child),
            }
        }
        Ok(())
    }

    fn flow(&mut self, node: &Node<'_>) {
        if let Some(text) = node.empty_flow() {
            self.out.push(' ');
            self.out.push_str(text);
            self.out.push('\n');
        }
    }

    fn plain(&mut self, text: &str) {
        self.out.push(' ');
        self.out.push_str(text);
        self.out.push('\n');
    }

    fn key(&mut self, key: &str) -> Result<(), EncodeError> {
        let analysis = Analysis::of(key);
        if key.len() > MAX_SIMPLE_KEY_LEN || analysis.multiline {
            return Err(EncodeError::ComplexKey(key.to_string()));
        }

        match select_style(key, &analysis, true) {
            Style::Plain => self.out.push_str(key),
            Style::SingleQuoted => self.single_quoted(key, 0),
            Style::DoubleQuoted | Style::Literal => self.double_quoted(key),
        }
        Ok(())
    }

    /// A string value whose continuation lines sit at column `indent`
    fn string(&mut self, s: &str, indent: usize) {
        let analysis = Analysis::of(s);
        match select_style(s, &analysis, false) {
            Style::Literal => self.literal(s, indent),
            style => {
                self.out.push(' ');
                match style {
                    Style::Plain => self.out.push_str(s),
                    Style::SingleQuoted => self.single_quoted(s, indent),
                    _ => self.double_quoted(s),
                }
                self.out.push('\n');
            }
        }
    }

    fn single_quoted(&mut self, s: &str, indent: usize) {
        self.out.push('\'');
        let mut breaks = false;
        for c in s.chars() {
            if c == ' ' {
                self.out.push(c);
            } else if is_break(c) {
                if !breaks && c == '\n' {
                    self.out.push('\n');
                }
                self.out.push(c);
                breaks = true;
            } else {
                if breaks {
                    self.pad(indent);
                }
                if c == '\'' {
                    self.out.push('\'');
                }
                self.out.push(c);
                breaks = false;
            }
        }
        self.out.push('\'');
    }

    fn double_quoted(&mut self, s: &str) {
        self.out.push('"');
        for c in s.chars() {
            if !is_printable(c) || c == '\u{feff}' || is_break(c) || c == '"' || c == '\\' {
                self.out.push('\\');
                match c {
                    '\0' => self.out.push('0'),
                    '\u{7}' => self.out.push('a'),
                    '\u{8}' => self.out.push('b'),
                    '\t' => self.out.push('t'),
                    '\n' => self.out.push('n'),
                    '\u{b}' => self.out.push('v'),
                    '\u{c}' => self.out.push('f'),
                    '\r' => self.out.push('r'),
                    '\u{1b}' => self.out.push('e'),
                    '"' => self.out.push('"'),
                    '\\' => self.out.push('\\'),
                    '\u{85}' => self.out.push('N'),
                    '\u{a0}' => self.out.push('_'),
                    '\u{2028}' => self.out.push('L'),
                    '\u{2029}' => self.out.push('P'),
                    other => {
                        let code = u32::from(other);
                        let escaped = if code <= 0xff {
                            format!("x{code:02X}")
                        } else if code <= 0xffff {
                            format!("u{code:04X}")
                        } else {
                            format!("U{code:08X}")
                        };
                        self.out.push_str(&escaped);
                    }
                }
            } else {
                self.out.push(c);
            }
        }
        self.out.push('"');
    }

    fn literal(&mut self, s: &str, indent: usize) {
        self.out.push_str(" |");
        if s.starts_with(|c: char| c == ' ' || is_break(c)) {
            self.out.push_str(&INDENT.to_string());
        }

        let mut tail = s.chars().rev();
        match tail.next() {
            Some(last) if !is_break(last) => self.out.push('-'),
            Some(_) => {
                if tail.next().map_or(true, is_break) {
                    self.out.push('+');
                }
            }
            None => self.out.push('-'),
        }
        self.out.push('\n');

        let mut line_start = true;
        for c in s.chars() {
            if is_break(c) {
                self.out.push(c);
                line_start = true;
            } else {
                if line_start {
                    self.pad(indent);
                    line_start = false;
                }
                self.out.push(c);
            }
        }
        if !line_start {
            self.out.push('\n');
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Plain,
    SingleQuoted,
    DoubleQuoted,
    Literal,
}

fn select_style(s: &str, analysis: &Analysis, simple_key: bool) -> Style {
    let mut style = if s.contains('\n') {
        Style::Literal
    } else if reads_back_as_string(s) {
        Style::Plain
    } else {
        Style::DoubleQuoted
    };

    if simple_key && analysis.multiline {
        style = Style::DoubleQuoted;
    }
    if style == Style::Plain && !analysis.plain_allowed {
        style = Style::SingleQuoted;
    }
    if style == Style::SingleQuoted && !analysis.single_quoted_allowed {
        style = Style::DoubleQuoted;
    }
    if style == Style::Literal && (!analysis.block_allowed || simple_key) {
        style = Style::DoubleQuoted;
    }
    style
}

/// Which styles can carry a scalar without changing its meaning
struct Analysis {
    multiline: bool,
    plain_allowed: bool,
    single_quoted_allowed: bool,
    block_allowed: bool,
}

impl Analysis {
    fn of(s: &str) -> Self {
        if s.is_empty() {
            return Self {
                multiline: false,
                plain_allowed: true,
                single_quoted_allowed: true,
                block_allowed: false,
            };
        }

        let chars: Vec<char> = s.chars().collect();
        let mut indicators = s.starts_with("---") || s.starts_with("...");
        let mut line_breaks = false;
        let mut special = false;
        let mut tabs = false;
        let mut leading_space = false;
        let mut leading_break = false;
        let mut trailing_space = false;
        let mut trailing_break = false;
        let mut break_space = false;
        let mut space_break = false;
        let mut previous_space = false;
        let mut previous_break = false;
        let mut preceded_by_whitespace = true;

        for (i, &c) in chars.iter().enumerate() {
            let followed_by_whitespace = chars.get(i + 1).map_or(true, |&n| is_blank(n));
            let last = i + 1 == chars.len();

            if i == 0 {
                match c {
                    '#' | ',' | '[' | ']' | '{' | '}' | '&' | '*' | '!' | '|' | '>' | '\''
                    | '"' | '%' | '@' | '`' => indicators = true,
                    '?' | ':' | '-' if followed_by_whitespace => indicators = true,
                    _ => {}
                }
            } else {
                match c {
                    ':' if followed_by_whitespace => indicators = true,
                    '#' if preceded_by_whitespace => indicators = true,
                    _ => {}
                }
            }

            if c == '\t' {
                tabs = true;
            } else if !is_printable(c) {
                special = true;
            }

            if c == ' ' {
                leading_space |= i == 0;
                trailing_space |= last;
                break_space |= previous_break;
                previous_space = true;
                previous_break = false;
            } else if is_break(c) {
                line_breaks = true;
                leading_break |= i == 0;
                trailing_break |= last;
                space_break |= previous_space;
                previous_space = false;
                previous_break = true;
            } else {
                previous_space = false;
                previous_break = false;
            }

            preceded_by_whitespace = is_blank(c) || is_break(c) || c == '\0';
        }

        let mut analysis = Self {
            multiline: line_breaks,
            plain_allowed: true,
            single_quoted_allowed: true,
            block_allowed: true,
        };
        if leading_space || leading_break || trailing_space || trailing_break {
            analysis.plain_allowed = false;
        }
        if trailing_space {
            analysis.block_allowed = false;
        }
        if break_space || space_break || tabs || special {
            analysis.plain_allowed = false;
            analysis.single_quoted_allowed = false;
        }
        if space_break || special {
            analysis.block_allowed = false;
        }
        if line_breaks || indicators {
            analysis.plain_allowed = false;
        }
        analysis
    }
}

fn is_blank(c: char) -> bool {
    c == ' ' || c == '\t'
}

fn is_break(c: char) -> bool {
    matches!(c, '\r' | '\n' | '\u{85}' | '\u{2028}' | '\u{2029}')
}

fn is_printable(c: char) -> bool {
    matches!(c, '\n' | '\u{20}'..='\u{7e}' | '\u{a0}'..='\u{d7ff}')
        || (('\u{e000}'..='\u{fffd}').contains(&c) && c != '\u{feff}')
}

/// Whether `s` written unquoted still reads back as the same string
fn reads_back_as_string(s: &str) -> bool {
    resolves_to_string(s) && !is_base60_float(s) && !OLD_BOOLEANS.contains(&s)
}

fn resolves_to_string(s: &str) -> bool {
    let Some(first) = s.bytes().next() else {
        // the empty scalar is null
        return false;
    };
    match first {
        b'y' | b'Y' | b'n' | b'N' | b't' | b'T' | b'f' | b'F' | b'o' | b'O' | b'~' => {
            !RESERVED_WORDS.contains(&s)
        }
        b'.' => !(RESERVED_WORDS.contains(&s) || s.parse::<f64>().is_ok_and(f64::is_finite)),
        b'+' | b'-' | b'0'..=b'9' => {
            let plain = s.replace('_', "");
            !(RESERVED_WORDS.contains(&s)
                || is_timestamp(s)
                || is_integer(&plain)
                || (DECIMAL_FLOAT.is_match(&plain) && plain.parse::<f64>().is_ok_and(f64::is_finite)))
        }
        _ => true,
    }
}

fn is_base60_float(s: &str) -> bool {
    s.starts_with(|c: char| c == '+' || c == '-' || c.is_ascii_digit())
        && s.contains(':')
        && BASE60_FLOAT.is_match(s)
}

/// Signed or unsigned 64-bit integer, with optional 0x/0o/0b or legacy 0 prefix
fn is_integer(s: &str) -> bool {
    let (sign, body) = match s.as_bytes().first() {
        Some(b'+') => (Some('+'), &s[1..]),
        Some(b'-') => (Some('-'), &s[1..]),
        _ => (None, s),
    };

    let prefixed = |lower: &str, upper: &str| body.strip_prefix(lower).or_else(|| body.strip_prefix(upper));
    let (radix, digits) = if let Some(rest) = prefixed("0x", "0X") {
        (16, rest)
    } else if let Some(rest) = prefixed("0b", "0B") {
        (2, rest)
    } else if let Some(rest) = prefixed("0o", "0O") {
        (8, rest)
    } else if body.len() > 1 && body.starts_with('0') {
        (8, &body[1..])
    } else {
        (10, body)
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
        return false;
    }
    let Ok(value) = u128::from_str_radix(digits, radix) else {
        return false;
    };
    match sign {
        Some('-') => value <= 1u128 << 63,
        Some(_) => value <= i64::MAX as u128,
        None => value <= u128::from(u64::MAX),
    }
}

/// Dates like `2001-12-14`, optionally followed by a time of day
fn is_timestamp(s: &str) -> bool {
    let bytes = s.as_bytes();
    if bytes.len() < 5 || !bytes[..4].iter().all(u8::is_ascii_digit) || bytes[4] != b'-' {
        return false;
    }

    let mut cursor = Cursor { rest: s };
    let (Some(year), Some(_), Some(month), Some(_), Some(day)) = (
        cursor.number(4, 4),
        cursor.literal('-'),
        cursor.number(1, 2),
        cursor.literal('-'),
        cursor.number(1, 2),
    ) else {
        return false;
    };
    if NaiveDate::from_ymd_opt(year as i32, month, day).is_none() {
        return false;
    }
    if cursor.rest.is_empty() {
        return true;
    }

    let zoned = match cursor.rest.as_bytes()[0] {
        b'T' | b't' => true,
        b' ' => false,
        _ => return false,
    };
    cursor.rest = &cursor.rest[1..];

    let (Some(hour), Some(_), Some(minute), Some(_), Some(second)) = (
        cursor.number(1, 2),
        cursor.literal(':'),
        cursor.number(1, 2),
        cursor.literal(':'),
        cursor.number(1, 2),
    ) else {
        return false;
    };
    if hour > 23 || minute > 59 || second > 59 {
        return false;
    }
    if cursor.rest.starts_with(|c: char| c == '.' || c == ',')
        && cursor.rest[1..].starts_with(|c: char| c.is_ascii_digit())
    {
        cursor.rest = cursor.rest[1..].trim_start_matches(|c: char| c.is_ascii_digit());
    }

    if !zoned {
        return cursor.rest.is_empty();
    }
    if cursor.rest == "Z" {
        return true;
    }
    let Some(offset) = cursor.rest.strip_prefix(['+', '-']) else {
        return false;
    };
    let offset = offset.as_bytes();
    offset.len() == 5
        && offset[2] == b':'
        && [0, 1, 3, 4].iter().all(|&i| offset[i].is_ascii_digit())
}

struct Cursor<'a> {
    rest: &'a str,
}

impl Cursor<'_> {
    /// Read between `min` and `max` digits, greedily
    fn number(&mut self, min: usize, max: usize) -> Option<u32> {
        let len = self
            .rest
            .bytes()
            .take(max)
            .take_while(u8::is_ascii_digit)
            .count();
        if len < min {
            return None;
        }
        let value = self.rest[..len].parse().ok()?;
        self.rest = &self.rest[len..];
        Some(value)
    }

    fn literal(&mut self, c: char) -> Option<()> {
        self.rest = self.rest.strip_prefix(c)?;
        Some(())
    }
}

fn format_number(n: &Number) -> String {
    if let Some(i) = n.as_i64() {
        i.to_string()
    } else if let Some(u) = n.as_u64() {
        u.to_string()
    } else {
        n.as_f64().map_or_else(|| n.to_string(), format_float)
    }
}

/// Shortest round-trip digits; exponent form below 1e-4 and from 1e6 on
fn format_float(f: f64) -> String {
    if f.is_nan() {
        return ".nan".to_string();
    }
    if f.is_infinite() {
        return if f > 0.0 { ".inf" } else { "-.inf" }.to_string();
    }

    let sign = if f.is_sign_negative() { "-" } else { "" };
    if f == 0.0 {
        return format!("{sign}0");
    }

    let scientific = format!("{:e}", f.abs());
    let (mantissa, exponent) = scientific
        .split_once('e')
        .unwrap_or((scientific.as_str(), "0"));
    let exponent: i32 = exponent.parse().unwrap_or(0);
    let digits: Vec<char> = mantissa.chars().filter(|c| *c != '.').collect();
    let count = digits.len() as i32;

    let mut out = String::from(sign);
    if exponent < -4 || exponent >= 6 {
        out.push(digits[0]);
        if count > 1 {
            out.push('.');
            out.extend(&digits[1..]);
        }
        let exp_sign = if exponent < 0 { '-' } else { '+' };
        out.push_str(&format!("e{exp_sign}{:02}", exponent.abs()));
        return out;
    }

    let point = exponent + 1;
    let digit_at = |i: i32| {
        if i >= 0 && i < count {
            digits[i as usize]
        } else {
            '0'
        }
    };
    if point > 0 {
        (0..point).for_each(|i| out.push(digit_at(i)));
    } else {
        out.push('0');
    }
    if count > point {
        out.push('.');
        (point..count).for_each(|i| out.push(digit_at(i)));
    }
    out
}

/// Key order: numeric runs compare by value, and within a run of
/// non-digits letters sort after other characters.
fn natural_order(a: &str, b: &str) -> Ordering {
    if natural_less(a, b) {
        Ordering::Less
    } else if natural_less(b, a) {
        Ordering::Greater
    } else {
        Ordering::Equal
    }
}

fn natural_less(a: &str, b: &str) -> bool {
    let ar: Vec<char> = a.chars().collect();
    let br: Vec<char> = b.chars().collect();
    let mut digits = false;

    for i in 0..ar.len().min(br.len()) {
        if ar[i] == br[i] {
            digits = ar[i].is_ascii_digit();
            continue;
        }

        let a_letter = ar[i].is_alphabetic();
        let b_letter = br[i].is_alphabetic();
        if a_letter && b_letter {
            return ar[i] < br[i];
        }
        if a_letter || b_letter {
            return if digits { a_letter } else { b_letter };
        }

        let (mut an, mut bn) = (0i64, 0i64);
        if ar[i] == '0' || br[i] == '0' {
            for j in (0..i).rev() {
                if !ar[j].is_ascii_digit() {
                    break;
                }
                if ar[j] != '0' {
                    an = 1;
                    bn = 1;
                    break;
                }
            }
        }

        let mut ai = i;
        while ai < ar.len() && ar[ai].is_ascii_digit() {
            an = an.wrapping_mul(10).wrapping_add(i64::from(ar[ai] as u8 - b'0'));
            ai += 1;
        }
        let mut bi = i;
        while bi < br.len() && br[bi].is_ascii_digit() {
            bn = bn.wrapping_mul(10).wrapping_add(i64::from(br[bi] as u8 - b'0'));
            bi += 1;
        }

        if an != bn {
            return an < bn;
        }
        if ai != bi {
            return ai < bi;
        }
        return ar[i] < br[i];
    }
    ar.len() < br.len()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn render(value: Value) -> String {
        document(&[("v", Node::from_value(&value))]).unwrap()
    }

    #[test]
    fn test_nested_collections_indentation() {
        let value = json!({ "a": { "b": [1, [2, 3], { "c": "d", "e": [] }] } });
        assert_eq!(
            render(value),
            "v:\n    a:\n        b:\n            - 1\n            - - 2\n              - 3\n            - c: d\n              e: []\n"
        );
    }

    #[test]
    fn test_strings_that_read_as_other_types_are_double_quoted() {
        for s in [
            "", "true", "NULL", "~", "yes", "off", "123", "-7", "1_000", "0x1F", "0o17", "0b101",
            "1.5", "1e3", ".5", ".inf", "1:20", "2024-01-15", "2001-12-14T21:59:43.10Z",
            "2001-12-14 21:59:43",
        ] {
            assert_eq!(render(json!(s)), format!("v: \"{s}\"\n"), "{s:?}");
        }
    }

    #[test]
    fn test_plain_strings() {
        for s in [
            "FOR doc IN @@collection RETURN doc",
            "it's",
            "a:b",
            "a#b",
            "<<",
            "2024-13-01",
            "0x",
            "true story",
            "héllo",
        ] {
            assert_eq!(render(json!(s)), format!("v: {s}\n"), "{s:?}");
        }
    }

    #[test]
    fn test_indicator_strings_are_single_quoted() {
        assert_eq!(render(json!("@collection")), "v: '@collection'\n");
        assert_eq!(render(json!("a: b")), "v: 'a: b'\n");
        assert_eq!(render(json!("- item")), "v: '- item'\n");
        assert_eq!(render(json!("x #y")), "v: 'x #y'\n");
        assert_eq!(render(json!(" padded")), "v: ' padded'\n");
        assert_eq!(render(json!("'quoted'")), "v: '''quoted'''\n");
        assert_eq!(render(json!("---")), "v: '---'\n");
    }

    #[test]
    fn test_control_characters_are_escaped() {
        assert_eq!(render(json!("a\tb")), "v: \"a\\tb\"\n");
        assert_eq!(render(json!("bell\u{7}")), "v: \"bell\\a\"\n");
        assert_eq!(render(json!("\u{1f600}")), "v: \"\\U0001F600\"\n");
        assert_eq!(render(json!("cr\r")), "v: \"cr\\r\"\n");
    }

    #[test]
    fn test_multiline_strings_use_literal_blocks() {
        assert_eq!(render(json!("a\nb")), "v: |-\n    a\n    b\n");
        assert_eq!(render(json!("a\nb\n")), "v: |\n    a\n    b\n");
        assert_eq!(render(json!("a\n\nb\n\n")), "v: |+\n    a\n\n    b\n\n");
        assert_eq!(render(json!(" a\nb")), "v: |4-\n     a\n    b\n");
        assert_eq!(render(json!("a \nb")), "v: \"a \\nb\"\n");
        assert_eq!(render(json!(["x\ny"])), "v:\n    - |-\n      x\n      y\n");
    }

    #[test]
    fn test_numbers() {
        assert_eq!(render(json!(42)), "v: 42\n");
        assert_eq!(render(json!(-3)), "v: -3\n");
        assert_eq!(render(json!(u64::MAX)), "v: 18446744073709551615\n");
        assert_eq!(render(json!(1.5)), "v: 1.5\n");
        assert_eq!(render(json!(1.0)), "v: 1\n");
        assert_eq!(render(json!(123456.0)), "v: 123456\n");
        assert_eq!(render(json!(1000000.0)), "v: 1e+06\n");
        assert_eq!(render(json!(1234567.5)), "v: 1.2345675e+06\n");
        assert_eq!(render(json!(0.0001)), "v: 0.0001\n");
        assert_eq!(render(json!(0.00001)), "v: 1e-05\n");
        assert_eq!(render(json!(-0.25)), "v: -0.25\n");
        assert_eq!(render(json!(null)), "v: null\n");
        assert_eq!(render(json!(false)), "v: false\n");
    }

    #[test]
    fn test_keys_sort_naturally() {
        let value = json!({ "item10": 1, "item9": 2, "Item": 3, "_x": 4, "a": 5 });
        assert_eq!(
            render(value),
            "v:\n    _x: 4\n    Item: 3\n    a: 5\n    item9: 2\n    item10: 1\n"
        );
    }

    #[test]
    fn test_keys_are_quoted_like_values() {
        let value = json!({ "@collection": "test", "true": 1, "": 2 });
        assert_eq!(
            render(value),
            "v:\n    \"\": 2\n    '@collection': test\n    \"true\": 1\n"
        );
    }

    #[test]
    fn test_complex_keys_are_rejected() {
        let long = "k".repeat(MAX_SIMPLE_KEY_LEN + 1);
        let mut map = Map::new();
        map.insert(long.clone(), json!(1));
        let value = Value::Object(map);
        assert!(matches!(
            document(&[("v", Node::from_value(&value))]),
            Err(EncodeError::ComplexKey(key)) if key == long
        ));

        let value = json!({ "two\nlines": 1 });
        assert!(document(&[("v", Node::from_value(&value))]).is_err());
    }

    #[test]
    fn test_empty_document() {
        assert_eq!(document(&[]).unwrap(), "{}\n");
    }
}
