//! Turning streamed completion text into presentable suggestions.
//!
//! The completion service answers with one blob of text in which `||`
//! separates the individual suggestions. Sometimes each piece is plain text,
//! sometimes a little JSON envelope such as `{"code": "..."}`, and sometimes a
//! mangled mix of both. [`split`] cuts the blob apart and [`clean`] reduces
//! every piece to display text without ever failing.

use serde_json::Value;

pub const DELIMITER: &str = "||";

/// The batch shown before the visitor asks for fresh suggestions.
pub const INITIAL_SUGGESTIONS: &str =
    "What's your favorite movie?||Do you have any pets?||What's your dream job?";

/// How a single segment was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    /// Well-formed JSON. The fields hold the truthy string values found
    /// under `code` and `message` when the value is an object.
    Structured {
        raw: &'a str,
        code: Option<String>,
        message: Option<String>,
    },
    /// Anything that cannot be read as structured text.
    Raw(&'a str),
}

impl<'a> Segment<'a> {
    pub fn parse(raw: &'a str) -> Self {
        let Ok(value) = serde_json::from_str::<Value>(raw) else {
            return Segment::Raw(raw);
        };

        let object = match value {
            Value::Object(object) => object,
            Value::Null => return Segment::Raw(raw),
            _ => {
                return Segment::Structured { raw, code: None, message: None };
            }
        };

        let code = match text_field(object.get("code")) {
            Field::Text(code) => Some(code),
            Field::Unreadable => return Segment::Raw(raw),
            Field::Absent => None,
        };
        let message = if code.is_some() {
            None
        } else {
            match text_field(object.get("message")) {
                Field::Text(message) => Some(message),
                Field::Unreadable => return Segment::Raw(raw),
                Field::Absent => None,
            }
        };

        Segment::Structured { raw, code, message }
    }

    /// Display text for this segment.
    pub fn normalize(&self) -> String {
        match self {
            Segment::Structured { code: Some(code), .. } => trim(code).to_owned(),
            Segment::Structured { message: Some(message), .. } => trim(message).to_owned(),
            Segment::Structured { raw, .. } => trim(raw).to_owned(),
            Segment::Raw(raw) => scrub(raw),
        }
    }
}

enum Field {
    Text(String),
    /// Present and truthy, but not a string.
    Unreadable,
    /// Missing or falsy.
    Absent,
}

fn text_field(value: Option<&Value>) -> Field {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => Field::Absent,
        Some(Value::String(s)) if s.is_empty() => Field::Absent,
        Some(Value::String(s)) => Field::Text(s.clone()),
        Some(Value::Number(n)) if n.as_f64() == Some(0.0) => Field::Absent,
        Some(_) => Field::Unreadable,
    }
}

/// Textual cleanup for segments that are not usable JSON.
fn scrub(raw: &str) -> String {
    let stripped: String = raw.chars().filter(|c| !matches!(c, '{' | '}' | '"')).collect();
    let stripped = strip_label(&stripped, "code");
    let stripped = strip_label(stripped, "message");
    trim(stripped).to_owned()
}

/// Whitespace as completion clients see it: the byte order mark counts,
/// U+0085 does not.
fn is_space(c: char) -> bool {
    c == '\u{FEFF}' || (c != '\u{0085}' && c.is_whitespace())
}

fn trim(text: &str) -> &str {
    text.trim_matches(is_space)
}

/// Removes a leading `label:` (case-insensitive, spaces allowed around the colon).
fn strip_label<'a>(text: &'a str, label: &str) -> &'a str {
    let Some(head) = text.get(..label.len()) else {
        return text;
    };
    if !head.eq_ignore_ascii_case(label) {
        return text;
    }

    let rest = text[label.len()..].trim_start_matches(is_space);
    match rest.strip_prefix(':') {
        Some(rest) => rest.trim_start_matches(is_space),
        None => text,
    }
}

/// Cuts raw completion text into its ordered segments.
pub fn split(raw: &str) -> Vec<&str> {
    raw.split(DELIMITER).collect()
}

/// Reduces one segment to display text. Total over all inputs.
pub fn clean(segment: &str) -> String {
    Segment::parse(segment).normalize()
}

/// Split and clean in one go; recomputed from scratch for every update.
pub fn parse_batch(raw: &str) -> Vec<String> {
    split(raw).into_iter().map(clean).collect()
}
