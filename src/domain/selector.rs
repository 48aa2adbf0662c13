//! Path selectors over nested project documents
//!
//! A selector is a dot-separated list of segments evaluated against a
//! YAML value tree. Each segment names a mapping key and may carry one
//! bracketed qualifier:
//!
//! - `name[3]` picks the element at index 3 of the sequence under `name`
//! - `name[id=rnaseq]` picks the first mapping in the sequence under `name`
//!   whose `id` stringifies to exactly `rnaseq`; booleans compare as
//!   `true`/`false` and a null or missing key as `None`
//!
//! Dots inside brackets do not split segments, so `templates[id=v1.2].published`
//! has two segments. Resolution never fails loudly: any missing key, type
//! mismatch or out-of-range index yields `None`.
//!
//! # Example
//!
//! ```
//! use courier::domain::selector::{resolve, Selector};
//!
//! let doc: serde_yaml::Value = serde_yaml::from_str(
//!     "templates:\n  - id: rnaseq\n    published:\n      salmon_dir: /data/salmon\n",
//! ).unwrap();
//!
//! let value = resolve(&doc, "templates[id=rnaseq].published.salmon_dir");
//! assert_eq!(value.and_then(|v| v.as_str()), Some("/data/salmon"));
//!
//! let selector = Selector::parse("templates[0].id").unwrap();
//! assert_eq!(selector.resolve(&doc).and_then(|v| v.as_str()), Some("rnaseq"));
//! ```

use crate::domain::{CourierError, Result};
use serde_yaml::Value;
use std::fmt;
use std::str::FromStr;

const NULL_TEXT: &str = "None";

/// Bracketed qualifier applied to a sequence
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Qualifier {
    /// Zero-based index into a sequence
    Index(usize),
    /// First mapping element whose `key` stringifies to `value`
    Match { key: String, value: String },
}

/// One parsed selector segment
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Segment {
    /// Mapping key to descend into; `None` for a bare `[qualifier]` segment
    pub key: Option<String>,
    /// Optional qualifier applied after the key lookup
    pub qualifier: Option<Qualifier>,
}

/// A parsed selector path
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    raw: String,
    segments: Vec<Segment>,
}

impl Selector {
    /// Parse a selector string
    ///
    /// # Errors
    ///
    /// Returns [`CourierError::Mapping`] for an empty selector, unbalanced
    /// brackets, more than one qualifier on a segment, or a qualifier that is
    /// neither an index nor `key=value`.
    pub fn parse(raw: &str) -> Result<Self> {
        let parts = split_segments(raw)?;
        if parts.is_empty() {
            return Err(CourierError::Mapping(format!(
                "selector '{raw}' has no segments"
            )));
        }

        let segments = parts
            .iter()
            .map(|part| parse_segment(part).map_err(|e| invalid(raw, &e)))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self {
            raw: raw.to_string(),
            segments,
        })
    }

    /// The selector as written
    pub fn as_str(&self) -> &str {
        &self.raw
    }

    /// Parsed segments in evaluation order
    pub fn segments(&self) -> &[Segment] {
        &self.segments
    }

    /// Evaluate the selector against a document
    ///
    /// Short-circuits to `None` on the first failing segment. YAML nulls are
    /// treated as absent values.
    pub fn resolve<'a>(&self, document: &'a Value) -> Option<&'a Value> {
        let mut current = document;
        for segment in &self.segments {
            if let Some(key) = &segment.key {
                current = untag(current).as_mapping()?.get(key.as_str())?;
            }
            if let Some(qualifier) = &segment.qualifier {
                current = apply_qualifier(current, qualifier)?;
            }
            if current.is_null() {
                return None;
            }
        }
        Some(current)
    }

    /// Evaluate and return the value only if it is a non-empty string
    pub fn resolve_str<'a>(&self, document: &'a Value) -> Option<&'a str> {
        self.resolve(document)
            .and_then(|v| untag(v).as_str())
            .filter(|s| !s.is_empty())
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.raw)
    }
}

impl FromStr for Selector {
    type Err = CourierError;

    fn from_str(s: &str) -> Result<Self> {
        Self::parse(s)
    }
}

/// Parse and evaluate a selector in one step
///
/// An unparseable selector resolves to `None`, like any other miss.
pub fn resolve<'a>(document: &'a Value, selector: &str) -> Option<&'a Value> {
    Selector::parse(selector).ok()?.resolve(document)
}

/// Render a scalar the way `key=value` qualifiers compare it
///
/// Mappings, sequences and nulls have no string form. In qualifiers a null
/// or missing key compares as `None`.
pub fn stringify(value: &Value) -> Option<String> {
    match untag(value) {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

// A null or missing key compares as `None`.
fn match_text(value: Option<&Value>) -> Option<String> {
    match value.map(untag) {
        None | Some(Value::Null) => Some(NULL_TEXT.to_string()),
        Some(other) => stringify(other),
    }
}

fn untag(value: &Value) -> &Value {
    match value {
        Value::Tagged(tagged) => untag(&tagged.value),
        other => other,
    }
}

fn apply_qualifier<'a>(value: &'a Value, qualifier: &Qualifier) -> Option<&'a Value> {
    let items = untag(value).as_sequence()?;
    match qualifier {
        Qualifier::Index(idx) => items.get(*idx),
        Qualifier::Match { key, value } => items.iter().find(|item| {
            untag(item)
                .as_mapping()
                .and_then(|m| match_text(m.get(key.as_str())))
                .is_some_and(|s| &s == value)
        }),
    }
}

fn invalid(raw: &str, reason: &str) -> CourierError {
    CourierError::Mapping(format!("invalid selector '{raw}': {reason}"))
}

/// Split on dots that are outside brackets; empty segments are dropped
fn split_segments(raw: &str) -> Result<Vec<String>> {
    let mut parts = Vec::new();
    let mut buf = String::new();
    let mut depth = 0usize;

    for ch in raw.chars() {
        match ch {
            '.' if depth == 0 => {
                if !buf.is_empty() {
                    parts.push(std::mem::take(&mut buf));
                }
                continue;
            }
            '[' => depth += 1,
            ']' => {
                if depth == 0 {
                    return Err(invalid(raw, "unmatched ']'"));
                }
                depth -= 1;
            }
            _ => {}
        }
        buf.push(ch);
    }

    if depth != 0 {
        return Err(invalid(raw, "unterminated '['"));
    }
    if !buf.is_empty() {
        parts.push(buf);
    }
    Ok(parts)
}

fn parse_segment(part: &str) -> std::result::Result<Segment, String> {
    let Some(open) = part.find('[') else {
        return Ok(Segment {
            key: Some(part.to_string()),
            qualifier: None,
        });
    };

    if !part.ends_with(']') {
        return Err(format!("segment '{part}' has text after its qualifier"));
    }

    let base = &part[..open];
    let inner = &part[open + 1..part.len() - 1];
    if inner.contains('[') || inner.contains(']') {
        return Err(format!("segment '{part}' has more than one qualifier"));
    }

    let qualifier = if !inner.is_empty() && inner.chars().all(|c| c.is_ascii_digit()) {
        let idx = inner
            .parse::<usize>()
            .map_err(|e| format!("index '{inner}' out of range: {e}"))?;
        Qualifier::Index(idx)
    } else if let Some((key, value)) = inner.split_once('=') {
        if key.is_empty() {
            return Err(format!("qualifier '{inner}' has an empty key"));
        }
        Qualifier::Match {
            key: key.to_string(),
            value: value.to_string(),
        }
    } else {
        return Err(format!(
            "qualifier '{inner}' must be an index or key=value"
        ));
    };

    Ok(Segment {
        key: (!base.is_empty()).then(|| base.to_string()),
        qualifier: Some(qualifier),
    })
}
