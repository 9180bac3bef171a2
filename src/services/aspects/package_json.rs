//! `package.json` reading and surgical member replacement.
//!
//! Convergence must only touch the members an aspect owns, so instead of
//! re-serializing the whole document we locate the byte span of one
//! top-level member's value and splice a new value into it. Every byte
//! outside that span is preserved.

use serde::{Deserialize, Deserializer};
use serde_json::ser::PrettyFormatter;
use serde_json::{Serializer, Value};
use std::collections::BTreeMap;

use crate::domain::errors::{DomainError, DomainResult};

pub const PACKAGE_JSON: &str = "package.json";

/// The parts of a package manifest the aspects read.
///
/// Any valid JSON object is accepted: members of an unexpected shape read
/// as absent, and non-string script commands keep their JSON text.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PackageManifest {
    #[serde(default, deserialize_with = "string_or_none")]
    pub name: Option<String>,
    #[serde(default, deserialize_with = "object_or_empty")]
    pub dependencies: BTreeMap<String, Value>,
    #[serde(default, deserialize_with = "scripts_or_empty")]
    pub scripts: BTreeMap<String, String>,
    #[serde(default)]
    pub license: Option<Value>,
}

impl PackageManifest {
    /// Parse manifest text. Duplicate keys resolve to the last occurrence.
    pub fn parse(text: &str) -> DomainResult<Self> {
        let value: Value = serde_json::from_str(text).map_err(|e| malformed(e.to_string()))?;
        if !value.is_object() {
            return Err(malformed("top level is not an object"));
        }
        serde_json::from_value(value).map_err(|e| malformed(e.to_string()))
    }

    pub fn depends_on(&self, dependency: &str) -> bool {
        self.dependencies.contains_key(dependency)
    }

    /// SPDX identifier from the `license` member, in either the string or
    /// the legacy `{ "type": ... }` form.
    pub fn license_id(&self) -> Option<&str> {
        match self.license.as_ref()? {
            Value::String(id) => Some(id.as_str()),
            Value::Object(map) => map.get("type").and_then(Value::as_str),
            _ => None,
        }
    }
}

fn string_or_none<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<String>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::String(s) => Some(s),
        _ => None,
    })
}

fn object_or_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, Value>, D::Error> {
    Ok(match Value::deserialize(deserializer)? {
        Value::Object(map) => map.into_iter().collect(),
        _ => BTreeMap::new(),
    })
}

fn scripts_or_empty<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> Result<BTreeMap<String, String>, D::Error> {
    Ok(object_or_empty(deserializer)?
        .into_iter()
        .map(|(name, command)| match command {
            Value::String(command) => (name, command),
            other => (name, other.to_string()),
        })
        .collect())
}

/// Top-level member located in the manifest text.
#[derive(Debug, Clone, PartialEq, Eq)]
struct Member {
    key: String,
    key_start: usize,
    value_start: usize,
    value_end: usize,
}

/// Layout of the top-level object.
#[derive(Debug)]
struct ObjectLayout {
    open: usize,
    close: usize,
    members: Vec<Member>,
}

/// Replace (or append) the top-level member `key` with `value`.
///
/// The new value is rendered in the indentation style of the existing
/// member, so replacing a value with itself is a no-op and repeated
/// application is stable.
pub fn set_top_level_member(text: &str, key: &str, value: &Value) -> DomainResult<String> {
    // Reject anything serde would not accept before trusting the scanner.
    serde_json::from_str::<Value>(text).map_err(|e| malformed(e.to_string()))?;
    let layout = scan_top_level(text)?;

    // The last occurrence is the one JSON readers see.
    if let Some(member) = layout.members.iter().rev().find(|m| m.key == key) {
        let indent = line_indent(text, member.key_start);
        let rendered = render(value, indent)?;
        let mut out = String::with_capacity(text.len() + rendered.len());
        out.push_str(&text[..member.value_start]);
        out.push_str(&rendered);
        out.push_str(&text[member.value_end..]);
        return Ok(out);
    }

    let key_json = serde_json::to_string(key)?;
    let mut out = String::with_capacity(text.len() + 64);
    match layout.members.last() {
        Some(last) => {
            let first = &layout.members[0];
            let indent = line_indent(text, first.key_start);
            out.push_str(&text[..last.value_end]);
            match indent {
                Some(indent) => {
                    out.push_str(",\n");
                    out.push_str(indent);
                    out.push_str(&key_json);
                    out.push_str(": ");
                    out.push_str(&render(value, Some(indent))?);
                }
                None => {
                    out.push(',');
                    out.push_str(&key_json);
                    out.push(':');
                    out.push_str(&render(value, None)?);
                }
            }
            out.push_str(&text[last.value_end..]);
        }
        None => {
            let indent = "  ";
            out.push_str(&text[..=layout.open]);
            out.push('\n');
            out.push_str(indent);
            out.push_str(&key_json);
            out.push_str(": ");
            out.push_str(&render(value, Some(indent))?);
            out.push('\n');
            out.push_str(&text[layout.close..]);
        }
    }
    Ok(out)
}

/// Render `value`; `indent` is the key's own indentation, or `None` for
/// members that share a line with other tokens.
fn render(value: &Value, indent: Option<&str>) -> DomainResult<String> {
    let Some(indent) = indent.filter(|i| !i.is_empty()) else {
        return Ok(serde_json::to_string(value)?);
    };

    let mut buf = Vec::new();
    let formatter = PrettyFormatter::with_indent(indent.as_bytes());
    let mut serializer = Serializer::with_formatter(&mut buf, formatter);
    serde::Serialize::serialize(value, &mut serializer)?;
    let pretty = String::from_utf8(buf).map_err(|e| DomainError::SerializationError(e.to_string()))?;
    Ok(pretty.replace('\n', &format!("\n{indent}")))
}

/// Whitespace preceding `pos` on its line, if only whitespace precedes it.
fn line_indent(text: &str, pos: usize) -> Option<&str> {
    let line_start = text[..pos].rfind('\n').map_or(0, |i| i + 1);
    let prefix = &text[line_start..pos];
    if line_start > 0 && prefix.chars().all(|c| c == ' ' || c == '\t') {
        Some(prefix)
    } else {
        None
    }
}

fn malformed(reason: impl Into<String>) -> DomainError {
    DomainError::MalformedManifest {
        path: PACKAGE_JSON.to_string(),
        reason: reason.into(),
    }
}

fn scan_top_level(text: &str) -> DomainResult<ObjectLayout> {
    let bytes = text.as_bytes();
    let mut pos = skip_ws(bytes, skip_bom(text));
    if bytes.get(pos) != Some(&b'{') {
        return Err(malformed("top-level value is not an object"));
    }
    let open = pos;
    pos += 1;
    let mut members = Vec::new();

    loop {
        pos = skip_ws(bytes, pos);
        match bytes.get(pos) {
            Some(b'}') => {
                return Ok(ObjectLayout {
                    open,
                    close: pos,
                    members,
                })
            }
            Some(b'"') => {}
            _ => return Err(malformed(format!("expected member key at byte {pos}"))),
        }

        let key_start = pos;
        let key_end = scan_string(bytes, pos)?;
        let key: String = serde_json::from_str(&text[key_start..key_end])?;

        pos = skip_ws(bytes, key_end);
        if bytes.get(pos) != Some(&b':') {
            return Err(malformed(format!("expected ':' at byte {pos}")));
        }
        let value_start = skip_ws(bytes, pos + 1);
        let value_end = scan_value(bytes, value_start)?;
        members.push(Member {
            key,
            key_start,
            value_start,
            value_end,
        });

        pos = skip_ws(bytes, value_end);
        match bytes.get(pos) {
            Some(b',') => pos += 1,
            Some(b'}') => {}
            _ => return Err(malformed(format!("expected ',' or '}}' at byte {pos}"))),
        }
    }
}

fn skip_bom(text: &str) -> usize {
    if text.starts_with('\u{feff}') {
        '\u{feff}'.len_utf8()
    } else {
        0
    }
}

fn skip_ws(bytes: &[u8], mut pos: usize) -> usize {
    while matches!(bytes.get(pos), Some(b' ' | b'\t' | b'\n' | b'\r')) {
        pos += 1;
    }
    pos
}

/// End (exclusive) of the string literal starting at `start`.
fn scan_string(bytes: &[u8], start: usize) -> DomainResult<usize> {
    let mut pos = start + 1;
    while let Some(&b) = bytes.get(pos) {
        match b {
            b'\\' => pos += 2,
            b'"' => return Ok(pos + 1),
            _ => pos += 1,
        }
    }
    Err(malformed("unterminated string"))
}

/// End (exclusive) of the value starting at `start`.
fn scan_value(bytes: &[u8], start: usize) -> DomainResult<usize> {
    match bytes.get(start) {
        Some(b'"') => scan_string(bytes, start),
        Some(b'{' | b'[') => {
            let mut depth = 0usize;
            let mut pos = start;
            while let Some(&b) = bytes.get(pos) {
                match b {
                    b'"' => {
                        pos = scan_string(bytes, pos)?;
                        continue;
                    }
                    b'{' | b'[' => depth += 1,
                    b'}' | b']' => {
                        depth -= 1;
                        if depth == 0 {
                            return Ok(pos + 1);
                        }
                    }
                    _ => {}
                }
                pos += 1;
            }
            Err(malformed("unterminated container"))
        }
        Some(_) => {
            let mut pos = start;
            while let Some(&b) = bytes.get(pos) {
                if matches!(b, b',' | b'}' | b']' | b' ' | b'\t' | b'\n' | b'\r') {
                    break;
                }
                pos += 1;
            }
            Ok(pos)
        }
        None => Err(malformed("missing value")),
    }
}
