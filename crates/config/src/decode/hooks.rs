//! Standard decode hooks.

use serde_json::Value;

use super::{DecodeHook, Origin};
use crate::constants::SECRET_MASK;
use crate::duration::{format_duration, parse_duration};
use crate::schema::FieldKind;

/// Parses duration strings (`"30s"`, `"1h30m"`) for `Duration` fields.
///
/// The output is the canonical duration string, which the
/// `stratum_config::duration` serde codec reads back.
#[derive(Debug, Clone, Copy, Default)]
pub struct StringToDuration;

impl DecodeHook for StringToDuration {
    fn apply(&self, kind: &FieldKind, _origin: Origin, value: Value) -> anyhow::Result<Value> {
        match (kind, value) {
            (FieldKind::Duration, Value::String(s)) => {
                let duration = parse_duration(&s)?;
                Ok(Value::String(format_duration(duration)))
            }
            (_, value) => Ok(value),
        }
    }
}

/// Splits a string on a separator for `List` fields.
///
/// The empty string becomes the empty list. Items are not trimmed.
#[derive(Debug, Clone)]
pub struct StringToList {
    separator: String,
}

impl StringToList {
    pub fn new(separator: impl Into<String>) -> Self {
        Self {
            separator: separator.into(),
        }
    }
}

impl DecodeHook for StringToList {
    fn apply(&self, kind: &FieldKind, _origin: Origin, value: Value) -> anyhow::Result<Value> {
        match (kind, value) {
            (FieldKind::List(_), Value::String(s)) => {
                if s.is_empty() {
                    return Ok(Value::Array(Vec::new()));
                }
                Ok(Value::Array(
                    s.split(self.separator.as_str())
                        .map(|item| Value::String(item.to_string()))
                        .collect(),
                ))
            }
            (_, value) => Ok(value),
        }
    }
}

/// Replaces secret values with `SECRET_MASK` when re-decoding a populated
/// structure.
///
/// Fires only when the value came from a typed structure and the target is a
/// `Secret` field; secrets read from files or env vars pass through.
#[derive(Debug, Clone, Copy, Default)]
pub struct SecretMask;

impl DecodeHook for SecretMask {
    fn apply(&self, kind: &FieldKind, origin: Origin, value: Value) -> anyhow::Result<Value> {
        match (kind, origin) {
            (FieldKind::Secret, Origin::Typed) => Ok(Value::String(SECRET_MASK.to_string())),
            _ => Ok(value),
        }
    }
}
