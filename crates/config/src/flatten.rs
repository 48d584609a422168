//! Key flattening for destination structures.
//!
//! Responsibilities:
//! - Produce the set of dot-separated leaf paths (`database.host`) of a
//!   destination structure, used to bind environment variables.
//! - Provide path helpers (`get_path`, `set_path`) over JSON value trees that
//!   the loader, defaults applier and decode pipeline share.
//!
//! Does NOT handle:
//! - Deciding env variable names (see `provider`).
//!
//! Invariants:
//! - Keys are built from serde field names joined with `KEY_DELIMITER`, the
//!   same convention used by schema paths and file keys.
//! - Sequences are leaves; maps (records and keyed containers) are recursed.
//! - A key that only names a parent of other keys is never reported.

use std::collections::{BTreeMap, BTreeSet};

use serde_json::{Map, Value};

use crate::constants::KEY_DELIMITER;
use crate::loader::ConfigError;
use crate::schema::Configurable;

/// Flatten a value tree into `path -> leaf value`.
///
/// Empty maps below the root are kept as leaves so their key still exists.
pub fn flatten_value(value: &Value) -> BTreeMap<String, Value> {
    let mut out = BTreeMap::new();
    if let Value::Object(map) = value {
        flatten_into(map, None, &mut out);
    }
    out
}

fn flatten_into(map: &Map<String, Value>, prefix: Option<&str>, out: &mut BTreeMap<String, Value>) {
    for (key, value) in map {
        let path = match prefix {
            Some(prefix) => format!("{}{}{}", prefix, KEY_DELIMITER, key),
            None => key.clone(),
        };
        match value {
            Value::Object(child) if !child.is_empty() => flatten_into(child, Some(&path), out),
            leaf => {
                out.insert(path, leaf.clone());
            }
        }
    }
}

/// Compute every leaf key path of `config`.
///
/// The result is the union of the paths present in the serialized value and
/// every path declared by `T::schema()`, so fields that are currently empty
/// (`None`, empty maps) are still reported.
pub fn flatten_keys<T: Configurable>(config: &T) -> Result<BTreeSet<String>, ConfigError> {
    let value = serde_json::to_value(config).map_err(|e| ConfigError::KeyDiscovery {
        message: e.to_string(),
    })?;
    if !value.is_object() {
        return Err(ConfigError::KeyDiscovery {
            message: format!("expected a struct, got {}", value_kind(&value)),
        });
    }

    let mut keys: BTreeSet<String> = flatten_value(&value).into_keys().collect();

    for field in T::schema().fields() {
        check_schema_path(&value, &field.path)?;
        keys.insert(field.path.clone());
    }

    let parents: Vec<String> = keys
        .iter()
        .filter(|key| {
            let prefix = format!("{}{}", key, KEY_DELIMITER);
            keys.iter().any(|other| other.starts_with(&prefix))
        })
        .cloned()
        .collect();
    for parent in parents {
        keys.remove(&parent);
    }

    Ok(keys)
}

/// A schema path must not run through a scalar in the serialized shape.
fn check_schema_path(root: &Value, path: &str) -> Result<(), ConfigError> {
    let mut current = root;
    let mut walked = Vec::new();
    let mut segments = path.split(KEY_DELIMITER).peekable();

    while let Some(segment) = segments.next() {
        if segment.is_empty() {
            return Err(ConfigError::KeyDiscovery {
                message: format!("empty segment in field path \"{}\"", path),
            });
        }
        walked.push(segment);
        match current {
            Value::Object(map) => match map.get(segment) {
                Some(next) => current = next,
                None => return Ok(()),
            },
            Value::Null => return Ok(()),
            other => {
                return Err(ConfigError::KeyDiscovery {
                    message: format!(
                        "field path \"{}\" expects a struct at \"{}\" but found {}",
                        path,
                        walked[..walked.len() - 1].join(KEY_DELIMITER),
                        value_kind(other)
                    ),
                });
            }
        }
        if segments.peek().is_none() {
            return Ok(());
        }
    }
    Ok(())
}

/// Look up a dotted path in a value tree.
pub(crate) fn get_path<'a>(root: &'a Value, path: &str) -> Option<&'a Value> {
    path.split(KEY_DELIMITER)
        .try_fold(root, |current, segment| current.as_object()?.get(segment))
}

pub(crate) fn get_path_mut<'a>(root: &'a mut Value, path: &str) -> Option<&'a mut Value> {
    path.split(KEY_DELIMITER)
        .try_fold(root, |current, segment| current.as_object_mut()?.get_mut(segment))
}

/// Insert `value` at a dotted path, creating (or replacing non-map)
/// intermediate nodes as needed.
pub(crate) fn set_path(root: &mut Value, path: &str, value: Value) {
    let mut current = root;
    let mut segments = path.split(KEY_DELIMITER).peekable();

    while let Some(segment) = segments.next() {
        if !current.is_object() {
            *current = Value::Object(Map::new());
        }
        let Value::Object(map) = current else {
            return;
        };
        if segments.peek().is_none() {
            map.insert(segment.to_string(), value);
            return;
        }
        current = map
            .entry(segment.to_string())
            .or_insert_with(|| Value::Object(Map::new()));
    }
}

/// Deep-merge `overlay` into `base`; maps merge key by key, anything else
/// in `overlay` replaces what is in `base`.
///
/// Overlay keys match base keys case-insensitively and take the base's
/// spelling, so lower-cased file keys land on `camelCase` serde names.
pub(crate) fn merge_values(base: &mut Value, overlay: Value) {
    match (base, overlay) {
        (Value::Object(base_map), Value::Object(overlay_map)) => {
            for (key, value) in overlay_map {
                let target = if base_map.contains_key(&key) {
                    key
                } else {
                    base_map
                        .keys()
                        .find(|existing| existing.eq_ignore_ascii_case(&key))
                        .cloned()
                        .unwrap_or(key)
                };
                match base_map.get_mut(&target) {
                    Some(existing) => merge_values(existing, value),
                    None => {
                        base_map.insert(target, value);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Lower-case every map key of a value tree, recursing into maps and
/// sequences.
pub(crate) fn lowercase_keys(value: Value) -> Value {
    match value {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (key.to_lowercase(), lowercase_keys(value)))
                .collect(),
        ),
        Value::Array(items) => Value::Array(items.into_iter().map(lowercase_keys).collect()),
        other => other,
    }
}

/// Name of a value's kind as reported in errors.
pub(crate) fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "sequence",
        Value::Object(_) => "struct",
    }
}
