//! Printable (redacted) views of loaded configuration.
//!
//! Responsibilities:
//! - Render a populated configuration as pretty JSON for logs and diagnostics.
//!
//! Invariants:
//! - Every `SecretString` renders as the fixed mask wherever it sits, inside
//!   lists, maps and records included, whether or not the schema declares it.
//! - Every field declared `FieldKind::Secret` renders as the mask too,
//!   whatever its Rust type, real value or length (empty secrets included).
//! - The input is never modified.

use serde::Serialize;
use serde_json::Value;

use crate::decode::{DecodePipeline, Origin};
use crate::loader::ConfigError;
use crate::schema::Configurable;
use crate::secret::masked;

/// The value tree of `config` with every secret replaced by the mask.
pub fn redacted<T: Configurable>(config: &T) -> Result<Value, ConfigError> {
    let tree = masked_value(config)?;
    let sanitized: T = DecodePipeline::standard().decode(tree, Origin::Typed)?;
    masked_value(&sanitized)
}

fn masked_value<T: Serialize>(value: &T) -> Result<Value, ConfigError> {
    masked(|| serde_json::to_value(value))
        .map_err(|e| ConfigError::decode(std::any::type_name::<T>(), e))
}

/// Render `config` as indented JSON with secrets masked.
pub fn printable<T: Configurable>(config: &T) -> Result<String, ConfigError> {
    let value = redacted(config)?;
    serde_json::to_string_pretty(&value)
        .map_err(|e| ConfigError::decode(std::any::type_name::<T>(), e))
}
