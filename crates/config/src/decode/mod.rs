//! Decode pipeline: loosely-typed values into typed destination fields.
//!
//! Responsibilities:
//! - Run a fixed chain of decode hooks over every schema field of a value
//!   tree (duration strings, comma-separated lists, secret masking).
//! - Apply weak typing so env vars, which are always strings, can populate
//!   numeric, boolean and collection fields.
//! - Deserialize the converted tree into the destination type.
//!
//! Does NOT handle:
//! - Merging sources or deciding precedence (see `loader`).
//!
//! Invariants:
//! - Hooks are independent: each inspects `(kind, origin, value)` and either
//!   returns a transformed value or the input unchanged.
//! - `null` is never handed to hooks or weak typing; it reaches serde as-is.
//! - Values decoded with `Origin::Raw` are never masked.

mod hooks;
mod weak;

use anyhow::Context;
use serde::Serialize;
use serde_json::Value;

pub use hooks::{SecretMask, StringToDuration, StringToList};

use crate::constants::DEFAULT_LIST_SEPARATOR;
use crate::flatten::{get_path, set_path};
use crate::loader::ConfigError;
use crate::schema::{Configurable, FieldKind, Schema};

/// Where a value tree came from.
///
/// Stands in for the "source type" of a value: provider input is untyped,
/// while a tree produced by serializing a populated structure carries the
/// structure's declared kinds (`Secret` in particular).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Files, env vars and declared defaults.
    Raw,
    /// Produced by serializing a populated destination structure.
    Typed,
}

/// A single conversion step of the pipeline.
pub trait DecodeHook: Send + Sync {
    /// Transform `value` for a field of `kind`, or return it unchanged.
    fn apply(&self, kind: &FieldKind, origin: Origin, value: Value) -> anyhow::Result<Value>;
}

/// Ordered hook chain plus weak typing.
pub struct DecodePipeline {
    hooks: Vec<Box<dyn DecodeHook>>,
    weakly_typed: bool,
}

impl Default for DecodePipeline {
    fn default() -> Self {
        Self::standard()
    }
}

impl std::fmt::Debug for DecodePipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DecodePipeline")
            .field("hooks", &self.hooks.len())
            .field("weakly_typed", &self.weakly_typed)
            .finish()
    }
}

impl DecodePipeline {
    /// The pipeline used by the loader and by `printable`: duration strings,
    /// comma-separated lists and secret masking, with weak typing enabled.
    pub fn standard() -> Self {
        Self {
            hooks: vec![
                Box::new(StringToDuration),
                Box::new(StringToList::new(DEFAULT_LIST_SEPARATOR)),
                Box::new(SecretMask),
            ],
            weakly_typed: true,
        }
    }

    /// A pipeline without hooks.
    pub fn empty() -> Self {
        Self {
            hooks: Vec::new(),
            weakly_typed: false,
        }
    }

    /// Append a hook; it runs after those already registered.
    pub fn with_hook(mut self, hook: impl DecodeHook + 'static) -> Self {
        self.hooks.push(Box::new(hook));
        self
    }

    pub fn weakly_typed(mut self, enabled: bool) -> Self {
        self.weakly_typed = enabled;
        self
    }

    /// Convert a single value for a field of `kind`.
    pub fn convert(&self, kind: &FieldKind, origin: Origin, value: Value) -> anyhow::Result<Value> {
        if value.is_null() {
            return Ok(value);
        }

        let mut value = value;
        for hook in &self.hooks {
            value = hook.apply(kind, origin, value)?;
        }
        if self.weakly_typed {
            value = weak::coerce(kind, value)?;
        }

        match (kind, value) {
            (FieldKind::List(element), Value::Array(items)) => items
                .into_iter()
                .map(|item| self.convert(element, origin, item))
                .collect::<anyhow::Result<Vec<_>>>()
                .map(Value::Array),
            (FieldKind::Map(inner), Value::Object(entries)) => entries
                .into_iter()
                .map(|(key, item)| Ok((key, self.convert(inner, origin, item)?)))
                .collect::<anyhow::Result<serde_json::Map<_, _>>>()
                .map(Value::Object),
            (FieldKind::Record(schema), record @ Value::Object(_)) => {
                self.convert_fields(record, schema, origin)
            }
            (_, value) => Ok(value),
        }
    }

    fn convert_fields(&self, mut tree: Value, schema: &Schema, origin: Origin) -> anyhow::Result<Value> {
        for field in schema.fields() {
            let Some(current) = get_path(&tree, &field.path).cloned() else {
                continue;
            };
            let converted = self
                .convert(&field.kind, origin, current)
                .with_context(|| format!("field \"{}\"", field.path))?;
            set_path(&mut tree, &field.path, converted);
        }
        Ok(tree)
    }

    /// Convert every schema field present in `tree`.
    pub fn decode_tree(
        &self,
        mut tree: Value,
        schema: &Schema,
        origin: Origin,
    ) -> Result<Value, ConfigError> {
        for field in schema.fields() {
            let Some(current) = get_path(&tree, &field.path).cloned() else {
                continue;
            };
            let converted = self
                .convert(&field.kind, origin, current)
                .map_err(|e| ConfigError::decode(field.path.as_str(), format!("{:#}", e)))?;
            set_path(&mut tree, &field.path, converted);
        }
        Ok(tree)
    }

    /// Convert `tree` and deserialize it into `T`.
    pub fn decode<T: Configurable>(&self, tree: Value, origin: Origin) -> Result<T, ConfigError> {
        let tree = self.decode_tree(tree, &T::schema(), origin)?;
        serde_json::from_value(tree)
            .map_err(|e| ConfigError::decode(std::any::type_name::<T>(), e))
    }
}

/// Encode `input` and decode it into `T` through the standard pipeline.
pub fn decode<T: Configurable>(input: &impl Serialize, origin: Origin) -> Result<T, ConfigError> {
    let tree = serde_json::to_value(input)
        .map_err(|e| ConfigError::decode(std::any::type_name::<T>(), e))?;
    DecodePipeline::standard().decode(tree, origin)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::SecretString;
    use crate::constants::SECRET_MASK;
    use serde::Deserialize;
    use serde_json::json;
    use std::time::Duration;

    #[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
    struct Server {
        port: u16,
        debug: bool,
        ratio: f64,
        #[serde(with = "crate::duration")]
        timeout: Duration,
        hosts: Vec<String>,
        #[serde(default)]
        retries: Vec<u32>,
        password: SecretString,
        name: String,
    }

    impl Configurable for Server {
        fn schema() -> Schema {
            Schema::new()
                .field("port", FieldKind::Unsigned)
                .field("debug", FieldKind::Bool)
                .field("ratio", FieldKind::Float)
                .field("timeout", FieldKind::Duration)
                .field("hosts", FieldKind::list_of(FieldKind::String))
                .field("retries", FieldKind::list_of(FieldKind::Unsigned))
                .field("password", FieldKind::Secret)
                .field("name", FieldKind::String)
        }
    }

    fn raw_strings() -> Value {
        json!({
            "port": "8080",
            "debug": "true",
            "ratio": "0.5",
            "timeout": "30s",
            "hosts": "a,b,c",
            "retries": "1,2,3",
            "password": "hunter2",
            "name": 42
        })
    }

    #[test]
    fn test_decode_raw_strings_weakly() {
        let server: Server = DecodePipeline::standard()
            .decode(raw_strings(), Origin::Raw)
            .unwrap();

        assert_eq!(server.port, 8080);
        assert!(server.debug);
        assert!((server.ratio - 0.5).abs() < f64::EPSILON);
        assert_eq!(server.timeout, Duration::from_secs(30));
        assert_eq!(server.hosts, ["a", "b", "c"]);
        assert_eq!(server.retries, [1, 2, 3]);
        assert_eq!(server.password.secret(), "hunter2");
        assert_eq!(server.name, "42");
    }

    #[test]
    fn test_decode_typed_masks_secrets_only() {
        let server = Server {
            port: 1,
            timeout: Duration::from_millis(1500),
            hosts: vec!["x".to_string()],
            password: SecretString::from("hunter2"),
            name: "api".to_string(),
            ..Default::default()
        };

        let masked: Server = decode(&server, Origin::Typed).unwrap();
        assert_eq!(masked.password.secret(), SECRET_MASK);
        assert_eq!(masked.port, 1);
        assert_eq!(masked.timeout, Duration::from_millis(1500));
        assert_eq!(masked.hosts, ["x"]);
        assert_eq!(masked.name, "api");

        let unmasked: Server = decode(&server, Origin::Raw).unwrap();
        assert_eq!(unmasked, server);
    }

    #[test]
    fn test_decode_accepts_typed_durations() {
        let mut tree = raw_strings();
        tree["timeout"] = json!(2_000_000_000u64);
        let server: Server = DecodePipeline::standard().decode(tree, Origin::Raw).unwrap();
        assert_eq!(server.timeout, Duration::from_secs(2));
    }

    #[test]
    fn test_decode_error_names_field() {
        let mut tree = raw_strings();
        tree["port"] = json!("eighty");
        let err = DecodePipeline::standard()
            .decode::<Server>(tree, Origin::Raw)
            .unwrap_err();
        match err {
            ConfigError::Decode { path, .. } => assert_eq!(path, "port"),
            other => panic!("expected Decode error, got {other:?}"),
        }
    }

    #[test]
    fn test_out_of_range_fails_in_serde() {
        let mut tree = raw_strings();
        tree["port"] = json!("70000");
        let err = DecodePipeline::standard()
            .decode::<Server>(tree, Origin::Raw)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Decode { .. }));
    }

    #[test]
    fn test_empty_pipeline_is_strict() {
        let result = DecodePipeline::empty().decode::<Server>(raw_strings(), Origin::Raw);
        assert!(result.is_err());
    }

    #[test]
    fn test_custom_hook_runs_after_standard_hooks() {
        struct Upper;
        impl DecodeHook for Upper {
            fn apply(&self, kind: &FieldKind, _: Origin, value: Value) -> anyhow::Result<Value> {
                match (kind, value) {
                    (FieldKind::String, Value::String(s)) => Ok(Value::String(s.to_uppercase())),
                    (_, value) => Ok(value),
                }
            }
        }

        let pipeline = DecodePipeline::standard().with_hook(Upper);
        let converted = pipeline
            .convert(&FieldKind::list_of(FieldKind::String), Origin::Raw, json!("a,b"))
            .unwrap();
        assert_eq!(converted, json!(["A", "B"]));
    }

    #[test]
    fn test_null_passes_through() {
        let pipeline = DecodePipeline::standard();
        for kind in [FieldKind::Duration, FieldKind::Secret, FieldKind::Unsigned] {
            assert_eq!(pipeline.convert(&kind, Origin::Typed, Value::Null).unwrap(), Value::Null);
        }
    }

    #[test]
    fn test_records_inside_lists_and_maps_are_converted() {
        let upstream = Schema::new()
            .field("port", FieldKind::Unsigned)
            .field("token", FieldKind::Secret);
        let pipeline = DecodePipeline::standard();

        let list = FieldKind::list_of(FieldKind::Record(upstream.clone()));
        let converted = pipeline
            .convert(&list, Origin::Typed, json!([{"port": "80", "token": "hunter2"}]))
            .unwrap();
        assert_eq!(converted, json!([{"port": 80, "token": SECRET_MASK}]));

        let map = FieldKind::map_of(FieldKind::Record(upstream));
        let err = pipeline
            .convert(&map, Origin::Raw, json!({"a": {"port": "eighty"}}))
            .unwrap_err();
        assert!(format!("{:#}", err).contains("field \"port\""));
    }
}
