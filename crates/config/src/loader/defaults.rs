//! Declared default values.
//!
//! Responsibilities:
//! - Fill fields that hold their type's zero value with the default declared
//!   in the destination's schema.
//!
//! Does NOT handle:
//! - Type conversion of defaults; they are inserted as raw text and go
//!   through the decode pipeline with everything else.
//!
//! Invariants:
//! - A field holding a non-zero value is never overwritten.
//! - A field explicitly set to its zero value (`0`, `""`, `false`, empty
//!   list) cannot be told apart from an unset one and receives the default.
//!   Fields whose zero value is meaningful should carry their default in the
//!   struct's `Default` impl instead of the schema.

use serde_json::Value;

use crate::decode::{DecodePipeline, Origin};
use crate::duration::parse_duration;
use crate::flatten::{get_path, get_path_mut, set_path};
use crate::loader::ConfigError;
use crate::schema::{Configurable, FieldKind, Schema};

/// Apply schema defaults to a value tree, returning the paths that changed.
///
/// Records inside lists and maps receive their own schema's defaults; their
/// field paths are not reported.
pub(crate) fn apply_defaults_to_tree<'s>(tree: &mut Value, schema: &'s Schema) -> Vec<&'s str> {
    let mut applied = Vec::new();
    for field in schema.fields() {
        if let Some(default) = field.default.as_deref()
            && is_zero(&field.kind, get_path(tree, &field.path))
        {
            set_path(tree, &field.path, default_value(&field.kind, default));
            applied.push(field.path.as_str());
        }
        if let Some(value) = get_path_mut(tree, &field.path) {
            apply_element_defaults(&field.kind, value);
        }
    }
    applied
}

fn apply_element_defaults(kind: &FieldKind, value: &mut Value) {
    match (kind, value) {
        (FieldKind::List(element), Value::Array(items)) => {
            for item in items {
                apply_element_defaults(element, item);
            }
        }
        (FieldKind::Map(inner), Value::Object(entries)) => {
            for item in entries.values_mut() {
                apply_element_defaults(inner, item);
            }
        }
        (FieldKind::Record(schema), record @ Value::Object(_)) => {
            apply_defaults_to_tree(record, schema);
        }
        _ => {}
    }
}

/// Populate zero-valued fields of `config` with their declared defaults.
pub fn apply_defaults<T: Configurable>(config: &mut T) -> Result<(), ConfigError> {
    let schema = T::schema();
    let original = serde_json::to_value(&*config)
        .map_err(|e| ConfigError::decode(std::any::type_name::<T>(), e))?;
    let mut tree = original.clone();
    apply_defaults_to_tree(&mut tree, &schema);
    if tree == original {
        return Ok(());
    }
    *config = DecodePipeline::standard().decode(tree, Origin::Raw)?;
    Ok(())
}

/// Map and `Any` defaults may be written as JSON; everything else is text.
fn default_value(kind: &FieldKind, default: &str) -> Value {
    match kind {
        FieldKind::Map(_) | FieldKind::Record(_) | FieldKind::Any => serde_json::from_str(default)
            .unwrap_or_else(|_| Value::String(default.to_string())),
        _ => Value::String(default.to_string()),
    }
}

fn is_zero(kind: &FieldKind, value: Option<&Value>) -> bool {
    let Some(value) = value else {
        return true;
    };
    match (kind, value) {
        (_, Value::Null) => true,
        (FieldKind::Any, _) => false,
        (FieldKind::Duration, Value::String(s)) => {
            parse_duration(s).is_ok_and(|d| d.is_zero())
        }
        (_, Value::String(s)) => s.is_empty(),
        (_, Value::Bool(b)) => !*b,
        (_, Value::Number(n)) => n.as_f64().is_some_and(|f| f == 0.0),
        (_, Value::Array(items)) => items.is_empty(),
        (_, Value::Object(map)) => map.is_empty(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};
    use serde_json::json;
    use std::collections::BTreeMap;
    use std::time::Duration;

    #[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
    struct Worker {
        name: String,
        threads: u32,
        verbose: bool,
        #[serde(with = "crate::duration")]
        interval: Duration,
        queues: Vec<String>,
        limits: BTreeMap<String, u32>,
        nickname: Option<String>,
    }

    impl Configurable for Worker {
        fn schema() -> Schema {
            Schema::new()
                .field("name", FieldKind::String)
                .with_default("worker")
                .field("threads", FieldKind::Unsigned)
                .with_default("4")
                .field("verbose", FieldKind::Bool)
                .with_default("true")
                .field("interval", FieldKind::Duration)
                .with_default("15s")
                .field("queues", FieldKind::list_of(FieldKind::String))
                .with_default("high,low")
                .field("limits", FieldKind::map_of(FieldKind::Unsigned))
                .with_default(r#"{"high": 10}"#)
                .field("nickname", FieldKind::String)
                .with_default("w")
        }
    }

    #[test]
    fn test_defaults_fill_zero_values() {
        let mut worker = Worker::default();
        apply_defaults(&mut worker).unwrap();

        assert_eq!(worker.name, "worker");
        assert_eq!(worker.threads, 4);
        assert!(worker.verbose);
        assert_eq!(worker.interval, Duration::from_secs(15));
        assert_eq!(worker.queues, ["high", "low"]);
        assert_eq!(worker.limits.get("high"), Some(&10));
        assert_eq!(worker.nickname.as_deref(), Some("w"));
    }

    #[test]
    fn test_defaults_keep_explicit_values() {
        let mut worker = Worker {
            name: "custom".to_string(),
            threads: 16,
            interval: Duration::from_secs(1),
            queues: vec!["only".to_string()],
            nickname: Some("n".to_string()),
            ..Default::default()
        };
        apply_defaults(&mut worker).unwrap();

        assert_eq!(worker.name, "custom");
        assert_eq!(worker.threads, 16);
        assert_eq!(worker.interval, Duration::from_secs(1));
        assert_eq!(worker.queues, ["only"]);
        assert_eq!(worker.nickname.as_deref(), Some("n"));
    }

    #[test]
    fn test_explicit_zero_is_treated_as_unset() {
        let mut worker = Worker {
            threads: 0,
            verbose: false,
            ..Default::default()
        };
        apply_defaults(&mut worker).unwrap();
        assert_eq!(worker.threads, 4);
        assert!(worker.verbose);
    }

    #[test]
    fn test_apply_defaults_to_tree_reports_paths() {
        let schema = Worker::schema();
        let mut tree = json!({"name": "set", "threads": 0});
        let applied = apply_defaults_to_tree(&mut tree, &schema);

        assert!(!applied.contains(&"name"));
        assert!(applied.contains(&"threads"));
        assert_eq!(tree["threads"], json!("4"));
        assert_eq!(tree["limits"], json!({"high": 10}));
    }

    #[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
    struct Pool {
        members: Vec<Member>,
    }

    #[derive(Serialize, Deserialize, Debug, Default, PartialEq)]
    struct Member {
        host: String,
        weight: u32,
    }

    impl Configurable for Pool {
        fn schema() -> Schema {
            let member = Schema::new()
                .field("host", FieldKind::String)
                .field("weight", FieldKind::Unsigned)
                .with_default("1");
            Schema::new().field("members", FieldKind::list_of(FieldKind::Record(member)))
        }
    }

    #[test]
    fn test_defaults_reach_records_inside_lists() {
        let mut pool = Pool {
            members: vec![
                Member { host: "a".to_string(), weight: 0 },
                Member { host: "b".to_string(), weight: 5 },
            ],
        };
        apply_defaults(&mut pool).unwrap();
        assert_eq!(pool.members[0].weight, 1);
        assert_eq!(pool.members[1].weight, 5);
    }
}
