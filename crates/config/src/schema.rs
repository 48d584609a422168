//! Field descriptors for destination structures.
//!
//! Responsibilities:
//! - Describe every leaf field of a destination structure: its dotted path,
//!   its kind (drives type coercion and masking) and its optional default.
//! - Compose nested structures by prefixing a child schema's paths.
//!
//! Does NOT handle:
//! - Reading values (see `provider`) or converting them (see `decode`).
//!
//! Invariants:
//! - Paths use the serde field names of the destination type, joined with
//!   `KEY_DELIMITER`, so file keys, env keys and struct paths share one
//!   namespace.
//! - A path appears at most once; declaring it again replaces the earlier
//!   descriptor.

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::constants::KEY_DELIMITER;

/// The declared type of a configuration field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldKind {
    String,
    Bool,
    /// Signed integer.
    Integer,
    /// Unsigned integer.
    Unsigned,
    Float,
    /// `std::time::Duration` serialized with `stratum_config::duration`.
    Duration,
    /// `SecretString`.
    Secret,
    /// Ordered sequence of the element kind.
    List(Box<FieldKind>),
    /// String-keyed map of the value kind.
    Map(Box<FieldKind>),
    /// A nested record, for elements of `List` and `Map`. Record fields
    /// directly on a structure are declared with `Schema::nest` instead.
    Record(Schema),
    /// Passed through the pipeline untouched.
    Any,
}

impl FieldKind {
    /// Shorthand for `FieldKind::List(Box::new(element))`.
    pub fn list_of(element: FieldKind) -> Self {
        Self::List(Box::new(element))
    }

    /// Shorthand for `FieldKind::Map(Box::new(value))`.
    pub fn map_of(value: FieldKind) -> Self {
        Self::Map(Box::new(value))
    }

    /// Human readable name used in error messages.
    pub fn name(&self) -> String {
        match self {
            Self::String => "string".to_string(),
            Self::Bool => "bool".to_string(),
            Self::Integer => "integer".to_string(),
            Self::Unsigned => "unsigned integer".to_string(),
            Self::Float => "float".to_string(),
            Self::Duration => "duration".to_string(),
            Self::Secret => "secret".to_string(),
            Self::List(element) => format!("list of {}", element.name()),
            Self::Map(value) => format!("map of {}", value.name()),
            Self::Record(_) => "record".to_string(),
            Self::Any => "any".to_string(),
        }
    }
}

/// One leaf field of a destination structure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldDescriptor {
    pub path: String,
    pub kind: FieldKind,
    /// Textual default, decoded through the pipeline like an env value.
    pub default: Option<String>,
}

impl FieldDescriptor {
    pub fn is_secret(&self) -> bool {
        self.kind == FieldKind::Secret
    }

    /// Path segments split on `KEY_DELIMITER`.
    pub fn segments(&self) -> impl Iterator<Item = &str> {
        self.path.split(KEY_DELIMITER)
    }
}

/// Ordered list of field descriptors, built with a small builder API.
///
/// ```
/// use stratum_config::{FieldKind, Schema};
///
/// let database = Schema::new()
///     .field("host", FieldKind::String)
///     .with_default("localhost")
///     .field("password", FieldKind::Secret);
///
/// let schema = Schema::new()
///     .field("name", FieldKind::String)
///     .nest("database", database);
///
/// let paths: Vec<_> = schema.fields().iter().map(|f| f.path.as_str()).collect();
/// assert_eq!(paths, ["name", "database.host", "database.password"]);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Schema {
    fields: Vec<FieldDescriptor>,
}

impl Schema {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a field. Use `with_default()` right after to attach a default.
    pub fn field(mut self, path: impl Into<String>, kind: FieldKind) -> Self {
        let path = path.into();
        self.fields.retain(|f| f.path != path);
        self.fields.push(FieldDescriptor {
            path,
            kind,
            default: None,
        });
        self
    }

    /// Attach a default to the most recently declared field.
    ///
    /// Calling this before any `field()` has no effect.
    pub fn with_default(mut self, value: impl Into<String>) -> Self {
        if let Some(last) = self.fields.last_mut() {
            last.default = Some(value.into());
        }
        self
    }

    /// Append a child schema with every path prefixed by `prefix`.
    pub fn nest(mut self, prefix: &str, child: Schema) -> Self {
        for mut field in child.fields {
            field.path = format!("{}{}{}", prefix, KEY_DELIMITER, field.path);
            self.fields.retain(|f| f.path != field.path);
            self.fields.push(field);
        }
        self
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn get(&self, path: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.path == path)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

/// A destination structure the loader can populate.
///
/// Implementors declare their leaf fields with [`Schema`]; serde provides the
/// encoding in both directions. Fields not listed in the schema still load
/// from files and bound env vars, they just skip type coercion.
pub trait Configurable: Serialize + DeserializeOwned {
    fn schema() -> Schema;
}
