//! Layered configuration loading for services.
//!
//! This crate resolves a destination structure from a config file
//! (YAML, JSON or TOML), environment variables and declared defaults,
//! and renders loaded configuration with secrets masked.

pub mod constants;
mod decode;
pub mod duration;
mod flatten;
mod loader;
mod printable;
mod provider;
mod schema;
mod secret;

pub use decode::{DecodeHook, DecodePipeline, Origin, SecretMask, StringToDuration, StringToList, decode};
pub use duration::{DurationError, format_duration, parse_duration};
pub use flatten::{flatten_keys, flatten_value};
pub use loader::{ConfigError, Loader, ParseError, apply_defaults};
pub use printable::{printable, redacted};
pub use provider::{EnvKeyReplacer, FileType, Provider, env_var_or_none};
pub use schema::{Configurable, FieldDescriptor, FieldKind, Schema};
pub use secret::SecretString;

