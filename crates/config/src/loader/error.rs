//! Error types for configuration loading.
//!
//! Responsibilities:
//! - Define error variants for every stage of resolution: argument checks,
//!   file reading, key discovery, env binding and decoding.
//! - Wrap lower-level causes (I/O, parser errors) with the path involved.
//!
//! Does NOT handle:
//! - Recovery. Every error is terminal for the current `load`/`printable` call;
//!   the loader only tolerates `ConfigFileNotFound`.
//!
//! Invariants:
//! - All error variants include context for debugging (paths, keys, kinds).
//! - Dotenv errors NEVER include raw .env line contents to prevent secret leakage.

use std::io::ErrorKind;
use std::path::PathBuf;
use thiserror::Error;

/// Parser failure for a config file, by format.
#[derive(Error, Debug)]
pub enum ParseError {
    #[error(transparent)]
    Json(#[from] serde_json::Error),

    #[error(transparent)]
    Yaml(#[from] serde_yaml::Error),

    #[error(transparent)]
    Toml(#[from] toml::de::Error),

    #[error("top-level value must be a mapping")]
    NotAMapping,
}

/// Errors that can occur during configuration loading and redaction.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// The destination does not encode as a record.
    #[error("require a mutable reference to a struct for load, got {kind}")]
    InvalidArgument { kind: &'static str },

    #[error("config file \"{name}\" not found in {locations:?}")]
    ConfigFileNotFound {
        name: String,
        locations: Vec<PathBuf>,
    },

    #[error("failed to read config file at {path}: {source}")]
    SourceRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to parse config file at {path}: {source}")]
    SourceParse { path: PathBuf, source: ParseError },

    #[error("unsupported config type \"{0}\"")]
    UnsupportedFormat(String),

    #[error("unable to get all config keys from struct: {message}")]
    KeyDiscovery { message: String },

    #[error("unable to bind env key for \"{key}\": {message}")]
    Binding { key: String, message: String },

    #[error("unable to decode \"{path}\": {message}")]
    Decode { path: String, message: String },

    /// Failed to parse the `.env` file due to invalid syntax.
    ///
    /// SAFETY: This error only includes the byte index of the parse failure,
    /// NOT the offending line content, to prevent leaking secrets.
    #[error(
        "Failed to parse .env file at position {error_index}. Hint: set DOTENV_DISABLED=1 to skip .env loading"
    )]
    DotenvParse { error_index: usize },

    /// Failed to read the `.env` file due to an I/O error.
    #[error("Failed to read .env file: {kind}")]
    DotenvIo { kind: ErrorKind },

    /// Unknown dotenv error (future variants from dotenvy crate).
    #[error("Failed to load .env file. Hint: set DOTENV_DISABLED=1 to skip .env loading")]
    DotenvUnknown,
}

impl ConfigError {
    /// True for the one error `Loader::load` tolerates.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::ConfigFileNotFound { .. })
    }

    pub(crate) fn decode(path: impl Into<String>, message: impl ToString) -> Self {
        Self::Decode {
            path: path.into(),
            message: message.to_string(),
        }
    }
}
