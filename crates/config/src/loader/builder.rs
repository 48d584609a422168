//! Configuration loader builder implementation.
//!
//! Responsibilities:
//! - Provide a builder-pattern `Loader` that configures the underlying `Provider`.
//! - Resolve a destination structure from file + environment + defaults.
//! - Optionally load a `.env` file before resolution.
//!
//! Does NOT handle:
//! - File discovery and env naming (delegated to `provider`).
//! - Type coercion (delegated to `decode`).
//! - Semantic validation of the loaded values.
//!
//! Invariants / Assumptions:
//! - Precedence: env vars > file values > declared defaults > zero values.
//! - Builder options are applied in the order they are called; `load` never
//!   mutates the loader, it works on a copy of the provider.
//! - A missing config file is not an error; every other read failure is.
//! - The `DOTENV_DISABLED` variable is checked before `dotenvy::dotenv()` is called.

use std::path::PathBuf;

use super::defaults::apply_defaults_to_tree;
use super::error::ConfigError;
use super::shape::destination_kind;
use crate::constants::{DEFAULT_CONFIG_TYPE, DEFAULT_ENV_KEY_REPLACER, DOTENV_DISABLED_VAR};
use crate::decode::{DecodePipeline, Origin};
use crate::flatten::{flatten_keys, merge_values};
use crate::provider::{EnvKeyReplacer, FileType, Provider};
use crate::schema::Configurable;

/// Loads configuration into destination structures.
///
/// ```no_run
/// use serde::{Deserialize, Serialize};
/// use stratum_config::{Configurable, FieldKind, Loader, Schema, SecretString};
///
/// #[derive(Serialize, Deserialize, Default)]
/// struct AppConfig {
///     host: String,
///     password: SecretString,
/// }
///
/// impl Configurable for AppConfig {
///     fn schema() -> Schema {
///         Schema::new()
///             .field("host", FieldKind::String)
///             .with_default("localhost")
///             .field("password", FieldKind::Secret)
///     }
/// }
///
/// let loader = Loader::new().with_path("/etc/myapp").with_env_prefix("MYAPP");
/// let mut config = AppConfig::default();
/// loader.load(&mut config)?;
/// # Ok::<(), stratum_config::ConfigError>(())
/// ```
#[derive(Debug, Clone)]
pub struct Loader {
    provider: Provider,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    /// Create a loader looking for `config.yaml`, with env keys translated
    /// by replacing `.` with `_`.
    pub fn new() -> Self {
        let mut provider = Provider::new();
        provider.set_config_type(DEFAULT_CONFIG_TYPE);
        let (old, new) = DEFAULT_ENV_KEY_REPLACER;
        provider.set_env_key_replacer(EnvKeyReplacer::new(old, new));
        Self { provider }
    }

    /// Check if dotenv loading is disabled via environment variable.
    fn dotenv_disabled() -> bool {
        matches!(
            std::env::var(DOTENV_DISABLED_VAR).ok().as_deref(),
            Some("true") | Some("1")
        )
    }

    /// Load environment variables from .env file if present.
    ///
    /// If `DOTENV_DISABLED` environment variable is set to "true" or "1",
    /// the .env file will not be loaded (useful for testing).
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The `.env` file exists but has invalid syntax (`ConfigError::DotenvParse`)
    /// - The `.env` file exists but cannot be read due to I/O errors (`ConfigError::DotenvIo`)
    ///
    /// Missing `.env` files are silently ignored (returns `Ok(self)`).
    ///
    /// SAFETY: Error messages never include raw .env line contents to prevent secret leakage.
    pub fn load_dotenv(self) -> Result<Self, ConfigError> {
        if Self::dotenv_disabled() {
            return Ok(self);
        }

        match dotenvy::dotenv() {
            Ok(path) => {
                tracing::debug!(path = %path.display(), "Loaded .env file");
                Ok(self)
            }
            Err(e) if Self::is_not_found(&e) => Ok(self),
            Err(dotenvy::Error::LineParse(_, idx)) => {
                Err(ConfigError::DotenvParse { error_index: idx })
            }
            Err(dotenvy::Error::Io(io_err)) => Err(ConfigError::DotenvIo {
                kind: io_err.kind(),
            }),
            Err(_) => Err(ConfigError::DotenvUnknown),
        }
    }

    /// Check if a dotenv error indicates the file was not found.
    fn is_not_found(err: &dotenvy::Error) -> bool {
        matches!(
            err,
            dotenvy::Error::Io(io_err) if io_err.kind() == std::io::ErrorKind::NotFound
        )
    }

    /// Replace the provider. Options called afterwards apply to the new one.
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = provider;
        self
    }

    /// Set the config file name, without extension.
    pub fn with_name(mut self, name: &str) -> Self {
        self.provider.set_config_name(name);
        self
    }

    /// Add a directory to search for the config file. Can be called
    /// repeatedly; the first directory containing the file wins.
    pub fn with_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.provider.add_config_path(path);
        self
    }

    /// Set the config file type, also used as its extension.
    pub fn with_type(mut self, file_type: FileType) -> Self {
        self.provider.set_config_type(file_type);
        self
    }

    /// Read exactly this file instead of searching. A missing explicit file
    /// is an error.
    pub fn with_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.provider.set_config_file(path);
        self
    }

    /// Add the platform config directory of `app_name` as a search path
    /// (`~/.config/<app_name>` on Linux).
    pub fn with_user_config_dir(mut self, app_name: &str) -> Self {
        match directories::ProjectDirs::from("", "", app_name) {
            Some(dirs) => self.provider.add_config_path(dirs.config_dir()),
            None => tracing::warn!(app_name, "Unable to determine user config directory"),
        }
        self
    }

    /// Set the prefix of env variable names; joined to keys with `_`.
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.provider.set_env_prefix(prefix);
        self
    }

    /// Replace `old` with `new` when translating keys into env variable names.
    pub fn with_env_key_replacer(mut self, old: &str, new: &str) -> Self {
        self.provider.set_env_key_replacer(EnvKeyReplacer::new(old, new));
        self
    }

    pub fn provider(&self) -> &Provider {
        &self.provider
    }

    /// Load configuration into `destination`.
    ///
    /// Values resolve with precedence env > file > declared default; fields
    /// with no source keep what `destination` already held. On error the
    /// destination is left untouched.
    pub fn load<T: Configurable>(&self, destination: &mut T) -> Result<(), ConfigError> {
        let kind = destination_kind(&*destination)?;
        if kind != "struct" {
            return Err(ConfigError::InvalidArgument { kind });
        }
        let mut tree = serde_json::to_value(&*destination).map_err(|e| {
            ConfigError::KeyDiscovery {
                message: e.to_string(),
            }
        })?;
        if !tree.is_object() {
            tracing::debug!("Destination has no fields, nothing to load");
            return Ok(());
        }

        let mut provider = self.provider.clone();
        provider.automatic_env();

        match provider.read_in_config() {
            Ok(()) => {}
            Err(e) if e.is_not_found() => {
                tracing::debug!(error = %e, "No config file found, using env and defaults");
            }
            Err(e) => return Err(e),
        }

        let keys = flatten_keys(&*destination)?;
        for key in &keys {
            provider.bind_env(key)?;
        }
        tracing::debug!(count = keys.len(), "Bound config keys to env variables");

        let schema = T::schema();
        let applied = apply_defaults_to_tree(&mut tree, &schema);
        if !applied.is_empty() {
            tracing::debug!(fields = ?applied, "Applied declared defaults");
        }

        merge_values(&mut tree, provider.all_settings());
        *destination = DecodePipeline::standard().decode(tree, Origin::Raw)?;
        Ok(())
    }
}
