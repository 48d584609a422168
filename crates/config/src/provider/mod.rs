//! The configuration provider: file and environment sources.
//!
//! Responsibilities:
//! - Hold the file search settings (name, paths, type or explicit file) and
//!   the parsed file contents once read.
//! - Hold the env settings (prefix, key replacer, explicit bindings,
//!   automatic env) and resolve env overrides.
//! - Produce the merged settings tree handed to the decode pipeline.
//!
//! Does NOT handle:
//! - Defaults or type conversion (see `loader::defaults` and `decode`).
//!
//! Invariants:
//! - Environment variables take precedence over file values.
//! - A missing file is reported as `ConfigFileNotFound`, distinct from read
//!   and parse failures.
//! - Values read from env are strings; converting them is the pipeline's job.
//! - Keys are case-insensitive: file keys are lower-cased when read, and
//!   bindings and lookups use the lower-cased key.

mod env;
mod file;

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};

pub use env::{EnvKeyReplacer, env_var_or_none};
pub use file::FileType;

use crate::constants::DEFAULT_CONFIG_NAME;
use crate::flatten::{flatten_value, get_path, lowercase_keys, set_path};
use crate::loader::ConfigError;

/// File and environment source settings plus the state read from them.
#[derive(Debug, Clone)]
pub struct Provider {
    config_name: String,
    config_paths: Vec<PathBuf>,
    config_type: Option<FileType>,
    config_file: Option<PathBuf>,
    env_prefix: Option<String>,
    env_key_replacer: Option<EnvKeyReplacer>,
    automatic_env: bool,
    env_bindings: BTreeMap<String, String>,
    file_settings: Value,
    config_file_used: Option<PathBuf>,
}

impl Default for Provider {
    fn default() -> Self {
        Self::new()
    }
}

impl Provider {
    /// A provider looking for `config.<ext>` with no search paths, no env
    /// prefix and no key replacer.
    pub fn new() -> Self {
        Self {
            config_name: DEFAULT_CONFIG_NAME.to_string(),
            config_paths: Vec::new(),
            config_type: None,
            config_file: None,
            env_prefix: None,
            env_key_replacer: None,
            automatic_env: false,
            env_bindings: BTreeMap::new(),
            file_settings: Value::Object(Map::new()),
            config_file_used: None,
        }
    }

    /// Set the config file base name, without extension.
    pub fn set_config_name(&mut self, name: impl Into<String>) {
        self.config_name = name.into();
    }

    /// Add a directory to search; directories are searched in insertion order.
    pub fn add_config_path(&mut self, path: impl Into<PathBuf>) {
        let path = path.into();
        if !self.config_paths.contains(&path) {
            self.config_paths.push(path);
        }
    }

    pub fn set_config_type(&mut self, config_type: FileType) {
        self.config_type = Some(config_type);
    }

    /// Use this exact file instead of searching.
    pub fn set_config_file(&mut self, path: impl Into<PathBuf>) {
        self.config_file = Some(path.into());
    }

    pub fn set_env_prefix(&mut self, prefix: impl Into<String>) {
        let prefix = prefix.into();
        self.env_prefix = (!prefix.is_empty()).then_some(prefix);
    }

    pub fn set_env_key_replacer(&mut self, replacer: EnvKeyReplacer) {
        self.env_key_replacer = Some(replacer);
    }

    /// Let env vars override every key found in the config file, not only
    /// explicitly bound ones.
    pub fn automatic_env(&mut self) {
        self.automatic_env = true;
    }

    pub fn config_name(&self) -> &str {
        &self.config_name
    }

    pub fn config_paths(&self) -> &[PathBuf] {
        &self.config_paths
    }

    pub fn config_type(&self) -> Option<FileType> {
        self.config_type
    }

    pub fn env_prefix(&self) -> Option<&str> {
        self.env_prefix.as_deref()
    }

    /// The file read by the last successful `read_in_config`.
    pub fn config_file_used(&self) -> Option<&Path> {
        self.config_file_used.as_deref()
    }

    /// Locate, read and parse the config file.
    pub fn read_in_config(&mut self) -> Result<(), ConfigError> {
        let path = match &self.config_file {
            Some(path) => path.clone(),
            None => file::find_config_file(&self.config_name, &self.config_paths, self.config_type)?,
        };

        let file_type = match self.config_type {
            Some(t) => t,
            None => FileType::from_path(&path)?,
        };

        self.file_settings = lowercase_keys(file::read_config_file(&path, file_type)?);
        tracing::debug!(path = %path.display(), file_type = %file_type, "Read config file");
        self.config_file_used = Some(path);
        Ok(())
    }

    /// The env variable name bound to `key`.
    pub fn env_key(&self, key: &str) -> String {
        env::env_name(key, self.env_prefix.as_deref(), self.env_key_replacer.as_ref())
    }

    /// Explicitly bind `key` to its env variable, so it is resolved even when
    /// the file does not mention it.
    pub fn bind_env(&mut self, key: &str) -> Result<(), ConfigError> {
        if key.is_empty() {
            return Err(ConfigError::Binding {
                key: String::new(),
                message: "key is empty".to_string(),
            });
        }
        let name = self.env_key(key);
        env::validate_env_name(key, &name)?;
        self.env_bindings.insert(key.to_lowercase(), name);
        Ok(())
    }

    /// Bound keys (lower-cased) and their env variable names.
    pub fn env_bindings(&self) -> &BTreeMap<String, String> {
        &self.env_bindings
    }

    /// Resolve a single key: env first, then the file.
    pub fn get(&self, key: &str) -> Option<Value> {
        let key = key.to_lowercase();
        if let Some(value) = self.env_value(&key) {
            return Some(Value::String(value));
        }
        get_path(&self.file_settings, &key).cloned()
    }

    /// `key` must already be lower-cased.
    fn env_value(&self, key: &str) -> Option<String> {
        if let Some(name) = self.env_bindings.get(key)
            && let Some(value) = env_var_or_none(name)
        {
            return Some(value);
        }
        if self.automatic_env {
            return env_var_or_none(&self.env_key(key));
        }
        None
    }

    /// The merged settings tree: file values overridden by env values.
    pub fn all_settings(&self) -> Value {
        let mut settings = self.file_settings.clone();

        let mut keys: Vec<String> = self.env_bindings.keys().cloned().collect();
        if self.automatic_env {
            keys.extend(flatten_value(&self.file_settings).into_keys());
        }
        keys.sort();
        keys.dedup();

        for key in keys {
            if let Some(value) = self.env_value(&key) {
                set_path(&mut settings, &key, Value::String(value));
            }
        }
        settings
    }
}
