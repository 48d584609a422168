//! Environment variable naming and lookup.
//!
//! Responsibilities:
//! - Translate a key path (`database.host`) into an env variable name
//!   (`APP_DATABASE_HOST`) using the prefix and the key replacer.
//! - Read environment variables with empty/whitespace filtering.
//!
//! Invariants:
//! - Env names are upper-cased after the prefix is joined, then the replacer runs.
//! - Empty or whitespace-only environment variables are treated as unset.
//! - Returned values are trimmed (leading/trailing whitespace removed).

use crate::constants::ENV_PREFIX_SEPARATOR;
use crate::loader::ConfigError;

/// Single-pair string replacement applied to env variable names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvKeyReplacer {
    old: String,
    new: String,
}

impl EnvKeyReplacer {
    pub fn new(old: impl Into<String>, new: impl Into<String>) -> Self {
        Self {
            old: old.into(),
            new: new.into(),
        }
    }

    /// Replace every occurrence of `old`; an empty `old` replaces nothing.
    pub fn replace(&self, input: &str) -> String {
        if self.old.is_empty() {
            return input.to_string();
        }
        input.replace(&self.old, &self.new)
    }
}

/// Read an environment variable, returning None if unset, empty, or whitespace-only.
/// Returns the trimmed value (leading/trailing whitespace removed) if present.
pub fn env_var_or_none(key: &str) -> Option<String> {
    std::env::var(key).ok().and_then(|s| {
        let trimmed = s.trim();
        if trimmed.is_empty() {
            None
        } else if trimmed.len() == s.len() {
            // No trimming needed, return original to avoid allocation
            Some(s)
        } else {
            Some(trimmed.to_string())
        }
    })
}

/// Build the env variable name for `key`.
pub(crate) fn env_name(key: &str, prefix: Option<&str>, replacer: Option<&EnvKeyReplacer>) -> String {
    let merged = match prefix {
        Some(prefix) => format!("{prefix}{ENV_PREFIX_SEPARATOR}{key}"),
        None => key.to_string(),
    }
    .to_uppercase();

    match replacer {
        Some(replacer) => replacer.replace(&merged),
        None => merged,
    }
}

/// Reject names the platform cannot look up.
pub(crate) fn validate_env_name(key: &str, name: &str) -> Result<(), ConfigError> {
    let message = if name.is_empty() {
        Some("env variable name is empty")
    } else if name.contains('=') {
        Some("env variable name contains '='")
    } else if name.contains('\0') {
        Some("env variable name contains a NUL byte")
    } else {
        None
    };

    match message {
        Some(message) => Err(ConfigError::Binding {
            key: key.to_string(),
            message: message.to_string(),
        }),
        None => Ok(()),
    }
}
