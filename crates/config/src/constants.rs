//! Centralized constants for the stratum configuration crate.
//!
//! Default values used by the loader, the provider and the decode pipeline
//! live here to avoid magic strings spread across modules.

// =============================================================================
// Provider Defaults
// =============================================================================

/// Base name (without extension) of the config file searched for by default.
pub const DEFAULT_CONFIG_NAME: &str = "config";

/// File type assumed by `Loader::new()` when none is configured.
pub const DEFAULT_CONFIG_TYPE: crate::FileType = crate::FileType::Yaml;

/// Default env key replacement rule: `database.host` -> `DATABASE_HOST`.
pub const DEFAULT_ENV_KEY_REPLACER: (&str, &str) = (".", "_");

/// Separator inserted between the env prefix and the key.
pub const ENV_PREFIX_SEPARATOR: &str = "_";

// =============================================================================
// Key Paths & Decoding
// =============================================================================

/// Separator between path segments of a flattened key.
pub const KEY_DELIMITER: &str = ".";

/// Separator used when a string is decoded into a list field.
pub const DEFAULT_LIST_SEPARATOR: &str = ",";

/// Fixed token rendered in place of every secret value.
pub const SECRET_MASK: &str = "****************";

// =============================================================================
// Dotenv
// =============================================================================

/// When set to `1` or `true`, `Loader::load_dotenv` does nothing.
pub const DOTENV_DISABLED_VAR: &str = "DOTENV_DISABLED";
