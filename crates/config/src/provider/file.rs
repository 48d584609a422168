//! Config file formats, discovery and parsing.
//!
//! Responsibilities:
//! - Map file types to extensions and parsers (`serde_yaml`, `serde_json`, `toml`).
//! - Locate `<name>.<ext>` in the configured search paths.
//! - Read and parse the file into a JSON value tree.
//!
//! Invariants:
//! - Search paths are tried in insertion order; the first existing candidate wins.
//! - An empty document is an empty mapping; any other non-mapping root is an error.

use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use serde_json::{Map, Value};

use crate::loader::{ConfigError, ParseError};

/// Supported config file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileType {
    Yaml,
    Json,
    Toml,
}

impl FileType {
    /// Every supported type, in search order for untyped lookups.
    pub const ALL: [FileType; 3] = [FileType::Yaml, FileType::Json, FileType::Toml];

    /// File extensions, preferred first.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            Self::Yaml => &["yaml", "yml"],
            Self::Json => &["json"],
            Self::Toml => &["toml"],
        }
    }

    pub fn as_str(self) -> &'static str {
        self.extensions()[0]
    }

    /// Infer the type from a path's extension.
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or_default();
        ext.parse()
    }

    /// Parse file contents into a value tree.
    pub fn parse(self, content: &str) -> Result<Value, ParseError> {
        let value: Value = match self {
            Self::Yaml => serde_yaml::from_str(content)?,
            Self::Json => serde_json::from_str(content)?,
            Self::Toml => toml::from_str(content)?,
        };
        match value {
            Value::Null => Ok(Value::Object(Map::new())),
            Value::Object(map) => Ok(Value::Object(map)),
            _ => Err(ParseError::NotAMapping),
        }
    }
}

impl FromStr for FileType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let lower = s.trim_start_matches('.').to_ascii_lowercase();
        FileType::ALL
            .into_iter()
            .find(|t| t.extensions().contains(&lower.as_str()))
            .ok_or_else(|| ConfigError::UnsupportedFormat(s.to_string()))
    }
}

impl fmt::Display for FileType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Find the first `<name>.<ext>` in `paths`.
///
/// With a configured type only that type's extensions (and then the bare
/// name) are tried; without one, every supported extension is.
pub(crate) fn find_config_file(
    name: &str,
    paths: &[PathBuf],
    config_type: Option<FileType>,
) -> Result<PathBuf, ConfigError> {
    for dir in paths {
        let mut candidates: Vec<PathBuf> = match config_type {
            Some(t) => t.extensions().iter().map(|ext| dir.join(format!("{name}.{ext}"))).collect(),
            None => FileType::ALL
                .iter()
                .flat_map(|t| t.extensions())
                .map(|ext| dir.join(format!("{name}.{ext}")))
                .collect(),
        };
        if config_type.is_some() {
            candidates.push(dir.join(name));
        }

        if let Some(found) = candidates.into_iter().find(|p| p.is_file()) {
            return Ok(found);
        }
    }

    Err(ConfigError::ConfigFileNotFound {
        name: name.to_string(),
        locations: paths.to_vec(),
    })
}

/// Read and parse a config file.
pub(crate) fn read_config_file(path: &Path, file_type: FileType) -> Result<Value, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|e| ConfigError::SourceRead {
        path: path.to_path_buf(),
        source: e,
    })?;
    file_type
        .parse(&content)
        .map_err(|e| ConfigError::SourceParse {
            path: path.to_path_buf(),
            source: e,
        })
}
