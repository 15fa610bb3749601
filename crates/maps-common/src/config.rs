//! `maps.toml` compiler configuration.
//!
//! ```toml
//! [options]
//! print-all-types = true
//! debug-no-inline = "false"
//!
//! [pragmas]
//! "mutable global variables" = true
//! ```
//!
//! Option values may be written as booleans or strings; both end up as the
//! string form the options store uses.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;

use serde::Deserialize;

use crate::options::{CompilerOption, Entries};
use crate::pragma::{self, PragmaStore};
use crate::span::SourceLocation;

/// A parsed configuration file.
#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub options: BTreeMap<String, OptionValue>,
    #[serde(default)]
    pub pragmas: BTreeMap<String, bool>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum OptionValue {
    Bool(bool),
    Text(String),
}

impl fmt::Display for OptionValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(b) => write!(f, "{b}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

#[derive(Debug)]
pub enum ConfigError {
    Io(String),
    Parse(String),
    UnknownOption(String),
    UnknownPragma(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(msg) => write!(f, "failed to read config: {msg}"),
            Self::Parse(msg) => write!(f, "failed to parse config: {msg}"),
            Self::UnknownOption(key) => write!(f, "unknown compiler option `{key}`"),
            Self::UnknownPragma(name) => write!(f, "unknown pragma `{name}`"),
        }
    }
}

impl std::error::Error for ConfigError {}

impl Config {
    pub fn from_file(path: &Path) -> Result<Config, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| ConfigError::Io(format!("{}: {}", path.display(), e)))?;
        Self::from_str(&content)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(content: &str) -> Result<Config, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::Parse(e.to_string()))
    }

    /// The `[options]` table as entries for [`crate::options::CompilerOptions::lock`].
    pub fn option_entries(&self) -> Result<Entries, ConfigError> {
        self.options
            .iter()
            .map(|(key, value)| {
                let option = CompilerOption::from_key(key)
                    .ok_or_else(|| ConfigError::UnknownOption(key.clone()))?;
                Ok((option, value.to_string()))
            })
            .collect()
    }

    /// The `[pragmas]` table as settings in effect from the start of every file.
    pub fn pragma_store(&self) -> Result<PragmaStore, ConfigError> {
        let mut store = PragmaStore::new();
        for (name, &value) in &self.pragmas {
            if !pragma::FLAGS.iter().any(|flag| flag.name == name) {
                return Err(ConfigError::UnknownPragma(name.clone()));
            }
            store.set_flag(name, value, SourceLocation::default());
        }
        Ok(store)
    }
}
