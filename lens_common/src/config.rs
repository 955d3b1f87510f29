//! TOML configuration: shared section, log level and the loader trait.
//!
//! Any `DeserializeOwned` type can be read with [`ConfigLoader`]:
//!
//! ```rust,no_run
//! use lens_common::config::{ConfigError, ConfigLoader};
//! use lens_common::control::config::LensConfig;
//! use std::path::Path;
//!
//! fn load() -> Result<LensConfig, ConfigError> {
//!     let config = LensConfig::load(Path::new("config/lens.toml"))?;
//!     config.validate()?;
//!     Ok(config)
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("configuration file not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// File exists but could not be read.
    #[error("cannot read {}: {reason}", path.display())]
    ReadError { path: PathBuf, reason: String },

    #[error("invalid TOML: {0}")]
    ParseError(String),

    /// Well-formed document with values outside their allowed range.
    #[error("invalid configuration: {0}")]
    ValidationError(String),
}

impl ConfigError {
    /// Shorthand for a [`ConfigError::ValidationError`].
    pub fn invalid(reason: impl Into<String>) -> Self {
        Self::ValidationError(reason.into())
    }
}

/// Log verbosity, lowercase in TOML.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    #[default]
    Info,
    Warn,
    Error,
}

impl LogLevel {
    /// Directive string understood by `tracing_subscriber::EnvFilter`.
    pub const fn as_directive(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// `[shared]` section.
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "lens-core-01"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SharedConfig {
    #[serde(default)]
    pub log_level: LogLevel,

    /// Instance name used in lifecycle logs.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: "lens-core".to_string(),
        }
    }
}

impl SharedConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::invalid("shared.service_name must not be empty"));
        }
        Ok(())
    }
}

/// TOML loading for every deserializable type.
///
/// Only syntax and shape are checked here; range checks belong to the
/// loaded type's own `validate`.
pub trait ConfigLoader: Sized + serde::de::DeserializeOwned {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::FileNotFound(path.to_path_buf()),
            _ => ConfigError::ReadError {
                path: path.to_path_buf(),
                reason: e.to_string(),
            },
        })?;
        Self::from_toml(&content)
    }

    fn from_toml(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: serde::de::DeserializeOwned> ConfigLoader for T {}
