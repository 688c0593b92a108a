//! Site file plumbing shared by every sluice binary.
//!
//! A binary reads exactly one TOML file. What is common to all of them
//! lives here: [`ConfigError`], [`LogLevel`], the `[shared]` table and
//! [`ConfigLoader`], which any `Deserialize` struct gets for free.
//!
//! # Usage
//!
//! ```rust,no_run
//! use serde::Deserialize;
//! use sluice_common::config::{ConfigError, ConfigLoader, SharedConfig};
//! use std::path::Path;
//!
//! #[derive(Deserialize)]
//! struct StationConsole {
//!     shared: SharedConfig,
//!     refresh_ms: u64,
//! }
//!
//! fn main() -> Result<(), ConfigError> {
//!     let console = StationConsole::load(Path::new("console.toml"))?;
//!     println!("{} refreshes every {} ms", console.shared.service_name, console.refresh_ms);
//!     Ok(())
//! }
//! ```

use std::io::ErrorKind;
use std::path::Path;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Why a site file could not be turned into a usable config.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ConfigError {
    /// Nothing at the given path.
    #[error("Configuration file not found: {0}")]
    FileNotFound(String),

    /// Unreadable file or malformed TOML.
    #[error("Failed to parse configuration: {0}")]
    ParseError(String),

    /// Well-formed TOML with values the site cannot run with.
    #[error("Configuration validation failed: {0}")]
    ValidationError(String),
}

/// Default log verbosity, written lowercase in TOML (`log_level = "warn"`).
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
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
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Trace => "trace",
            Self::Debug => "debug",
            Self::Info => "info",
            Self::Warn => "warn",
            Self::Error => "error",
        }
    }
}

/// The `[shared]` table.
///
/// ```toml
/// [shared]
/// log_level = "debug"
/// service_name = "sluice-cu-01"
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SharedConfig {
    #[serde(default)]
    pub log_level: LogLevel,
    /// Instance name shown in logs.
    pub service_name: String,
}

impl Default for SharedConfig {
    fn default() -> Self {
        Self {
            log_level: LogLevel::default(),
            service_name: "sluice".to_string(),
        }
    }
}

impl SharedConfig {
    /// A blank `service_name` is the only invalid value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.service_name.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "shared.service_name must not be blank".to_string(),
            ));
        }
        Ok(())
    }
}

/// TOML loading for any deserializable config struct.
///
/// A missing file maps to [`ConfigError::FileNotFound`]; any other I/O
/// failure and every TOML error map to [`ConfigError::ParseError`].
pub trait ConfigLoader: Sized + DeserializeOwned {
    fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ConfigError::FileNotFound(path.display().to_string()),
            _ => ConfigError::ParseError(format!("{}: {e}", path.display())),
        })?;
        Self::load_str(&text)
    }

    fn load_str(content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))
    }
}

impl<T: DeserializeOwned> ConfigLoader for T {}
