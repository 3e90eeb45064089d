#![forbid(unsafe_code)]

//! Session configuration.
//!
//! [`SessionConfig`] collects the tunables of an editing session. With the
//! `session-config` feature it can be loaded from TOML or JSON.
//!
//! ```toml
//! # styleform.toml
//! [history]
//! max_depth = 250
//! max_bytes = 4194304
//! ```
//!
//! ```rust,ignore
//! let config = SessionConfig::from_toml_file("styleform.toml")?.validated()?;
//! let ctx = UndoContext::with_config(&config);
//! ```
//!
//! Missing keys take their defaults, so an empty file is valid.

#[cfg(feature = "session-config")]
use std::path::Path;

#[cfg(feature = "session-config")]
use serde::{Deserialize, Serialize};

use crate::undo::HistoryConfig;

/// Tunables for one editing session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "session-config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "session-config", serde(default))]
pub struct SessionConfig {
    /// Undo history limits.
    pub history: HistoryConfig,
}

impl SessionConfig {
    #[cfg(feature = "session-config")]
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        toml::from_str(s).map_err(ConfigError::Toml)
    }

    #[cfg(feature = "session-config")]
    pub fn from_toml_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_toml_str(&content)
    }

    #[cfg(feature = "session-config")]
    pub fn from_json_str(s: &str) -> Result<Self, ConfigError> {
        serde_json::from_str(s).map_err(ConfigError::Json)
    }

    #[cfg(feature = "session-config")]
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref()).map_err(ConfigError::Io)?;
        Self::from_json_str(&content)
    }

    /// Problems with the configured values. Empty means valid.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.history.max_depth == 0 {
            errors.push("history.max_depth must be > 0".into());
        }
        if self.history.max_bytes != 0 && self.history.max_bytes < 1024 {
            errors.push(format!(
                "history.max_bytes must be 0 (unlimited) or >= 1024, got {}",
                self.history.max_bytes
            ));
        }
        errors
    }

    /// `self` if [`Self::validate`] finds nothing.
    pub fn validated(self) -> Result<Self, ConfigError> {
        let errors = self.validate();
        if errors.is_empty() {
            Ok(self)
        } else {
            Err(ConfigError::Validation(errors))
        }
    }
}

/// Failure to load or validate a [`SessionConfig`].
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    #[cfg(feature = "session-config")]
    Toml(toml::de::Error),
    #[cfg(feature = "session-config")]
    Json(serde_json::Error),
    Validation(Vec<String>),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(e) => write!(f, "I/O error: {e}"),
            #[cfg(feature = "session-config")]
            Self::Toml(e) => write!(f, "TOML parse error: {e}"),
            #[cfg(feature = "session-config")]
            Self::Json(e) => write!(f, "JSON parse error: {e}"),
            Self::Validation(errors) => write!(f, "validation errors: {}", errors.join("; ")),
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Io(e) => Some(e),
            #[cfg(feature = "session-config")]
            Self::Toml(e) => Some(e),
            #[cfg(feature = "session-config")]
            Self::Json(e) => Some(e),
            Self::Validation(_) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_valid() {
        let config = SessionConfig::default();
        assert!(config.validate().is_empty());
        assert_eq!(config.history, HistoryConfig::unlimited());
    }

    #[test]
    fn validation_reports_each_problem() {
        let config = SessionConfig {
            history: HistoryConfig::new(0, 10),
        };
        let errors = config.validate();
        assert_eq!(errors.len(), 2);
        assert!(errors[0].contains("max_depth"));
        match config.validated() {
            Err(ConfigError::Validation(found)) => assert_eq!(found, errors),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn unlimited_bytes_is_valid() {
        let config = SessionConfig {
            history: HistoryConfig::new(10, 0),
        };
        assert!(config.validated().is_ok());
    }

    #[cfg(feature = "session-config")]
    #[test]
    fn toml_fills_missing_keys() {
        let config = SessionConfig::from_toml_str("[history]\nmax_depth = 7\n").expect("toml");
        assert_eq!(config.history.max_depth, 7);
        assert_eq!(config.history.max_bytes, HistoryConfig::default().max_bytes);
    }

    #[cfg(feature = "session-config")]
    #[test]
    fn json_parse_error_is_reported() {
        let err = SessionConfig::from_json_str("{").expect_err("bad json");
        assert!(err.to_string().starts_with("JSON parse error"));
    }
}
