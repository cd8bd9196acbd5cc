//! Crate-wide defaults, loadable from TOML.
//!
//! Every field has a default, so a config file only needs the keys it
//! changes:
//!
//! ```toml
//! default_protocol = "HTTP/2"
//! cookie_lifetime_secs = 3600
//! session = "shop"
//! ```

use std::path::Path;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::http::SessionDirective;

/// Errors produced while loading a [`Config`].
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Protocol used in the status line when the host reports none.
    pub default_protocol: String,
    /// `content-type` header of a freshly created response.
    pub default_content_type: String,
    /// Lifetime of cookies set without an explicit expiry.
    pub cookie_lifetime_secs: u64,
    /// Session directive used by [`Request::from_host`](crate::http::Request::from_host).
    pub session: SessionDirective,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_protocol: "HTTP/1.1".to_owned(),
            default_content_type: "text/html; charset=utf-8".to_owned(),
            cookie_lifetime_secs: 30,
            session: SessionDirective::Default,
        }
    }
}

impl Config {
    /// Parses a config from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Parse`] for malformed TOML or mistyped fields.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    /// Reads and parses a TOML config file.
    ///
    /// # Errors
    ///
    /// - [`ConfigError::Io`]: the file cannot be read.
    /// - [`ConfigError::Parse`]: the content is not a valid config.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.display().to_string(),
            source: e,
        })?;
        Self::from_toml_str(&content)
    }
}
