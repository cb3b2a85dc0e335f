//! HTTP transport settings, loadable from a TOML file.

use std::path::Path;

use serde::Deserialize;

use crate::error::{BridgeError, IoContext, Result};

fn default_bind() -> String {
    "127.0.0.1:8080".into()
}

fn default_allowed_origin() -> String {
    "http://localhost:5173".into()
}

fn default_workers() -> usize {
    1
}

/// Tuning for the HTTP transport. The command loop itself is identical
/// across transports; only the framing differs.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HttpConfig {
    /// Address to listen on
    #[serde(default = "default_bind")]
    pub bind: String,

    /// Origin allowed by the CORS headers on every response
    #[serde(default = "default_allowed_origin")]
    pub allowed_origin: String,

    /// Number of HTTP worker threads. Command execution is serialised
    /// behind one lock regardless.
    #[serde(default = "default_workers")]
    pub workers: usize,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            allowed_origin: default_allowed_origin(),
            workers: default_workers(),
        }
    }
}

impl HttpConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .io_context(|| format!("Failed to read config file at {}", path.display()))?;
        let config: HttpConfig = toml::from_str(&contents)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(BridgeError::config("workers must be greater than 0"));
        }
        Ok(())
    }
}
