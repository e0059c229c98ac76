//! Runtime configuration loaded from the environment.

use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::api::middleware::SecurityConfig;
use crate::hierarchy::DEFAULT_MAX_DEPTH;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 3000;

/// Server configuration.
///
/// | Env Var                   | Default                          |
/// |---------------------------|----------------------------------|
/// | `ORGNOCAL_HOST`           | `127.0.0.1`                      |
/// | `ORGNOCAL_PORT`           | `3000`                           |
/// | `ORGNOCAL_DB_PATH`        | `orgnocal.db` in the data dir    |
/// | `ORGNOCAL_MAX_TASK_DEPTH` | `5`                              |
/// | `ORGNOCAL_API_KEY`        | unset (no auth, no rate limit)   |
/// | `ORGNOCAL_CORS_ORIGINS`   | unset (permissive)               |
/// | `ORGNOCAL_RATE_LIMIT`     | `100` requests per minute        |
///
/// A `.env` file in the working directory is loaded by the binary before
/// this is read.
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub db_path: Option<PathBuf>,
    /// Upper bound on nested generations returned by tree endpoints.
    pub max_task_depth: usize,
    pub security: SecurityConfig,
}

impl AppConfig {
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary key lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let host = lookup("ORGNOCAL_HOST").unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup("ORGNOCAL_PORT") {
            Some(value) => value
                .parse()
                .with_context(|| format!("ORGNOCAL_PORT must be a valid port, got {value:?}"))?,
            None => DEFAULT_PORT,
        };

        let max_task_depth = match lookup("ORGNOCAL_MAX_TASK_DEPTH") {
            Some(value) => value.parse().with_context(|| {
                format!("ORGNOCAL_MAX_TASK_DEPTH must be a non-negative integer, got {value:?}")
            })?,
            None => DEFAULT_MAX_DEPTH,
        };

        Ok(Self {
            host,
            port,
            db_path: lookup("ORGNOCAL_DB_PATH").map(PathBuf::from),
            max_task_depth,
            security: SecurityConfig::from_lookup(&lookup),
        })
    }

    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Clamp a requested tree depth to the configured maximum.
    pub fn depth(&self, requested: Option<usize>) -> usize {
        requested.map_or(self.max_task_depth, |d| d.min(self.max_task_depth))
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_path: None,
            max_task_depth: DEFAULT_MAX_DEPTH,
            security: SecurityConfig::disabled(),
        }
    }
}
