//! Service configuration.
//!
//! Values come from, in increasing precedence: built-in defaults, a TOML
//! file, `STRICTLY_SCORES_*` environment variables and command-line flags.

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use std::path::Path;
use tracing::{debug, info, instrument};

use crate::identity::DEFAULT_ACCOUNT_HEADER;

/// Environment variable overriding [`ServiceConfig::database_url`].
pub const ENV_DATABASE: &str = "STRICTLY_SCORES_DB";
/// Environment variable overriding [`ServiceConfig::host`].
pub const ENV_HOST: &str = "STRICTLY_SCORES_HOST";
/// Environment variable overriding [`ServiceConfig::port`].
pub const ENV_PORT: &str = "STRICTLY_SCORES_PORT";

/// Configuration for the leaderboard service.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct ServiceConfig {
    /// Path of the SQLite database file.
    database_url: String,

    /// Address to bind.
    host: String,

    /// Port to bind.
    port: u16,

    /// Header the authentication gateway puts the account id in.
    account_header: String,

    /// Origins allowed to submit. Empty allows any origin.
    allowed_origins: Vec<String>,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            database_url: "strictly_scores.db".to_string(),
            host: "127.0.0.1".to_string(),
            port: 3000,
            account_header: DEFAULT_ACCOUNT_HEADER.to_string(),
            allowed_origins: Vec::new(),
        }
    }
}

impl ServiceConfig {
    /// Loads configuration from a TOML file. Missing keys take defaults.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid configuration.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        info!(db = %config.database_url, port = config.port, "Config loaded");
        Ok(config)
    }

    /// Applies `STRICTLY_SCORES_*` overrides from the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the port override is not a port number.
    pub fn with_env(self) -> Result<Self, ConfigError> {
        self.with_overrides(|key| std::env::var(key).ok())
    }

    /// Applies overrides looked up through `lookup`.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the port override is not a port number.
    #[instrument(skip_all)]
    pub fn with_overrides(
        mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, ConfigError> {
        if let Some(db) = lookup(ENV_DATABASE) {
            debug!(db = %db, "Database overridden by environment");
            self.database_url = db;
        }
        if let Some(host) = lookup(ENV_HOST) {
            self.host = host;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.port = port
                .trim()
                .parse()
                .map_err(|_| ConfigError::new(format!("{} is not a valid port: {:?}", ENV_PORT, port)))?;
        }
        Ok(self)
    }

    /// Overrides the database path.
    pub fn set_database_url(&mut self, database_url: String) {
        self.database_url = database_url;
    }

    /// Overrides the bind address.
    pub fn set_host(&mut self, host: String) {
        self.host = host;
    }

    /// Overrides the bind port.
    pub fn set_port(&mut self, port: u16) {
        self.port = port;
    }

    /// Address to bind, as `host:port`.
    pub fn bind_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
