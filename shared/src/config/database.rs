//! Database configuration module

use serde::{Deserialize, Serialize};

use super::env_parse;

/// Database configuration for MySQL connections
///
/// An empty `url` selects the in-memory verification repository, which is
/// only suitable for development and tests.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    /// Database connection URL
    pub url: String,

    /// Maximum number of connections in the pool
    pub max_connections: u32,

    /// Connection timeout in seconds
    pub connect_timeout: u64,

    /// Idle connection timeout in seconds
    pub idle_timeout: u64,

    /// Maximum lifetime of a connection in seconds
    pub max_lifetime: u64,

    /// Slow query threshold in milliseconds
    #[serde(default = "default_slow_query_threshold")]
    pub slow_query_threshold: u64,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: String::from("mysql://localhost:3306/verifly"),
            max_connections: 10,
            connect_timeout: 30,
            idle_timeout: 600,
            max_lifetime: 1800,
            slow_query_threshold: default_slow_query_threshold(),
        }
    }
}

impl DatabaseConfig {
    /// Create from environment variables
    pub fn from_env() -> Self {
        Self::default().merge_env()
    }

    /// Apply environment overrides on top of this configuration
    pub fn merge_env(mut self) -> Self {
        if let Ok(url) = std::env::var("DATABASE_URL") {
            self.url = url;
        }
        if let Some(max_connections) = env_parse("DATABASE_MAX_CONNECTIONS") {
            self.max_connections = max_connections;
        }
        if let Some(connect_timeout) = env_parse("DATABASE_CONNECT_TIMEOUT") {
            self.connect_timeout = connect_timeout;
        }
        self
    }

    /// Create a new database configuration with URL
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Configuration selecting the in-memory repository
    pub fn in_memory() -> Self {
        Self::new("")
    }

    /// Set the maximum number of connections
    pub fn with_max_connections(mut self, max: u32) -> Self {
        self.max_connections = max;
        self
    }

    /// Whether no external database is configured
    pub fn is_in_memory(&self) -> bool {
        self.url.trim().is_empty()
    }
}

fn default_slow_query_threshold() -> u64 {
    1000 // 1 second
}
