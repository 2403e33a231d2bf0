//! Application configuration structures
//!
//! Plain data; loading happens in the infra crate (environment first,
//! config file fallback).

use serde::{Deserialize, Serialize};

/// Top-level application configuration
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub sweep: SweepConfig,
}

/// Database settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    /// Path to the SQLite database file
    pub path: String,
    /// Connection pool size
    pub pool_size: u32,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self { path: "mawid.db".into(), pool_size: 5 }
    }
}

/// HTTP server settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { host: "0.0.0.0".into(), port: 8080 }
    }
}

/// Status sweep scheduler settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SweepConfig {
    /// Six-field cron expression driving the sweep
    pub cron_expression: String,
    pub enabled: bool,
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self { cron_expression: "0 */5 * * * *".into(), enabled: true }
    }
}
