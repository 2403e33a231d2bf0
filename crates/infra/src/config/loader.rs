//! Configuration loader
//!
//! Loads application configuration from environment variables or files.
//!
//! ## Loading Strategy
//! 1. First, attempts to load from environment variables
//! 2. If incomplete, falls back to loading from file
//! 3. If no file is found either, falls back to built-in defaults
//!
//! ## Environment Variables
//! - `MAWID_DB_PATH`: Database file path
//! - `MAWID_DB_POOL_SIZE`: Connection pool size
//! - `MAWID_SERVER_HOST`: Bind host
//! - `MAWID_SERVER_PORT`: Bind port
//! - `MAWID_SWEEP_CRON`: Cron expression for the status sweep
//! - `MAWID_SWEEP_ENABLED`: Whether the sweep runs (true/false)
//!
//! ## File Locations
//! The loader probes `config.{toml,json}` and `mawid.{toml,json}` in the
//! working directory and up to two parent directories.

use std::path::{Path, PathBuf};

use mawid_domain::{
    Config, DatabaseConfig, MawidError, Result, ServerConfig, SweepConfig,
};

/// Load configuration with automatic fallback strategy
///
/// # Errors
/// Returns `MawidError::Config` when a source is present but malformed
/// (invalid file format, unparseable numeric variable).
pub fn load() -> Result<Config> {
    match load_from_env() {
        Ok(config) => {
            tracing::info!("Configuration loaded from environment variables");
            Ok(config)
        }
        Err(env_err) => {
            tracing::debug!(error = ?env_err, "Failed to load from environment, trying file");
            match probe_config_paths() {
                Some(path) => load_from_file(Some(path)),
                None => {
                    tracing::info!("No configuration source found, using defaults");
                    Ok(Config::default())
                }
            }
        }
    }
}

/// Load configuration from environment variables
///
/// `MAWID_DB_PATH` is required; the remaining variables fall back to the
/// defaults in [`Config`].
///
/// # Errors
/// Returns `MawidError::Config` if the required variable is missing or a
/// numeric variable has an invalid value.
pub fn load_from_env() -> Result<Config> {
    let defaults = Config::default();

    let db_path = env_var("MAWID_DB_PATH")?;
    let db_pool_size = env_parse("MAWID_DB_POOL_SIZE", defaults.database.pool_size)?;
    let server_host =
        std::env::var("MAWID_SERVER_HOST").unwrap_or(defaults.server.host);
    let server_port = env_parse("MAWID_SERVER_PORT", defaults.server.port)?;
    let sweep_cron =
        std::env::var("MAWID_SWEEP_CRON").unwrap_or(defaults.sweep.cron_expression);
    let sweep_enabled = env_bool("MAWID_SWEEP_ENABLED", defaults.sweep.enabled);

    Ok(Config {
        database: DatabaseConfig { path: db_path, pool_size: db_pool_size },
        server: ServerConfig { host: server_host, port: server_port },
        sweep: SweepConfig { cron_expression: sweep_cron, enabled: sweep_enabled },
    })
}

/// Load configuration from a file
///
/// If `path` is `None`, probes the standard locations. Supports TOML and
/// JSON, detected by extension.
///
/// # Errors
/// Returns `MawidError::Config` if the file is missing, has an unknown
/// extension, or does not parse.
pub fn load_from_file(path: Option<PathBuf>) -> Result<Config> {
    let config_path = match path {
        Some(p) => {
            if !p.exists() {
                return Err(MawidError::Config(format!(
                    "Config file not found: {}",
                    p.display()
                )));
            }
            p
        }
        None => probe_config_paths().ok_or_else(|| {
            MawidError::Config("No config file found in any of the standard locations".into())
        })?,
    };

    tracing::info!(path = %config_path.display(), "Loading configuration from file");

    let contents = std::fs::read_to_string(&config_path)
        .map_err(|e| MawidError::Config(format!("Failed to read config file: {e}")))?;

    parse_config(&contents, &config_path)
}

fn parse_config(contents: &str, path: &Path) -> Result<Config> {
    let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("toml");

    match extension {
        "toml" => toml::from_str(contents)
            .map_err(|e| MawidError::Config(format!("Invalid TOML format: {e}"))),
        "json" => serde_json::from_str(contents)
            .map_err(|e| MawidError::Config(format!("Invalid JSON format: {e}"))),
        _ => Err(MawidError::Config(format!("Unsupported config format: {extension}"))),
    }
}

/// Probe the standard locations for a config file, returning the first
/// hit.
pub fn probe_config_paths() -> Option<PathBuf> {
    let mut candidates = Vec::new();

    if let Ok(cwd) = std::env::current_dir() {
        for base in ["config", "mawid"] {
            for ext in ["toml", "json"] {
                candidates.push(cwd.join(format!("{base}.{ext}")));
                candidates.push(cwd.join(format!("../{base}.{ext}")));
                candidates.push(cwd.join(format!("../../{base}.{ext}")));
            }
        }
    }

    candidates.into_iter().find(|path| path.exists())
}

fn env_var(key: &str) -> Result<String> {
    std::env::var(key)
        .map_err(|_| MawidError::Config(format!("Missing required environment variable: {key}")))
}

fn env_parse<T: std::str::FromStr>(key: &str, default: T) -> Result<T>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(key) {
        Ok(raw) => raw
            .parse()
            .map_err(|e| MawidError::Config(format!("Invalid value for {key}: {e}"))),
        Err(_) => Ok(default),
    }
}

/// Parse boolean from environment variable
///
/// Accepts: `1`/`0`, `true`/`false`, `yes`/`no`, `on`/`off`
/// (case-insensitive); `default` when not set.
fn env_bool(key: &str, default: bool) -> bool {
    std::env::var(key)
        .ok()
        .map(|s| matches!(s.to_ascii_lowercase().as_str(), "1" | "true" | "yes" | "on"))
        .unwrap_or(default)
}
