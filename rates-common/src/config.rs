//! Configuration loading for the rates service
//!
//! Settings are resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. Environment variable
//! 3. TOML config file
//! 4. OS-dependent compiled default (fallback)

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

pub const ENV_CONFIG_FILE: &str = "RATES_CONFIG";
pub const ENV_DATABASE: &str = "RATES_DATABASE";
pub const ENV_HOST: &str = "RATES_HOST";
pub const ENV_PORT: &str = "RATES_PORT";
pub const ENV_QUERY_TIMEOUT_MS: &str = "RATES_QUERY_TIMEOUT_MS";

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 5730;

/// Fully resolved service configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceConfig {
    /// SQLite database holding `prices`, `regions`, `ports` and `codes`
    pub database_path: PathBuf,
    pub host: String,
    pub port: u16,
    /// Upper bound on the aggregate query round trip; `None` means unbounded
    pub query_timeout_ms: Option<u64>,
}

/// Values supplied on the command line. Every field is optional.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub config_file: Option<PathBuf>,
    pub database_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub query_timeout_ms: Option<u64>,
}

/// On-disk TOML layout
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct TomlConfig {
    pub database_path: Option<PathBuf>,
    pub host: Option<String>,
    pub port: Option<u16>,
    pub query_timeout_ms: Option<u64>,
}

impl ServiceConfig {
    /// Resolve configuration from CLI overrides, environment, TOML and defaults
    pub fn resolve(overrides: ConfigOverrides) -> Result<Self> {
        let file = load_toml_config(overrides.config_file.as_deref())?;

        let database_path = overrides
            .database_path
            .or_else(|| std::env::var(ENV_DATABASE).ok().map(PathBuf::from))
            .or(file.database_path)
            .unwrap_or_else(default_database_path);

        let host = overrides
            .host
            .or_else(|| std::env::var(ENV_HOST).ok())
            .or(file.host)
            .unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match overrides.port {
            Some(port) => port,
            None => env_parsed::<u16>(ENV_PORT)?
                .or(file.port)
                .unwrap_or(DEFAULT_PORT),
        };

        let query_timeout_ms = match overrides.query_timeout_ms {
            Some(ms) => Some(ms),
            None => env_parsed::<u64>(ENV_QUERY_TIMEOUT_MS)?.or(file.query_timeout_ms),
        };

        Ok(Self {
            database_path,
            host,
            port,
            query_timeout_ms,
        })
    }

    /// `host:port` string suitable for `TcpListener::bind`
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// Parse an environment variable, treating absence as `None`
fn env_parsed<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| Error::Config(format!("{} has invalid value '{}'", name, raw))),
        Err(_) => Ok(None),
    }
}

/// Load the TOML config file.
///
/// An explicitly named file (argument or `RATES_CONFIG`) must exist. The
/// platform default location is optional and silently skipped when absent.
pub fn load_toml_config(explicit: Option<&Path>) -> Result<TomlConfig> {
    let explicit = explicit
        .map(Path::to_path_buf)
        .or_else(|| std::env::var(ENV_CONFIG_FILE).ok().map(PathBuf::from));

    let path = match explicit {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path
        }
        None => match default_config_file() {
            Some(path) if path.exists() => path,
            _ => {
                debug!("No config file found, using defaults");
                return Ok(TomlConfig::default());
            }
        },
    };

    let content = std::fs::read_to_string(&path)?;
    let config = toml::from_str::<TomlConfig>(&content)
        .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;

    info!("Loaded config file: {}", path.display());
    Ok(config)
}

/// Platform config file location, e.g. `~/.config/rates/config.toml` on Linux
fn default_config_file() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("rates").join("config.toml"))
}

/// OS-dependent default database location
pub fn default_database_path() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("rates").join("rates.db"))
        .unwrap_or_else(|| PathBuf::from("./rates.db"))
}
