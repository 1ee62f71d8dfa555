//! Unit tests for configuration resolution
//!
//! Priority order: command line > environment > TOML file > compiled default.
//!
//! Note: Uses serial_test to prevent environment variable races. Every test
//! that touches RATES_* variables is marked #[serial].

use rates_common::config::{
    default_database_path, ConfigOverrides, ServiceConfig, DEFAULT_HOST, DEFAULT_PORT,
    ENV_CONFIG_FILE, ENV_DATABASE, ENV_HOST, ENV_PORT, ENV_QUERY_TIMEOUT_MS,
};
use rates_common::Error;
use serial_test::serial;
use std::env;
use std::path::PathBuf;
use tempfile::TempDir;

fn clear_env() {
    for name in [
        ENV_CONFIG_FILE,
        ENV_DATABASE,
        ENV_HOST,
        ENV_PORT,
        ENV_QUERY_TIMEOUT_MS,
    ] {
        env::remove_var(name);
    }
}

fn write_config(dir: &TempDir, content: &str) -> PathBuf {
    let path = dir.path().join("config.toml");
    std::fs::write(&path, content).unwrap();
    path
}

#[test]
#[serial]
fn test_defaults_when_nothing_is_set() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let empty = write_config(&dir, "");

    let config = ServiceConfig::resolve(ConfigOverrides {
        config_file: Some(empty),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(config.database_path, default_database_path());
    assert_eq!(config.host, DEFAULT_HOST);
    assert_eq!(config.port, DEFAULT_PORT);
    assert_eq!(config.query_timeout_ms, None);
}

#[test]
#[serial]
fn test_toml_values_are_used() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(
        &dir,
        r#"
        database_path = "/srv/rates/prices.db"
        host = "0.0.0.0"
        port = 8080
        query_timeout_ms = 2500
        "#,
    );

    let config = ServiceConfig::resolve(ConfigOverrides {
        config_file: Some(path),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(config.database_path, PathBuf::from("/srv/rates/prices.db"));
    assert_eq!(config.bind_address(), "0.0.0.0:8080");
    assert_eq!(config.query_timeout_ms, Some(2500));
}

#[test]
#[serial]
fn test_env_overrides_toml() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "port = 8080\nhost = \"0.0.0.0\"\n");
    env::set_var(ENV_CONFIG_FILE, &path);
    env::set_var(ENV_PORT, "9090");
    env::set_var(ENV_DATABASE, "/tmp/env-rates.db");

    let config = ServiceConfig::resolve(ConfigOverrides::default()).unwrap();

    assert_eq!(config.port, 9090);
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.database_path, PathBuf::from("/tmp/env-rates.db"));

    clear_env();
}

#[test]
#[serial]
fn test_cli_overrides_env() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");
    env::set_var(ENV_PORT, "9090");
    env::set_var(ENV_HOST, "10.0.0.1");
    env::set_var(ENV_QUERY_TIMEOUT_MS, "100");

    let config = ServiceConfig::resolve(ConfigOverrides {
        config_file: Some(path),
        port: Some(7000),
        query_timeout_ms: Some(50),
        ..Default::default()
    })
    .unwrap();

    assert_eq!(config.port, 7000);
    assert_eq!(config.host, "10.0.0.1");
    assert_eq!(config.query_timeout_ms, Some(50));

    clear_env();
}

#[test]
#[serial]
fn test_invalid_port_env_is_config_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "");
    env::set_var(ENV_PORT, "not-a-port");

    let result = ServiceConfig::resolve(ConfigOverrides {
        config_file: Some(path),
        ..Default::default()
    });

    assert!(matches!(result, Err(Error::Config(_))));
    clear_env();
}

#[test]
#[serial]
fn test_missing_explicit_config_file_is_error() {
    clear_env();

    let result = ServiceConfig::resolve(ConfigOverrides {
        config_file: Some(PathBuf::from("/nonexistent/rates/config.toml")),
        ..Default::default()
    });

    assert!(matches!(result, Err(Error::Config(_))));
}

#[test]
#[serial]
fn test_malformed_toml_is_error() {
    clear_env();
    let dir = TempDir::new().unwrap();
    let path = write_config(&dir, "port = \"eighty\"\n");

    let result = ServiceConfig::resolve(ConfigOverrides {
        config_file: Some(path),
        ..Default::default()
    });

    assert!(matches!(result, Err(Error::Config(_))));
}
