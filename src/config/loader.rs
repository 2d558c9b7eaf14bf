//! Configuration loading from disk and the environment.

use std::fs;
use std::path::Path;

use zeroize::Zeroizing;

use crate::config::schema::UploaderConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Environment variable holding the signing key.
pub const PRIVATE_KEY_ENV_VAR: &str = "PRIVATE_KEY";
/// Environment variable overriding `network.evm_rpc_url`.
pub const RPC_URL_ENV_VAR: &str = "RPC_URL";
/// Environment variable overriding `network.indexer_url`.
pub const INDEXER_URL_ENV_VAR: &str = "INDEXER_URL";
/// Environment variable overriding `network.storage_nodes` (comma separated).
pub const STORAGE_NODE_URL_ENV_VAR: &str = "STORAGE_NODE_URL";
/// Environment variable naming a config file when `--config` is absent.
pub const CONFIG_PATH_ENV_VAR: &str = "BASEURI_CONFIG";

/// Error type for configuration loading.
#[derive(Debug)]
pub enum ConfigError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Validation(Vec<ValidationError>),
    MissingPrivateKey,
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::Io(e) => write!(f, "IO error: {}", e),
            ConfigError::Parse(e) => write!(f, "Parse error: {}", e),
            ConfigError::Validation(errors) => {
                write!(f, "Validation failed: ")?;
                for (i, err) in errors.iter().enumerate() {
                    if i > 0 { write!(f, ", ")?; }
                    write!(f, "{}", err)?;
                }
                Ok(())
            }
            ConfigError::MissingPrivateKey => {
                write!(f, "{} environment variable not set", PRIVATE_KEY_ENV_VAR)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Parse a TOML configuration file. Validation happens after overrides are applied.
pub fn load_config(path: &Path) -> Result<UploaderConfig, ConfigError> {
    let content = fs::read_to_string(path).map_err(ConfigError::Io)?;
    toml::from_str(&content).map_err(ConfigError::Parse)
}

/// Layer defaults, the file (if any), environment overrides and finally
/// `overrides` (CLI flags), then validate the result.
pub fn load_layered<F, O>(
    path: Option<&Path>,
    lookup: F,
    overrides: O,
) -> Result<UploaderConfig, ConfigError>
where
    F: Fn(&str) -> Option<String>,
    O: FnOnce(&mut UploaderConfig),
{
    let mut config = match path {
        Some(p) => load_config(p)?,
        None => UploaderConfig::default(),
    };
    apply_env_overrides(&mut config, &lookup);
    overrides(&mut config);
    validate_config(&config).map_err(ConfigError::Validation)?;
    Ok(config)
}

/// Override endpoints from `RPC_URL`, `INDEXER_URL` and `STORAGE_NODE_URL`.
pub fn apply_env_overrides<F>(config: &mut UploaderConfig, lookup: &F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

    if let Some(url) = non_empty(RPC_URL_ENV_VAR) {
        config.network.evm_rpc_url = url;
    }
    if let Some(url) = non_empty(INDEXER_URL_ENV_VAR) {
        config.network.indexer_url = url;
    }
    if let Some(urls) = non_empty(STORAGE_NODE_URL_ENV_VAR) {
        config.network.storage_nodes = urls
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(String::from)
            .collect();
    }
}

/// Read the private key. Missing or blank values are a configuration error;
/// format problems surface later when the wallet parses it.
pub fn read_private_key<F>(lookup: F) -> Result<Zeroizing<String>, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    let raw = Zeroizing::new(lookup(PRIVATE_KEY_ENV_VAR).ok_or(ConfigError::MissingPrivateKey)?);
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::MissingPrivateKey);
    }
    Ok(Zeroizing::new(trimmed.to_string()))
}

/// Lookup backed by the process environment.
pub fn process_env(name: &str) -> Option<String> {
    std::env::var(name).ok()
}
