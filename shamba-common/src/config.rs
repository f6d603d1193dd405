//! Configuration loading and resolution
//!
//! The config file location is resolved in priority order:
//! 1. Command-line argument (highest priority)
//! 2. `SHAMBA_CONFIG` environment variable
//! 3. Platform config directory (`<config dir>/shamba/shamba.toml`)
//!
//! Every field carries a default, so a missing config file still boots a
//! local development setup.

use crate::{Error, Result};
use serde::Deserialize;
use std::path::PathBuf;

/// Top-level service configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub server: ServerConfig,

    /// Sqlite database file. Defaults to `<data dir>/shamba/shamba.db`.
    pub database_path: Option<PathBuf>,

    /// Directory holding proof-of-payment images. Defaults to
    /// `<data dir>/shamba/proofs`.
    pub media_root: Option<PathBuf>,

    pub vision: VisionConfig,
    pub chain: ChainConfig,
}

/// HTTP listener configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 5840,
        }
    }
}

/// Text-detection (Google Vision) client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct VisionConfig {
    pub endpoint: String,
    pub api_key: String,
    pub timeout_secs: u64,
}

impl Default for VisionConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://vision.googleapis.com".to_string(),
            api_key: String::new(),
            timeout_secs: 30,
        }
    }
}

/// Escrow-chain JSON-RPC client configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ChainConfig {
    pub rpc_url: String,

    /// Account the verification transactions are sent from.
    pub from_account: String,

    /// Deployment address used when a transaction record carries none.
    pub contract_address: Option<String>,

    pub request_timeout_secs: u64,

    /// Upper bound on waiting for a submitted transaction to be included.
    pub confirm_timeout_secs: u64,

    /// Receipt polling interval while waiting for inclusion.
    pub receipt_poll_ms: u64,
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: "http://localhost:8545".to_string(),
            from_account: String::new(),
            contract_address: None,
            request_timeout_secs: 30,
            confirm_timeout_secs: 120,
            receipt_poll_ms: 1000,
        }
    }
}

impl Config {
    pub fn database_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| default_data_dir().join("shamba.db"))
    }

    pub fn media_root(&self) -> PathBuf {
        self.media_root
            .clone()
            .unwrap_or_else(|| default_data_dir().join("proofs"))
    }
}

/// Load configuration, resolving the file location in priority order.
///
/// A config path named explicitly (CLI or environment) must exist and parse;
/// with neither given, a missing platform config file falls back to defaults.
pub fn load_config(cli_arg: Option<&str>) -> Result<Config> {
    // Priority 1: Command-line argument
    // Priority 2: Environment variable
    let explicit = cli_arg
        .map(PathBuf::from)
        .or_else(|| std::env::var("SHAMBA_CONFIG").ok().map(PathBuf::from));

    if let Some(path) = explicit {
        let contents = std::fs::read_to_string(&path)
            .map_err(|e| Error::Config(format!("cannot read {}: {}", path.display(), e)))?;
        return parse_config(&contents, &path);
    }

    // Priority 3: Platform config directory
    if let Some(path) = platform_config_path() {
        if path.exists() {
            let contents = std::fs::read_to_string(&path)?;
            return parse_config(&contents, &path);
        }
    }

    // Priority 4: Compiled defaults
    Ok(Config::default())
}

fn parse_config(contents: &str, path: &std::path::Path) -> Result<Config> {
    toml::from_str(contents)
        .map_err(|e| Error::Config(format!("invalid config {}: {}", path.display(), e)))
}

fn platform_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("shamba").join("shamba.toml"))
}

fn default_data_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|d| d.join("shamba"))
        .unwrap_or_else(|| PathBuf::from("./shamba_data"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_boot_without_a_file() {
        let config = Config::default();
        assert_eq!(config.server.port, 5840);
        assert_eq!(config.chain.rpc_url, "http://localhost:8545");
        assert_eq!(config.vision.timeout_secs, 30);
        assert!(config.chain.contract_address.is_none());
    }

    #[test]
    fn parses_partial_toml() {
        let config: Config = toml::from_str(
            r#"
            database_path = "/tmp/shamba-test.db"

            [server]
            port = 6000

            [chain]
            rpc_url = "http://localhost:7545"
            contract_address = "0xC11D335a2C3977909eC2E8aBDfADE4AC84e4370C"
            "#,
        )
        .unwrap();

        assert_eq!(config.server.port, 6000);
        assert_eq!(config.server.host, "127.0.0.1");
        assert_eq!(config.chain.rpc_url, "http://localhost:7545");
        assert_eq!(
            config.chain.contract_address.as_deref(),
            Some("0xC11D335a2C3977909eC2E8aBDfADE4AC84e4370C")
        );
        assert_eq!(
            config.database_path(),
            PathBuf::from("/tmp/shamba-test.db")
        );
        // Unset sections keep their defaults
        assert_eq!(config.chain.confirm_timeout_secs, 120);
    }

    #[test]
    fn explicit_missing_path_is_an_error() {
        let result = load_config(Some("/nonexistent/shamba.toml"));
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[test]
    fn loads_from_an_explicit_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shamba.toml");
        std::fs::write(
            &path,
            r#"
            [vision]
            api_key = "test-key"

            [chain]
            from_account = "0x6Fb0D27e38fA6437a3BC2Bd10328310c8bC7F994"
            "#,
        )
        .unwrap();

        let config = load_config(path.to_str()).unwrap();
        assert_eq!(config.vision.api_key, "test-key");
        assert_eq!(
            config.chain.from_account,
            "0x6Fb0D27e38fA6437a3BC2Bd10328310c8bC7F994"
        );
    }

    #[test]
    fn invalid_toml_is_a_config_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("shamba.toml");
        std::fs::write(&path, "server = \"not a table\"").unwrap();

        let result = load_config(path.to_str());
        assert!(matches!(result, Err(Error::Config(_))));
    }
}
