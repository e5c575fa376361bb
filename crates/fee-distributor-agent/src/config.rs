use fee_distributor::DistributorConfig;
use serde::{Deserialize, Serialize};
use solana_sdk::signer::keypair::Keypair;
use thiserror::Error as ThisError;

pub const WALLET_PRIVATE_KEY: &str = "WALLET_PRIVATE_KEY";
pub const SOLANA_RPC_URL: &str = "SOLANA_RPC_URL";

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("error reading config {path}: {error}")]
    Read {
        path: String,
        error: std::io::Error,
    },
    #[error("error parsing config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(anyhow::Error),
    #[error("{0} is not set")]
    MissingEnv(&'static str),
    #[error("WALLET_PRIVATE_KEY is not valid base58: {0}")]
    KeypairEncoding(#[from] bs58::decode::Error),
    #[error("WALLET_PRIVATE_KEY is not a valid keypair: {0}")]
    Keypair(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "Config::default_rpc_url")]
    pub rpc_url: String,
    /// Used when `RUST_LOG` is not set.
    #[serde(default = "Config::default_log_filter")]
    pub log_filter: String,
    #[serde(default)]
    pub distributor: DistributorConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            rpc_url: Self::default_rpc_url(),
            log_filter: Self::default_log_filter(),
            distributor: DistributorConfig::default(),
        }
    }
}

impl Config {
    pub fn default_rpc_url() -> String {
        "https://api.mainnet-beta.solana.com".to_owned()
    }

    pub fn default_log_filter() -> String {
        "info".to_owned()
    }

    /// Read the config from `path`, `-` for stdin, or use the defaults.
    /// Environment overrides are applied on top.
    pub fn load(path: Option<&str>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => {
                let text = if path == "-" {
                    use std::io::Read;
                    let mut buf = String::new();
                    std::io::stdin()
                        .read_to_string(&mut buf)
                        .map(|_| buf)
                } else {
                    std::fs::read_to_string(path)
                }
                .map_err(|error| ConfigError::Read {
                    path: path.to_owned(),
                    error,
                })?;
                Self::from_toml(&text)?
            }
            None => Self::default(),
        };
        if let Ok(url) = std::env::var(SOLANA_RPC_URL) {
            config.rpc_url = url;
        }
        Ok(config)
    }

    pub fn from_toml(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config
            .distributor
            .validate()
            .map_err(ConfigError::Invalid)?;
        Ok(config)
    }
}

/// Signing wallet from [`WALLET_PRIVATE_KEY`].
pub fn keypair_from_env() -> Result<Keypair, ConfigError> {
    let key = std::env::var(WALLET_PRIVATE_KEY)
        .map_err(|_| ConfigError::MissingEnv(WALLET_PRIVATE_KEY))?;
    keypair_from_base58(key.trim())
}

pub fn keypair_from_base58(key: &str) -> Result<Keypair, ConfigError> {
    let bytes = bs58::decode(key).into_vec()?;
    Keypair::from_bytes(&bytes).map_err(|error| ConfigError::Keypair(error.to_string()))
}
