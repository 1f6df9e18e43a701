use crate::{constant, utils};

use alloy::primitives::Address;
use anyhow::{anyhow, Result};
use dotenv::dotenv;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::env;
use std::fs;

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct NetworkConfig {
    pub rpc_url: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DatabaseConfig {
    pub database_url: String,
    pub db_connection_pool_max_size: usize,
    pub db_connection_pool_idle_size: usize,
}

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct ComptrollerConfig {
    pub address: Option<String>,
    /// When unset the oracle is resolved through the comptroller's `oracle()`.
    pub price_oracle: Option<String>,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct MarketsConfig {
    #[serde(default = "default_native_market")]
    pub native_market: String,
    #[serde(default = "default_stablecoin_market")]
    pub stablecoin_market: String,
    #[serde(default = "default_native_name")]
    pub native_name: String,
    #[serde(default = "default_native_symbol")]
    pub native_symbol: String,
    /// Markets to track. Empty means every market listed in the comptroller.
    #[serde(default)]
    pub addresses: Vec<String>,
}

impl Default for MarketsConfig {
    fn default() -> Self {
        MarketsConfig {
            native_market: default_native_market(),
            stablecoin_market: default_stablecoin_market(),
            native_name: default_native_name(),
            native_symbol: default_native_symbol(),
            addresses: vec![],
        }
    }
}

fn default_native_market() -> String {
    constant::VBNB_MARKET.to_string()
}

fn default_stablecoin_market() -> String {
    constant::VUSDC_MARKET.to_string()
}

fn default_native_name() -> String {
    constant::NATIVE_NAME.to_string()
}

fn default_native_symbol() -> String {
    constant::NATIVE_SYMBOL.to_string()
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct IndexerConfig {
    pub dev_mode: bool,
    pub start_block: u64,
    pub poll_interval_ms: u64,
    pub metric_flush_interval: u64,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    // global
    pub log_level: String,
    pub run_mode: String,

    pub onchain_indexer_enabled: bool,

    pub database: DatabaseConfig,
    pub networks: HashMap<String, NetworkConfig>,

    pub indexer: IndexerConfig,

    #[serde(default)]
    pub comptroller: ComptrollerConfig,
    #[serde(default)]
    pub markets: MarketsConfig,
}

/// Everything the market normalizer needs to know about the deployment.
#[derive(Debug, Clone)]
pub struct NormalizerConfig {
    pub native_market: Address,
    pub stablecoin_market: Address,
    pub native_name: String,
    pub native_symbol: String,
    /// Collateral factors live on the comptroller, so they can only be
    /// refreshed when one is configured.
    pub collateral_factor_enabled: bool,
}

impl Config {
    pub fn load_toml() -> Result<Self> {
        dotenv().ok();

        let path = env::var("CONFIG_PATH").unwrap_or_else(|_| "config.toml".to_string());
        let config_str = fs::read_to_string(&path)
            .map_err(|e| anyhow!("Failed to read config file {}: {}", path, e))?;

        let mut config = Self::from_toml_str(&config_str)?;
        config.apply_env_overrides();
        Ok(config)
    }

    pub fn from_toml_str(config_str: &str) -> Result<Self> {
        let config: Config = toml::from_str(config_str)?;
        Ok(config)
    }

    /// `DATABASE_URL` and `RPC_URL` take precedence over the file so that
    /// credentials can stay out of it.
    fn apply_env_overrides(&mut self) {
        if let Ok(database_url) = env::var("DATABASE_URL") {
            self.database.database_url = database_url;
        }

        if let Ok(rpc_url) = env::var("RPC_URL") {
            self.networks
                .entry(self.run_mode.clone())
                .or_insert(NetworkConfig { rpc_url: None })
                .rpc_url = Some(rpc_url);
        }
    }

    pub fn rpc_url(&self) -> Result<&str> {
        self.networks
            .get(&self.run_mode)
            .and_then(|network| network.rpc_url.as_deref())
            .ok_or_else(|| anyhow!("No rpc_url configured for run mode {}", self.run_mode))
    }

    pub fn comptroller_address(&self) -> Result<Option<Address>> {
        self.comptroller
            .address
            .as_deref()
            .map(utils::parse_address)
            .transpose()
    }

    pub fn price_oracle_address(&self) -> Result<Option<Address>> {
        self.comptroller
            .price_oracle
            .as_deref()
            .map(utils::parse_address)
            .transpose()
    }

    pub fn market_addresses(&self) -> Result<Vec<Address>> {
        self.markets
            .addresses
            .iter()
            .map(|address| utils::parse_address(address))
            .collect()
    }

    pub fn normalizer_config(&self) -> Result<NormalizerConfig> {
        Ok(NormalizerConfig {
            native_market: utils::parse_address(&self.markets.native_market)?,
            stablecoin_market: utils::parse_address(&self.markets.stablecoin_market)?,
            native_name: self.markets.native_name.clone(),
            native_symbol: self.markets.native_symbol.clone(),
            collateral_factor_enabled: self.comptroller.address.is_some(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
log_level = "debug"
run_mode = "mainnet"
onchain_indexer_enabled = true

[database]
database_url = "postgres://localhost/markets"
db_connection_pool_max_size = 8
db_connection_pool_idle_size = 2

[networks.mainnet]
rpc_url = "https://bsc-dataseed.binance.org"

[indexer]
dev_mode = false
start_block = 2471512
poll_interval_ms = 3000
metric_flush_interval = 100

[comptroller]
address = "0xfD36E2c2a6789Db23113685031d7F16329158384"

[markets]
addresses = ["0xA07c5b74C9B40447a954e1466938b865b6BBea36"]
"#;

    #[test]
    fn parses_sample_config_with_market_defaults() {
        let config = Config::from_toml_str(SAMPLE).unwrap();

        assert_eq!(config.rpc_url().unwrap(), "https://bsc-dataseed.binance.org");
        assert_eq!(config.indexer.start_block, 2471512);
        assert_eq!(config.markets.native_symbol, "BNB");
        assert!(config.price_oracle_address().unwrap().is_none());

        let normalizer = config.normalizer_config().unwrap();
        assert_eq!(
            utils::format_address(&normalizer.native_market),
            constant::VBNB_MARKET
        );
        assert_eq!(
            utils::format_address(&normalizer.stablecoin_market),
            constant::VUSDC_MARKET
        );
        assert!(normalizer.collateral_factor_enabled);

        let markets = config.market_addresses().unwrap();
        assert_eq!(markets, vec![normalizer.native_market]);
    }

    #[test]
    fn missing_network_is_an_error() {
        let mut config = Config::from_toml_str(SAMPLE).unwrap();
        config.run_mode = "testnet".to_string();

        assert!(config.rpc_url().is_err());
    }

    #[test]
    fn rejects_malformed_market_address() {
        let mut config = Config::from_toml_str(SAMPLE).unwrap();
        config.markets.native_market = "0x1234".to_string();

        assert!(config.normalizer_config().is_err());
    }
}
