use crate::{constant, utils};

use alloy::primitives::Address;
use anyhow::{anyhow, Result};
use bigdecimal::BigDecimal;
use serde::{Deserialize, Serialize};
use serde_with::{serde_as, DisplayFromStr};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// How a market is priced. Resolved once when the market is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarketKind {
    /// The wrapped gas-token market. It is the pricing reference unit.
    Native,
    /// The USD-pegged market whose USD price stays pinned at 1.
    #[serde(rename = "stablecoin")]
    StablecoinAnchor,
    Standard,
}

impl MarketKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            MarketKind::Native => constant::NATIVE_MARKET_KIND,
            MarketKind::StablecoinAnchor => constant::STABLECOIN_MARKET_KIND,
            MarketKind::Standard => constant::STANDARD_MARKET_KIND,
        }
    }
}

impl Display for MarketKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for MarketKind {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            constant::NATIVE_MARKET_KIND => Ok(MarketKind::Native),
            constant::STABLECOIN_MARKET_KIND => Ok(MarketKind::StablecoinAnchor),
            constant::STANDARD_MARKET_KIND => Ok(MarketKind::Standard),
            _ => Err(anyhow!("Unknown market kind: {}", s)),
        }
    }
}

#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Market {
    pub id: String,
    pub kind: MarketKind,
    pub name: String,
    pub symbol: String,

    #[serde_as(as = "DisplayFromStr")]
    pub underlying_address: Address,
    pub underlying_name: String,
    pub underlying_symbol: String,
    pub underlying_decimals: u8,

    pub underlying_price: BigDecimal,
    pub underlying_price_usd: BigDecimal,
    pub exchange_rate: BigDecimal,
    pub borrow_index: BigDecimal,
    pub total_borrows: BigDecimal,
    pub total_supply: BigDecimal,
    pub cash: BigDecimal,
    pub reserves: BigDecimal,
    pub borrow_rate: BigDecimal,
    pub supply_rate: BigDecimal,
    pub collateral_factor: BigDecimal,
    /// Raw reserve-factor mantissa, not rescaled.
    pub reserve_factor: BigDecimal,

    #[serde_as(as = "DisplayFromStr")]
    pub interest_rate_model_address: Address,

    pub accrual_block_number: u64,
    pub block_timestamp: u64,
}

impl From<&Market> for db::models::market::NewMarket {
    fn from(market: &Market) -> Self {
        db::models::market::NewMarket {
            id: market.id.to_lowercase(),
            kind: market.kind.as_str().to_string(),
            name: market.name.clone(),
            symbol: market.symbol.clone(),
            underlying_address: utils::format_address(&market.underlying_address),
            underlying_name: market.underlying_name.clone(),
            underlying_symbol: market.underlying_symbol.clone(),
            underlying_decimals: market.underlying_decimals as i32,
            underlying_price: market.underlying_price.to_string(),
            underlying_price_usd: market.underlying_price_usd.to_string(),
            exchange_rate: market.exchange_rate.to_string(),
            borrow_index: market.borrow_index.to_string(),
            total_borrows: market.total_borrows.to_string(),
            total_supply: market.total_supply.to_string(),
            cash: market.cash.to_string(),
            reserves: market.reserves.to_string(),
            borrow_rate: market.borrow_rate.to_string(),
            supply_rate: market.supply_rate.to_string(),
            collateral_factor: market.collateral_factor.to_string(),
            reserve_factor: market.reserve_factor.to_string(),
            interest_rate_model_address: utils::format_address(
                &market.interest_rate_model_address,
            ),
            accrual_block_number: market.accrual_block_number as i64,
            block_timestamp: market.block_timestamp as i64,
        }
    }
}

impl TryFrom<db::models::market::Market> for Market {
    type Error = anyhow::Error;

    fn try_from(row: db::models::market::Market) -> Result<Self> {
        let underlying_decimals = u8::try_from(row.underlying_decimals).map_err(|_| {
            anyhow!(
                "Market {} has invalid underlying decimals {}",
                row.id,
                row.underlying_decimals
            )
        })?;

        Ok(Market {
            kind: MarketKind::from_str(&row.kind)?,
            name: row.name,
            symbol: row.symbol,
            underlying_address: utils::parse_address(&row.underlying_address)?,
            underlying_name: row.underlying_name,
            underlying_symbol: row.underlying_symbol,
            underlying_decimals,
            underlying_price: utils::parse_bigdecimal(&row.underlying_price)?,
            underlying_price_usd: utils::parse_bigdecimal(&row.underlying_price_usd)?,
            exchange_rate: utils::parse_bigdecimal(&row.exchange_rate)?,
            borrow_index: utils::parse_bigdecimal(&row.borrow_index)?,
            total_borrows: utils::parse_bigdecimal(&row.total_borrows)?,
            total_supply: utils::parse_bigdecimal(&row.total_supply)?,
            cash: utils::parse_bigdecimal(&row.cash)?,
            reserves: utils::parse_bigdecimal(&row.reserves)?,
            borrow_rate: utils::parse_bigdecimal(&row.borrow_rate)?,
            supply_rate: utils::parse_bigdecimal(&row.supply_rate)?,
            collateral_factor: utils::parse_bigdecimal(&row.collateral_factor)?,
            reserve_factor: utils::parse_bigdecimal(&row.reserve_factor)?,
            interest_rate_model_address: utils::parse_address(&row.interest_rate_model_address)?,
            accrual_block_number: row.accrual_block_number as u64,
            block_timestamp: row.block_timestamp as u64,
            id: row.id,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Metric {
    pub latest_block_number: u64,
    pub total_blocks: u64,
    pub total_refreshed_markets: u64,
    pub max_processing_time: f32,
    pub min_processing_time: f32,
    pub avg_processing_time: f32,
}

impl From<Metric> for db::models::metric::NewMetric {
    fn from(metric: Metric) -> Self {
        db::models::metric::NewMetric {
            latest_block_number: metric.latest_block_number as i64,
            total_blocks: metric.total_blocks as i64,
            total_refreshed_markets: metric.total_refreshed_markets as i64,
            max_processing_time: metric.max_processing_time,
            min_processing_time: metric.min_processing_time,
            avg_processing_time: metric.avg_processing_time,
        }
    }
}
