//! Oracle price normalization.
//!
//! The oracle quotes every underlying price as if the underlying had 18
//! decimals, on top of the usual 18-decimal mantissa. Scaling a quote back
//! therefore depends on the decimals of the specific underlying token.

use crate::{chain::PriceOracle, constant, utils};

use alloy::primitives::{Address, U256};
use anyhow::Result;
use bigdecimal::BigDecimal;

/// Power of ten a raw oracle quote is divided by: `18 - decimals + 18`.
pub fn oracle_price_exponent(underlying_decimals: u8) -> i64 {
    constant::MANTISSA_DECIMALS as i64 - underlying_decimals as i64
        + constant::MANTISSA_DECIMALS as i64
}

pub fn scale_oracle_price(raw_price: U256, underlying_decimals: u8) -> BigDecimal {
    utils::mantissa_to_decimal(raw_price, oracle_price_exponent(underlying_decimals))
}

/// USD price of one unit of the native token.
pub async fn native_price_in_usd(
    oracle: &(dyn PriceOracle + Send + Sync),
    native_market: Address,
    block_number: u64,
) -> Result<BigDecimal> {
    let raw_price = oracle
        .get_underlying_price(native_market, block_number)
        .await?;

    Ok(utils::mantissa_to_decimal(
        raw_price,
        constant::MANTISSA_DECIMALS as i64,
    ))
}

/// Underlying price of `market` with the decimal mismatch corrected.
pub async fn token_price_in_native(
    oracle: &(dyn PriceOracle + Send + Sync),
    market: Address,
    underlying_decimals: u8,
    block_number: u64,
) -> Result<BigDecimal> {
    let raw_price = oracle.get_underlying_price(market, block_number).await?;

    Ok(scale_oracle_price(raw_price, underlying_decimals))
}
