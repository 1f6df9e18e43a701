use alloy::primitives::{Address, U256};
use anyhow::{anyhow, Result};
use bigdecimal::BigDecimal;
use chrono::{DateTime, NaiveDateTime};
use num_bigint::{BigInt, Sign};
use std::str::FromStr;
use tracing::Level;

pub fn convert_log_level_to_tracing_level(log_level: &str) -> Level {
    match log_level.to_lowercase().as_str() {
        "error" => Level::ERROR,
        "warn" => Level::WARN,
        "info" => Level::INFO,
        "debug" => Level::DEBUG,
        "trace" => Level::TRACE,
        _ => Level::INFO, // Default to INFO if the log level is not recognized
    }
}

pub fn parse_address(address: &str) -> Result<Address> {
    Address::from_str(address.trim()).map_err(|e| anyhow!("Invalid address {}: {}", address, e))
}

/// Lowercase `0x`-prefixed hex, the form used as entity id.
pub fn format_address(address: &Address) -> String {
    address.to_string().to_lowercase()
}

/// 10^exponent. Negative exponents are allowed.
pub fn exponent_to_bigdecimal(exponent: i64) -> BigDecimal {
    BigDecimal::new(BigInt::from(1), -exponent)
}

pub fn u256_to_bigint(value: U256) -> BigInt {
    BigInt::from_bytes_be(Sign::Plus, &value.to_be_bytes::<32>())
}

pub fn u256_to_bigdecimal(value: U256) -> BigDecimal {
    BigDecimal::new(u256_to_bigint(value), 0)
}

/// Divides a raw fixed-point integer by 10^decimals. The division is exact.
pub fn mantissa_to_decimal(value: U256, decimals: i64) -> BigDecimal {
    BigDecimal::new(u256_to_bigint(value), decimals)
}

/// Drops every digit past `decimals` places, rounding toward zero.
pub fn truncate(value: &BigDecimal, decimals: i64) -> BigDecimal {
    value.with_scale(decimals)
}

pub fn parse_bigdecimal(value: &str) -> Result<BigDecimal> {
    BigDecimal::from_str(value).map_err(|e| anyhow!("Invalid decimal {}: {}", value, e))
}

pub fn timestamp_to_naive_datetime(timestamp: u64) -> NaiveDateTime {
    // block timestamps are in seconds
    DateTime::from_timestamp(timestamp as i64, 0)
        .map(|datetime| datetime.naive_utc())
        .unwrap_or_default()
}
