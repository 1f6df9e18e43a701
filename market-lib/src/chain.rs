pub mod abi;
pub mod evm;

use crate::constant;

use alloy::primitives::{Address, U256};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::{self, Display, Formatter};

/// Result of a view call that is allowed to revert.
///
/// A revert is an expected outcome and is never surfaced as an error;
/// transport or decoding failures are, and travel in the outer `Result`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallOutcome<T> {
    Success(T),
    Reverted,
}

impl<T> CallOutcome<T> {
    pub fn ok(self) -> Option<T> {
        match self {
            CallOutcome::Success(value) => Some(value),
            CallOutcome::Reverted => None,
        }
    }

    pub fn unwrap_or(self, default: T) -> T {
        self.ok().unwrap_or(default)
    }
}

/// Revert-guarded `uint256` accessors of a market contract.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MarketCall {
    ReserveFactorMantissa,
    TotalSupply,
    ExchangeRateStored,
    BorrowIndex,
    TotalReserves,
    TotalBorrows,
    GetCash,
    BorrowRatePerBlock,
    SupplyRatePerBlock,
}

impl MarketCall {
    /// Name reported in revert diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            MarketCall::ReserveFactorMantissa => constant::TRY_RESERVE_FACTOR_MANTISSA,
            MarketCall::TotalSupply => constant::TRY_TOTAL_SUPPLY,
            MarketCall::ExchangeRateStored => constant::TRY_EXCHANGE_RATE_STORED,
            MarketCall::BorrowIndex => constant::TRY_BORROW_INDEX,
            MarketCall::TotalReserves => constant::TRY_TOTAL_RESERVES,
            MarketCall::TotalBorrows => constant::TRY_TOTAL_BORROWS,
            MarketCall::GetCash => constant::TRY_GET_CASH,
            MarketCall::BorrowRatePerBlock => constant::TRY_BORROW_RATE_PER_BLOCK,
            MarketCall::SupplyRatePerBlock => constant::TRY_SUPPLY_RATE_PER_BLOCK,
        }
    }
}

impl Display for MarketCall {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// Read-only view calls against market contracts, their underlying tokens
/// and the comptroller.
///
/// `block` pins the call to the state at that block height.
#[async_trait]
pub trait MarketReader {
    async fn underlying(&self, market: Address) -> Result<Address>;

    async fn market_name(&self, market: Address) -> Result<String>;

    async fn market_symbol(&self, market: Address) -> Result<String>;

    async fn token_decimals(&self, token: Address) -> Result<u8>;

    async fn token_name(&self, token: Address) -> Result<String>;

    async fn token_symbol(&self, token: Address) -> Result<String>;

    async fn interest_rate_model(&self, market: Address) -> Result<CallOutcome<Address>>;

    async fn accrual_block_number(&self, market: Address, block: u64) -> Result<u64>;

    async fn call_uint(
        &self,
        market: Address,
        call: MarketCall,
        block: Option<u64>,
    ) -> Result<CallOutcome<U256>>;

    /// Collateral-factor mantissa the comptroller holds for `market`.
    async fn collateral_factor_mantissa(
        &self,
        market: Address,
        block: u64,
    ) -> Result<CallOutcome<U256>>;
}

/// Price oracle quoting underlying prices as 18-decimal-implied mantissas.
#[async_trait]
pub trait PriceOracle {
    async fn get_underlying_price(&self, market: Address, block: u64) -> Result<U256>;
}

/// Block heads and the market listing the indexer follows.
#[async_trait]
pub trait BlockSource {
    async fn latest_block(&self) -> Result<u64>;

    /// Timestamp of `block`, in seconds.
    async fn block_timestamp(&self, block: u64) -> Result<u64>;

    /// Every market the comptroller lists.
    async fn listed_markets(&self) -> Result<Vec<Address>>;
}
