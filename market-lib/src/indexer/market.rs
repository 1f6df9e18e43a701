use crate::{
    chain::{CallOutcome, MarketCall, MarketReader, PriceOracle},
    config::NormalizerConfig,
    constant,
    indexer::pricing,
    service::db_service::market::MarketService,
    types::{Market, MarketKind},
    utils,
};

use alloy::primitives::{Address, U256};
use anyhow::Result;
use bigdecimal::BigDecimal;
use std::sync::Arc;
use tracing::{debug, error, info, instrument, warn};

/// Accessors re-read on every refresh, in call order.
const REFRESH_CALLS: [MarketCall; 9] = [
    MarketCall::TotalSupply,
    MarketCall::ExchangeRateStored,
    MarketCall::BorrowIndex,
    MarketCall::TotalReserves,
    MarketCall::TotalBorrows,
    MarketCall::GetCash,
    MarketCall::BorrowRatePerBlock,
    MarketCall::SupplyRatePerBlock,
    MarketCall::ReserveFactorMantissa,
];

/// Outcome of [`MarketNormalizer::refresh_market`].
#[derive(Debug, Clone)]
pub struct MarketRefresh {
    pub market: Market,
    /// The market had already been refreshed for the requested block.
    pub skipped: bool,
    /// Diagnostic names of the calls that reverted. Their fields kept their
    /// previous values.
    pub reverted_calls: Vec<&'static str>,
}

/// Rescales a raw accessor value into the decimal form stored on the market.
pub fn scale_call_value(call: MarketCall, raw: U256, underlying_decimals: u8) -> BigDecimal {
    let decimals = underlying_decimals as i64;
    let mantissa = constant::MANTISSA_DECIMALS as i64;

    match call {
        // market-tokens carry a fixed 8 decimals
        MarketCall::TotalSupply => {
            utils::mantissa_to_decimal(raw, constant::VTOKEN_DECIMALS as i64)
        }
        // underlying per market-token, offset by the underlying/market-token
        // decimal difference on top of the mantissa
        MarketCall::ExchangeRateStored => {
            let rate = utils::mantissa_to_decimal(raw, decimals)
                * utils::exponent_to_bigdecimal(constant::VTOKEN_DECIMALS as i64)
                * utils::exponent_to_bigdecimal(-mantissa);
            utils::truncate(&rate, mantissa)
        }
        MarketCall::BorrowIndex
        | MarketCall::BorrowRatePerBlock
        | MarketCall::SupplyRatePerBlock => {
            utils::truncate(&utils::mantissa_to_decimal(raw, mantissa), mantissa)
        }
        MarketCall::TotalReserves | MarketCall::TotalBorrows | MarketCall::GetCash => {
            utils::truncate(&utils::mantissa_to_decimal(raw, decimals), decimals)
        }
        MarketCall::ReserveFactorMantissa => utils::u256_to_bigdecimal(raw),
    }
}

fn field_mut(market: &mut Market, call: MarketCall) -> &mut BigDecimal {
    match call {
        MarketCall::TotalSupply => &mut market.total_supply,
        MarketCall::ExchangeRateStored => &mut market.exchange_rate,
        MarketCall::BorrowIndex => &mut market.borrow_index,
        MarketCall::TotalReserves => &mut market.reserves,
        MarketCall::TotalBorrows => &mut market.total_borrows,
        MarketCall::GetCash => &mut market.cash,
        MarketCall::BorrowRatePerBlock => &mut market.borrow_rate,
        MarketCall::SupplyRatePerBlock => &mut market.supply_rate,
        MarketCall::ReserveFactorMantissa => &mut market.reserve_factor,
    }
}

/// Projects lending-market contract state onto market records.
pub struct MarketNormalizer {
    config: Arc<NormalizerConfig>,
    reader: Arc<dyn MarketReader + Send + Sync>,
    oracle: Arc<dyn PriceOracle + Send + Sync>,
    db_market_service: Arc<MarketService>,
}

impl MarketNormalizer {
    pub fn new(
        config: Arc<NormalizerConfig>,
        reader: Arc<dyn MarketReader + Send + Sync>,
        oracle: Arc<dyn PriceOracle + Send + Sync>,
        db_market_service: Arc<MarketService>,
    ) -> Self {
        MarketNormalizer {
            config,
            reader,
            oracle,
            db_market_service,
        }
    }

    pub fn market_kind(&self, market_address: Address) -> MarketKind {
        if market_address == self.config.native_market {
            MarketKind::Native
        } else if market_address == self.config.stablecoin_market {
            MarketKind::StablecoinAnchor
        } else {
            MarketKind::Standard
        }
    }

    /// Builds a fresh market record from contract metadata. Nothing is
    /// persisted here.
    #[instrument(skip(self))]
    pub async fn create_market(&self, market_address: Address) -> Result<Market> {
        let kind = self.market_kind(market_address);

        let (underlying_address, underlying_decimals, underlying_name, underlying_symbol) =
            match kind {
                // the native market has no token contract behind it
                MarketKind::Native => (
                    Address::ZERO,
                    constant::NATIVE_DECIMALS,
                    self.config.native_name.clone(),
                    self.config.native_symbol.clone(),
                ),
                MarketKind::StablecoinAnchor | MarketKind::Standard => {
                    let underlying = self.reader.underlying(market_address).await?;
                    (
                        underlying,
                        self.reader.token_decimals(underlying).await?,
                        self.reader.token_name(underlying).await?,
                        self.reader.token_symbol(underlying).await?,
                    )
                }
            };

        let underlying_price = match kind {
            MarketKind::Native => BigDecimal::from(1),
            _ => BigDecimal::from(0),
        };
        let underlying_price_usd = match kind {
            MarketKind::StablecoinAnchor => BigDecimal::from(1),
            _ => BigDecimal::from(0),
        };

        let interest_rate_model_address = self
            .reader
            .interest_rate_model(market_address)
            .await?
            .unwrap_or(Address::ZERO);

        let reserve_factor = self
            .reader
            .call_uint(market_address, MarketCall::ReserveFactorMantissa, None)
            .await?
            .unwrap_or(U256::ZERO);

        let market = Market {
            id: utils::format_address(&market_address),
            kind,
            name: self.reader.market_name(market_address).await?,
            symbol: self.reader.market_symbol(market_address).await?,
            underlying_address,
            underlying_name,
            underlying_symbol,
            underlying_decimals,
            underlying_price,
            underlying_price_usd,
            exchange_rate: BigDecimal::from(0),
            borrow_index: BigDecimal::from(0),
            total_borrows: BigDecimal::from(0),
            total_supply: BigDecimal::from(0),
            cash: BigDecimal::from(0),
            reserves: BigDecimal::from(0),
            borrow_rate: BigDecimal::from(0),
            supply_rate: BigDecimal::from(0),
            collateral_factor: BigDecimal::from(0),
            reserve_factor: utils::u256_to_bigdecimal(reserve_factor),
            interest_rate_model_address,
            accrual_block_number: 0,
            block_timestamp: 0,
        };

        info!(
            "Created {} market {} ({}) with underlying {}",
            market.kind, market.id, market.symbol, market.underlying_symbol
        );

        Ok(market)
    }

    /// Returns the stored market, or constructs it when absent.
    pub async fn load_or_create_market(&self, market_address: Address) -> Result<Market> {
        let market_id = utils::format_address(&market_address);

        match self.db_market_service.load(&market_id)? {
            Some(market) => Ok(market),
            None => self.create_market(market_address).await,
        }
    }

    /// Synchronizes the market with on-chain state at `block_number` and
    /// persists it.
    ///
    /// The once-per-block guard compares `block_number` with the stored
    /// `accrualBlockNumber` read from the contract, not with the last block
    /// this normalizer handled. A market whose interest has not accrued since
    /// an earlier block is read and written again on every call for
    /// `block_number`.
    #[instrument(skip(self))]
    pub async fn refresh_market(
        &self,
        market_address: Address,
        block_number: u64,
        block_timestamp: u64,
    ) -> Result<MarketRefresh> {
        let mut market = self.load_or_create_market(market_address).await?;

        if market.accrual_block_number == block_number {
            debug!(
                "Market {} already refreshed at block #{}",
                market.id, block_number
            );
            return Ok(MarketRefresh {
                market,
                skipped: true,
                reverted_calls: vec![],
            });
        }

        let native_price_usd = pricing::native_price_in_usd(
            self.oracle.as_ref(),
            self.config.native_market,
            block_number,
        )
        .await?;

        self.update_prices(&mut market, market_address, &native_price_usd, block_number)
            .await?;

        market.accrual_block_number = self
            .reader
            .accrual_block_number(market_address, block_number)
            .await?;
        market.block_timestamp = block_timestamp;

        let mut reverted_calls = vec![];

        for call in REFRESH_CALLS {
            match self
                .reader
                .call_uint(market_address, call, Some(block_number))
                .await?
            {
                CallOutcome::Success(raw) => {
                    let value = scale_call_value(call, raw, market.underlying_decimals);
                    *field_mut(&mut market, call) = value;
                }
                CallOutcome::Reverted => {
                    error!(
                        "Contract call reverted! call_name: {}, market_name: {}",
                        call.name(),
                        market.name
                    );
                    reverted_calls.push(call.name());
                }
            }
        }

        if self.config.collateral_factor_enabled {
            match self
                .reader
                .collateral_factor_mantissa(market_address, block_number)
                .await?
            {
                CallOutcome::Success(raw) => {
                    let mantissa = constant::MANTISSA_DECIMALS as i64;
                    market.collateral_factor =
                        utils::truncate(&utils::mantissa_to_decimal(raw, mantissa), mantissa);
                }
                CallOutcome::Reverted => {
                    error!(
                        "Contract call reverted! call_name: {}, market_name: {}",
                        constant::TRY_MARKETS,
                        market.name
                    );
                    reverted_calls.push(constant::TRY_MARKETS);
                }
            }
        }

        let market = self.db_market_service.save(&market)?;

        info!(
            "Refreshed market {} at block #{}, {} reverted calls",
            market.id,
            block_number,
            reverted_calls.len()
        );

        Ok(MarketRefresh {
            market,
            skipped: false,
            reverted_calls,
        })
    }

    async fn update_prices(
        &self,
        market: &mut Market,
        market_address: Address,
        native_price_usd: &BigDecimal,
        block_number: u64,
    ) -> Result<()> {
        let decimals = market.underlying_decimals as i64;

        match market.kind {
            // the native price stays pinned at 1, only its USD quote moves
            MarketKind::Native => {
                market.underlying_price_usd = utils::truncate(native_price_usd, decimals);
            }
            MarketKind::StablecoinAnchor | MarketKind::Standard => {
                if native_price_usd == &BigDecimal::from(0) {
                    warn!(
                        "Native price is zero at block #{}, keeping prices of {}",
                        block_number, market.id
                    );
                    return Ok(());
                }

                let token_price_usd = pricing::token_price_in_native(
                    self.oracle.as_ref(),
                    market_address,
                    market.underlying_decimals,
                    block_number,
                )
                .await?;

                market.underlying_price = utils::truncate(
                    &(token_price_usd.clone() / native_price_usd.clone()),
                    decimals,
                );

                // the stablecoin keeps its USD price pinned at 1
                if market.kind != MarketKind::StablecoinAnchor {
                    market.underlying_price_usd = utils::truncate(&token_price_usd, decimals);
                }
            }
        }

        Ok(())
    }
}
