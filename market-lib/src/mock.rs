//! In-memory stand-ins for the chain and the database, used by unit tests.

use crate::{
    chain::{BlockSource, CallOutcome, MarketCall, MarketReader, PriceOracle},
    constant,
    service::db_service::market::MarketService,
    types::{Market, MarketKind},
    utils,
};
use db::{
    models::{
        market::{Market as MarketRow, NewMarket},
        metric::{Metric as MetricRow, NewMetric},
    },
    repositories::{MarketRepository, MetricRepository},
    QueryResult,
};

use alloy::primitives::{address, Address, U256};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use bigdecimal::BigDecimal;
use std::{
    collections::{BTreeMap, HashMap, HashSet},
    sync::{
        atomic::{AtomicBool, AtomicU64, Ordering},
        Arc, Mutex,
    },
};

pub const STANDARD_MARKET: Address = address!("0x334b3ecb4dca3593bccc3c7ebd1a1c1d1780fbf1");
pub const UNDERLYING: Address = address!("0x1af3f329e8be154074d8769d1ffa4ee058b1dbc3");
pub const UNDERLYING_DECIMALS: u8 = 18;
pub const INTEREST_RATE_MODEL: Address = address!("0x9e47c4f8654edfb45bc81e7e320c8fc1ad0acb73");

pub fn native_market() -> Address {
    utils::parse_address(constant::VBNB_MARKET).unwrap()
}

pub fn stablecoin_market() -> Address {
    utils::parse_address(constant::VUSDC_MARKET).unwrap()
}

pub fn standard_market() -> Address {
    STANDARD_MARKET
}

pub struct MockReader {
    values: Mutex<HashMap<MarketCall, U256>>,
    reverted: Mutex<HashSet<MarketCall>>,
    revert_all: AtomicBool,
    interest_rate_model_reverted: AtomicBool,
    collateral_factor: Mutex<CallOutcome<U256>>,
    accrual_block_number: AtomicU64,
    underlying_calls: AtomicU64,
}

impl Default for MockReader {
    fn default() -> Self {
        let mut values = HashMap::new();
        // 20%
        values.insert(
            MarketCall::ReserveFactorMantissa,
            U256::from(200_000_000_000_000_000u64),
        );

        MockReader {
            values: Mutex::new(values),
            reverted: Mutex::new(HashSet::new()),
            revert_all: AtomicBool::new(false),
            interest_rate_model_reverted: AtomicBool::new(false),
            collateral_factor: Mutex::new(CallOutcome::Success(U256::ZERO)),
            accrual_block_number: AtomicU64::new(0),
            underlying_calls: AtomicU64::new(0),
        }
    }
}

impl MockReader {
    pub fn set_value(&self, call: MarketCall, value: U256) {
        self.values.lock().unwrap().insert(call, value);
    }

    pub fn revert(&self, call: MarketCall) {
        self.reverted.lock().unwrap().insert(call);
    }

    /// Every revertible call reverts. Hard calls keep answering.
    pub fn revert_everything(&self) {
        self.revert_all.store(true, Ordering::SeqCst);
    }

    pub fn revert_interest_rate_model(&self) {
        self.interest_rate_model_reverted
            .store(true, Ordering::SeqCst);
    }

    pub fn set_collateral_factor(&self, value: U256) {
        *self.collateral_factor.lock().unwrap() = CallOutcome::Success(value);
    }

    pub fn revert_collateral_factor(&self) {
        *self.collateral_factor.lock().unwrap() = CallOutcome::Reverted;
    }

    pub fn set_accrual_block_number(&self, block: u64) {
        self.accrual_block_number.store(block, Ordering::SeqCst);
    }

    pub fn underlying_calls(&self) -> u64 {
        self.underlying_calls.load(Ordering::SeqCst)
    }

    fn reverts_everything(&self) -> bool {
        self.revert_all.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl MarketReader for MockReader {
    async fn underlying(&self, _market: Address) -> Result<Address> {
        self.underlying_calls.fetch_add(1, Ordering::SeqCst);
        Ok(UNDERLYING)
    }

    async fn market_name(&self, market: Address) -> Result<String> {
        if market == native_market() {
            return Ok("Venus BNB".to_string());
        }
        Ok("Venus DAI".to_string())
    }

    async fn market_symbol(&self, market: Address) -> Result<String> {
        if market == native_market() {
            return Ok("vBNB".to_string());
        }
        Ok("vDAI".to_string())
    }

    async fn token_decimals(&self, _token: Address) -> Result<u8> {
        Ok(UNDERLYING_DECIMALS)
    }

    async fn token_name(&self, _token: Address) -> Result<String> {
        Ok("Dai Token".to_string())
    }

    async fn token_symbol(&self, _token: Address) -> Result<String> {
        Ok("DAI".to_string())
    }

    async fn interest_rate_model(&self, _market: Address) -> Result<CallOutcome<Address>> {
        if self.reverts_everything()
            || self.interest_rate_model_reverted.load(Ordering::SeqCst)
        {
            return Ok(CallOutcome::Reverted);
        }
        Ok(CallOutcome::Success(INTEREST_RATE_MODEL))
    }

    async fn accrual_block_number(&self, _market: Address, _block: u64) -> Result<u64> {
        Ok(self.accrual_block_number.load(Ordering::SeqCst))
    }

    async fn call_uint(
        &self,
        _market: Address,
        call: MarketCall,
        _block: Option<u64>,
    ) -> Result<CallOutcome<U256>> {
        if self.reverts_everything() || self.reverted.lock().unwrap().contains(&call) {
            return Ok(CallOutcome::Reverted);
        }

        let value = self
            .values
            .lock()
            .unwrap()
            .get(&call)
            .copied()
            .unwrap_or(U256::ZERO);
        Ok(CallOutcome::Success(value))
    }

    async fn collateral_factor_mantissa(
        &self,
        _market: Address,
        _block: u64,
    ) -> Result<CallOutcome<U256>> {
        if self.reverts_everything() {
            return Ok(CallOutcome::Reverted);
        }
        Ok(self.collateral_factor.lock().unwrap().clone())
    }
}

/// Quotes only the markets it was given a price for.
#[derive(Default)]
pub struct MockOracle {
    prices: Mutex<HashMap<Address, U256>>,
}

impl MockOracle {
    pub fn set_price(&self, market: Address, price: U256) {
        self.prices.lock().unwrap().insert(market, price);
    }
}

#[async_trait]
impl PriceOracle for MockOracle {
    async fn get_underlying_price(&self, market: Address, _block: u64) -> Result<U256> {
        self.prices
            .lock()
            .unwrap()
            .get(&market)
            .copied()
            .ok_or_else(|| anyhow!("no price for {}", market))
    }
}

pub struct MockBlockSource {
    latest_block: AtomicU64,
    markets: Mutex<Vec<Address>>,
    listed_calls: AtomicU64,
}

impl MockBlockSource {
    pub fn new(latest_block: u64, markets: Vec<Address>) -> Self {
        MockBlockSource {
            latest_block: AtomicU64::new(latest_block),
            markets: Mutex::new(markets),
            listed_calls: AtomicU64::new(0),
        }
    }

    pub fn set_latest_block(&self, block: u64) {
        self.latest_block.store(block, Ordering::SeqCst);
    }

    /// The comptroller lists a new market.
    pub fn list_market(&self, market: Address) {
        self.markets.lock().unwrap().push(market);
    }

    pub fn listed_calls(&self) -> u64 {
        self.listed_calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl BlockSource for MockBlockSource {
    async fn latest_block(&self) -> Result<u64> {
        Ok(self.latest_block.load(Ordering::SeqCst))
    }

    /// Three-second blocks.
    async fn block_timestamp(&self, block: u64) -> Result<u64> {
        Ok(block * 3)
    }

    async fn listed_markets(&self) -> Result<Vec<Address>> {
        self.listed_calls.fetch_add(1, Ordering::SeqCst);
        Ok(self.markets.lock().unwrap().clone())
    }
}

pub fn row_from_new_market(market: &NewMarket) -> MarketRow {
    MarketRow {
        id: market.id.clone(),
        kind: market.kind.clone(),
        name: market.name.clone(),
        symbol: market.symbol.clone(),
        underlying_address: market.underlying_address.clone(),
        underlying_name: market.underlying_name.clone(),
        underlying_symbol: market.underlying_symbol.clone(),
        underlying_decimals: market.underlying_decimals,
        underlying_price: market.underlying_price.clone(),
        underlying_price_usd: market.underlying_price_usd.clone(),
        exchange_rate: market.exchange_rate.clone(),
        borrow_index: market.borrow_index.clone(),
        total_borrows: market.total_borrows.clone(),
        total_supply: market.total_supply.clone(),
        cash: market.cash.clone(),
        reserves: market.reserves.clone(),
        borrow_rate: market.borrow_rate.clone(),
        supply_rate: market.supply_rate.clone(),
        collateral_factor: market.collateral_factor.clone(),
        reserve_factor: market.reserve_factor.clone(),
        interest_rate_model_address: market.interest_rate_model_address.clone(),
        accrual_block_number: market.accrual_block_number,
        block_timestamp: market.block_timestamp,
        created_at: None,
        updated_at: None,
    }
}

#[derive(Default)]
pub struct InMemoryMarketRepository {
    rows: Mutex<BTreeMap<String, MarketRow>>,
    upserts: AtomicU64,
}

impl InMemoryMarketRepository {
    pub fn upsert_count(&self) -> u64 {
        self.upserts.load(Ordering::SeqCst)
    }
}

impl MarketRepository for InMemoryMarketRepository {
    fn upsert(&self, market: &NewMarket) -> QueryResult<MarketRow> {
        self.upserts.fetch_add(1, Ordering::SeqCst);
        let row = row_from_new_market(market);
        self.rows
            .lock()
            .unwrap()
            .insert(row.id.clone(), row.clone());
        Ok(row)
    }

    fn find_by_id(&self, id: &str) -> QueryResult<Option<MarketRow>> {
        Ok(self.rows.lock().unwrap().get(id).cloned())
    }

    fn find_all(&self) -> QueryResult<Vec<MarketRow>> {
        Ok(self.rows.lock().unwrap().values().cloned().collect())
    }

    fn find_by_underlying_address(&self, address: &str) -> QueryResult<Vec<MarketRow>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .values()
            .filter(|row| row.underlying_address == address)
            .cloned()
            .collect())
    }
}

#[derive(Default)]
pub struct InMemoryMetricRepository {
    rows: Mutex<Vec<MetricRow>>,
}

impl MetricRepository for InMemoryMetricRepository {
    fn create(&self, metric: &NewMetric) -> QueryResult<MetricRow> {
        let mut rows = self.rows.lock().unwrap();
        let row = MetricRow {
            id: rows.len() as i32 + 1,
            latest_block_number: metric.latest_block_number,
            total_blocks: metric.total_blocks,
            total_refreshed_markets: metric.total_refreshed_markets,
            max_processing_time: metric.max_processing_time,
            min_processing_time: metric.min_processing_time,
            avg_processing_time: metric.avg_processing_time,
            created_at: None,
            updated_at: None,
        };
        rows.push(row.clone());
        Ok(row)
    }

    fn find_latest_block_number(&self) -> QueryResult<Option<MetricRow>> {
        Ok(self
            .rows
            .lock()
            .unwrap()
            .iter()
            .max_by_key(|row| row.latest_block_number)
            .cloned())
    }
}

pub fn market_service() -> (MarketService, Arc<InMemoryMarketRepository>) {
    let (service, market_repo, _metric_repo) = market_service_with_metrics();
    (service, market_repo)
}

pub fn market_service_with_metrics() -> (
    MarketService,
    Arc<InMemoryMarketRepository>,
    Arc<InMemoryMetricRepository>,
) {
    let market_repo = Arc::new(InMemoryMarketRepository::default());
    let metric_repo = Arc::new(InMemoryMetricRepository::default());
    let service = MarketService::new(market_repo.clone(), metric_repo.clone());
    (service, market_repo, metric_repo)
}

pub fn sample_market(kind: MarketKind) -> Market {
    let (address, underlying_address, underlying_symbol, price, price_usd) = match kind {
        MarketKind::Native => (
            native_market(),
            Address::ZERO,
            constant::NATIVE_SYMBOL,
            BigDecimal::from(1),
            BigDecimal::from(300),
        ),
        MarketKind::StablecoinAnchor => (
            stablecoin_market(),
            UNDERLYING,
            "USDC",
            BigDecimal::new(34.into(), 4),
            BigDecimal::from(1),
        ),
        MarketKind::Standard => (
            standard_market(),
            UNDERLYING,
            "DAI",
            BigDecimal::new(5.into(), 3),
            BigDecimal::new(15.into(), 1),
        ),
    };

    Market {
        id: utils::format_address(&address),
        kind,
        name: format!("Venus {}", underlying_symbol),
        symbol: format!("v{}", underlying_symbol),
        underlying_address,
        underlying_name: format!("{} Token", underlying_symbol),
        underlying_symbol: underlying_symbol.to_string(),
        underlying_decimals: 18,
        underlying_price: price,
        underlying_price_usd: price_usd,
        exchange_rate: BigDecimal::new(2.into(), 2),
        borrow_index: BigDecimal::from(1),
        total_borrows: BigDecimal::from(400),
        total_supply: BigDecimal::from(500_000_000),
        cash: BigDecimal::from(600),
        reserves: BigDecimal::from(3),
        borrow_rate: BigDecimal::new(2.into(), 9),
        supply_rate: BigDecimal::new(1.into(), 9),
        collateral_factor: BigDecimal::new(75.into(), 2),
        reserve_factor: BigDecimal::from(200_000_000_000_000_000u64),
        interest_rate_model_address: INTEREST_RATE_MODEL,
        accrual_block_number: 0,
        block_timestamp: 0,
    }
}
