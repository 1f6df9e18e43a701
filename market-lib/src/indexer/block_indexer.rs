use crate::{
    chain::BlockSource,
    config::IndexerConfig,
    indexer::market::MarketNormalizer,
    service::db_service::market::MarketService,
    types::Metric,
    utils,
};

use alloy::primitives::Address;
use anyhow::Result;
use std::sync::{
    atomic::{AtomicU64, Ordering},
    Arc,
};
use tokio::time::{sleep, Duration, Instant};
use tracing::{debug, error, info, warn};

/// Follows the chain head and refreshes every tracked market once per block.
pub struct BlockIndexer {
    config: IndexerConfig,
    configured_markets: Vec<Address>,
    source: Arc<dyn BlockSource + Send + Sync>,
    normalizer: Arc<MarketNormalizer>,
    db_market_service: Arc<MarketService>,

    next_block_number: Arc<AtomicU64>,
    pub start_block_number: u64,

    total_blocks: Arc<AtomicU64>,
    total_refreshed_markets: Arc<AtomicU64>,
    max_processing_time: Arc<AtomicU64>,
    min_processing_time: Arc<AtomicU64>,
    total_processing_time: Arc<AtomicU64>,
}

impl BlockIndexer {
    pub fn new(
        config: IndexerConfig,
        configured_markets: Vec<Address>,
        source: Arc<dyn BlockSource + Send + Sync>,
        normalizer: Arc<MarketNormalizer>,
        db_market_service: Arc<MarketService>,
    ) -> Self {
        let mut start_block_number = config.start_block;
        let total_blocks = Arc::new(AtomicU64::new(0));
        let total_refreshed_markets = Arc::new(AtomicU64::new(0));
        let max_processing_time = Arc::new(AtomicU64::new(0));
        let min_processing_time = Arc::new(AtomicU64::new(u64::MAX));
        let total_processing_time = Arc::new(AtomicU64::new(0));

        if !config.dev_mode {
            if let Some(latest_metric) = db_market_service
                .find_latest_block_number()
                .unwrap_or(None)
            {
                info!(
                    "BlockIndexer resuming after block #{}",
                    latest_metric.latest_block_number
                );

                start_block_number =
                    start_block_number.max(latest_metric.latest_block_number as u64 + 1);

                total_blocks.store(latest_metric.total_blocks as u64, Ordering::SeqCst);
                total_refreshed_markets.store(
                    latest_metric.total_refreshed_markets as u64,
                    Ordering::SeqCst,
                );
                max_processing_time.store(
                    latest_metric.max_processing_time as u64,
                    Ordering::SeqCst,
                );

                if latest_metric.min_processing_time > 0.0 {
                    min_processing_time.store(
                        latest_metric.min_processing_time as u64,
                        Ordering::SeqCst,
                    );
                }

                total_processing_time.store(
                    (latest_metric.total_blocks as f64 * latest_metric.avg_processing_time as f64)
                        as u64,
                    Ordering::SeqCst,
                );
            }
        }

        BlockIndexer {
            config,
            configured_markets,
            source,
            normalizer,
            db_market_service,
            next_block_number: Arc::new(AtomicU64::new(start_block_number)),
            start_block_number,
            total_blocks,
            total_refreshed_markets,
            max_processing_time,
            min_processing_time,
            total_processing_time,
        }
    }

    pub fn next_block_number(&self) -> u64 {
        self.next_block_number.load(Ordering::SeqCst)
    }

    /// Configured markets, or every market the comptroller lists.
    pub async fn tracked_markets(&self) -> Result<Vec<Address>> {
        if !self.configured_markets.is_empty() {
            return Ok(self.configured_markets.clone());
        }

        self.source.listed_markets().await
    }

    /// Polls until the task is dropped. In dev mode only the start block is
    /// processed.
    pub async fn run(&self) -> Result<()> {
        let poll_interval = Duration::from_millis(self.config.poll_interval_ms);

        warn!(
            "BlockIndexer starting from block #{}",
            self.start_block_number
        );

        if self.config.dev_mode {
            let markets = self.tracked_markets().await?;
            self.process_block(self.start_block_number, &markets).await?;
            return Ok(());
        }

        loop {
            match self.poll().await {
                Ok(0) => {}
                Ok(processed) => info!("Processed {} blocks", processed),
                Err(e) => error!("Failed to follow chain head: {}", e),
            }

            sleep(poll_interval).await;
        }
    }

    /// One polling round. Tracked markets are resolved again each round so
    /// that markets listed after startup are picked up.
    pub async fn poll(&self) -> Result<u64> {
        let markets = self.tracked_markets().await?;
        debug!("Tracking {} markets", markets.len());

        self.catch_up(&markets).await
    }

    /// Processes every block between the next unprocessed one and the chain
    /// head. Returns how many blocks were processed.
    pub async fn catch_up(&self, markets: &[Address]) -> Result<u64> {
        let latest_block = self.source.latest_block().await?;
        let mut processed = 0;

        while self.next_block_number() <= latest_block {
            let block_number = self.next_block_number();
            self.process_block(block_number, markets).await?;
            self.next_block_number
                .store(block_number + 1, Ordering::SeqCst);
            processed += 1;
        }

        Ok(processed)
    }

    /// Refreshes every market at `block_number`. A market that fails is
    /// logged and left for the next block. Returns how many markets changed.
    pub async fn process_block(&self, block_number: u64, markets: &[Address]) -> Result<u64> {
        let start_time = Instant::now();
        let block_timestamp = self.source.block_timestamp(block_number).await?;

        let mut refreshed = 0;
        for market in markets {
            match self
                .normalizer
                .refresh_market(*market, block_number, block_timestamp)
                .await
            {
                Ok(refresh) if !refresh.skipped => refreshed += 1,
                Ok(_) => {}
                Err(e) => error!(
                    "Failed to refresh market {} at block #{}: {}",
                    utils::format_address(market),
                    block_number,
                    e
                ),
            }
        }

        let processing_time = start_time.elapsed().as_millis() as u64;

        if processing_time > self.max_processing_time.load(Ordering::SeqCst) {
            self.max_processing_time
                .store(processing_time, Ordering::SeqCst);
        }

        if processing_time < self.min_processing_time.load(Ordering::SeqCst) {
            self.min_processing_time
                .store(processing_time, Ordering::SeqCst);
        }

        self.total_processing_time
            .fetch_add(processing_time, Ordering::SeqCst);
        self.total_refreshed_markets
            .fetch_add(refreshed, Ordering::SeqCst);
        self.total_blocks.fetch_add(1, Ordering::SeqCst);

        info!(
            "Processed block #{} with {}/{} refreshed markets in {}ms",
            block_number,
            refreshed,
            markets.len(),
            processing_time
        );

        if self.config.metric_flush_interval > 0
            && block_number % self.config.metric_flush_interval == 0
        {
            self.db_market_service
                .save_metric_to_db(self.metric(block_number))?;
        }

        Ok(refreshed)
    }

    pub fn metric(&self, latest_block_number: u64) -> Metric {
        let total_blocks = self.total_blocks.load(Ordering::SeqCst);

        let avg_processing_time = if total_blocks > 0 {
            self.total_processing_time.load(Ordering::SeqCst) as f32 / total_blocks as f32
        } else {
            0.0
        };

        let min_processing_time = match self.min_processing_time.load(Ordering::SeqCst) {
            u64::MAX => 0.0,
            min => min as f32,
        };

        Metric {
            latest_block_number,
            total_blocks,
            total_refreshed_markets: self.total_refreshed_markets.load(Ordering::SeqCst),
            max_processing_time: self.max_processing_time.load(Ordering::SeqCst) as f32,
            min_processing_time,
            avg_processing_time,
        }
    }
}
