use crate::types::{Market, Metric};
use db::models;
use db::repositories::{MarketRepository, MetricRepository};

use anyhow::{anyhow, Result};
use std::sync::Arc;
use tracing::{debug, error, info};

/// Entity store for markets and indexer progress.
pub struct MarketService {
    market_repo: Arc<dyn MarketRepository + Send + Sync>,
    metric_repo: Arc<dyn MetricRepository + Send + Sync>,
}

impl MarketService {
    pub fn new(
        market_repo: Arc<dyn MarketRepository + Send + Sync>,
        metric_repo: Arc<dyn MetricRepository + Send + Sync>,
    ) -> Self {
        MarketService {
            market_repo,
            metric_repo,
        }
    }

    /// Loads a market by its contract address. Ids are matched lowercase.
    pub fn load(&self, market_id: &str) -> Result<Option<Market>> {
        let market_id = market_id.to_lowercase();

        let row = self.market_repo.find_by_id(&market_id).map_err(|e| {
            error!("Error finding market {}: {:?}", market_id, e);
            anyhow!("Error finding market {}", market_id)
        })?;

        row.map(Market::try_from).transpose()
    }

    pub fn save(&self, market: &Market) -> Result<Market> {
        let new_market = models::market::NewMarket::from(market);

        let row = self.market_repo.upsert(&new_market).map_err(|e| {
            error!("Error saving market {}: {:?}", new_market.id, e);
            anyhow!("Error saving market {}", new_market.id)
        })?;

        debug!(
            "Saved market {} at accrual block #{}",
            row.id, row.accrual_block_number
        );

        Market::try_from(row)
    }

    pub fn find_all(&self) -> Result<Vec<Market>> {
        self.market_repo
            .find_all()
            .map_err(|e| anyhow!("Error listing markets: {}", e))?
            .into_iter()
            .map(Market::try_from)
            .collect()
    }

    pub fn find_by_underlying_address(&self, underlying: &str) -> Result<Vec<Market>> {
        self.market_repo
            .find_by_underlying_address(&underlying.to_lowercase())
            .map_err(|e| anyhow!("Error finding markets of {}: {}", underlying, e))?
            .into_iter()
            .map(Market::try_from)
            .collect()
    }

    pub fn save_metric_to_db(&self, metric: Metric) -> Result<models::metric::Metric> {
        let latest_block_number = metric.latest_block_number;
        let metric = self
            .metric_repo
            .create(&metric.into())
            .map_err(|e| anyhow!("Error saving metric: {}", e))?;

        info!("Saved indexer metric at block #{}", latest_block_number);
        Ok(metric)
    }

    pub fn find_latest_block_number(&self) -> Result<Option<models::metric::Metric>> {
        self.metric_repo
            .find_latest_block_number()
            .map_err(|e| anyhow!("Error finding latest metric: {}", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{mock, types::MarketKind};

    #[test]
    fn load_is_case_insensitive_and_absent_is_none() {
        let (service, _repo) = mock::market_service();
        let market = mock::sample_market(MarketKind::Standard);

        service.save(&market).unwrap();

        let loaded = service.load(&market.id.to_uppercase()).unwrap();
        assert_eq!(loaded, Some(market));
        assert!(service.load(crate::constant::ZERO_ADDRESS).unwrap().is_none());
    }

    #[test]
    fn save_replaces_the_previous_row() {
        let (service, repo) = mock::market_service();
        let mut market = mock::sample_market(MarketKind::Standard);

        service.save(&market).unwrap();
        market.accrual_block_number = 42;
        service.save(&market).unwrap();

        assert_eq!(service.find_all().unwrap(), vec![market]);
        assert_eq!(repo.upsert_count(), 2);
    }

    #[test]
    fn finds_markets_by_underlying() {
        let (service, _repo) = mock::market_service();
        let market = mock::sample_market(MarketKind::Standard);
        service.save(&market).unwrap();

        let underlying = crate::utils::format_address(&market.underlying_address);
        let found = service.find_by_underlying_address(&underlying).unwrap();

        assert_eq!(found, vec![market]);
    }

    #[test]
    fn metrics_resume_from_highest_block() {
        let (service, _repo) = mock::market_service();

        for latest_block_number in [10, 30, 20] {
            service
                .save_metric_to_db(Metric {
                    latest_block_number,
                    total_blocks: latest_block_number,
                    total_refreshed_markets: 0,
                    max_processing_time: 0.0,
                    min_processing_time: 0.0,
                    avg_processing_time: 0.0,
                })
                .unwrap();
        }

        let latest = service.find_latest_block_number().unwrap().unwrap();
        assert_eq!(latest.latest_block_number, 30);
    }
}
