pub mod market;
pub mod metric;

use crate::models::{
    market::{Market, NewMarket},
    metric::{Metric, NewMetric},
};

use diesel::prelude::*;

/// Markets are keyed by their lowercase hex contract address.
pub trait MarketRepository {
    /// Inserts the row, or replaces every mutable column when the id exists.
    fn upsert(&self, market: &NewMarket) -> QueryResult<Market>;
    fn find_by_id(&self, id: &str) -> QueryResult<Option<Market>>;
    fn find_all(&self) -> QueryResult<Vec<Market>>;
    fn find_by_underlying_address(&self, address: &str) -> QueryResult<Vec<Market>>;
}

pub trait MetricRepository {
    fn create(&self, metric: &NewMetric) -> QueryResult<Metric>;
    fn find_latest_block_number(&self) -> QueryResult<Option<Metric>>;
}
