use crate::models::metric::{Metric, NewMetric};
use crate::repositories::MetricRepository;
use crate::DbPool;

use diesel::prelude::*;

pub struct MetricRepositoryImpl {
    db_pool: DbPool,
}

impl MetricRepositoryImpl {
    pub fn new(db_pool: DbPool) -> Self {
        MetricRepositoryImpl { db_pool }
    }
}

impl MetricRepository for MetricRepositoryImpl {
    fn create(&self, metric: &NewMetric) -> QueryResult<Metric> {
        use crate::schema::metrics::dsl::*;
        let mut conn = self.db_pool.get().map_err(|e| {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UnableToSendCommand,
                Box::new(e.to_string()),
            )
        })?;

        diesel::insert_into(metrics)
            .values(metric)
            .get_result(&mut conn)
    }

    fn find_latest_block_number(&self) -> QueryResult<Option<Metric>> {
        use crate::schema::metrics::dsl::*;
        let mut conn = self.db_pool.get().map_err(|e| {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UnableToSendCommand,
                Box::new(e.to_string()),
            )
        })?;

        metrics
            .order(latest_block_number.desc())
            .first::<Metric>(&mut conn)
            .optional()
    }
}
