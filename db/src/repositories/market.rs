use crate::models::market::{Market, NewMarket};
use crate::repositories::MarketRepository;
use crate::DbPool;

use chrono::Utc;
use diesel::prelude::*;

pub struct MarketRepositoryImpl {
    db_pool: DbPool,
}

impl MarketRepositoryImpl {
    pub fn new(db_pool: DbPool) -> Self {
        Self { db_pool }
    }
}

impl MarketRepository for MarketRepositoryImpl {
    fn upsert(&self, market: &NewMarket) -> QueryResult<Market> {
        use crate::schema::markets::dsl::*;
        let mut conn = self.db_pool.get().map_err(|e| {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UnableToSendCommand,
                Box::new(e.to_string()),
            )
        })?;

        diesel::insert_into(markets)
            .values(market)
            .on_conflict(id)
            .do_update()
            .set((market, updated_at.eq(Some(Utc::now().naive_utc()))))
            .get_result(&mut conn)
    }

    fn find_by_id(&self, market_id: &str) -> QueryResult<Option<Market>> {
        use crate::schema::markets::dsl::*;
        let mut conn = self.db_pool.get().map_err(|e| {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UnableToSendCommand,
                Box::new(e.to_string()),
            )
        })?;

        markets.find(market_id).first(&mut conn).optional()
    }

    fn find_all(&self) -> QueryResult<Vec<Market>> {
        use crate::schema::markets::dsl::*;
        let mut conn = self.db_pool.get().map_err(|e| {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UnableToSendCommand,
                Box::new(e.to_string()),
            )
        })?;

        markets.order(id.asc()).load(&mut conn)
    }

    fn find_by_underlying_address(&self, address: &str) -> QueryResult<Vec<Market>> {
        use crate::schema::markets::dsl::*;
        let mut conn = self.db_pool.get().map_err(|e| {
            diesel::result::Error::DatabaseError(
                diesel::result::DatabaseErrorKind::UnableToSendCommand,
                Box::new(e.to_string()),
            )
        })?;

        markets
            .filter(underlying_address.eq(address))
            .load(&mut conn)
    }
}
