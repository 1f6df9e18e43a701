use crate::schema::markets;
use chrono::NaiveDateTime;
use diesel::prelude::*;

use std::hash::{Hash, Hasher};

#[derive(Queryable, Selectable, Debug, Clone)]
#[diesel(table_name = markets)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Market {
    pub id: String,
    pub kind: String,
    pub name: String,
    pub symbol: String,
    pub underlying_address: String,
    pub underlying_name: String,
    pub underlying_symbol: String,
    pub underlying_decimals: i32,
    pub underlying_price: String,
    pub underlying_price_usd: String,
    pub exchange_rate: String,
    pub borrow_index: String,
    pub total_borrows: String,
    pub total_supply: String,
    pub cash: String,
    pub reserves: String,
    pub borrow_rate: String,
    pub supply_rate: String,
    pub collateral_factor: String,
    pub reserve_factor: String,
    pub interest_rate_model_address: String,
    pub accrual_block_number: i64,
    pub block_timestamp: i64,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

impl PartialEq for Market {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Market {}

impl Hash for Market {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

/// Full row written on every save. Markets are replaced wholesale, so the
/// same struct serves both the insert and the conflict update.
#[derive(Insertable, AsChangeset, Debug, Clone)]
#[diesel(table_name = markets)]
pub struct NewMarket {
    pub id: String,
    pub kind: String,
    pub name: String,
    pub symbol: String,
    pub underlying_address: String,
    pub underlying_name: String,
    pub underlying_symbol: String,
    pub underlying_decimals: i32,
    pub underlying_price: String,
    pub underlying_price_usd: String,
    pub exchange_rate: String,
    pub borrow_index: String,
    pub total_borrows: String,
    pub total_supply: String,
    pub cash: String,
    pub reserves: String,
    pub borrow_rate: String,
    pub supply_rate: String,
    pub collateral_factor: String,
    pub reserve_factor: String,
    pub interest_rate_model_address: String,
    pub accrual_block_number: i64,
    pub block_timestamp: i64,
}
