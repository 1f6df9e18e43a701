use crate::schema::metrics;
use chrono::NaiveDateTime;
use diesel::prelude::*;

#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = metrics)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct Metric {
    pub id: i32,
    pub latest_block_number: i64,
    pub total_blocks: i64,
    pub total_refreshed_markets: i64,
    pub max_processing_time: f32,
    pub min_processing_time: f32,
    pub avg_processing_time: f32,
    pub created_at: Option<NaiveDateTime>,
    pub updated_at: Option<NaiveDateTime>,
}

#[derive(Insertable, Debug)]
#[diesel(table_name = metrics)]
pub struct NewMetric {
    pub latest_block_number: i64,
    pub total_blocks: i64,
    pub total_refreshed_markets: i64,
    pub max_processing_time: f32,
    pub min_processing_time: f32,
    pub avg_processing_time: f32,
}
