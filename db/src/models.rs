pub mod market;
pub mod metric;
