pub mod chain;
pub mod config;
pub mod constant;
pub mod indexer;
pub mod service;
pub mod types;
pub mod utils;

#[cfg(test)]
pub(crate) mod mock;
