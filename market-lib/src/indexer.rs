pub mod block_indexer;
pub mod market;
pub mod pricing;
