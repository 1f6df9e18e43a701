use market_lib::{
    chain::BlockSource,
    indexer::market::MarketNormalizer,
    service::db_service::market::MarketService,
    types::Market,
    utils,
};

use anyhow::{anyhow, Result};
use clap::Subcommand;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Subcommand)]
pub enum MarketCommands {
    #[command(about = "Print a stored market")]
    Show {
        #[arg(long)]
        address: String,
    },

    #[command(about = "Print stored markets, optionally only those of one underlying")]
    List {
        #[arg(long)]
        underlying: Option<String>,
    },

    #[command(about = "Build a market from contract metadata and store it")]
    Create {
        #[arg(long)]
        address: String,
    },

    #[command(about = "Refresh a market at a block, the latest one by default")]
    Refresh {
        #[arg(long)]
        address: String,

        #[arg(long)]
        block: Option<u64>,
    },
}

fn print_market(market: &Market) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(market)?);

    if market.block_timestamp > 0 {
        info!(
            "Market {} last refreshed at {} UTC",
            market.id,
            utils::timestamp_to_naive_datetime(market.block_timestamp)
        );
    }

    Ok(())
}

//handlers
pub fn handle_show(db_market_service: Arc<MarketService>, address: &str) -> Result<()> {
    let address = utils::parse_address(address)?;
    let market_id = utils::format_address(&address);

    let market = db_market_service
        .load(&market_id)?
        .ok_or_else(|| anyhow!("Market {} not found", market_id))?;

    print_market(&market)
}

pub fn handle_list(
    db_market_service: Arc<MarketService>,
    underlying: Option<&str>,
) -> Result<()> {
    let markets = match underlying {
        Some(underlying) => {
            let underlying = utils::format_address(&utils::parse_address(underlying)?);
            db_market_service.find_by_underlying_address(&underlying)?
        }
        None => db_market_service.find_all()?,
    };

    println!("{}", serde_json::to_string_pretty(&markets)?);
    info!("Listed {} markets", markets.len());

    Ok(())
}

pub async fn handle_create(
    normalizer: Arc<MarketNormalizer>,
    db_market_service: Arc<MarketService>,
    address: &str,
) -> Result<()> {
    let address = utils::parse_address(address)?;

    if let Some(existing) = db_market_service.load(&utils::format_address(&address))? {
        warn!("Market {} already exists", existing.id);
        return print_market(&existing);
    }

    let market = normalizer.create_market(address).await?;
    let market = db_market_service.save(&market)?;

    print_market(&market)
}

pub async fn handle_refresh(
    normalizer: Arc<MarketNormalizer>,
    source: Arc<dyn BlockSource + Send + Sync>,
    address: &str,
    block: Option<u64>,
) -> Result<()> {
    let address = utils::parse_address(address)?;

    let block_number = match block {
        Some(block_number) => block_number,
        None => source.latest_block().await?,
    };
    let block_timestamp = source.block_timestamp(block_number).await?;

    let refresh = normalizer
        .refresh_market(address, block_number, block_timestamp)
        .await?;

    if refresh.skipped {
        warn!(
            "Market {} was already refreshed at block #{}",
            refresh.market.id, block_number
        );
    }

    if !refresh.reverted_calls.is_empty() {
        warn!("Reverted calls: {}", refresh.reverted_calls.join(", "));
    }

    print_market(&refresh.market)
}
