use market_lib::{
    chain::{evm::EvmChain, BlockSource, MarketReader, PriceOracle},
    config::Config,
    indexer::{block_indexer::BlockIndexer, market::MarketNormalizer},
    service::db_service::market::MarketService,
    utils,
};

use db::repositories::{
    market::MarketRepositoryImpl, metric::MetricRepositoryImpl, MarketRepository,
    MetricRepository,
};
use db::{establish_connection_pool, run_migrations};

use anyhow::Result;
use futures::future;
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = Arc::new(Config::load_toml()?);

    let log_level = utils::convert_log_level_to_tracing_level(&config.log_level);
    let filter = EnvFilter::from_default_env().add_directive(log_level.into());

    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(filter)
        .try_init()?;

    warn!("Starting server...");

    // connect database
    let db_conn = establish_connection_pool(
        &config.database.database_url,
        config.database.db_connection_pool_max_size,
        config.database.db_connection_pool_idle_size,
    )?;
    warn!("Connected to database");

    run_migrations(&db_conn)?;
    warn!("Database migrations completed");

    // initialize db repositories
    let market_repo: Arc<dyn MarketRepository + Send + Sync> =
        Arc::new(MarketRepositoryImpl::new(db_conn.clone()));

    let metric_repo: Arc<dyn MetricRepository + Send + Sync> =
        Arc::new(MetricRepositoryImpl::new(db_conn.clone()));

    // initialize chain client
    let rpc_url = config.rpc_url()?;
    let chain = Arc::new(
        EvmChain::connect(
            rpc_url,
            config.comptroller_address()?,
            config.price_oracle_address()?,
        )
        .await?,
    );
    warn!(
        "Chain client initialized, price oracle {}",
        utils::format_address(&chain.price_oracle())
    );

    // services
    let db_market_service = Arc::new(MarketService::new(
        Arc::clone(&market_repo),
        Arc::clone(&metric_repo),
    ));

    let reader: Arc<dyn MarketReader + Send + Sync> = chain.clone();
    let oracle: Arc<dyn PriceOracle + Send + Sync> = chain.clone();
    let source: Arc<dyn BlockSource + Send + Sync> = chain.clone();

    let normalizer = Arc::new(MarketNormalizer::new(
        Arc::new(config.normalizer_config()?),
        reader,
        oracle,
        Arc::clone(&db_market_service),
    ));

    let block_indexer = BlockIndexer::new(
        config.indexer.clone(),
        config.market_addresses()?,
        source,
        Arc::clone(&normalizer),
        Arc::clone(&db_market_service),
    );

    let onchain_task = if config.onchain_indexer_enabled {
        info!(
            "Block indexer starting at block #{}",
            block_indexer.start_block_number
        );

        tokio::spawn(async move {
            if let Err(e) = block_indexer.run().await {
                error!("Block indexer failed: {:?}", e);
            }
        })
    } else {
        warn!("Block indexer disabled");

        tokio::spawn(async {
            future::pending::<()>().await;
        })
    };

    tokio::select! {
        _ = onchain_task => {
            info!("Block indexing task completed");
        }

        _ = tokio::signal::ctrl_c() => {
            warn!("Received Ctrl+C signal, shutting down...");
        }
    }

    Ok(())
}
