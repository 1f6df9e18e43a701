use db::repositories::{
    market::MarketRepositoryImpl, metric::MetricRepositoryImpl, MarketRepository,
    MetricRepository,
};
use db::{establish_connection_pool, run_migrations};
use market_lib::{
    chain::{evm::EvmChain, BlockSource, MarketReader, PriceOracle},
    config::Config,
    indexer::market::MarketNormalizer,
    service::db_service::market::MarketService,
    utils,
};

mod market_cmd;

use market_cmd::MarketCommands;

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "market-cli")]
#[command(about = "Lending market indexer CLI")]
#[command(version = "1.0.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    #[command(about = "Inspect and refresh market records")]
    Market {
        #[command(subcommand)]
        command: MarketCommands,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let config = Arc::new(Config::load_toml()?);

    let log_level = utils::convert_log_level_to_tracing_level(&config.log_level);
    let filter = EnvFilter::from_default_env().add_directive(log_level.into());

    // logs go to stderr so that stdout stays valid JSON
    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .try_init()?;

    warn!("Starting market-cli...");

    let db_conn = establish_connection_pool(
        &config.database.database_url,
        config.database.db_connection_pool_max_size,
        config.database.db_connection_pool_idle_size,
    )?;

    run_migrations(&db_conn)?;
    info!("Database migrations completed");

    let market_repo: Arc<dyn MarketRepository + Send + Sync> =
        Arc::new(MarketRepositoryImpl::new(db_conn.clone()));

    let metric_repo: Arc<dyn MetricRepository + Send + Sync> =
        Arc::new(MetricRepositoryImpl::new(db_conn.clone()));

    let db_market_service = Arc::new(MarketService::new(
        Arc::clone(&market_repo),
        Arc::clone(&metric_repo),
    ));

    match args.command {
        Commands::Market { command } => match command {
            MarketCommands::Show { address } => {
                market_cmd::handle_show(Arc::clone(&db_market_service), &address)?;
            }
            MarketCommands::List { underlying } => {
                market_cmd::handle_list(
                    Arc::clone(&db_market_service),
                    underlying.as_deref(),
                )?;
            }
            command => {
                let chain = Arc::new(
                    EvmChain::connect(
                        config.rpc_url()?,
                        config.comptroller_address()?,
                        config.price_oracle_address()?,
                    )
                    .await?,
                );
                info!("Chain client connected");

                let reader: Arc<dyn MarketReader + Send + Sync> = chain.clone();
                let oracle: Arc<dyn PriceOracle + Send + Sync> = chain.clone();
                let source: Arc<dyn BlockSource + Send + Sync> = chain.clone();

                let normalizer = Arc::new(MarketNormalizer::new(
                    Arc::new(config.normalizer_config()?),
                    reader,
                    oracle,
                    Arc::clone(&db_market_service),
                ));

                match command {
                    MarketCommands::Create { address } => {
                        info!("Creating market {}", address);

                        market_cmd::handle_create(normalizer, db_market_service, &address)
                            .await?;
                    }
                    MarketCommands::Refresh { address, block } => {
                        info!("Refreshing market {}", address);

                        market_cmd::handle_refresh(normalizer, source, &address, block).await?;
                    }
                    MarketCommands::Show { .. } | MarketCommands::List { .. } => {}
                }
            }
        },
    }

    Ok(())
}
