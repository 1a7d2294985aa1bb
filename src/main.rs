//! Two-venue arbitrage bot
//!
//! Main entry point. Loads configuration and ABIs, connects to the node,
//! approves both venues, then polls until SIGINT / SIGTERM.
//!
//! Startup failures (bad config, missing ABI, unreachable node, key/wallet
//! mismatch) exit non-zero. Nothing after startup is fatal.

use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::StreamExt;
use signal_hook::consts::{SIGINT, SIGTERM};
use signal_hook_tokio::Signals;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use venue_arb_bot::abi::{AbiRegistry, ContractKind};
use venue_arb_bot::arbitrage::ArbitrageBot;
use venue_arb_bot::chain::{ChainClient, RpcChainClient};
use venue_arb_bot::config::{load_config, load_config_from_file};
use venue_arb_bot::execution::TransactionManager;
use venue_arb_bot::logging::init_logging;
use venue_arb_bot::types::format_units;
use venue_arb_bot::venues::{BalancerVenue, UniswapPool, UniswapVenue, VenueContext};

/// Uniswap v4 <-> Balancer V2 arbitrage bot
#[derive(Parser)]
#[command(name = "venue-arb")]
struct Args {
    /// Env file to load (default: .env in the working directory, if present)
    #[arg(long, env = "ENV_FILE")]
    env_file: Option<PathBuf>,

    /// Log file (overrides LOG_FILE)
    #[arg(long)]
    log_file: Option<PathBuf>,

    /// Log filter, e.g. "debug" or "venue_arb_bot=debug" (default: RUST_LOG or info)
    #[arg(long)]
    log_level: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = match &args.env_file {
        Some(path) => load_config_from_file(path)?,
        None => load_config()?,
    };

    let log_file = args.log_file.clone().unwrap_or_else(|| config.log_file.clone());
    let _log_guard = init_logging(&log_file, config.log_format, args.log_level.as_deref())?;

    info!("Venue arbitrage bot starting...");
    info!("RPC URL: {}", config.rpc_url.chars().take(40).collect::<String>());
    info!("Token A: {:?}, Token B: {:?}", config.token_a, config.token_b);
    info!(
        "Trade amount: {} tokenA, threshold: {}, poll interval: {}s",
        format_units(config.trade_amount),
        config.arbitrage_threshold,
        config.poll_interval_secs
    );
    info!(
        "Allowance policy: {}, leg policy: {}",
        config.allowance_policy, config.leg_policy
    );
    tracing::debug!("{:?}", config);

    let abis = AbiRegistry::load(&config.abi_dir)
        .with_context(|| format!("Failed to load ABIs from {}", config.abi_dir.display()))?;
    for kind in ContractKind::ALL {
        info!("{}: {} functions declared", kind.file_name(), abis.function_count(kind));
    }

    let signer: PrivateKeySigner = config
        .private_key
        .parse()
        .context("PRIVATE_KEY is not a valid secp256k1 key")?;
    if signer.address() != config.wallet_address {
        bail!(
            "WALLET_ADDRESS {:?} does not match PRIVATE_KEY address {:?}",
            config.wallet_address,
            signer.address()
        );
    }

    info!("Connecting to node...");
    let provider = ProviderBuilder::new()
        .connect(&config.rpc_url)
        .await
        .context("Failed to connect to RPC_URL")?;
    let chain_id = match config.chain_id {
        Some(id) => id,
        None => provider
            .get_chain_id()
            .await
            .context("Failed to fetch chain id")?,
    };

    let client = RpcChainClient::new(
        Arc::new(provider),
        signer,
        chain_id,
        config.gas_price_multiplier,
    );
    let block = client
        .check_connectivity()
        .await
        .context("Node connectivity check failed")?;
    info!("Connected! chain_id: {}, current block: {}", chain_id, block);

    let chain: Arc<dyn ChainClient> = Arc::new(client);
    let manager = Arc::new(TransactionManager::new(Arc::clone(&chain)));
    let ctx = VenueContext::new(
        chain,
        manager,
        config.token_a,
        config.token_b,
        config.tx_deadline_secs,
    );

    let uniswap = UniswapVenue::new(
        ctx.clone(),
        config.uniswap_quoter,
        config.uniswap_router,
        UniswapPool {
            fee: config.uniswap_fee,
            tick_spacing: config.uniswap_tick_spacing,
            hooks: config.uniswap_hooks,
        },
    )?;
    let balancer = BalancerVenue::new(ctx, config.balancer_vault, config.balancer_pool_id);

    let mut bot = ArbitrageBot::new(Arc::new(uniswap), Arc::new(balancer), config.bot_settings());

    let mut signals = Signals::new([SIGINT, SIGTERM])?;
    let signals_handle = signals.handle();
    let shutdown = async move {
        if let Some(signal) = signals.next().await {
            info!("Received signal {}, shutting down", signal);
        }
    };

    bot.run(shutdown).await;
    signals_handle.close();

    info!("Bot stopped");
    Ok(())
}
