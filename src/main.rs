//! Bot entrypoint: load config, connect, then scan and submit once per block.

use alloy::providers::{Provider, ProviderBuilder, WsConnect};
use alloy::signers::local::PrivateKeySigner;
use anyhow::{bail, Context, Result};
use clap::Parser;
use crossarb_bot::arbitrage::{OpportunityDetector, RpcEnvironment, TradeExecutor};
use crossarb_bot::config::load_config;
use crossarb_bot::market::registry::{build_markets_by_token, MarketsFile};
use crossarb_bot::relay::FlashbotsRelay;
use crossarb_bot::reporting::format_opportunity;
use futures::StreamExt;
use std::sync::Arc;
use tracing::{debug, info, warn};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "crossarb-bot", about = "Cross-market arbitrage bundle bot")]
struct Args {
    /// Path to the JSON venue list.
    #[arg(short, long, env = "MARKETS_FILE")]
    markets_file: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_target(false)
        .init();

    let args = Args::parse();
    let config = load_config()?;
    let markets_file = args.markets_file.unwrap_or(config.markets_file.clone());

    let tx_signer: PrivateKeySigner = config
        .private_key
        .parse()
        .context("PRIVATE_KEY is not a valid key")?;
    let relay_signer: PrivateKeySigner = config
        .relay_signing_key
        .parse()
        .context("RELAY_SIGNING_KEY is not a valid key")?;
    let sender = tx_signer.address();

    let provider = Arc::new(
        ProviderBuilder::new()
            .connect_ws(WsConnect::new(&config.rpc_url))
            .await
            .context("failed to connect to RPC node")?,
    );
    let head = provider.get_block_number().await?;
    info!("connected to {} at block {}", config.rpc_url, head);

    let venue_list = MarketsFile::load(&markets_file)?;
    let markets =
        build_markets_by_token(&venue_list, provider.clone(), config.reference_token).await;
    if markets.is_empty() {
        bail!("no usable venues in {markets_file}");
    }

    let detector = OpportunityDetector::new(config.reference_token);
    let relay = Arc::new(FlashbotsRelay::new(
        config.relay_url.clone(),
        tx_signer,
        relay_signer,
    ));
    let env = Arc::new(RpcEnvironment::new(provider.clone()));
    let executor = TradeExecutor::new(
        env,
        relay,
        config.executor_contract,
        sender,
        config.chain_id,
        config.miner_reward_percentage,
        config.reference_token,
    );

    let subscription = provider.subscribe_blocks().await?;
    let mut blocks = subscription.into_stream();
    info!("watching new blocks");

    while let Some(header) = blocks.next().await {
        let block_number = header.number;
        let opportunities = detector.evaluate_markets(&markets).await;
        if opportunities.is_empty() {
            debug!("block {}: no crossed markets", block_number);
            continue;
        }
        for opportunity in &opportunities {
            info!("{}", format_opportunity(opportunity));
        }
        match executor.take_crossed_markets(&opportunities, block_number).await {
            Ok(()) => info!("bundle submitted after block {}", block_number),
            Err(e) => warn!("block {}: {}", block_number, e),
        }
    }

    Ok(())
}
