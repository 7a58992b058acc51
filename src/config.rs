//! Environment-based configuration
//!
//! Everything comes from env vars (a local `.env` is honored in
//! development). Sensible defaults exist only for values with an obvious
//! one; keys and addresses must always be provided.

use crate::relay::DEFAULT_RELAY_URL;
use crate::types::BotConfig;
use alloy::primitives::Address;
use anyhow::{Context, Result};
use std::env;

fn var(name: &str) -> Result<String> {
    env::var(name).with_context(|| format!("missing environment variable {name}"))
}

fn var_or(name: &str, default: &str) -> String {
    env::var(name).unwrap_or_else(|_| default.to_string())
}

fn address_var(name: &str) -> Result<Address> {
    var(name)?
        .parse()
        .with_context(|| format!("{name} is not a valid address"))
}

pub fn load_config() -> Result<BotConfig> {
    dotenv::dotenv().ok();

    Ok(BotConfig {
        rpc_url: var("RPC_URL")?,
        chain_id: var("CHAIN_ID")?
            .parse()
            .context("CHAIN_ID is not a valid integer")?,
        private_key: var("PRIVATE_KEY")?,
        relay_signing_key: var("RELAY_SIGNING_KEY")?,
        relay_url: var_or("RELAY_URL", DEFAULT_RELAY_URL),
        executor_contract: address_var("EXECUTOR_CONTRACT_ADDRESS")?,
        reference_token: address_var("REFERENCE_TOKEN_ADDRESS")?,
        miner_reward_percentage: var_or("MINER_REWARD_PERCENTAGE", "80")
            .parse()
            .context("MINER_REWARD_PERCENTAGE is not a valid integer")?,
        markets_file: var_or("MARKETS_FILE", "config/markets.json"),
    })
}
