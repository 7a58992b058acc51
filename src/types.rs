// Core data structures shared between the opportunity finder
// and the execution pipeline.

use crate::market::Market;
use alloy::primitives::{Address, I256, U256};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Venues trading a token against the reference asset, keyed by token
/// address. Supplied by the market registry (or any other discovery source);
/// read-only input to the finder.
pub type MarketsByToken = HashMap<Address, Vec<Arc<dyn Market>>>;

/// A crossed-market trade found by the volume search.
///
/// `profit` is the proceeds of the sell leg minus `volume`, and is the
/// locally-maximal value over the tested volumes for this venue pair.
/// Immutable once created; consumed exactly once by the execution pipeline.
#[derive(Clone)]
pub struct ArbitrageOpportunity {
    /// Net profit in the reference asset's smallest unit.
    pub profit: I256,
    /// Reference-asset amount spent on the buy leg.
    pub volume: U256,
    /// The token being round-tripped against the reference asset.
    pub token_address: Address,
    pub buy_from_market: Arc<dyn Market>,
    pub sell_to_market: Arc<dyn Market>,
}

impl fmt::Debug for ArbitrageOpportunity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ArbitrageOpportunity")
            .field("profit", &self.profit)
            .field("volume", &self.volume)
            .field("token_address", &self.token_address)
            .field("buy_from", &self.buy_from_market.market_address())
            .field("sell_to", &self.sell_to_market.market_address())
            .finish()
    }
}

/// Bot configuration (from env)
#[derive(Debug, Clone)]
pub struct BotConfig {
    // Network
    pub rpc_url: String,
    pub chain_id: u64,

    // Identities
    /// Signs the bundle transactions (the execution identity).
    pub private_key: String,
    /// Signs relay request headers; a separate reputation identity.
    pub relay_signing_key: String,

    // Relay
    pub relay_url: String,

    /// On-chain executor contract receiving (volume, payment, targets, payloads).
    pub executor_contract: Address,

    /// The common-denominator asset profit is measured in (e.g. WETH).
    pub reference_token: Address,

    /// Percentage of profit forwarded to the block producer.
    pub miner_reward_percentage: u64,

    /// JSON venue list (see `market::registry`).
    pub markets_file: String,
}
