//! Cross-market arbitrage bot
//!
//! Watches a set of venues trading tokens against a common reference asset,
//! detects price crossings between venue pairs, sizes them, and submits the
//! resulting two-leg trades as private relay bundles.

pub mod arbitrage;
pub mod config;
pub mod contracts;
pub mod errors;
pub mod market;
pub mod relay;
pub mod reporting;
pub mod types;

pub use arbitrage::{OpportunityDetector, RpcEnvironment, TradeExecutor};
pub use errors::ArbitrageError;
pub use market::Market;
pub use relay::{FlashbotsRelay, Relay};
pub use types::{ArbitrageOpportunity, BotConfig, MarketsByToken};
