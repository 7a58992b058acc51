//! Arbitrage Engine
//!
//! The detector scans venue pairs for price crossings and sizes each one;
//! the executor turns the resulting opportunities into signed bundles and
//! races them into the next blocks.

pub mod detector;
pub mod executor;

pub use detector::OpportunityDetector;
pub use executor::{ExecutionEnvironment, RpcEnvironment, TradeExecutor};
