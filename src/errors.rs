//! Error types
//!
//! Failures during a single execution attempt are soft: the pipeline logs
//! them and moves on to the next opportunity. Only exhausting the whole
//! list without a submission surfaces as a hard error to the caller.

use alloy::primitives::Address;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ArbitrageError {
    #[error("quote failed on market {market}: {reason}")]
    QuoteFailure { market: Address, reason: String },

    #[error("gas estimation failed: {0}")]
    EstimationFailure(String),

    #[error("suspicious gas estimate {estimate} exceeds ceiling {ceiling}")]
    SuspiciousGasEstimate { estimate: u64, ceiling: u64 },

    #[error("bundle simulation failed: {0}")]
    SimulationFailure(String),

    #[error("relay request failed: {0}")]
    RelayFailure(String),

    #[error("no arbitrage submitted this cycle")]
    NoArbitrageSubmitted,
}
