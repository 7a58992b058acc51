//! Log line formatting for opportunities and submissions. Pure string
//! builders so the log surface can be tested without a node.

use crate::relay::SimulatedBundle;
use crate::types::ArbitrageOpportunity;
use alloy::primitives::utils::format_units;
use alloy::primitives::{I256, U256};

pub fn format_profit(profit: I256) -> String {
    format_units(profit, 18).unwrap_or_else(|_| profit.to_string())
}

pub fn format_reference_amount(amount: U256) -> String {
    format_units(amount, 18).unwrap_or_else(|_| amount.to_string())
}

pub fn format_opportunity(opportunity: &ArbitrageOpportunity) -> String {
    format!(
        "profit {} on token {}: buy {} via {} {}, sell via {} {}",
        format_profit(opportunity.profit),
        opportunity.token_address,
        format_reference_amount(opportunity.volume),
        opportunity.buy_from_market.protocol(),
        opportunity.buy_from_market.market_address(),
        opportunity.sell_to_market.protocol(),
        opportunity.sell_to_market.market_address(),
    )
}

/// Short venue-pair tag for skip warnings.
pub fn describe_market_pair(opportunity: &ArbitrageOpportunity) -> String {
    format!(
        "{} {} -> {} {}",
        opportunity.buy_from_market.protocol(),
        opportunity.buy_from_market.market_address(),
        opportunity.sell_to_market.protocol(),
        opportunity.sell_to_market.market_address(),
    )
}

pub fn format_submission(simulation: &SimulatedBundle) -> String {
    let gas_price = format_units(simulation.effective_gas_price(), "gwei")
        .unwrap_or_else(|_| simulation.effective_gas_price().to_string());
    format!(
        "bundle simulated: {} to producer at {} gwei effective",
        format_reference_amount(simulation.coinbase_paid()),
        gas_price,
    )
}
