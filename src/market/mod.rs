//! Market Abstraction
//!
//! A `Market` is a single venue where the reference asset trades against a
//! token. The finder only needs quotes; the executor additionally needs the
//! venue to encode its own swap calldata so legs can be chained through the
//! executor contract without the bot knowing venue internals.

use alloy::primitives::{Address, Bytes, U256};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

pub mod registry;
pub mod uniswap_v2;

#[cfg(test)]
pub(crate) mod mock;

/// Calldata for one or more contract calls making up a swap leg.
/// `targets[i]` receives `data[i]`; both vectors always have equal length.
#[derive(Debug, Clone, Default)]
pub struct MultipleCallData {
    pub targets: Vec<Address>,
    pub data: Vec<Bytes>,
}

#[async_trait]
pub trait Market: Send + Sync + fmt::Debug {
    /// Address tokens must be transferred to for this venue to swap them.
    fn market_address(&self) -> Address;

    /// Human-readable protocol tag, e.g. "UniswapV2".
    fn protocol(&self) -> &str;

    /// The two assets this venue trades, in venue order.
    fn tokens(&self) -> (Address, Address);

    /// Amount of `token_out` received for selling `amount_in` of `token_in`.
    async fn get_tokens_out(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<U256>;

    /// Amount of `token_in` needed to receive `amount_out` of `token_out`.
    async fn get_tokens_in(
        &self,
        token_in: Address,
        token_out: Address,
        amount_out: U256,
    ) -> Result<U256>;

    /// Calldata selling `amount_in` of `token_in` on this venue, with the
    /// proceeds sent to `recipient`. Assumes the input tokens have already
    /// been transferred to `market_address()`.
    async fn sell_tokens(
        &self,
        token_in: Address,
        amount_in: U256,
        recipient: Address,
    ) -> Result<Bytes>;

    /// Like `sell_tokens`, but routes the proceeds directly into `next`
    /// so the two legs can execute back to back in one transaction.
    async fn sell_tokens_to_next_market(
        &self,
        token_in: Address,
        amount_in: U256,
        next: &dyn Market,
    ) -> Result<MultipleCallData>;
}
