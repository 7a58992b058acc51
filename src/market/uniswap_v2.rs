//! Uniswap V2 Market
//!
//! Venue implementation for Uniswap V2 style constant-product pairs
//! (Uniswap, Sushiswap and other forks sharing the pair/router ABI).
//! Quotes go through the router so pricing stays on-chain; only the raw
//! `swap` calldata is assembled locally.

use crate::contracts::{IUniswapV2Pair, IUniswapV2Router02};
use crate::market::{Market, MultipleCallData};
use alloy::primitives::{Address, Bytes, U256};
use alloy::providers::Provider;
use alloy::sol_types::SolCall;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

pub struct UniswapV2Market<P> {
    pair_address: Address,
    router_address: Address,
    token0: Address,
    token1: Address,
    protocol: String,
    provider: Arc<P>,
}

impl<P> fmt::Debug for UniswapV2Market<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UniswapV2Market")
            .field("pair", &self.pair_address)
            .field("router", &self.router_address)
            .field("protocol", &self.protocol)
            .finish()
    }
}

/// Order a token pair the way the V2 factory does (ascending by address).
pub fn sorted_tokens(a: Address, b: Address) -> (Address, Address) {
    if a < b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Encode a pair `swap` call paying out `amount_out` of the token opposite
/// `token_in`, to `recipient`. The amount lands on the token0 or token1
/// side depending on pair ordering.
pub fn swap_calldata(
    token0: Address,
    token_in: Address,
    amount_out: U256,
    recipient: Address,
) -> Bytes {
    let (amount0_out, amount1_out) = if token_in == token0 {
        (U256::ZERO, amount_out)
    } else {
        (amount_out, U256::ZERO)
    };
    IUniswapV2Pair::swapCall {
        amount0Out: amount0_out,
        amount1Out: amount1_out,
        to: recipient,
        data: Bytes::new(),
    }
    .abi_encode()
    .into()
}

impl<P: Provider + 'static> UniswapV2Market<P> {
    /// Build a market from a known pair, reading token ordering on-chain.
    pub async fn new(
        pair_address: Address,
        router_address: Address,
        protocol: impl Into<String>,
        provider: Arc<P>,
    ) -> Result<Self> {
        let pair = IUniswapV2Pair::new(pair_address, provider.clone());
        let token0 = pair
            .token0()
            .call()
            .await
            .context("failed to read token0")?;
        let token1 = pair
            .token1()
            .call()
            .await
            .context("failed to read token1")?;
        Ok(Self {
            pair_address,
            router_address,
            token0,
            token1,
            protocol: protocol.into(),
            provider,
        })
    }

    fn path_for(&self, token_in: Address, token_out: Address) -> Result<Vec<Address>> {
        let known = |t: Address| t == self.token0 || t == self.token1;
        if !known(token_in) || !known(token_out) || token_in == token_out {
            return Err(anyhow!(
                "pair {} does not trade {} -> {}",
                self.pair_address,
                token_in,
                token_out
            ));
        }
        Ok(vec![token_in, token_out])
    }

    fn other_token(&self, token_in: Address) -> Address {
        if token_in == self.token0 {
            self.token1
        } else {
            self.token0
        }
    }
}

#[async_trait]
impl<P: Provider + 'static> Market for UniswapV2Market<P> {
    fn market_address(&self) -> Address {
        self.pair_address
    }

    fn protocol(&self) -> &str {
        &self.protocol
    }

    fn tokens(&self) -> (Address, Address) {
        (self.token0, self.token1)
    }

    async fn get_tokens_out(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<U256> {
        let path = self.path_for(token_in, token_out)?;
        let router = IUniswapV2Router02::new(self.router_address, self.provider.clone());
        let amounts = router
            .getAmountsOut(amount_in, path)
            .call()
            .await
            .context("getAmountsOut failed")?;
        amounts
            .last()
            .copied()
            .ok_or_else(|| anyhow!("router returned empty amounts"))
    }

    async fn get_tokens_in(
        &self,
        token_in: Address,
        token_out: Address,
        amount_out: U256,
    ) -> Result<U256> {
        let path = self.path_for(token_in, token_out)?;
        let router = IUniswapV2Router02::new(self.router_address, self.provider.clone());
        let amounts = router
            .getAmountsIn(amount_out, path)
            .call()
            .await
            .context("getAmountsIn failed")?;
        amounts
            .first()
            .copied()
            .ok_or_else(|| anyhow!("router returned empty amounts"))
    }

    async fn sell_tokens(
        &self,
        token_in: Address,
        amount_in: U256,
        recipient: Address,
    ) -> Result<Bytes> {
        let token_out = self.other_token(token_in);
        let amount_out = self.get_tokens_out(token_in, token_out, amount_in).await?;
        Ok(swap_calldata(self.token0, token_in, amount_out, recipient))
    }

    async fn sell_tokens_to_next_market(
        &self,
        token_in: Address,
        amount_in: U256,
        next: &dyn Market,
    ) -> Result<MultipleCallData> {
        let data = self
            .sell_tokens(token_in, amount_in, next.market_address())
            .await?;
        Ok(MultipleCallData {
            targets: vec![self.pair_address],
            data: vec![data],
        })
    }
}
