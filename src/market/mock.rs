//! Test doubles for the `Market` trait. Quotes are driven by closures so a
//! test can describe a venue as a price function; swap calldata is replaced
//! with recognizable markers that assertions can decode.

use crate::market::{Market, MultipleCallData};
use alloy::primitives::{Address, Bytes, U256};
use anyhow::Result;
use async_trait::async_trait;
use std::fmt;

type QuoteFn = Box<dyn Fn(Address, Address, U256) -> Result<U256> + Send + Sync>;

pub(crate) struct MockMarket {
    address: Address,
    protocol: &'static str,
    tokens: (Address, Address),
    quote_out: QuoteFn,
    quote_in: QuoteFn,
}

impl fmt::Debug for MockMarket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MockMarket")
            .field("address", &self.address)
            .field("protocol", &self.protocol)
            .finish()
    }
}

impl MockMarket {
    pub(crate) fn new(address: Address, tokens: (Address, Address)) -> Self {
        Self {
            address,
            protocol: "MockV2",
            tokens,
            quote_out: Box::new(|_, _, amount| Ok(amount)),
            quote_in: Box::new(|_, _, amount| Ok(amount)),
        }
    }

    pub(crate) fn with_quote_out(
        mut self,
        f: impl Fn(Address, Address, U256) -> Result<U256> + Send + Sync + 'static,
    ) -> Self {
        self.quote_out = Box::new(f);
        self
    }

    #[allow(dead_code)]
    pub(crate) fn with_quote_in(
        mut self,
        f: impl Fn(Address, Address, U256) -> Result<U256> + Send + Sync + 'static,
    ) -> Self {
        self.quote_in = Box::new(f);
        self
    }
}

#[async_trait]
impl Market for MockMarket {
    fn market_address(&self) -> Address {
        self.address
    }

    fn protocol(&self) -> &str {
        self.protocol
    }

    fn tokens(&self) -> (Address, Address) {
        self.tokens
    }

    async fn get_tokens_out(
        &self,
        token_in: Address,
        token_out: Address,
        amount_in: U256,
    ) -> Result<U256> {
        (self.quote_out)(token_in, token_out, amount_in)
    }

    async fn get_tokens_in(
        &self,
        token_in: Address,
        token_out: Address,
        amount_out: U256,
    ) -> Result<U256> {
        (self.quote_in)(token_in, token_out, amount_out)
    }

    async fn sell_tokens(
        &self,
        _token_in: Address,
        _amount_in: U256,
        recipient: Address,
    ) -> Result<Bytes> {
        // Marker payload: the recipient address, so tests can check routing.
        Ok(Bytes::copy_from_slice(recipient.as_slice()))
    }

    async fn sell_tokens_to_next_market(
        &self,
        _token_in: Address,
        _amount_in: U256,
        next: &dyn Market,
    ) -> Result<MultipleCallData> {
        Ok(MultipleCallData {
            targets: vec![self.address],
            data: vec![Bytes::copy_from_slice(next.market_address().as_slice())],
        })
    }
}
