//! Trade Executor
//!
//! Turns detected opportunities into composite two-leg transactions, gas
//! checks and simulates them against the relay, and races the signed bundle
//! into the next two blocks. Attempts run in the order given; the first
//! successful submission wins and the rest are abandoned.

use crate::contracts::IArbitrageExecutor;
use crate::errors::ArbitrageError;
use crate::relay::Relay;
use crate::reporting::{describe_market_pair, format_submission};
use crate::types::ArbitrageOpportunity;
use alloy::consensus::TxEip1559;
use alloy::primitives::{Address, Bytes, TxKind, I256, U256};
use alloy::providers::Provider;
use alloy::rpc::types::{TransactionInput, TransactionRequest};
use alloy::sol_types::SolCall;
use anyhow::{Context, Result};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};

/// Estimates above this are treated as a mispriced or hostile pool.
const GAS_ESTIMATE_CEILING: u64 = 1_400_000;

/// Gas limit placed on the draft transaction sent for estimation.
const DRAFT_GAS_LIMIT: u64 = 1_000_000;

/// The node-facing surface the executor needs, kept narrow so tests can
/// substitute a scripted double.
#[async_trait]
pub trait ExecutionEnvironment: Send + Sync {
    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64>;
    async fn next_nonce(&self, address: Address) -> Result<u64>;
}

pub struct RpcEnvironment<P> {
    provider: Arc<P>,
}

impl<P> RpcEnvironment<P> {
    pub fn new(provider: Arc<P>) -> Self {
        Self { provider }
    }
}

#[async_trait]
impl<P: Provider + 'static> ExecutionEnvironment for RpcEnvironment<P> {
    async fn estimate_gas(&self, tx: TransactionRequest) -> Result<u64> {
        self.provider
            .estimate_gas(tx)
            .await
            .context("eth_estimateGas failed")
    }

    async fn next_nonce(&self, address: Address) -> Result<u64> {
        self.provider
            .get_transaction_count(address)
            .await
            .context("eth_getTransactionCount failed")
    }
}

pub struct TradeExecutor<E, R> {
    env: Arc<E>,
    relay: Arc<R>,
    executor_contract: Address,
    sender: Address,
    chain_id: u64,
    miner_reward_percentage: u64,
    reference_token: Address,
}

impl<E: ExecutionEnvironment, R: Relay> TradeExecutor<E, R> {
    pub fn new(
        env: Arc<E>,
        relay: Arc<R>,
        executor_contract: Address,
        sender: Address,
        chain_id: u64,
        miner_reward_percentage: u64,
        reference_token: Address,
    ) -> Self {
        Self {
            env,
            relay,
            executor_contract,
            sender,
            chain_id,
            miner_reward_percentage,
            reference_token,
        }
    }

    /// Attempt opportunities in order until one bundle is submitted.
    /// Failures along the way are logged and skipped; running out of
    /// opportunities is the hard error.
    pub async fn take_crossed_markets(
        &self,
        opportunities: &[ArbitrageOpportunity],
        block_number: u64,
    ) -> Result<(), ArbitrageError> {
        for opportunity in opportunities {
            match self.execute_opportunity(opportunity, block_number).await {
                Ok(()) => return Ok(()),
                Err(e) => {
                    warn!(
                        "skipping {}: {}",
                        describe_market_pair(opportunity),
                        e
                    );
                }
            }
        }
        Err(ArbitrageError::NoArbitrageSubmitted)
    }

    async fn execute_opportunity(
        &self,
        opportunity: &ArbitrageOpportunity,
        block_number: u64,
    ) -> Result<(), ArbitrageError> {
        let buy = opportunity.buy_from_market.as_ref();
        let sell = opportunity.sell_to_market.as_ref();

        // Buy leg: reference asset into the token, proceeds routed straight
        // to the sell venue.
        let buy_calls = buy
            .sell_tokens_to_next_market(self.reference_token, opportunity.volume, sell)
            .await
            .map_err(|e| ArbitrageError::QuoteFailure {
                market: buy.market_address(),
                reason: format!("{e:#}"),
            })?;

        // Sell leg needs the exact token amount the buy leg will deliver.
        let intermediate = buy
            .get_tokens_out(
                self.reference_token,
                opportunity.token_address,
                opportunity.volume,
            )
            .await
            .map_err(|e| ArbitrageError::QuoteFailure {
                market: buy.market_address(),
                reason: format!("{e:#}"),
            })?;
        let sell_data = sell
            .sell_tokens(
                opportunity.token_address,
                intermediate,
                self.executor_contract,
            )
            .await
            .map_err(|e| ArbitrageError::QuoteFailure {
                market: sell.market_address(),
                reason: format!("{e:#}"),
            })?;

        let mut targets = buy_calls.targets;
        let mut payloads = buy_calls.data;
        targets.push(sell.market_address());
        payloads.push(sell_data);

        let calldata: Bytes = IArbitrageExecutor::executeArbitrageCall {
            volumeIn: opportunity.volume,
            minerPayment: self.miner_payment(opportunity.profit),
            targets,
            payloads,
        }
        .abi_encode()
        .into();

        let nonce = self
            .env
            .next_nonce(self.sender)
            .await
            .map_err(|e| ArbitrageError::EstimationFailure(format!("{e:#}")))?;

        // Zero-fee draft; the relay only cares that the bundle simulates.
        let draft = TransactionRequest {
            from: Some(self.sender),
            to: Some(TxKind::Call(self.executor_contract)),
            gas: Some(DRAFT_GAS_LIMIT),
            max_fee_per_gas: Some(0),
            max_priority_fee_per_gas: Some(0),
            value: Some(U256::ZERO),
            input: TransactionInput::new(calldata.clone()),
            nonce: Some(nonce),
            chain_id: Some(self.chain_id),
            ..Default::default()
        };

        let estimate = self
            .env
            .estimate_gas(draft)
            .await
            .map_err(|e| ArbitrageError::EstimationFailure(format!("{e:#}")))?;
        if estimate > GAS_ESTIMATE_CEILING {
            return Err(ArbitrageError::SuspiciousGasEstimate {
                estimate,
                ceiling: GAS_ESTIMATE_CEILING,
            });
        }

        let tx = TxEip1559 {
            chain_id: self.chain_id,
            nonce,
            gas_limit: estimate * 2,
            max_fee_per_gas: 0,
            max_priority_fee_per_gas: 0,
            to: TxKind::Call(self.executor_contract),
            value: U256::ZERO,
            access_list: Default::default(),
            input: calldata,
        };

        let signed = self
            .relay
            .sign_bundle(vec![tx])
            .await
            .map_err(|e| ArbitrageError::RelayFailure(format!("{e:#}")))?;

        let simulation = self
            .relay
            .simulate_bundle(&signed, block_number + 1)
            .await
            .map_err(|e| ArbitrageError::SimulationFailure(format!("{e:#}")))?;
        if let Some(reverted) = simulation.first_revert() {
            return Err(ArbitrageError::SimulationFailure(reverted.to_string()));
        }

        info!("{}", format_submission(&simulation));

        // Race the bundle into the next two blocks; delivery failures only
        // cost us this cycle, so log and move on.
        let (first, second) = tokio::join!(
            self.relay.send_raw_bundle(&signed, block_number + 1),
            self.relay.send_raw_bundle(&signed, block_number + 2),
        );
        for (target, result) in [(block_number + 1, first), (block_number + 2, second)] {
            if let Err(e) = result {
                warn!("bundle send for block {} failed: {:#}", target, e);
            }
        }
        Ok(())
    }

    /// Portion of the expected profit forwarded to the block producer.
    fn miner_payment(&self, profit: I256) -> U256 {
        let profit = U256::try_from(profit).unwrap_or(U256::ZERO);
        profit * U256::from(self.miner_reward_percentage) / U256::from(100u64)
    }
}
