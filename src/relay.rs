//! Private Relay Client
//!
//! Bundles are signed locally, then simulated and submitted over an
//! authenticated JSON-RPC endpoint. Every request body is hashed and signed
//! with a dedicated relay identity; the signature travels in the
//! `X-Flashbots-Signature` header and is how the relay tracks reputation.

use alloy::consensus::{SignableTransaction, TxEip1559, TxEnvelope};
use alloy::eips::eip2718::Encodable2718;
use alloy::hex;
use alloy::network::TxSignerSync;
use alloy::primitives::{keccak256, Bytes, U256};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::SignerSync;
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use std::fmt;
use tracing::debug;

pub const DEFAULT_RELAY_URL: &str = "https://relay.flashbots.net";

/// Relay-side bundle operations, behind a trait so the executor can be
/// driven against a scripted relay in tests.
#[async_trait]
pub trait Relay: Send + Sync {
    /// Sign each transaction with the execution identity and return the
    /// raw EIP-2718 encoded bundle.
    async fn sign_bundle(&self, txs: Vec<TxEip1559>) -> Result<Vec<Bytes>>;

    /// Simulate the bundle on top of `block_number`'s parent state.
    async fn simulate_bundle(&self, bundle: &[Bytes], block_number: u64)
        -> Result<SimulatedBundle>;

    /// Submit the bundle targeting `block_number`.
    async fn send_raw_bundle(&self, bundle: &[Bytes], block_number: u64) -> Result<()>;
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedBundle {
    /// Wei paid to the producer, as a decimal string.
    #[serde(default)]
    pub coinbase_diff: String,
    #[serde(default)]
    pub total_gas_used: u64,
    #[serde(default)]
    pub results: Vec<SimulatedTransaction>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SimulatedTransaction {
    #[serde(default)]
    pub tx_hash: String,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub revert: Option<String>,
}

impl SimulatedBundle {
    /// The first transaction that errored or reverted, if any.
    pub fn first_revert(&self) -> Option<&SimulatedTransaction> {
        self.results
            .iter()
            .find(|tx| tx.error.is_some() || tx.revert.is_some())
    }

    pub fn coinbase_paid(&self) -> U256 {
        U256::from_str_radix(self.coinbase_diff.trim(), 10).unwrap_or(U256::ZERO)
    }

    /// Producer payment per unit of gas, the relay's bundle ranking metric.
    pub fn effective_gas_price(&self) -> U256 {
        if self.total_gas_used == 0 {
            return U256::ZERO;
        }
        self.coinbase_paid() / U256::from(self.total_gas_used)
    }
}

impl fmt::Display for SimulatedTransaction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (&self.error, &self.revert) {
            (Some(error), _) => write!(f, "tx {} failed: {}", self.tx_hash, error),
            (None, Some(revert)) => write!(f, "tx {} reverted: {}", self.tx_hash, revert),
            (None, None) => write!(f, "tx {} ok", self.tx_hash),
        }
    }
}

/// Header value authenticating a relay request: the signer address and its
/// signature over the keccak hash of the body, rendered as text.
fn flashbots_signature(signer: &PrivateKeySigner, body: &str) -> Result<String> {
    let digest = format!("0x{}", hex::encode(keccak256(body.as_bytes())));
    let signature = signer
        .sign_message_sync(digest.as_bytes())
        .context("failed to sign relay request")?;
    Ok(format!(
        "{:?}:0x{}",
        signer.address(),
        hex::encode(signature.as_bytes())
    ))
}

fn bundle_params(bundle: &[Bytes], block_number: u64) -> Value {
    json!([{
        "txs": bundle.iter().map(hex::encode_prefixed).collect::<Vec<_>>(),
        "blockNumber": format!("0x{block_number:x}"),
    }])
}

pub struct FlashbotsRelay {
    relay_url: String,
    /// Signs the bundle transactions.
    tx_signer: PrivateKeySigner,
    /// Signs request headers; a separate reputation identity.
    relay_signer: PrivateKeySigner,
    client: reqwest::Client,
}

impl FlashbotsRelay {
    pub fn new(
        relay_url: impl Into<String>,
        tx_signer: PrivateKeySigner,
        relay_signer: PrivateKeySigner,
    ) -> Self {
        Self {
            relay_url: relay_url.into(),
            tx_signer,
            relay_signer,
            client: reqwest::Client::new(),
        }
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": 1,
            "method": method,
            "params": params,
        })
        .to_string();
        let signature = flashbots_signature(&self.relay_signer, &body)?;

        debug!("relay request {} to {}", method, self.relay_url);
        let response: Value = self
            .client
            .post(&self.relay_url)
            .header("X-Flashbots-Signature", signature)
            .header(reqwest::header::CONTENT_TYPE, "application/json")
            .body(body)
            .send()
            .await
            .context("relay request failed")?
            .json()
            .await
            .context("relay returned malformed JSON")?;

        if let Some(error) = response.get("error") {
            return Err(anyhow!("relay error on {}: {}", method, error));
        }
        Ok(response.get("result").cloned().unwrap_or(Value::Null))
    }
}

#[async_trait]
impl Relay for FlashbotsRelay {
    async fn sign_bundle(&self, txs: Vec<TxEip1559>) -> Result<Vec<Bytes>> {
        let mut raw = Vec::with_capacity(txs.len());
        for mut tx in txs {
            let signature = self
                .tx_signer
                .sign_transaction_sync(&mut tx)
                .context("failed to sign bundle transaction")?;
            let signed: TxEnvelope = tx.into_signed(signature).into();
            raw.push(signed.encoded_2718().into());
        }
        Ok(raw)
    }

    async fn simulate_bundle(
        &self,
        bundle: &[Bytes],
        block_number: u64,
    ) -> Result<SimulatedBundle> {
        let mut params = bundle_params(bundle, block_number);
        params[0]["stateBlockNumber"] = json!("latest");
        let result = self.request("eth_callBundle", params).await?;
        serde_json::from_value(result).context("unexpected eth_callBundle response")
    }

    async fn send_raw_bundle(&self, bundle: &[Bytes], block_number: u64) -> Result<()> {
        self.request("eth_sendBundle", bundle_params(bundle, block_number))
            .await?;
        Ok(())
    }
}
