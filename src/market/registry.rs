//! Market Registry
//!
//! Loads the static venue list from a JSON file and instantiates markets,
//! grouped by the token they trade against the reference asset. Malformed
//! or unsupported entries are skipped with a warning rather than aborting
//! startup.

use crate::market::uniswap_v2::UniswapV2Market;
use crate::market::Market;
use crate::types::MarketsByToken;
use alloy::primitives::Address;
use alloy::providers::Provider;
use anyhow::{Context, Result};
use serde::Deserialize;
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

#[derive(Debug, Deserialize)]
pub struct MarketsFile {
    pub markets: Vec<MarketEntry>,
}

#[derive(Debug, Deserialize)]
pub struct MarketEntry {
    pub protocol: String,
    pub pair_address: String,
    pub router: String,
    /// The token this venue trades against the reference asset.
    pub token: String,
    #[serde(default = "default_status")]
    pub status: String,
    #[serde(default)]
    pub notes: Option<String>,
}

fn default_status() -> String {
    "active".to_string()
}

impl MarketsFile {
    pub fn parse(raw: &str) -> Result<Self> {
        serde_json::from_str(raw).context("failed to parse markets file")
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read markets file {}", path.display()))?;
        Self::parse(&raw)
    }
}

/// Supported pair/router ABIs. Forks sharing the V2 interface all map to the
/// same market implementation.
fn supported_protocol(protocol: &str) -> bool {
    matches!(protocol, "UniswapV2" | "SushiswapV2")
}

/// Instantiate every active entry and group the venues by token. Entries
/// that fail address parsing, name an unknown protocol, or fail the
/// on-chain token lookup are skipped.
pub async fn build_markets_by_token<P: Provider + 'static>(
    file: &MarketsFile,
    provider: Arc<P>,
    reference_token: Address,
) -> MarketsByToken {
    let mut by_token: MarketsByToken = HashMap::new();

    for entry in &file.markets {
        if entry.status != "active" {
            continue;
        }
        if !supported_protocol(&entry.protocol) {
            warn!(
                "skipping market {}: unsupported protocol {}",
                entry.pair_address, entry.protocol
            );
            continue;
        }
        let parsed = (
            entry.pair_address.parse::<Address>(),
            entry.router.parse::<Address>(),
            entry.token.parse::<Address>(),
        );
        let (pair, router, token) = match parsed {
            (Ok(p), Ok(r), Ok(t)) => (p, r, t),
            _ => {
                warn!("skipping market {}: invalid address", entry.pair_address);
                continue;
            }
        };
        if token == reference_token {
            warn!(
                "skipping market {}: token equals reference asset",
                entry.pair_address
            );
            continue;
        }

        match UniswapV2Market::new(pair, router, entry.protocol.clone(), provider.clone()).await {
            Ok(market) => {
                by_token
                    .entry(token)
                    .or_default()
                    .push(Arc::new(market) as Arc<dyn Market>);
            }
            Err(e) => {
                warn!("skipping market {}: {:#}", entry.pair_address, e);
            }
        }
    }

    let venues: usize = by_token.values().map(Vec::len).sum();
    info!("loaded {} venues across {} tokens", venues, by_token.len());
    by_token
}
