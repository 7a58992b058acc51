//! Opportunity Detector
//!
//! Scans every venue pair trading a token against the reference asset for
//! price crossings, then sizes each crossing with a coarse volume ladder
//! plus a single midpoint refinement. Quotes come straight from the venues;
//! the detector holds no pricing math of its own.

use crate::market::Market;
use crate::types::{ArbitrageOpportunity, MarketsByToken};
use alloy::primitives::{Address, I256, U256};
use anyhow::Result;
use futures::future::join_all;
use once_cell::sync::Lazy;
use std::sync::Arc;
use tracing::debug;

pub static ETHER: Lazy<U256> = Lazy::new(|| U256::from(10u64).pow(U256::from(18u64)));

/// Reference-asset volume used to probe whether a pair of venues crosses.
static CROSSING_PROBE_VOLUME: Lazy<U256> = Lazy::new(|| *ETHER / U256::from(100u64));

/// Candidate volumes for the search, ascending. Must stay sorted.
static TEST_VOLUMES: Lazy<Vec<U256>> = Lazy::new(|| {
    vec![
        *ETHER / U256::from(100u64),
        *ETHER / U256::from(10u64),
        *ETHER / U256::from(6u64),
        *ETHER / U256::from(4u64),
        *ETHER / U256::from(2u64),
        *ETHER,
        *ETHER * U256::from(2u64),
        *ETHER * U256::from(5u64),
        *ETHER * U256::from(10u64),
    ]
});

/// Opportunities must strictly exceed this to be reported.
static MIN_PROFIT: Lazy<I256> = Lazy::new(|| I256::from_raw(*ETHER / U256::from(1000u64)));

fn signed(value: U256) -> I256 {
    I256::try_from(value).unwrap_or(I256::MAX)
}

struct PricedMarket {
    market: Arc<dyn Market>,
    /// Reference asset needed to buy the probe amount of token here.
    buy_price: U256,
    /// Reference asset received for selling the probe amount of token here.
    sell_price: U256,
}

/// Ordered venue pairs where buying on the first and selling on the second
/// looks profitable at the probe volume.
fn crossed_pairs(priced: &[PricedMarket]) -> Vec<(Arc<dyn Market>, Arc<dyn Market>)> {
    let mut pairs = Vec::new();
    for buy in priced {
        for sell in priced {
            if Arc::ptr_eq(&buy.market, &sell.market) {
                continue;
            }
            if sell.sell_price > buy.buy_price {
                pairs.push((buy.market.clone(), sell.market.clone()));
            }
        }
    }
    pairs
}

pub struct OpportunityDetector {
    reference_token: Address,
}

impl OpportunityDetector {
    pub fn new(reference_token: Address) -> Self {
        Self { reference_token }
    }

    /// Scan all tokens and return every opportunity clearing the minimum
    /// profit threshold, sorted by profit descending.
    pub async fn evaluate_markets(
        &self,
        markets_by_token: &MarketsByToken,
    ) -> Vec<ArbitrageOpportunity> {
        let mut opportunities = Vec::new();
        for (token, markets) in markets_by_token {
            let priced = self.price_markets(*token, markets).await;
            for (buy, sell) in crossed_pairs(&priced) {
                let best = self
                    .search_volumes(*token, buy.as_ref(), sell.as_ref())
                    .await;
                if let Some((volume, profit)) = best {
                    if profit > *MIN_PROFIT {
                        opportunities.push(ArbitrageOpportunity {
                            profit,
                            volume,
                            token_address: *token,
                            buy_from_market: buy.clone(),
                            sell_to_market: sell.clone(),
                        });
                    }
                }
            }
        }
        opportunities.sort_by(|a, b| b.profit.cmp(&a.profit));
        opportunities
    }

    /// Probe every venue at the crossing volume, concurrently. A venue whose
    /// quote fails is dropped from this token's scan.
    async fn price_markets(
        &self,
        token: Address,
        markets: &[Arc<dyn Market>],
    ) -> Vec<PricedMarket> {
        let probes = markets.iter().map(|market| async move {
            let buy = market
                .get_tokens_in(self.reference_token, token, *CROSSING_PROBE_VOLUME)
                .await;
            let sell = market
                .get_tokens_out(token, self.reference_token, *CROSSING_PROBE_VOLUME)
                .await;
            match (buy, sell) {
                (Ok(buy_price), Ok(sell_price)) => Some(PricedMarket {
                    market: market.clone(),
                    buy_price,
                    sell_price,
                }),
                (Err(e), _) | (_, Err(e)) => {
                    debug!(
                        "dropping venue {} from scan: {:#}",
                        market.market_address(),
                        e
                    );
                    None
                }
            }
        });
        join_all(probes).await.into_iter().flatten().collect()
    }

    /// Walk the volume ladder bottom up, keeping the best (volume, profit).
    /// The first strictly worse candidate triggers one midpoint probe between
    /// the best volume and the declining one, then the scan stops. Returns
    /// `None` when every tested profit was non-positive.
    async fn search_volumes(
        &self,
        token: Address,
        buy: &dyn Market,
        sell: &dyn Market,
    ) -> Option<(U256, I256)> {
        let mut best: Option<(U256, I256)> = None;
        for &volume in TEST_VOLUMES.iter() {
            let profit = match self.roundtrip_profit(token, buy, sell, volume).await {
                Ok(p) => p,
                Err(e) => {
                    debug!("quote failed at volume {}: {:#}", volume, e);
                    continue;
                }
            };
            match &mut best {
                None => best = Some((volume, profit)),
                Some((best_volume, best_profit)) => {
                    // Ties go to the larger volume.
                    if profit >= *best_profit {
                        *best_volume = volume;
                        *best_profit = profit;
                    } else {
                        let midpoint = (*best_volume + volume) / U256::from(2u64);
                        if let Ok(mid_profit) =
                            self.roundtrip_profit(token, buy, sell, midpoint).await
                        {
                            if mid_profit > *best_profit {
                                *best_volume = midpoint;
                                *best_profit = mid_profit;
                            }
                        }
                        break;
                    }
                }
            }
        }
        best.filter(|(_, profit)| profit.is_positive())
    }

    /// Profit of buying the token with `volume` reference asset on `buy` and
    /// selling the whole position on `sell`.
    async fn roundtrip_profit(
        &self,
        token: Address,
        buy: &dyn Market,
        sell: &dyn Market,
        volume: U256,
    ) -> Result<I256> {
        let tokens_bought = buy.get_tokens_out(self.reference_token, token, volume).await?;
        let proceeds = sell
            .get_tokens_out(token, self.reference_token, tokens_bought)
            .await?;
        Ok(signed(proceeds) - signed(volume))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::market::mock::MockMarket;
    use anyhow::anyhow;
    use std::collections::HashMap;

    fn addr(b: u8) -> Address {
        Address::repeat_byte(b)
    }

    fn eth(num: u64, den: u64) -> U256 {
        *ETHER * U256::from(num) / U256::from(den)
    }

    const REFERENCE: u8 = 0xee;
    const TOKEN: u8 = 0x11;

    fn markets_for(
        token: Address,
        markets: Vec<Arc<dyn Market>>,
    ) -> MarketsByToken {
        let mut by_token = HashMap::new();
        by_token.insert(token, markets);
        by_token
    }

    fn identity_market(address: Address) -> Arc<dyn Market> {
        Arc::new(MockMarket::new(address, (addr(REFERENCE), addr(TOKEN))))
    }

    /// Venue whose token sells add `delta(volume)` reference on top of the
    /// amount in; buy quotes stay identity.
    fn premium_market(
        address: Address,
        delta: impl Fn(U256) -> I256 + Send + Sync + 'static,
    ) -> Arc<dyn Market> {
        let reference = addr(REFERENCE);
        Arc::new(
            MockMarket::new(address, (reference, addr(TOKEN)))
                .with_quote_out(move |_, token_out, amount| {
                    if token_out == reference {
                        let adjusted = signed(amount) + delta(amount);
                        Ok(U256::try_from(adjusted).unwrap_or(U256::ZERO))
                    } else {
                        Ok(amount)
                    }
                }),
        )
    }

    #[tokio::test]
    async fn detects_crossed_pair_at_reference_volume() {
        let detector = OpportunityDetector::new(addr(REFERENCE));
        let buy = identity_market(addr(0x01));
        // Pays a 25% premium at the probe volume, then prices collapse.
        let sell = premium_market(addr(0x02), |volume| {
            if volume <= eth(1, 100) {
                signed(volume) / I256::from_raw(U256::from(4u64))
            } else {
                -(signed(volume) / I256::from_raw(U256::from(5u64)))
            }
        });

        let markets = markets_for(addr(TOKEN), vec![buy, sell]);
        let opportunities = detector.evaluate_markets(&markets).await;

        assert_eq!(opportunities.len(), 1);
        let opp = &opportunities[0];
        assert_eq!(opp.volume, eth(1, 100));
        assert_eq!(opp.profit, signed(eth(1, 400)));
        assert_eq!(opp.token_address, addr(TOKEN));
        assert_eq!(opp.buy_from_market.market_address(), addr(0x01));
        assert_eq!(opp.sell_to_market.market_address(), addr(0x02));
    }

    #[tokio::test]
    async fn identical_prices_produce_no_opportunities() {
        let detector = OpportunityDetector::new(addr(REFERENCE));
        let markets = markets_for(
            addr(TOKEN),
            vec![identity_market(addr(0x01)), identity_market(addr(0x02))],
        );
        assert!(detector.evaluate_markets(&markets).await.is_empty());
    }

    #[tokio::test]
    async fn tie_in_profit_prefers_larger_volume() {
        let detector = OpportunityDetector::new(addr(REFERENCE));
        let flat = signed(eth(2, 1000));
        let buy = identity_market(addr(0x01));
        let sell = premium_market(addr(0x02), move |_| flat);

        let markets = markets_for(addr(TOKEN), vec![buy, sell]);
        let opportunities = detector.evaluate_markets(&markets).await;

        assert_eq!(opportunities.len(), 1);
        // Flat profit across the whole ladder: the last (largest) volume wins.
        assert_eq!(opportunities[0].volume, eth(10, 1));
        assert_eq!(opportunities[0].profit, flat);
    }

    #[tokio::test]
    async fn midpoint_refinement_stops_the_scan() {
        let detector = OpportunityDetector::new(addr(REFERENCE));
        let buy = identity_market(addr(0x01));
        let sell = premium_market(addr(0x02), |volume| {
            let table: [(U256, i64); 7] = [
                (eth(1, 100), 2),
                (eth(1, 10), 3),
                (eth(1, 6), 4),
                (eth(1, 4), 5),
                (eth(1, 2), 10),
                (eth(3, 4), 20),
                (eth(1, 1), 8),
            ];
            for (v, millis) in table {
                if volume == v {
                    return signed(eth(millis as u64, 1000));
                }
            }
            panic!("unexpected quote at volume {volume}");
        });

        let markets = markets_for(addr(TOKEN), vec![buy, sell]);
        let opportunities = detector.evaluate_markets(&markets).await;

        // Profit declines at 1 ether; the midpoint of (0.5, 1) wins and the
        // larger candidates are never quoted.
        assert_eq!(opportunities.len(), 1);
        assert_eq!(opportunities[0].volume, eth(3, 4));
        assert_eq!(opportunities[0].profit, signed(eth(20, 1000)));
    }

    #[tokio::test]
    async fn failing_venue_is_dropped_from_the_scan() {
        let detector = OpportunityDetector::new(addr(REFERENCE));
        let buy = identity_market(addr(0x01));
        let sell = premium_market(addr(0x02), |_| signed(eth(2, 1000)));
        let broken: Arc<dyn Market> = Arc::new(
            MockMarket::new(addr(0x03), (addr(REFERENCE), addr(TOKEN)))
                .with_quote_out(|_, _, _| Err(anyhow!("rpc timeout"))),
        );

        let markets = markets_for(addr(TOKEN), vec![buy, sell, broken]);
        let opportunities = detector.evaluate_markets(&markets).await;

        assert_eq!(opportunities.len(), 1);
        assert_eq!(opportunities[0].buy_from_market.market_address(), addr(0x01));
        assert_eq!(opportunities[0].sell_to_market.market_address(), addr(0x02));
    }

    #[tokio::test]
    async fn profit_equal_to_threshold_is_filtered() {
        let detector = OpportunityDetector::new(addr(REFERENCE));
        let buy = identity_market(addr(0x01));
        let sell = premium_market(addr(0x02), |_| *MIN_PROFIT);

        let markets = markets_for(addr(TOKEN), vec![buy, sell]);
        assert!(detector.evaluate_markets(&markets).await.is_empty());
    }

    #[tokio::test]
    async fn opportunities_are_sorted_by_profit_descending() {
        let detector = OpportunityDetector::new(addr(REFERENCE));
        let token_a = addr(TOKEN);
        let token_b = addr(0x22);

        let mut by_token: MarketsByToken = HashMap::new();
        by_token.insert(
            token_a,
            vec![
                identity_market(addr(0x01)),
                premium_market(addr(0x02), |_| signed(eth(2, 1000))),
            ],
        );
        by_token.insert(
            token_b,
            vec![
                Arc::new(MockMarket::new(addr(0x03), (addr(REFERENCE), token_b))),
                {
                    let reference = addr(REFERENCE);
                    Arc::new(
                        MockMarket::new(addr(0x04), (reference, token_b)).with_quote_out(
                            move |_, token_out, amount| {
                                if token_out == reference {
                                    Ok(amount + eth(5, 1000))
                                } else {
                                    Ok(amount)
                                }
                            },
                        ),
                    )
                },
            ],
        );

        let opportunities = detector.evaluate_markets(&by_token).await;
        assert_eq!(opportunities.len(), 2);
        assert_eq!(opportunities[0].profit, signed(eth(5, 1000)));
        assert_eq!(opportunities[0].token_address, token_b);
        assert_eq!(opportunities[1].profit, signed(eth(2, 1000)));
        assert_eq!(opportunities[1].token_address, token_a);
    }
}
