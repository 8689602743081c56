//! Token price lookups.
//!
//! Prices come from an external HTTP API behind the [`PriceFeed`] trait. The
//! [`PriceCache`] keeps a short freshness window per asset and the poller
//! refreshes it on a fixed interval. Failures are never retried here; they
//! are recorded so the caller can show the price as unavailable.

pub mod cache;
pub mod coingecko;
pub mod poller;

pub use cache::{PriceCache, PriceStatus, DEFAULT_STALE_AFTER};
pub use coingecko::{CoinGeckoClient, COINGECKO_API_URL};
pub use poller::{spawn_poller, DEFAULT_REFRESH_INTERVAL};

use serde::{Deserialize, Serialize};
use std::{collections::HashMap, future::Future};
use thiserror::Error;

/// Latest known price of one asset.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PriceSnapshot {
    /// Price in USD
    pub price: Option<f64>,
    /// 24h price change in percent
    pub change_24h: Option<f64>,
}

#[derive(Error, Debug)]
pub enum PriceError {
    #[error("price request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("price API returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("malformed price response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("no price returned for {0}")]
    MissingAsset(String),
}

/// Source of price snapshots keyed by asset id.
pub trait PriceFeed: Send + Sync {
    /// Fetch snapshots for the given asset ids in one request.
    ///
    /// Ids the source does not know are absent from the returned map.
    fn fetch(
        &self,
        ids: &[String],
    ) -> impl Future<Output = Result<HashMap<String, PriceSnapshot>, PriceError>> + Send;
}

#[cfg(test)]
pub(crate) mod test_utils {
    use super::{PriceError, PriceFeed, PriceSnapshot};
    use std::{
        collections::HashMap,
        sync::{
            atomic::{AtomicBool, AtomicUsize, Ordering},
            Arc,
        },
    };

    /// In-memory feed that counts requests and can be switched to failing.
    #[derive(Clone, Default)]
    pub struct FakeFeed {
        pub prices: HashMap<String, PriceSnapshot>,
        pub calls: Arc<AtomicUsize>,
        pub failing: Arc<AtomicBool>,
    }

    impl FakeFeed {
        pub fn with_price(id: &str, price: f64, change: f64) -> Self {
            let mut prices = HashMap::new();
            prices.insert(
                id.to_string(),
                PriceSnapshot {
                    price: Some(price),
                    change_24h: Some(change),
                },
            );
            Self {
                prices,
                ..Default::default()
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }

        pub fn set_failing(&self, failing: bool) {
            self.failing.store(failing, Ordering::SeqCst);
        }
    }

    impl PriceFeed for FakeFeed {
        async fn fetch(
            &self,
            ids: &[String],
        ) -> Result<HashMap<String, PriceSnapshot>, PriceError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if self.failing.load(Ordering::SeqCst) {
                return Err(PriceError::Status {
                    status: 429,
                    body: "rate limited".to_string(),
                });
            }
            Ok(ids
                .iter()
                .filter_map(|id| self.prices.get(id).map(|p| (id.clone(), *p)))
                .collect())
        }
    }
}
