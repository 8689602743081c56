use crate::{PriceError, PriceFeed, PriceSnapshot};
use std::{collections::HashMap, time::Duration};
use tokio::{sync::RwLock, time::Instant};
use tracing::{debug, warn};

/// How long a fetched snapshot is served without refetching.
pub const DEFAULT_STALE_AFTER: Duration = Duration::from_secs(60);

/// What a view should show for an asset's price.
#[derive(Debug, Clone, PartialEq)]
pub enum PriceStatus {
    /// Never fetched
    Loading,
    Available(PriceSnapshot),
    /// Last fetch failed; the previous good snapshot is still shown
    Stale {
        snapshot: PriceSnapshot,
        reason: String,
    },
    /// Last fetch failed and nothing was fetched before
    Unavailable(String),
}

impl PriceStatus {
    pub const fn snapshot(&self) -> Option<&PriceSnapshot> {
        match self {
            Self::Available(s) | Self::Stale { snapshot: s, .. } => Some(s),
            Self::Loading | Self::Unavailable(_) => None,
        }
    }

    pub const fn is_stale(&self) -> bool {
        matches!(self, Self::Stale { .. })
    }

    /// USD price, if known.
    pub fn price(&self) -> Option<f64> {
        self.snapshot().and_then(|s| s.price)
    }
}

#[derive(Debug, Clone)]
enum Entry {
    Fetched {
        snapshot: PriceSnapshot,
        at: Instant,
    },
    /// A refetch failed after `snapshot` was fetched
    Stale {
        snapshot: PriceSnapshot,
        reason: String,
    },
    Failed(String),
}

impl Entry {
    /// Record a failed fetch, keeping the last good snapshot if there is one.
    fn failed(previous: Option<&Self>, reason: String) -> Self {
        match previous {
            Some(Self::Fetched { snapshot, .. } | Self::Stale { snapshot, .. }) => Self::Stale {
                snapshot: *snapshot,
                reason,
            },
            Some(Self::Failed(_)) | None => Self::Failed(reason),
        }
    }
}

/// Per-asset price cache with a freshness window.
pub struct PriceCache<F> {
    feed: F,
    stale_after: Duration,
    entries: RwLock<HashMap<String, Entry>>,
}

impl<F> PriceCache<F>
where
    F: PriceFeed,
{
    pub fn new(feed: F, stale_after: Duration) -> Self {
        Self {
            feed,
            stale_after,
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Current status without touching the network.
    pub async fn status(&self, id: &str) -> PriceStatus {
        match self.entries.read().await.get(id) {
            None => PriceStatus::Loading,
            Some(Entry::Fetched { snapshot, .. }) => PriceStatus::Available(*snapshot),
            Some(Entry::Stale { snapshot, reason }) => PriceStatus::Stale {
                snapshot: *snapshot,
                reason: reason.clone(),
            },
            Some(Entry::Failed(reason)) => PriceStatus::Unavailable(reason.clone()),
        }
    }

    /// Whether `id` has a snapshot younger than the freshness window.
    pub async fn is_fresh(&self, id: &str) -> bool {
        matches!(
            self.entries.read().await.get(id),
            Some(Entry::Fetched { at, .. }) if at.elapsed() < self.stale_after
        )
    }

    /// Serve a fresh snapshot or fetch one.
    pub async fn get(&self, id: &str) -> Result<PriceSnapshot, PriceError> {
        if let Some(Entry::Fetched { snapshot, at }) = self.entries.read().await.get(id) {
            if at.elapsed() < self.stale_after {
                return Ok(*snapshot);
            }
        }

        let ids = [id.to_string()];
        let mut fetched = self.refresh(&ids).await?;
        fetched
            .remove(id)
            .ok_or_else(|| PriceError::MissingAsset(id.to_string()))
    }

    /// Fetch `ids` regardless of freshness and record the outcome per id.
    ///
    /// Returns an error if the request failed or any id came back without a
    /// quote; the ids that did resolve are still cached. An id that fails
    /// after an earlier success keeps its old snapshot, marked stale.
    pub async fn refresh(
        &self,
        ids: &[String],
    ) -> Result<HashMap<String, PriceSnapshot>, PriceError> {
        if ids.is_empty() {
            return Ok(HashMap::new());
        }

        let result = self.feed.fetch(ids).await;
        let now = Instant::now();
        let mut entries = self.entries.write().await;

        let prices = match result {
            Ok(prices) => prices,
            Err(e) => {
                warn!(ids = %ids.join(","), error = %e, "Price refresh failed");
                for id in ids {
                    let entry = Entry::failed(entries.get(id), e.to_string());
                    entries.insert(id.clone(), entry);
                }
                return Err(e);
            }
        };

        let mut missing = None;
        for id in ids {
            match prices.get(id) {
                Some(snapshot) => {
                    entries.insert(
                        id.clone(),
                        Entry::Fetched {
                            snapshot: *snapshot,
                            at: now,
                        },
                    );
                }
                None => {
                    let err = PriceError::MissingAsset(id.clone());
                    let entry = Entry::failed(entries.get(id), err.to_string());
                    entries.insert(id.clone(), entry);
                    missing.get_or_insert(err);
                }
            }
        }

        debug!(requested = ids.len(), resolved = prices.len(), "Prices refreshed");

        match missing {
            Some(err) => Err(err),
            None => Ok(prices),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::FakeFeed;

    #[tokio::test(start_paused = true)]
    async fn test_fresh_entry_is_served_from_cache() {
        let feed = FakeFeed::with_price("chainlink", 13.0, 1.5);
        let cache = PriceCache::new(feed.clone(), DEFAULT_STALE_AFTER);

        assert_eq!(cache.status("chainlink").await, PriceStatus::Loading);

        let first = cache.get("chainlink").await.unwrap();
        let second = cache.get("chainlink").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(first.price, Some(13.0));
        assert_eq!(feed.calls(), 1);
        assert!(cache.is_fresh("chainlink").await);
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_entry_is_refetched() {
        let feed = FakeFeed::with_price("chainlink", 13.0, 1.5);
        let cache = PriceCache::new(feed.clone(), DEFAULT_STALE_AFTER);

        cache.get("chainlink").await.unwrap();
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(!cache.is_fresh("chainlink").await);

        cache.get("chainlink").await.unwrap();
        assert_eq!(feed.calls(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_refresh_ignores_freshness() {
        let feed = FakeFeed::with_price("chainlink", 13.0, 1.5);
        let cache = PriceCache::new(feed.clone(), DEFAULT_STALE_AFTER);

        cache.get("chainlink").await.unwrap();
        cache.refresh(&["chainlink".to_string()]).await.unwrap();
        assert_eq!(feed.calls(), 2);
    }

    #[tokio::test]
    async fn test_failure_marks_unavailable() {
        let feed = FakeFeed::with_price("chainlink", 13.0, 1.5);
        feed.set_failing(true);
        let cache = PriceCache::new(feed.clone(), DEFAULT_STALE_AFTER);

        assert!(cache.get("chainlink").await.is_err());
        assert!(matches!(
            cache.status("chainlink").await,
            PriceStatus::Unavailable(reason) if reason.contains("429")
        ));

        // no automatic retry happened
        assert_eq!(feed.calls(), 1);

        feed.set_failing(false);
        cache.get("chainlink").await.unwrap();
        assert_eq!(cache.status("chainlink").await.price(), Some(13.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_refetch_keeps_last_snapshot() {
        let feed = FakeFeed::with_price("chainlink", 13.0, 1.5);
        let cache = PriceCache::new(feed.clone(), DEFAULT_STALE_AFTER);
        let ids = ["chainlink".to_string()];

        cache.refresh(&ids).await.unwrap();
        feed.set_failing(true);
        tokio::time::advance(Duration::from_secs(61)).await;
        assert!(cache.get("chainlink").await.is_err());
        assert!(cache.refresh(&ids).await.is_err());

        let status = cache.status("chainlink").await;
        assert!(status.is_stale());
        assert_eq!(status.price(), Some(13.0));
        assert!(matches!(status, PriceStatus::Stale { ref reason, .. } if reason.contains("429")));
        assert!(!cache.is_fresh("chainlink").await);

        feed.set_failing(false);
        cache.get("chainlink").await.unwrap();
        assert_eq!(
            cache.status("chainlink").await,
            PriceStatus::Available(PriceSnapshot {
                price: Some(13.0),
                change_24h: Some(1.5),
            })
        );
    }

    #[tokio::test]
    async fn test_missing_asset() {
        let feed = FakeFeed::with_price("chainlink", 13.0, 1.5);
        let cache = PriceCache::new(feed, DEFAULT_STALE_AFTER);

        let ids = vec!["chainlink".to_string(), "unknown-coin".to_string()];
        let err = cache.refresh(&ids).await.unwrap_err();

        assert!(matches!(err, PriceError::MissingAsset(ref id) if id == "unknown-coin"));
        assert_eq!(cache.status("chainlink").await.price(), Some(13.0));
        assert!(matches!(
            cache.status("unknown-coin").await,
            PriceStatus::Unavailable(_)
        ));
    }
}
