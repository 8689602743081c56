use crate::{PriceCache, PriceError, PriceFeed};
use std::{sync::Arc, time::Duration};
use tokio::{
    task::JoinHandle,
    time::{self, MissedTickBehavior},
};
use tracing::debug;

/// Default interval between background price refreshes.
pub const DEFAULT_REFRESH_INTERVAL: Duration = Duration::from_secs(60);

/// Refresh `ids` immediately and then every `every` until the handle is aborted.
///
/// Each failed refresh is handed to `on_failure` once; nothing is retried
/// before the next tick.
pub fn spawn_poller<F, C>(
    cache: Arc<PriceCache<F>>,
    ids: Vec<String>,
    every: Duration,
    on_failure: C,
) -> JoinHandle<()>
where
    F: PriceFeed + 'static,
    C: Fn(&PriceError) + Send + 'static,
{
    tokio::spawn(async move {
        let mut interval = time::interval(every);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            interval.tick().await;
            debug!(count = ids.len(), "Polling prices");
            if let Err(e) = cache.refresh(&ids).await {
                on_failure(&e);
            }
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{test_utils::FakeFeed, DEFAULT_STALE_AFTER};
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[tokio::test(start_paused = true)]
    async fn test_poller_refreshes_on_interval() {
        let feed = FakeFeed::with_price("uniswap", 7.0, 0.0);
        let cache = Arc::new(PriceCache::new(feed.clone(), DEFAULT_STALE_AFTER));

        let handle = spawn_poller(
            cache.clone(),
            vec!["uniswap".to_string()],
            Duration::from_secs(60),
            |_| {},
        );

        time::sleep(Duration::from_secs(125)).await;
        handle.abort();

        assert_eq!(feed.calls(), 3);
        assert_eq!(cache.status("uniswap").await.price(), Some(7.0));
    }

    #[tokio::test(start_paused = true)]
    async fn test_poller_reports_each_failure() {
        let feed = FakeFeed::with_price("uniswap", 7.0, 0.0);
        feed.set_failing(true);
        let cache = Arc::new(PriceCache::new(feed.clone(), DEFAULT_STALE_AFTER));

        let failures = Arc::new(AtomicUsize::new(0));
        let counter = failures.clone();
        let handle = spawn_poller(
            cache,
            vec!["uniswap".to_string()],
            Duration::from_secs(60),
            move |_| {
                counter.fetch_add(1, Ordering::SeqCst);
            },
        );

        time::sleep(Duration::from_secs(65)).await;
        handle.abort();

        assert_eq!(failures.load(Ordering::SeqCst), 2);
        assert_eq!(feed.calls(), 2);
    }
}
