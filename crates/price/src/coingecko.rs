//! CoinGecko `simple/price` client.

use crate::{PriceError, PriceFeed, PriceSnapshot};
use serde::Deserialize;
use std::{collections::HashMap, time::Duration};
use tracing::{debug, warn};

pub const COINGECKO_API_URL: &str = "https://api.coingecko.com/api/v3";

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Quote for one asset as returned by `simple/price`.
#[derive(Debug, Deserialize)]
struct Quote {
    usd: Option<f64>,
    usd_24h_change: Option<f64>,
}

#[derive(Debug, Clone)]
pub struct CoinGeckoClient {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl CoinGeckoClient {
    /// Client against the public API. The key, if any, is sent as the demo key.
    pub fn new(api_key: Option<String>) -> Result<Self, PriceError> {
        let client = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self::with_client(client, COINGECKO_API_URL, api_key))
    }

    /// Client with a custom HTTP client and base URL.
    pub fn with_client(
        client: reqwest::Client,
        base_url: impl Into<String>,
        api_key: Option<String>,
    ) -> Self {
        Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key: api_key.filter(|k| !k.is_empty()),
        }
    }

    /// Build the `simple/price` request for `ids`.
    pub fn request(&self, ids: &[String]) -> reqwest::RequestBuilder {
        let mut query = vec![
            ("ids", ids.join(",")),
            ("vs_currencies", "usd".to_string()),
            ("include_24hr_change", "true".to_string()),
        ];
        if let Some(key) = &self.api_key {
            query.push(("cg_demo_api_key", key.clone()));
        }

        self.client
            .get(format!("{}/simple/price", self.base_url))
            .query(&query)
    }
}

/// Decode a `simple/price` body into snapshots keyed by asset id.
pub fn parse_response(body: &str) -> Result<HashMap<String, PriceSnapshot>, PriceError> {
    let quotes: HashMap<String, Quote> = serde_json::from_str(body)?;
    Ok(quotes
        .into_iter()
        .map(|(id, q)| {
            (
                id,
                PriceSnapshot {
                    price: q.usd,
                    change_24h: q.usd_24h_change,
                },
            )
        })
        .collect())
}

impl PriceFeed for CoinGeckoClient {
    async fn fetch(&self, ids: &[String]) -> Result<HashMap<String, PriceSnapshot>, PriceError> {
        debug!(ids = %ids.join(","), "Fetching prices");

        let response = self.request(ids).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            warn!(status, body = %body, "Price API returned an error");
            return Err(PriceError::Status { status, body });
        }

        let body = response.text().await?;
        parse_response(&body)
    }
}
