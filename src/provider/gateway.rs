//! The market-data gateway: the sole interface between the application
//! and the upstream price-data provider.
//!
//! Design principles:
//! - **One request per key**: concurrent callers for identical parameters
//!   share a single in-flight request and its outcome.
//! - **Fail distinguishably**: every failure surfaces as one of the
//!   classified [`MarketDataError`] variants, never a generic error and
//!   never a fabricated default value.
//! - **Alternative source, not fabricated data**: when the native candle
//!   endpoint is empty, candles are synthesized from the raw chart
//!   series; when that is empty too, the call fails outright.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::config::GatewayConfig;
use crate::error::MarketDataError;
use crate::provider::cache::{self, Lookup, ResponseCache};
use crate::provider::candles;
use crate::provider::transport::{FetchError, HttpTransport, Transport};
use crate::provider::types::{AssetListing, Candle, ChartSeries, MarketSnapshot};

pub struct MarketDataGateway {
    transport: Arc<dyn Transport>,
    cache: ResponseCache,
    config: GatewayConfig,
}

impl MarketDataGateway {
    /// Gateway backed by a real HTTP client.
    pub fn new(config: GatewayConfig) -> Result<Self, reqwest::Error> {
        let transport = Arc::new(HttpTransport::new(config.base_url.clone())?);
        Ok(Self::with_transport(transport, config))
    }

    /// Gateway over an arbitrary transport.
    ///
    /// Each gateway owns its cache; independent instances share nothing.
    pub fn with_transport(transport: Arc<dyn Transport>, config: GatewayConfig) -> Self {
        Self {
            transport,
            cache: ResponseCache::new(),
            config,
        }
    }

    /// Every asset the provider knows about, in provider order.
    #[instrument(skip(self), level = "debug")]
    pub async fn supported_assets(&self) -> Result<Vec<AssetListing>, MarketDataError> {
        let value = self
            .fetch_json(
                "/coins/list",
                Vec::new(),
                self.config.market_ttl,
                self.config.market_timeout,
            )
            .await?;

        decode(&value)
    }

    /// Current market state for the top assets, one page of up to 100,
    /// ranked by market capitalization descending.
    #[instrument(skip(self), level = "debug")]
    pub async fn market_snapshots(&self) -> Result<Vec<MarketSnapshot>, MarketDataError> {
        let query = query_pairs(&[
            ("vs_currency", "usd"),
            ("order", "market_cap_desc"),
            ("per_page", "100"),
            ("page", "1"),
            ("sparkline", "false"),
        ]);

        let value = self
            .fetch_json(
                "/coins/markets",
                query,
                self.config.market_ttl,
                self.config.market_timeout,
            )
            .await?;

        decode(&value)
    }

    /// Raw historical chart series for one asset.
    #[instrument(skip(self), level = "debug")]
    pub async fn market_chart(
        &self,
        asset: &str,
        vs_currency: &str,
        days: u32,
        interval: &str,
    ) -> Result<ChartSeries, MarketDataError> {
        let path = format!("/coins/{asset}/market_chart");
        let days = days.to_string();
        let query = query_pairs(&[
            ("vs_currency", vs_currency),
            ("days", days.as_str()),
            ("interval", interval),
        ]);

        let value = self
            .fetch_json(&path, query, self.config.chart_ttl, self.config.chart_timeout)
            .await?;

        decode(&value)
    }

    /// Current spot price, or `None` when the provider response lacks the
    /// asset/currency key. Absence is an expected outcome here, not a
    /// failure.
    #[instrument(skip(self), level = "debug")]
    pub async fn spot_price(
        &self,
        asset: &str,
        vs_currency: &str,
    ) -> Result<Option<f64>, MarketDataError> {
        let query = query_pairs(&[("ids", asset), ("vs_currencies", vs_currency)]);

        let value = self
            .fetch_json(
                "/simple/price",
                query,
                self.config.spot_ttl,
                self.config.spot_timeout,
            )
            .await?;

        let table: HashMap<String, HashMap<String, f64>> = decode(&value)?;

        Ok(table
            .get(asset)
            .and_then(|prices| prices.get(vs_currency))
            .copied())
    }

    /// OHLC candles for one asset over `days`, ascending by time.
    ///
    /// Prefers the provider's native candles; when that endpoint returns
    /// an empty array, candles are synthesized from the raw chart series.
    /// Never returns an empty-but-successful result.
    #[instrument(skip(self), level = "debug")]
    pub async fn ohlc_candles(
        &self,
        asset: &str,
        vs_currency: &str,
        days: u32,
    ) -> Result<Vec<Candle>, MarketDataError> {
        let path = format!("/coins/{asset}/ohlc");
        let days_param = days.to_string();
        let query = query_pairs(&[("vs_currency", vs_currency), ("days", days_param.as_str())]);

        let value = self
            .fetch_json(&path, query, self.config.chart_ttl, self.config.market_timeout)
            .await?;

        let rows: Vec<[f64; 5]> = decode(&value)?;
        if !rows.is_empty() {
            // Native rows are [time, open, high, low, close], provider order.
            return Ok(rows
                .iter()
                .map(|[t, o, h, l, c]| Candle {
                    time: *t as i64,
                    open: *o,
                    high: *h,
                    low: *l,
                    close: *c,
                })
                .collect());
        }

        warn!(asset, days, "native ohlc empty; synthesizing from chart series");

        let chart_path = format!("/coins/{asset}/market_chart");
        let chart_query =
            query_pairs(&[("vs_currency", vs_currency), ("days", days_param.as_str())]);

        let value = self
            .fetch_json(
                &chart_path,
                chart_query,
                self.config.chart_ttl,
                self.config.market_timeout,
            )
            .await?;

        let series: ChartSeries = decode(&value)?;
        let synthesized = candles::synthesize(&series.prices, candles::bucket_width_ms(days));

        if synthesized.is_empty() {
            return Err(MarketDataError::NoData {
                asset: asset.to_string(),
            });
        }

        Ok(synthesized)
    }

    /// Cache-first fetch. Hits return the stored payload; misses publish
    /// a retrying request that every concurrent caller for the same key
    /// joins instead of duplicating.
    async fn fetch_json(
        &self,
        path: &str,
        query: Vec<(String, String)>,
        ttl: Duration,
        timeout: Duration,
    ) -> Result<Arc<Value>, MarketDataError> {
        let key = cache::cache_key(path, &query);

        let fetch = request_with_retry(
            Arc::clone(&self.transport),
            path.to_string(),
            query,
            timeout,
            self.config.max_attempts,
            self.config.initial_backoff,
        );

        match self.cache.lookup_or_start(&key, ttl, fetch) {
            Lookup::Hit(value) => {
                debug!(key = %key, "cache hit");
                Ok(value)
            }
            Lookup::Joined(pending) => {
                debug!(key = %key, "joined in-flight request");
                pending.await
            }
            Lookup::Started(pending) => pending.await,
        }
    }
}

/// One logical request: up to `max_attempts` tries with exponential
/// backoff between them.
///
/// Classification:
/// - 429 fails immediately as `RateLimited`, callers back off above us.
/// - other 4xx fail immediately, retrying a rejected request cannot help.
/// - anything else (connect error, timeout, 5xx) is transient and retried;
///   the last observed error is surfaced once attempts run out.
async fn request_with_retry(
    transport: Arc<dyn Transport>,
    path: String,
    query: Vec<(String, String)>,
    timeout: Duration,
    max_attempts: u32,
    initial_backoff: Duration,
) -> Result<Value, MarketDataError> {
    let mut last_error = String::new();

    for attempt in 1..=max_attempts {
        match transport.get_json(&path, &query, timeout).await {
            Ok(value) => return Ok(value),

            Err(FetchError::Status(429)) => return Err(MarketDataError::RateLimited),

            Err(FetchError::Status(status)) if (400..500).contains(&status) => {
                return Err(MarketDataError::ClientRequest { status });
            }

            Err(err) => {
                last_error = match err {
                    FetchError::Status(status) => format!("HTTP {status}"),
                    FetchError::Network(msg) => msg,
                };

                if attempt < max_attempts {
                    let backoff = initial_backoff * 2u32.pow(attempt - 1);

                    warn!(
                        path = %path,
                        attempt,
                        backoff_ms = backoff.as_millis() as u64,
                        error = %last_error,
                        "transient provider failure; backing off"
                    );

                    tokio::time::sleep(backoff).await;
                }
            }
        }
    }

    Err(MarketDataError::NetworkExhausted {
        attempts: max_attempts,
        last_error,
    })
}

/// Typed decode at the provider boundary. Malformed payloads are rejected
/// here instead of propagating nulls into callers.
fn decode<T: DeserializeOwned>(value: &Value) -> Result<T, MarketDataError> {
    serde_json::from_value(value.clone()).map_err(|e| MarketDataError::InvalidResponse {
        reason: e.to_string(),
    })
}

fn query_pairs(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}
