use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://api.coingecko.com/api/v3";

#[derive(Clone, Debug)]
pub struct GatewayConfig {
    /// Base URL of the upstream price-data provider.
    pub base_url: String,

    // =========================
    // Cache configuration
    // =========================
    /// Freshness window for market listings and the full asset list.
    pub market_ttl: Duration,

    /// Freshness window for chart/OHLC history.
    ///
    /// Deliberately kept just under the typical UI poll interval so a
    /// poll always sees fresh-enough data without always hitting the
    /// network.
    pub chart_ttl: Duration,

    /// Freshness window for single spot-price lookups.
    pub spot_ttl: Duration,

    // =========================
    // Retry configuration
    // =========================
    /// Total attempts per logical request, the first try included.
    ///
    /// Only transient failures (network errors, timeouts, 5xx) consume
    /// additional attempts; 429 and other 4xx fail on the spot.
    pub max_attempts: u32,

    /// Backoff before the first retry; doubles on every retry after it.
    pub initial_backoff: Duration,

    // =========================
    // Per-attempt timeouts
    // =========================
    /// Bound on one attempt against the listings/OHLC endpoints.
    pub market_timeout: Duration,

    /// Bound on one attempt against the chart-series endpoint.
    pub chart_timeout: Duration,

    /// Bound on one attempt against the spot-price endpoint.
    pub spot_timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),

            market_ttl: Duration::from_secs(30),
            chart_ttl: Duration::from_secs(25),
            spot_ttl: Duration::from_secs(5),

            max_attempts: 3,
            initial_backoff: Duration::from_millis(500),

            market_timeout: Duration::from_secs(10),
            chart_timeout: Duration::from_secs(15),
            spot_timeout: Duration::from_secs(8),
        }
    }
}

impl GatewayConfig {
    pub fn from_env() -> Self {
        let base_url =
            std::env::var("MARKET_API_URL").unwrap_or_else(|_| DEFAULT_BASE_URL.to_string());

        Self {
            base_url,
            ..Self::default()
        }
    }
}
