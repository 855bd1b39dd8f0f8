use serde::Deserialize;

/// One row of the provider's full asset list.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct AssetListing {
    pub id: String,
    pub symbol: String,
    pub name: String,
}

/// One asset's current market state.
///
/// Immutable once fetched; the next successful fetch supersedes it
/// wholesale, there is no partial merge.
#[derive(Debug, Clone, Deserialize)]
pub struct MarketSnapshot {
    pub id: String,
    pub symbol: String,
    pub name: String,
    pub current_price: f64,
    pub price_change_24h: f64,
    pub price_change_percentage_24h: f64,
    pub high_24h: f64,
    pub low_24h: f64,
    pub total_volume: f64,
    pub market_cap: f64,
    /// Absent for assets the provider has not ranked.
    pub market_cap_rank: Option<u32>,
    pub image: String,
}

/// Raw historical chart payload: lists of `[epoch_ms, value]` pairs,
/// ascending by timestamp.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ChartSeries {
    #[serde(default)]
    pub prices: Vec<[f64; 2]>,
    #[serde(default)]
    pub market_caps: Vec<[f64; 2]>,
    #[serde(default)]
    pub total_volumes: Vec<[f64; 2]>,
}

/// One OHLC observation; `time` is the period start in epoch milliseconds.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Candle {
    pub time: i64,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
}
