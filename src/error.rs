use thiserror::Error;

/// Failure classes surfaced by the market-data gateway.
///
/// `Clone` because the outcome of a failed in-flight request is handed to
/// every caller that joined it.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum MarketDataError {
    #[error("rate limited by provider (HTTP 429)")]
    RateLimited,

    #[error("provider rejected request: HTTP {status}")]
    ClientRequest { status: u16 },

    #[error("network failure after {attempts} attempts: {last_error}")]
    NetworkExhausted { attempts: u32, last_error: String },

    #[error("no price data available for {asset}")]
    NoData { asset: String },

    #[error("malformed provider response: {reason}")]
    InvalidResponse { reason: String },
}
