pub mod cache;
pub mod candles;
pub mod gateway;
pub mod transport;
pub mod types;

pub use gateway::MarketDataGateway;
pub use transport::{FetchError, HttpTransport, Transport};
pub use types::*;
