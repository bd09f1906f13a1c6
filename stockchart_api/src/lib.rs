//! Client for the Yahoo Finance v8 chart endpoint.
//!
//! Covers the one call the gateway needs: daily OHLCV bars for a ticker,
//! addressed either by a period token or by an epoch-second range.

mod client;
mod errors;
mod query;
pub mod types;
mod user_agent;
pub use self::client::Client;
pub use self::errors::Error;
pub use self::query::{ChartQuery, ChartSpan, Query};
