//! Library layer for the stock quote gateway: provider seam, Yahoo binding,
//! date validation, and the three quote operations.

pub mod error;
pub mod gateway;
pub mod provider;
pub mod validation;
pub mod yahoo;

pub use stockchart_api;

pub use error::GatewayError;
pub use gateway::{QuoteGateway, DEFAULT_DURATION};
pub use provider::{PriceBar, PriceTable, ProviderError, QuoteProvider, Record, Span};
pub use yahoo::YahooProvider;
