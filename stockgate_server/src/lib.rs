//! HTTP surface for the stock quote gateway.

pub mod config;
pub mod routes;

pub use config::{Cli, CorsPolicy};
pub use routes::router;
