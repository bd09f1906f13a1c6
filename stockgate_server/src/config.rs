//! Command-line and environment configuration.

use std::net::{IpAddr, SocketAddr};

use anyhow::{Context, Result};
use axum::http::HeaderValue;
use clap::Parser;

/// Default upstream host for chart requests.
pub const DEFAULT_YAHOO_BASE_URL: &str = "https://query2.finance.yahoo.com";

#[derive(Parser, Debug)]
#[command(name = "stockgate")]
#[command(about = "Serve daily stock price history over HTTP")]
pub struct Cli {
    /// Address to bind
    #[arg(long, env = "STOCKGATE_HOST", default_value = "0.0.0.0")]
    pub host: IpAddr,

    /// Port to listen on
    #[arg(long, env = "STOCKGATE_PORT", default_value_t = 8000)]
    pub port: u16,

    /// Base URL of the Yahoo Finance chart API
    #[arg(long, env = "STOCKGATE_YAHOO_BASE_URL", default_value = DEFAULT_YAHOO_BASE_URL)]
    pub yahoo_base_url: String,

    /// Return raw prices plus an `Adj Close` column instead of adjusted OHLC
    #[arg(long, env = "STOCKGATE_NO_AUTO_ADJUST")]
    pub no_auto_adjust: bool,

    /// Allowed CORS origin (repeatable, or comma-separated in the env var).
    /// When none are given every origin is allowed.
    #[arg(long = "cors-origin", env = "STOCKGATE_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Vec<String>,
}

/// Which browser origins may call the API.
#[derive(Clone, Debug, PartialEq)]
pub enum CorsPolicy {
    /// Any origin, method and header, with credentials.
    Permissive,
    /// Only the listed origins.
    Origins(Vec<HeaderValue>),
}

impl Cli {
    pub fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }

    pub fn cors_policy(&self) -> Result<CorsPolicy> {
        let origins: Vec<&str> = self
            .cors_origins
            .iter()
            .map(|o| o.trim())
            .filter(|o| !o.is_empty())
            .collect();
        if origins.is_empty() {
            return Ok(CorsPolicy::Permissive);
        }
        let parsed = origins
            .into_iter()
            .map(|o| {
                HeaderValue::from_str(o).with_context(|| format!("invalid CORS origin '{}'", o))
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(CorsPolicy::Origins(parsed))
    }
}
