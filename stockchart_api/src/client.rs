//! HTTP client for the Yahoo Finance chart API.

use std::time::Duration;

use url::Url;

use crate::{
    query::{ChartQuery, Query},
    types::{ChartEnvelope, ChartResult},
    user_agent::get_user_agent,
    Error,
};

/// HTTP client for the Yahoo Finance chart API.
///
/// Sends requests with a randomized browser user agent. Each request builds a
/// fresh `reqwest::Client` with a 30-second timeout.
#[derive(Clone, Debug)]
pub struct Client {
    /// Base URL for the API. Defaults to `https://query2.finance.yahoo.com`.
    base_api_url: String,
}

impl Default for Client {
    fn default() -> Self {
        Self::new()
    }
}

impl Client {
    /// Creates a new client pointing at the production Yahoo Finance host.
    pub fn new() -> Self {
        Self {
            base_api_url: "https://query2.finance.yahoo.com".to_string(),
        }
    }

    /// Creates a new client with a custom base URL. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Self {
        Self {
            base_api_url: base_url.trim_end_matches('/').to_string(),
        }
    }

    fn get_url(&self, ticker: &str, query: &impl Query) -> Result<Url, Error> {
        let mut url = Url::parse(format!("{}/v8/finance/chart", &self.base_api_url).as_str())
            .map_err(|e| {
                tracing::error!("Invalid URL constructed: {}", e);
                Error::RequestFailed(format!("invalid base URL: {}", e))
            })?;
        url.path_segments_mut()
            .map_err(|_| Error::RequestFailed("base URL cannot carry a path".to_string()))?
            .push(ticker);
        Ok(query.add_to_url(&url))
    }

    /// Fetches the chart for `ticker`.
    ///
    /// A successful response whose span holds no bars comes back as a
    /// [`ChartResult`] with an empty `timestamp`. Unknown symbols come back as
    /// [`Error::Chart`] with code `Not Found`; see [`Error::is_not_found`].
    pub async fn get_chart(&self, ticker: &str, query: &ChartQuery) -> Result<ChartResult, Error> {
        let url = self.get_url(ticker, query)?;
        tracing::debug!("GET {}", url);

        let client = reqwest::Client::builder()
            .user_agent(get_user_agent())
            .timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| {
                tracing::error!("Failed to build HTTP client: {}", e);
                Error::RequestFailed(e.to_string())
            })?;
        let resp = client
            .get(url)
            .header("accept", "application/json, text/plain, */*")
            .header("accept-language", "en-US,en;q=0.9")
            .send()
            .await
            .map_err(|e| {
                tracing::error!("Failed to get chart for {}: {}", ticker, e);
                Error::RequestFailed(e.to_string())
            })?;

        let status = resp.status();
        let body = resp.text().await.map_err(|e| {
            tracing::error!("Failed to read response body: {}", e);
            Error::RequestFailed(e.to_string())
        })?;

        // Yahoo wraps most failures in the same envelope, so try that first.
        let envelope = serde_json::from_str::<ChartEnvelope>(&body);

        if !status.is_success() {
            if let Ok(ChartEnvelope { chart }) = envelope {
                if let Some(err) = chart.error {
                    tracing::warn!(
                        "Chart request for {} failed with status {}: {} ({})",
                        ticker,
                        status,
                        err.code,
                        err.description
                    );
                    return Err(Error::Chart {
                        status: status.as_u16(),
                        code: err.code,
                        description: err.description,
                    });
                }
            }
            let snippet = truncate_body(&body);
            tracing::error!("Request failed with status {}: {}", status, snippet);
            return Err(Error::HttpStatus {
                status: status.as_u16(),
                body: snippet,
            });
        }

        let chart = envelope
            .map_err(|e| {
                let snippet = truncate_body(&body);
                tracing::error!("Failed to parse chart: {} | body: {}", e, snippet);
                Error::Parse(e.to_string())
            })?
            .chart;

        if let Some(err) = chart.error {
            return Err(Error::Chart {
                status: status.as_u16(),
                code: err.code,
                description: err.description,
            });
        }

        chart
            .result
            .and_then(|results| results.into_iter().next())
            .ok_or_else(|| Error::Parse("chart response contained no result".to_string()))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 2000;
    match body.char_indices().nth(MAX) {
        None => body.to_string(),
        Some((idx, _)) => format!("{}...[truncated]", &body[..idx]),
    }
}
