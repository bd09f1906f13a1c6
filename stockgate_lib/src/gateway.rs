//! The three read-only quote operations.
//!
//! Each operation validates its input, makes exactly one provider call and
//! turns the result into records or a [`GatewayError`]. Nothing is cached or
//! retried, and the gateway keeps no state between calls.

use std::sync::Arc;

use chrono::NaiveDate;

use crate::error::GatewayError;
use crate::provider::{PriceTable, QuoteProvider, Record, Span};
use crate::validation::{exclusive_end, parse_date};

/// Period used when the caller does not name one.
pub const DEFAULT_DURATION: &str = "1d";

const BAD_DATE: &str = "Invalid date format. Please use YYYY-MM-DD.";
const BAD_RANGE: &str = "Invalid date format. Please use YYYY-MM-DD for both start and end dates.";

/// Front door for quote lookups. Cheap to clone; clones share the provider.
#[derive(Clone)]
pub struct QuoteGateway {
    provider: Arc<dyn QuoteProvider>,
}

impl QuoteGateway {
    pub fn new(provider: Arc<dyn QuoteProvider>) -> Self {
        Self { provider }
    }

    async fn fetch(&self, ticker: &str, span: Span) -> Result<PriceTable, GatewayError> {
        tracing::debug!(ticker, ?span, "provider lookup");
        Ok(self.provider.lookup(ticker, &span).await?)
    }

    /// All bars for a relative period such as `5d` or `ytd`.
    ///
    /// The duration is not checked here; the provider decides what it accepts.
    pub async fn by_duration(
        &self,
        ticker: &str,
        duration: &str,
    ) -> Result<Vec<Record>, GatewayError> {
        let table = self
            .fetch(ticker, Span::Period(duration.to_string()))
            .await?;
        if table.is_empty() {
            return Err(GatewayError::NotFound(format!(
                "No data found for ticker: {} with duration: {}",
                ticker, duration
            )));
        }
        Ok(table.into_records())
    }

    /// The bar for one calendar day.
    ///
    /// Queries `[date, date + 1)`. Should the provider return more than one
    /// bar for that span, only the first is kept.
    pub async fn by_date(&self, ticker: &str, date: &str) -> Result<Record, GatewayError> {
        let day = parse_date(date).ok_or_else(|| GatewayError::BadRequest(BAD_DATE.to_string()))?;
        let end = exclusive_end(day).ok_or_else(|| GatewayError::BadRequest(BAD_DATE.to_string()))?;

        let table = self.fetch(ticker, Span::Range { start: day, end }).await?;
        table.into_records().into_iter().next().ok_or_else(|| {
            GatewayError::NotFound(format!(
                "No data found for ticker: {} on date: {}",
                ticker, date
            ))
        })
    }

    /// All bars from `start_date` through `end_date`, both inclusive.
    ///
    /// The two dates are not compared; an inverted range goes to the
    /// provider as given.
    pub async fn by_range(
        &self,
        ticker: &str,
        start_date: &str,
        end_date: &str,
    ) -> Result<Vec<Record>, GatewayError> {
        let (start, end) = parse_range(start_date, end_date)?;

        let table = self.fetch(ticker, Span::Range { start, end }).await?;
        if table.is_empty() {
            return Err(GatewayError::NotFound(format!(
                "No data found for ticker: {} within date range: {} to {}",
                ticker, start_date, end_date
            )));
        }
        Ok(table.into_records())
    }
}

/// Parses both ends and converts the inclusive end to an exclusive bound.
fn parse_range(start_date: &str, end_date: &str) -> Result<(NaiveDate, NaiveDate), GatewayError> {
    let bad = || GatewayError::BadRequest(BAD_RANGE.to_string());
    let start = parse_date(start_date).ok_or_else(bad)?;
    let end = parse_date(end_date).ok_or_else(bad)?;
    Ok((start, exclusive_end(end).ok_or_else(bad)?))
}
