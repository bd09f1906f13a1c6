//! The market-data provider seam.
//!
//! The gateway only knows how to ask a [`QuoteProvider`] for a [`Span`] of
//! history and get back a [`PriceTable`]. An empty table means "no data";
//! anything else that goes wrong is a [`ProviderError`].

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, SecondsFormat};
use serde_json::{Map, Value};

/// One flattened bar as sent to clients: field name to value, timestamp first.
pub type Record = Map<String, Value>;

/// What slice of history to fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Span {
    /// Provider period token (`1d`, `1mo`, `ytd`, `max`, ...), forwarded verbatim.
    Period(String),
    /// Half-open calendar range: `start` included, `end` excluded.
    Range { start: NaiveDate, end: NaiveDate },
}

/// Opaque provider failure. The message is surfaced to callers unchanged.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    message: String,
}

impl ProviderError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

impl From<stockchart_api::Error> for ProviderError {
    fn from(e: stockchart_api::Error) -> Self {
        Self::new(e.to_string())
    }
}

/// A single row: when it happened plus one value per table column.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceBar {
    pub timestamp: DateTime<FixedOffset>,
    pub values: Vec<Value>,
}

/// Provider result: an index column (the timestamp) plus named value columns.
///
/// Rows stay in the order the provider produced them.
#[derive(Debug, Clone, PartialEq)]
pub struct PriceTable {
    index: String,
    columns: Vec<String>,
    rows: Vec<PriceBar>,
}

impl PriceTable {
    pub fn new(index: impl Into<String>, columns: Vec<String>) -> Self {
        Self {
            index: index.into(),
            columns,
            rows: Vec::new(),
        }
    }

    /// A table with no rows and no columns, for "nothing found".
    pub fn empty() -> Self {
        Self::new("Date", Vec::new())
    }

    /// Appends a row. `values` must line up with the table's columns.
    pub fn push_row(
        &mut self,
        timestamp: DateTime<FixedOffset>,
        values: Vec<Value>,
    ) -> Result<(), ProviderError> {
        if values.len() != self.columns.len() {
            return Err(ProviderError::new(format!(
                "row has {} values but table has {} columns",
                values.len(),
                self.columns.len()
            )));
        }
        self.rows.push(PriceBar { timestamp, values });
        Ok(())
    }

    pub fn index(&self) -> &str {
        &self.index
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn rows(&self) -> &[PriceBar] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Keeps only the rows for which `keep` returns true, preserving order.
    pub fn retain(&mut self, keep: impl FnMut(&PriceBar) -> bool) {
        self.rows.retain(keep);
    }

    /// Turns each row into a record with the index as an ordinary field.
    ///
    /// The timestamp comes first, rendered as RFC 3339 with its offset; the
    /// remaining fields follow in column order, untouched.
    pub fn into_records(self) -> Vec<Record> {
        let PriceTable {
            index,
            columns,
            rows,
        } = self;
        rows.into_iter()
            .map(|bar| {
                let mut record = Record::new();
                record.insert(
                    index.clone(),
                    Value::String(bar.timestamp.to_rfc3339_opts(SecondsFormat::Secs, false)),
                );
                for (column, value) in columns.iter().zip(bar.values) {
                    record.insert(column.clone(), value);
                }
                record
            })
            .collect()
    }
}

/// Source of price history.
///
/// One call per gateway operation; implementations must not retry on the
/// gateway's behalf.
#[async_trait]
pub trait QuoteProvider: Send + Sync {
    async fn lookup(&self, ticker: &str, span: &Span) -> Result<PriceTable, ProviderError>;
}
