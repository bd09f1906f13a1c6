//! Chart envelope returned by `/v8/finance/chart/{ticker}`.
//!
//! Series are column-oriented: `timestamp[i]` lines up with `open[i]`,
//! `close[i]` and so on. Yahoo emits `null` for missing points, and omits
//! `timestamp` and the series entirely when the span holds no bars.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize, Debug)]
pub struct ChartEnvelope {
    pub chart: Chart,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct Chart {
    pub result: Option<Vec<ChartResult>>,
    pub error: Option<ChartError>,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct ChartError {
    pub code: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Serialize, Deserialize, Debug)]
pub struct ChartResult {
    pub meta: ChartMeta,
    /// Bar open times in epoch seconds. Absent when there were no trades.
    #[serde(default)]
    pub timestamp: Vec<i64>,
    #[serde(default)]
    pub events: Option<Events>,
    #[serde(default)]
    pub indicators: Indicators,
}

#[derive(Serialize, Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ChartMeta {
    pub symbol: String,
    pub currency: Option<String>,
    pub exchange_name: Option<String>,
    pub instrument_type: Option<String>,
    pub exchange_timezone_name: Option<String>,
    /// Exchange offset from UTC in seconds.
    #[serde(default)]
    pub gmtoffset: i32,
    pub data_granularity: Option<String>,
    pub range: Option<String>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Indicators {
    #[serde(default)]
    pub quote: Vec<QuoteSeries>,
    #[serde(default)]
    pub adjclose: Vec<AdjCloseSeries>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct QuoteSeries {
    #[serde(default)]
    pub open: Vec<Option<f64>>,
    #[serde(default)]
    pub high: Vec<Option<f64>>,
    #[serde(default)]
    pub low: Vec<Option<f64>>,
    #[serde(default)]
    pub close: Vec<Option<f64>>,
    #[serde(default)]
    pub volume: Vec<Option<u64>>,
}

#[derive(Serialize, Deserialize, Debug, Default)]
pub struct AdjCloseSeries {
    #[serde(default)]
    pub adjclose: Vec<Option<f64>>,
}

/// Corporate actions keyed by the epoch second (as a string) they apply to.
#[derive(Serialize, Deserialize, Debug, Default)]
pub struct Events {
    #[serde(default)]
    pub dividends: BTreeMap<String, Dividend>,
    #[serde(default)]
    pub splits: BTreeMap<String, Split>,
}

#[derive(Serialize, Deserialize, Debug, Clone, Copy)]
pub struct Dividend {
    pub amount: f64,
    pub date: i64,
}

#[derive(Serialize, Deserialize, Debug, Clone)]
#[serde(rename_all = "camelCase")]
pub struct Split {
    pub date: i64,
    pub numerator: f64,
    pub denominator: f64,
    pub split_ratio: Option<String>,
}

impl Split {
    /// Shares after the split per share before it, e.g. `4.0` for a 4:1 split.
    pub fn ratio(&self) -> f64 {
        if self.denominator == 0.0 {
            0.0
        } else {
            self.numerator / self.denominator
        }
    }
}
