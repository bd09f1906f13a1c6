//! Yahoo Finance binding for [`QuoteProvider`].
//!
//! Reshapes the column-oriented chart response into a [`PriceTable`] with the
//! columns the Python `yfinance` library produces for daily history:
//! `Open`, `High`, `Low`, `Close`, `Volume`, `Dividends`, `Stock Splits`
//! (plus `Adj Close` when auto-adjust is off).
//!
//! Bars are dated on the exchange's own calendar. A date range is requested
//! from Yahoo one day wider on each side in UTC and then cut back to the
//! exchange-local days the caller asked for, so exchanges whose session
//! starts before UTC midnight (ASX, NZX) land on the right day.

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, Offset, TimeZone, Utc};
use chrono_tz::Tz;
use serde_json::Value;
use stockchart_api::types::{ChartMeta, ChartResult};
use stockchart_api::{ChartQuery, Client};

use crate::provider::{PriceTable, ProviderError, QuoteProvider, Span};

/// Chart-API backed provider.
#[derive(Clone, Debug)]
pub struct YahooProvider {
    client: Client,
    auto_adjust: bool,
}

impl Default for YahooProvider {
    fn default() -> Self {
        Self::new()
    }
}

impl YahooProvider {
    /// Provider against the production Yahoo host, auto-adjust on.
    pub fn new() -> Self {
        Self::with_client(Client::new())
    }

    /// Provider against a custom host. Used for testing with wiremock.
    pub fn with_base_url(base_url: &str) -> Self {
        Self::with_client(Client::with_base_url(base_url))
    }

    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            auto_adjust: true,
        }
    }

    /// When on (the default), Open/High/Low/Close are back-adjusted for
    /// splits and dividends. When off, raw prices plus an `Adj Close` column.
    pub fn with_auto_adjust(mut self, auto_adjust: bool) -> Self {
        self.auto_adjust = auto_adjust;
        self
    }
}

fn chart_query(span: &Span) -> ChartQuery {
    match span {
        Span::Period(period) => ChartQuery::period(period),
        Span::Range { start, end } => ChartQuery::range(
            start.pred_opt().unwrap_or(*start),
            end.succ_opt().unwrap_or(*end),
        ),
    }
}

#[async_trait]
impl QuoteProvider for YahooProvider {
    async fn lookup(&self, ticker: &str, span: &Span) -> Result<PriceTable, ProviderError> {
        let query = chart_query(span);
        let mut table = match self.client.get_chart(ticker, &query).await {
            Ok(chart) => chart_to_table(&chart, self.auto_adjust)?,
            Err(e) if e.is_not_found() => {
                tracing::debug!("{}: no such symbol, treating as empty", ticker);
                return Ok(PriceTable::empty());
            }
            Err(e) => return Err(e.into()),
        };
        if let Span::Range { start, end } = span {
            table.retain(|bar| (*start..*end).contains(&bar.timestamp.date_naive()));
        }
        Ok(table)
    }
}

/// Clock of the exchange a chart was traded on.
///
/// `gmtoffset` is the offset in force today, so it only stands in when the
/// named zone is missing or unknown.
#[derive(Clone, Copy, Debug)]
enum ExchangeZone {
    Named(Tz),
    Fixed(FixedOffset),
}

impl ExchangeZone {
    fn for_chart(meta: &ChartMeta) -> Self {
        match meta
            .exchange_timezone_name
            .as_deref()
            .and_then(|name| name.parse::<Tz>().ok())
        {
            Some(tz) => Self::Named(tz),
            None => Self::Fixed(FixedOffset::east_opt(meta.gmtoffset).unwrap_or_else(|| Utc.fix())),
        }
    }

    fn local(&self, epoch: i64) -> Option<DateTime<FixedOffset>> {
        let utc = DateTime::from_timestamp(epoch, 0)?;
        Some(match self {
            Self::Named(tz) => utc.with_timezone(tz).fixed_offset(),
            Self::Fixed(offset) => utc.with_timezone(offset),
        })
    }

    fn session_day(&self, epoch: i64) -> Option<NaiveDate> {
        self.local(epoch).map(|local| local.date_naive())
    }

    /// Local midnight of the session day that contains `epoch`.
    fn session_start(&self, epoch: i64) -> Option<DateTime<FixedOffset>> {
        let local = self.local(epoch)?;
        let midnight = local.date_naive().and_time(NaiveTime::MIN);
        let start = match self {
            Self::Named(tz) => tz
                .from_local_datetime(&midnight)
                .earliest()
                .map(|dt| dt.fixed_offset()),
            Self::Fixed(offset) => offset.from_local_datetime(&midnight).single(),
        };
        Some(start.unwrap_or(local))
    }
}

/// Flattens one chart result into a table, one row per timestamp.
///
/// Rows where Open, High, Low and Close are all missing are dropped.
pub fn chart_to_table(chart: &ChartResult, auto_adjust: bool) -> Result<PriceTable, ProviderError> {
    let zone = ExchangeZone::for_chart(&chart.meta);

    let mut columns: Vec<String> = ["Open", "High", "Low", "Close"]
        .iter()
        .map(|c| c.to_string())
        .collect();
    if !auto_adjust {
        columns.push("Adj Close".to_string());
    }
    columns.extend(["Volume", "Dividends", "Stock Splits"].iter().map(|c| c.to_string()));

    let mut table = PriceTable::new("Date", columns);

    // events attach to the bar of the same exchange-local day
    let mut dividends: HashMap<NaiveDate, f64> = HashMap::new();
    let mut splits: HashMap<NaiveDate, f64> = HashMap::new();
    if let Some(events) = &chart.events {
        for div in events.dividends.values() {
            if let Some(day) = zone.session_day(div.date) {
                *dividends.entry(day).or_insert(0.0) += div.amount;
            }
        }
        for split in events.splits.values() {
            if let Some(day) = zone.session_day(split.date) {
                splits.insert(day, split.ratio());
            }
        }
    }

    let quote = chart.indicators.quote.first();
    let adjclose = chart.indicators.adjclose.first();
    let at = |series: Option<&Vec<Option<f64>>>, i: usize| -> Option<f64> {
        series.and_then(|s| s.get(i).copied().flatten())
    };

    for (i, &epoch) in chart.timestamp.iter().enumerate() {
        let open = at(quote.map(|q| &q.open), i);
        let high = at(quote.map(|q| &q.high), i);
        let low = at(quote.map(|q| &q.low), i);
        let close = at(quote.map(|q| &q.close), i);
        if open.is_none() && high.is_none() && low.is_none() && close.is_none() {
            tracing::debug!("{}: dropping empty bar at {}", chart.meta.symbol, epoch);
            continue;
        }
        let adj = at(adjclose.map(|a| &a.adjclose), i);
        let volume = quote.and_then(|q| q.volume.get(i).copied().flatten());

        let Some(timestamp) = zone.session_start(epoch) else {
            tracing::warn!("{}: skipping bar with out-of-range timestamp {}", chart.meta.symbol, epoch);
            continue;
        };

        let mut values = Vec::with_capacity(table.columns().len());
        if auto_adjust {
            let ratio = match (adj, close) {
                (Some(a), Some(c)) if c != 0.0 => a / c,
                _ => 1.0,
            };
            values.push(Value::from(open.map(|v| v * ratio)));
            values.push(Value::from(high.map(|v| v * ratio)));
            values.push(Value::from(low.map(|v| v * ratio)));
            values.push(Value::from(adj.or(close)));
        } else {
            values.push(Value::from(open));
            values.push(Value::from(high));
            values.push(Value::from(low));
            values.push(Value::from(close));
            values.push(Value::from(adj.or(close)));
        }
        values.push(Value::from(volume));

        let day = timestamp.date_naive();
        values.push(Value::from(dividends.get(&day).copied().unwrap_or(0.0)));
        values.push(Value::from(splits.get(&day).copied().unwrap_or(0.0)));

        table.push_row(timestamp, values)?;
    }

    Ok(table)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use serde_json::json;
    use stockchart_api::types::ChartEnvelope;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use crate::gateway::QuoteGateway;

    fn daily_chart() -> serde_json::Value {
        json!({
            "chart": {
                "result": [{
                    "meta": { "symbol": "AAPL", "currency": "USD", "gmtoffset": -14400 },
                    "timestamp": [1710336600, 1710423000, 1710509400],
                    "events": {
                        "dividends": { "1710423000": { "amount": 0.24, "date": 1710423000 } },
                        "splits": { "1710509400": { "date": 1710509400, "numerator": 4, "denominator": 1, "splitRatio": "4:1" } }
                    },
                    "indicators": {
                        "quote": [{
                            "open": [100.0, 200.0, 300.0],
                            "high": [110.0, 210.0, 310.0],
                            "low": [90.0, 190.0, 290.0],
                            "close": [105.0, 205.0, 305.0],
                            "volume": [1000, 2000, null]
                        }],
                        "adjclose": [{ "adjclose": [52.5, 205.0, 305.0] }]
                    }
                }],
                "error": null
            }
        })
    }

    fn parse(value: serde_json::Value) -> ChartResult {
        let env: ChartEnvelope = serde_json::from_value(value).unwrap();
        env.chart.result.unwrap().into_iter().next().unwrap()
    }

    #[test]
    fn daily_columns_and_index() {
        let table = chart_to_table(&parse(daily_chart()), true).unwrap();
        assert_eq!(table.index(), "Date");
        assert_eq!(
            table.columns(),
            ["Open", "High", "Low", "Close", "Volume", "Dividends", "Stock Splits"]
        );
        assert_eq!(table.len(), 3);
    }

    #[test]
    fn daily_bars_are_local_midnight() {
        let records = chart_to_table(&parse(daily_chart()), true)
            .unwrap()
            .into_records();
        assert_eq!(records[0]["Date"], json!("2024-03-13T00:00:00-04:00"));
        assert_eq!(records[2]["Date"], json!("2024-03-15T00:00:00-04:00"));
    }

    #[test]
    fn auto_adjust_scales_prices() {
        let records = chart_to_table(&parse(daily_chart()), true)
            .unwrap()
            .into_records();
        // adjclose / close = 0.5 on the first bar
        assert_eq!(records[0]["Open"], json!(50.0));
        assert_eq!(records[0]["High"], json!(55.0));
        assert_eq!(records[0]["Low"], json!(45.0));
        assert_eq!(records[0]["Close"], json!(52.5));
        assert_eq!(records[1]["Open"], json!(200.0));
    }

    #[test]
    fn raw_prices_with_adj_close_column() {
        let table = chart_to_table(&parse(daily_chart()), false).unwrap();
        assert!(table.columns().iter().any(|c| c == "Adj Close"));
        let records = table.into_records();
        assert_eq!(records[0]["Open"], json!(100.0));
        assert_eq!(records[0]["Close"], json!(105.0));
        assert_eq!(records[0]["Adj Close"], json!(52.5));
    }

    #[test]
    fn events_land_on_matching_bars() {
        let records = chart_to_table(&parse(daily_chart()), true)
            .unwrap()
            .into_records();
        assert_eq!(records[0]["Dividends"], json!(0.0));
        assert_eq!(records[1]["Dividends"], json!(0.24));
        assert_eq!(records[2]["Stock Splits"], json!(4.0));
        assert_eq!(records[1]["Stock Splits"], json!(0.0));
    }

    #[test]
    fn missing_volume_is_null() {
        let records = chart_to_table(&parse(daily_chart()), true)
            .unwrap()
            .into_records();
        assert_eq!(records[0]["Volume"], json!(1000));
        assert_eq!(records[2]["Volume"], serde_json::Value::Null);
    }

    #[test]
    fn all_null_bars_are_dropped() {
        let chart = parse(json!({
            "chart": {
                "result": [{
                    "meta": { "symbol": "TCS.NS", "gmtoffset": 19800 },
                    "timestamp": [1710475200, 1710561600],
                    "indicators": {
                        "quote": [{
                            "open": [null, 4000.0],
                            "high": [null, 4050.0],
                            "low": [null, 3980.0],
                            "close": [null, 4020.0],
                            "volume": [null, 10]
                        }]
                    }
                }],
                "error": null
            }
        }));
        let records = chart_to_table(&chart, true)
            .unwrap()
            .into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["Close"], json!(4020.0));
        assert_eq!(records[0]["Date"], json!("2024-03-16T00:00:00+05:30"));
    }

    #[test]
    fn no_timestamps_means_empty_table() {
        let chart = parse(json!({
            "chart": {
                "result": [{
                    "meta": { "symbol": "AAPL", "gmtoffset": -14400 },
                    "indicators": { "quote": [{}], "adjclose": [{}] }
                }],
                "error": null
            }
        }));
        assert!(chart_to_table(&chart, true).unwrap().is_empty());
    }

    #[tokio::test]
    async fn lookup_period_hits_chart_endpoint() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/AAPL"))
            .and(query_param("range", "5d"))
            .and(query_param("interval", "1d"))
            .respond_with(ResponseTemplate::new(200).set_body_json(daily_chart()))
            .expect(1)
            .mount(&server)
            .await;

        let provider = YahooProvider::with_base_url(&server.uri());
        let table = provider
            .lookup("AAPL", &Span::Period("5d".to_string()))
            .await
            .unwrap();
        assert_eq!(table.len(), 3);
    }

    #[tokio::test]
    async fn lookup_range_widens_request_then_keeps_requested_days() {
        let server = MockServer::start().await;
        // [2024-03-14, 2024-03-17) in UTC for a request of [2024-03-15, 2024-03-16)
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/AAPL"))
            .and(query_param("period1", "1710374400"))
            .and(query_param("period2", "1710633600"))
            .respond_with(ResponseTemplate::new(200).set_body_json(daily_chart()))
            .expect(1)
            .mount(&server)
            .await;

        let provider = YahooProvider::with_base_url(&server.uri());
        let span = Span::Range {
            start: NaiveDate::from_ymd_opt(2024, 3, 15).unwrap(),
            end: NaiveDate::from_ymd_opt(2024, 3, 16).unwrap(),
        };
        let records = provider.lookup("AAPL", &span).await.unwrap().into_records();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0]["Date"], json!("2024-03-15T00:00:00-04:00"));
    }

    // ASX sessions open at 10:00 AEDT, which is 23:00 UTC the previous day.
    fn asx_chart() -> serde_json::Value {
        json!({
            "chart": {
                "result": [{
                    "meta": {
                        "symbol": "BHP.AX",
                        "currency": "AUD",
                        "exchangeTimezoneName": "Australia/Sydney",
                        "gmtoffset": 39600
                    },
                    "timestamp": [1710370800, 1710457200],
                    "indicators": {
                        "quote": [{
                            "open": [44.0, 45.0],
                            "high": [44.5, 45.5],
                            "low": [43.5, 44.5],
                            "close": [44.2, 45.2],
                            "volume": [7000000, 8000000]
                        }]
                    }
                }],
                "error": null
            }
        })
    }

    async fn asx_server() -> MockServer {
        let server = MockServer::start().await;
        for (period1, period2) in [("1710374400", "1710633600"), ("1710288000", "1710547200")] {
            Mock::given(method("GET"))
                .and(path("/v8/finance/chart/BHP.AX"))
                .and(query_param("period1", period1))
                .and(query_param("period2", period2))
                .respond_with(ResponseTemplate::new(200).set_body_json(asx_chart()))
                .mount(&server)
                .await;
        }
        server
    }

    #[tokio::test]
    async fn by_date_east_of_utc_returns_that_local_session() {
        let server = asx_server().await;
        let gateway = QuoteGateway::new(Arc::new(YahooProvider::with_base_url(&server.uri())));

        let friday = gateway.by_date("BHP.AX", "2024-03-15").await.unwrap();
        assert_eq!(friday["Date"], json!("2024-03-15T00:00:00+11:00"));
        assert_eq!(friday["Close"], json!(45.2));

        let thursday = gateway.by_date("BHP.AX", "2024-03-14").await.unwrap();
        assert_eq!(thursday["Date"], json!("2024-03-14T00:00:00+11:00"));
        assert_eq!(thursday["Close"], json!(44.2));
    }

    #[test]
    fn named_zone_gives_the_offset_in_force_on_the_bar_day() {
        // AAPL 2024-01-15 09:30 EST, fetched while gmtoffset reports EDT
        let chart = parse(json!({
            "chart": {
                "result": [{
                    "meta": {
                        "symbol": "AAPL",
                        "exchangeTimezoneName": "America/New_York",
                        "gmtoffset": -14400
                    },
                    "timestamp": [1705329000],
                    "indicators": {
                        "quote": [{
                            "open": [182.16], "high": [184.26], "low": [180.93],
                            "close": [183.63], "volume": [65076600]
                        }]
                    }
                }],
                "error": null
            }
        }));
        let records = chart_to_table(&chart, true).unwrap().into_records();
        assert_eq!(records[0]["Date"], json!("2024-01-15T00:00:00-05:00"));
    }

    #[test]
    fn unknown_zone_name_falls_back_to_gmtoffset() {
        let mut value = daily_chart();
        value["chart"]["result"][0]["meta"]["exchangeTimezoneName"] = json!("Mars/Olympus_Mons");
        let records = chart_to_table(&parse(value), true).unwrap().into_records();
        assert_eq!(records[0]["Date"], json!("2024-03-13T00:00:00-04:00"));
    }

    #[tokio::test]
    async fn unknown_symbol_is_an_empty_table() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/NOTAREALTICKER"))
            .respond_with(ResponseTemplate::new(404).set_body_json(json!({
                "chart": {
                    "result": null,
                    "error": { "code": "Not Found", "description": "No data found, symbol may be delisted" }
                }
            })))
            .mount(&server)
            .await;

        let provider = YahooProvider::with_base_url(&server.uri());
        let table = provider
            .lookup("NOTAREALTICKER", &Span::Period("1d".to_string()))
            .await
            .unwrap();
        assert!(table.is_empty());
    }

    #[tokio::test]
    async fn other_upstream_errors_carry_their_description() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/v8/finance/chart/AAPL"))
            .respond_with(ResponseTemplate::new(422).set_body_json(json!({
                "chart": {
                    "result": null,
                    "error": { "code": "Unprocessable Entity", "description": "Invalid input - range=7x is not supported" }
                }
            })))
            .mount(&server)
            .await;

        let provider = YahooProvider::with_base_url(&server.uri());
        let err = provider
            .lookup("AAPL", &Span::Period("7x".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.message(), "Invalid input - range=7x is not supported");
    }
}
