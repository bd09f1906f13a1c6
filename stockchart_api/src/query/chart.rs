//! Query builder for `/v8/finance/chart/{ticker}`.

use chrono::{NaiveDate, NaiveTime};
use url::Url;

use super::Query;

// Daily bars, regular session only, with dividend and split events.
const INTERVAL: &str = "1d";
const EVENTS: &str = "div,splits";

/// Which slice of history to request.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ChartSpan {
    /// A relative period token such as `5d`, `1mo` or `max`, passed through verbatim.
    Period(String),
    /// Epoch seconds; `start` inclusive, `end` exclusive.
    Range { start: i64, end: i64 },
}

/// Chart request parameters.
#[derive(Clone, Debug)]
pub struct ChartQuery {
    pub span: ChartSpan,
}

impl ChartQuery {
    /// History for a relative period ending now.
    pub fn period(period: &str) -> Self {
        Self {
            span: ChartSpan::Period(period.to_string()),
        }
    }

    /// History between two calendar dates taken at UTC midnight.
    /// `end` is exclusive on the Yahoo side.
    pub fn range(start: NaiveDate, end: NaiveDate) -> Self {
        Self {
            span: ChartSpan::Range {
                start: midnight_utc(start),
                end: midnight_utc(end),
            },
        }
    }
}

fn midnight_utc(date: NaiveDate) -> i64 {
    date.and_time(NaiveTime::MIN).and_utc().timestamp()
}

impl Query for ChartQuery {
    fn add_to_url(&self, url: &Url) -> Url {
        let mut url = url.clone();
        url.query_pairs_mut()
            .append_pair("interval", INTERVAL)
            .append_pair("includePrePost", "false")
            .append_pair("events", EVENTS);
        match &self.span {
            ChartSpan::Period(period) => {
                url.query_pairs_mut().append_pair("range", period);
            }
            ChartSpan::Range { start, end } => {
                url.query_pairs_mut()
                    .append_pair("period1", &start.to_string())
                    .append_pair("period2", &end.to_string());
            }
        }
        url
    }
}
