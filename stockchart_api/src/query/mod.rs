//! Query builders for the chart endpoint.

use url::Url;

mod chart;
pub use self::chart::{ChartQuery, ChartSpan};

/// Implemented by query builders. Serializes the query onto a request URL.
pub trait Query {
    /// Appends this query's parameters to the given URL, returning the modified URL.
    fn add_to_url(&self, url: &Url) -> Url;
}
