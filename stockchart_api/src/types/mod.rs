mod chart;
pub use self::chart::{
    AdjCloseSeries, Chart, ChartEnvelope, ChartError, ChartMeta, ChartResult, Dividend, Events,
    Indicators, QuoteSeries, Split,
};
