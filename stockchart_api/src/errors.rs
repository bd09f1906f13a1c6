//! Error types for the chart client.

/// Errors that can occur when requesting chart data.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The request could not be built or sent, or the body could not be read.
    #[error("{0}")]
    RequestFailed(String),
    /// The API returned a non-success status without a chart error payload.
    #[error("Request failed with status {status}: {body}")]
    HttpStatus { status: u16, body: String },
    /// The API answered with a chart error object (`chart.error`).
    #[error("{description}")]
    Chart {
        status: u16,
        code: String,
        description: String,
    },
    /// The body was not a chart envelope we understand.
    #[error("Failed to parse chart response: {0}")]
    Parse(String),
}

impl Error {
    /// Yahoo reports unknown and delisted symbols as a 404 with code `Not Found`.
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::Chart { code, .. } if code == "Not Found")
    }
}
