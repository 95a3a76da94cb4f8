use reqwest::StatusCode;

/// Errors raised by the aggregation engine and display parameter validation
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum AggregationError {
    #[error("Cannot aggregate an empty level list")]
    EmptyInput,
    #[error("Invalid parameter: {0}")] InvalidParameter(String),
    #[error("Arithmetic overflow: {0}")] Overflow(String),
}

/// Errors raised while fetching and validating a depth snapshot
#[derive(thiserror::Error, Debug)]
pub enum FetchError {
    #[error("Transport error: {0}")] Transport(#[from] reqwest::Error),
    #[error("Depth endpoint returned {status}: {body}")] Status {
        status: StatusCode,
        body: String,
    },
    #[error("Failed to decode depth response: {0}")] Decode(#[from] serde_json::Error),
    #[error("Malformed {side} level [{price}, {quantity}]: {reason}")] MalformedLevel {
        side: &'static str,
        price: String,
        quantity: String,
        reason: String,
    },
    #[error("Snapshot for {symbol} has an empty {side} side")] EmptyBook {
        symbol: String,
        side: &'static str,
    },
    #[error("Depth request timed out after {0:?}")] Timeout(std::time::Duration),
    #[error("Invalid request: {0}")] Request(String),
}
