#[derive(thiserror::Error, Debug)]
pub enum Error {
    /// The RPC backend refused the request due to rate limiting. Retryable.
    #[error("rpc rate limited")]
    RateLimited,

    /// Any other RPC failure. Not retryable.
    #[error("rpc error: {reason}")]
    Rpc { reason: String },

    #[error("config error: {reason}")]
    Config { reason: String },

    #[error("parse error: {reason}")]
    Parse { reason: String },

    /// The log walk recovered a different number of invocation indexes than
    /// there are fulfillment events, so positional pairing cannot be trusted.
    #[error("fulfillment correlation mismatch: {event_count} events, {index_count} invocation indexes")]
    CorrelationMismatch {
        event_count: usize,
        index_count: usize,
    },

    #[error("token metadata lookup failed: {reason}")]
    Metadata { reason: String },

    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
