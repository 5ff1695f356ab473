//! Error types for the AlphaLend report

use thiserror::Error;

/// Errors that can occur when talking to the chain or a price source
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network request failed
    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    /// The node answered with a JSON-RPC error object
    #[error("RPC error {code}: {message}")]
    RpcError { code: i64, message: String },

    /// Invalid or unexpected response shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// No market with this id exists in the markets table
    #[error("Market not found: {0}")]
    MarketNotFound(u64),

    /// A referenced on-chain object does not exist
    #[error("Object not found: {0}")]
    ObjectNotFound(String),

    /// The node answered with a non-success HTTP status
    #[error("RPC HTTP error {status}: {body}")]
    RpcHttp { status: u16, body: String },

    /// Price API error
    #[error("Price API error: {0}")]
    ApiError(String),
}

impl ClientError {
    /// Creates an InvalidResponse error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }
}

/// Errors raised while reading configuration from the environment
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A variable was set to something unusable
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

/// Fatal errors of a report run
#[derive(Debug, Error)]
pub enum ReportError {
    #[error(transparent)]
    Client(#[from] ClientError),

    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error("Failed to encode market record: {0}")]
    Encode(#[from] serde_json::Error),

    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),
}

/// Renders an error followed by its `source()` chain, joined with `": "`
///
/// Causes whose text is already part of the message are not repeated.
pub fn error_chain(err: &dyn std::error::Error) -> String {
    let mut message = err.to_string();
    let mut source = err.source();
    while let Some(cause) = source {
        let text = cause.to_string();
        if !message.contains(&text) {
            message.push_str(": ");
            message.push_str(&text);
        }
        source = cause.source();
    }
    message
}
