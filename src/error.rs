//! Crate-level error types.
//!
//! [`FeedError`] unifies every error source (configuration, HTTP,
//! WebSocket, JSON) behind a single enum so callers can match on the
//! variant they care about while still using the `?` operator for easy
//! propagation.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, FeedError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum FeedError {
    /// A command-line option was malformed or missing its value.
    #[error("configuration error: {0}")]
    Config(String),

    /// Exchange metadata was missing or unusable (e.g. no quote precision).
    #[error("metadata error: {0}")]
    Metadata(String),

    /// An HTTP request for metadata or a depth snapshot failed.
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// A WebSocket operation (connect, send, receive) failed.
    #[error("websocket error: {0}")]
    WebSocket(#[from] tungstenite::Error),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// Writing an output record to the process stream failed.
    #[error("output error: {0}")]
    Output(#[from] std::io::Error),
}
