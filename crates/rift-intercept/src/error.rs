//! Error types for request interception.

/// Errors surfaced by the interception core, the normalizer and stub configuration.
#[derive(Debug, thiserror::Error)]
pub enum InterceptError {
    #[error("Invalid request URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    /// The request handler failed. This is never treated as "no mock".
    #[error("Request handler failed: {0}")]
    Handler(#[source] anyhow::Error),

    #[error("Response stream already ended; cannot push more data")]
    StreamEnded,

    #[error("Request {0} has already been ended")]
    AlreadyFinished(uuid::Uuid),

    #[error("Invalid intercept configuration: {0}")]
    Config(String),
}
