//! Crate-level error types.
//!
//! [`BursarError`] unifies every error source (configuration, transport,
//! server-side rejections, JSON) behind a single enum so callers can match
//! on the variant they care about while still using the `?` operator for
//! easy propagation.
//!
//! The four variants `Auth`, `Tls`, `Connection`, and `InvalidDataset` are
//! the session adapter's typed failure surface; the setup wizard maps them
//! to user-facing error codes.

/// Convenience alias used throughout the crate.
pub type Result<T> = std::result::Result<T, BursarError>;

/// Top-level error type returned by all public APIs.
#[derive(Debug, thiserror::Error)]
pub enum BursarError {
    /// Configuration is missing, malformed, or inconsistent.
    #[error("configuration error: {0}")]
    Config(String),

    /// The server rejected the configured password or session token.
    #[error("authentication failed: {0}")]
    Auth(String),

    /// TLS setup or the TLS handshake with the server failed.
    #[error("tls error: {0}")]
    Tls(String),

    /// The server could not be reached, or the transport failed mid-request.
    #[error("connection error: {0}")]
    Connection(String),

    /// The configured dataset is unknown to the server, or unusable
    /// (e.g. encrypted without an encryption password).
    #[error("invalid dataset: {0}")]
    InvalidDataset(String),

    /// JSON serialization or deserialization failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}
