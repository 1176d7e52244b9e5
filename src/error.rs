//! Error types for WhatsOnChain operations.

/// Errors that can occur when querying WhatsOnChain or verifying proofs.
#[derive(Debug, thiserror::Error)]
pub enum WhatsOnChainError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Failed to serialize or deserialize data.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Server returned a non-2xx response.
    #[error("server error ({status_code}): {message}")]
    ServerError {
        /// HTTP status code.
        status_code: u16,
        /// Error message from server.
        message: String,
    },

    /// Resource not found (404).
    #[error("not found")]
    NotFound,

    /// Block header fetch failed or returned malformed data.
    #[error("header unavailable: {0}")]
    HeaderUnavailable(String),

    /// The recomputed Merkle root did not match the block header's root,
    /// or the proof data itself is malformed.
    #[error("invalid merkle proof: {0}")]
    InvalidProof(String),

    /// A raw source transaction could not be fetched during ancestor
    /// resolution.
    #[error("source transaction fetch failed: {0}")]
    SourceFetchFailed(String),

    /// Hex decoding failed.
    #[error("hex error: {0}")]
    Hex(#[from] hex::FromHexError),

    /// Invalid 32-byte hash data.
    #[error("invalid hash: {0}")]
    InvalidHash(String),

    /// Malformed raw transaction data.
    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    /// Ran out of bytes while reading wire data.
    #[error("unexpected end of data")]
    UnexpectedEof,
}
