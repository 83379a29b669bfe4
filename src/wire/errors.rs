//! Error taxonomy for the wire codec.

use thiserror::Error;

/// Failures that can occur while decoding a frame envelope.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum WireError {
    /// A declared length field ran past the end of the buffer.
    #[error("malformed envelope")]
    Malformed,
    /// The JSON framing fallback failed to parse.
    #[error("malformed envelope: invalid json")]
    InvalidJson,
    /// The JSON framing fallback's `data` field was not valid base64.
    #[error("malformed envelope: invalid base64 payload")]
    InvalidBase64,
    /// The buffer was empty.
    #[error("malformed envelope: empty input")]
    Empty,
}
