//! Error taxonomy for the inference client pool.

use thiserror::Error;

/// Failures surfaced by the inference client pool.
#[derive(Debug, Error)]
pub enum InferenceError {
    /// No pooled client is available (degraded `N=0` construction).
    #[error("No inference backend available")]
    NoBackend,
    /// Client construction failed after exhausting the retry budget.
    #[error("failed to connect to inference backend: {0}")]
    Connect(String),
    /// A transport error from the underlying RPC.
    #[error("AI Error: {0}")]
    Rpc(String),
}

impl From<tonic::transport::Error> for InferenceError {
    fn from(err: tonic::transport::Error) -> Self { Self::Connect(err.to_string()) }
}

impl From<tonic::Status> for InferenceError {
    fn from(status: tonic::Status) -> Self { Self::Rpc(status.message().to_owned()) }
}
