//! The reply abstraction shared by the connection-oriented and UDP transports.

use async_trait::async_trait;
use thiserror::Error;

use crate::wire::FrameResponse;

/// Failure delivering a [`FrameResponse`] back to the client.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResponderError {
    /// The underlying transport failed to write the reply.
    #[error("failed to send response: {0}")]
    Send(String),
}

/// A reply channel abstracting over the connection-oriented and UDP
/// transports, so [`super::process_frame`] runs identically over either.
#[async_trait]
pub trait Responder: Send {
    /// Deliver a response to the client that sent the envelope being processed.
    ///
    /// # Errors
    /// Returns [`ResponderError::Send`] if the underlying transport write fails.
    async fn respond(&mut self, response: FrameResponse) -> Result<(), ResponderError>;
}
