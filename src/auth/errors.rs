//! Error taxonomy for the auth core.

use thiserror::Error;

/// A single opaque failure covering every way token verification can fail.
///
/// Per the wire contract, the reason (wrong algorithm, expired, missing
/// claim, bad signature) is never disclosed to the caller beyond this
/// variant's display text.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum AuthError {
    /// Token verification failed for any reason.
    #[error("Unauthorized")]
    Unauthorized,
}
