//! Binary and JSON wire framings for the frame envelope, plus the response shape.

pub mod envelope;
pub mod errors;
pub mod response;

pub use envelope::{Envelope, decode_envelope, encode_binary};
pub use errors::WireError;
pub use response::{AiResults, BoundingBox, Detection, FrameResponse};
