//! The outgoing response shape, shared by both transports.
//!
//! Responses are always JSON, even when the request arrived in binary
//! framing. For UDP, the serialized bytes are re-chunked using the same
//! 12-byte header described in [`crate::udp::chunk`].

use serde::{Deserialize, Serialize};

/// A single detected object region.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BoundingBox {
    /// Left edge, in the `[0, 1]` normalized coordinate space.
    pub x_min: f64,
    /// Top edge.
    pub y_min: f64,
    /// Right edge.
    pub x_max: f64,
    /// Bottom edge.
    pub y_max: f64,
}

/// One inference detection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    /// Detected class label.
    pub class_name: String,
    /// Model confidence, in `[0, 1]`.
    pub confidence: f64,
    /// Detection bounding box.
    pub bbox: BoundingBox,
}

/// The `ai_results` object nested in the frame response.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct AiResults {
    /// Ordered detections, in the order returned by the inference backend.
    ///
    /// Always present, even when empty — never omitted.
    pub detections: Vec<Detection>,
}

/// The JSON shape returned to a client for a single processed frame.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FrameResponse {
    /// Whether the frame was processed successfully.
    pub success: bool,
    /// Human-readable status, never disclosing auth failure reasons.
    pub message: String,
    /// Opaque identifier for this response (the client's session id).
    pub frame_id: String,
    /// Echoed frame sequence number from the request.
    pub frame_sequence: u64,
    /// Inference results; an empty array rather than absent when there were
    /// no detections.
    pub ai_results: AiResults,
    /// Echoed image width.
    pub original_width: i32,
    /// Echoed image height.
    pub original_height: i32,
}

impl FrameResponse {
    /// Build a rejection response with no AI results.
    #[must_use]
    pub fn rejected(frame_id: String, frame_sequence: u64, message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            frame_id,
            frame_sequence,
            ai_results: AiResults::default(),
            original_width: 0,
            original_height: 0,
        }
    }
}
