//! Client pool for the downstream AI inference service.

mod client;
mod errors;
mod pool;
/// Generated gRPC message and service types.
///
/// Public so that test harnesses can stand up a mock `InferenceService`
/// server without duplicating the wire contract; the gateway itself only
/// ever exercises the client side through [`InferencePool`].
pub mod proto;

pub use client::connect_with_retry;
pub use errors::InferenceError;
pub use pool::InferencePool;
pub use proto::{
    BoundingBox as ProtoBoundingBox, Detection as ProtoDetection, ModelInfoResponse,
    ProcessFrameResponse, ServerStatsResponse,
};
