//! A minimal in-process `InferenceService` used to exercise the happy-path
//! frame pipeline without a real downstream AI backend.
//!
//! Returns a fixed, caller-supplied detection list for every
//! `ProcessFrame` call, mirroring exactly what a downstream model would
//! hand back over the wire.

use std::net::SocketAddr;

use frame_gateway::inference::proto::{
    BoundingBox, Detection, ModelInfoRequest, ModelInfoResponse, ProcessFrameRequest, ProcessFrameResponse,
    ServerStatsRequest, ServerStatsResponse, inference_service_server::{InferenceService, InferenceServiceServer},
};
use tokio::{net::TcpListener, task::JoinHandle};
use tonic::{Request, Response, Status, transport::Server};

use crate::AnyError;

/// One canned detection returned by [`MockInferenceService`].
#[derive(Debug, Clone)]
pub struct MockDetection {
    pub class_name: String,
    pub confidence: f32,
    pub bbox: (f32, f32, f32, f32),
}

/// `InferenceService` stub that always returns the same detection list.
struct MockInferenceService {
    detections: Vec<MockDetection>,
}

#[tonic::async_trait]
impl InferenceService for MockInferenceService {
    async fn process_frame(
        &self,
        _request: Request<ProcessFrameRequest>,
    ) -> Result<Response<ProcessFrameResponse>, Status> {
        let detections = self
            .detections
            .iter()
            .map(|d| Detection {
                class_name: d.class_name.clone(),
                confidence: d.confidence,
                bbox: Some(BoundingBox { x_min: d.bbox.0, y_min: d.bbox.1, x_max: d.bbox.2, y_max: d.bbox.3 }),
            })
            .collect();
        Ok(Response::new(ProcessFrameResponse {
            success: true,
            message: "ok".to_owned(),
            detections,
            processing_time_ms: 1.0,
        }))
    }

    async fn get_model_info(&self, _request: Request<ModelInfoRequest>) -> Result<Response<ModelInfoResponse>, Status> {
        Ok(Response::new(ModelInfoResponse {
            model_name: "mock".to_owned(),
            model_version: "0".to_owned(),
            supported_formats: vec!["jpeg".to_owned(), "rgba".to_owned(), "grayscale".to_owned()],
        }))
    }

    async fn get_server_stats(
        &self,
        _request: Request<ServerStatsRequest>,
    ) -> Result<Response<ServerStatsResponse>, Status> {
        Ok(Response::new(ServerStatsResponse { frames_processed: 0, average_latency_ms: 0.0, active_workers: 1 }))
    }
}

/// A running mock inference server, shut down when dropped.
pub struct MockInferenceServer {
    addr: SocketAddr,
    handle: JoinHandle<()>,
}

impl MockInferenceServer {
    /// Bind to an ephemeral loopback port and start serving `detections` for
    /// every `ProcessFrame` call.
    ///
    /// # Errors
    /// Returns an error if the listener cannot be bound.
    pub async fn start(detections: Vec<MockDetection>) -> Result<Self, AnyError> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let service = MockInferenceService { detections };

        let handle = tokio::spawn(async move {
            let incoming = tokio_stream_from_listener(listener);
            let _ = Server::builder()
                .add_service(InferenceServiceServer::new(service))
                .serve_with_incoming(incoming)
                .await;
        });

        Ok(Self { addr, handle })
    }

    /// The address the mock server is listening on.
    #[must_use]
    pub const fn addr(&self) -> SocketAddr { self.addr }
}

impl Drop for MockInferenceServer {
    fn drop(&mut self) { self.handle.abort(); }
}

fn tokio_stream_from_listener(
    listener: TcpListener,
) -> impl futures_util::Stream<Item = std::io::Result<tokio::net::TcpStream>> {
    futures_util::stream::unfold(listener, |listener| async move {
        let accepted = listener.accept().await.map(|(stream, _addr)| stream);
        Some((accepted, listener))
    })
}
