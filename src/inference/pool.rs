//! Round-robin pool of long-lived inference RPC clients.

use std::sync::atomic::{AtomicUsize, Ordering};

use tonic::transport::Channel;

use super::{
    client::connect_with_retry,
    errors::InferenceError,
    proto::{
        ModelInfoRequest, ModelInfoResponse, ProcessFrameRequest, ProcessFrameResponse,
        ServerStatsRequest, ServerStatsResponse, inference_service_client::InferenceServiceClient,
    },
};

/// A fixed-size pool of long-lived gRPC clients, selected round-robin.
///
/// `tonic` clients are cheap to clone (the underlying `Channel` is
/// reference-counted), so each call clones the selected client rather than
/// holding a lock across the RPC.
pub struct InferencePool {
    clients: Vec<InferenceServiceClient<Channel>>,
    counter: AtomicUsize,
}

impl InferencePool {
    /// Construct a pool of `size` clients against `host:port`.
    ///
    /// Clients are created sequentially; if any fails, the pool is
    /// discarded and construction fails rather than proceeding with a
    /// partially built pool.
    ///
    /// # Errors
    /// Returns the [`InferenceError`] reported by the first failing client.
    pub async fn connect(host: &str, port: u16, size: usize) -> Result<Self, InferenceError> {
        let addr = format!("http://{host}:{port}");
        let mut clients = Vec::with_capacity(size);
        for _ in 0..size {
            let client = connect_with_retry(&addr).await?;
            clients.push(client);
        }
        Ok(Self {
            clients,
            counter: AtomicUsize::new(0),
        })
    }

    /// Build a degraded pool with zero clients.
    ///
    /// Every call returns [`InferenceError::NoBackend`] rather than
    /// panicking or blocking.
    #[must_use]
    pub const fn degraded() -> Self {
        Self {
            clients: Vec::new(),
            counter: AtomicUsize::new(0),
        }
    }

    /// Number of clients in the pool.
    #[must_use]
    pub fn len(&self) -> usize { self.clients.len() }

    /// Whether the pool has no clients (degraded mode).
    #[must_use]
    pub fn is_empty(&self) -> bool { self.clients.is_empty() }

    fn next_client(&self) -> Option<InferenceServiceClient<Channel>> {
        if self.clients.is_empty() {
            return None;
        }
        #[expect(
            clippy::integer_division_remainder_used,
            reason = "round-robin selection over a fixed-size pool"
        )]
        let index = self.counter.fetch_add(1, Ordering::Relaxed) % self.clients.len();
        self.clients.get(index).cloned()
    }

    /// Dispatch a frame to the next client in round-robin order.
    ///
    /// # Errors
    /// Returns [`InferenceError::NoBackend`] in degraded mode, or
    /// [`InferenceError::Rpc`] if the underlying call fails.
    pub async fn process_frame(
        &self,
        frame_bytes: Vec<u8>,
        width: i32,
        height: i32,
        channels: i32,
        format_tag: String,
    ) -> Result<ProcessFrameResponse, InferenceError> {
        let Some(mut client) = self.next_client() else {
            return Err(InferenceError::NoBackend);
        };
        let request = ProcessFrameRequest {
            frame_bytes,
            width,
            height,
            channels,
            format_tag,
        };
        let response = client.process_frame(request).await?;
        Ok(response.into_inner())
    }

    /// Fetch model metadata from the next client in round-robin order.
    ///
    /// # Errors
    /// Returns [`InferenceError::NoBackend`] in degraded mode, or
    /// [`InferenceError::Rpc`] if the underlying call fails.
    pub async fn get_model_info(&self) -> Result<ModelInfoResponse, InferenceError> {
        let Some(mut client) = self.next_client() else {
            return Err(InferenceError::NoBackend);
        };
        let response = client.get_model_info(ModelInfoRequest {}).await?;
        Ok(response.into_inner())
    }

    /// Fetch server statistics from the next client in round-robin order.
    ///
    /// # Errors
    /// Returns [`InferenceError::NoBackend`] in degraded mode, or
    /// [`InferenceError::Rpc`] if the underlying call fails.
    pub async fn get_server_stats(&self) -> Result<ServerStatsResponse, InferenceError> {
        let Some(mut client) = self.next_client() else {
            return Err(InferenceError::NoBackend);
        };
        let response = client.get_server_stats(ServerStatsRequest {}).await?;
        Ok(response.into_inner())
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn degraded_pool_reports_no_backend_on_select() {
        let pool = InferencePool::degraded();
        assert!(pool.is_empty());
        assert!(pool.next_client().is_none());
    }
}
