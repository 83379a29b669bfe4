//! Connect-with-retry for a single pooled inference client.

use std::time::Duration;

use tokio::time::{sleep, timeout};
use tonic::transport::{Channel, Endpoint};
use tracing::warn;

use super::{
    errors::InferenceError,
    proto::{ModelInfoRequest, inference_service_client::InferenceServiceClient},
};

const INITIAL_BACKOFF: Duration = Duration::from_secs(1);
const BACKOFF_FACTOR: u32 = 2;
const MAX_BACKOFF: Duration = Duration::from_secs(30);
const MAX_ATTEMPTS: u32 = 10;
const LIVENESS_DEADLINE: Duration = Duration::from_secs(5);

/// Connect to the inference service at `addr`, retrying with exponential
/// backoff (1 s initial, factor 2, capped at 30 s, up to 10 attempts).
///
/// Each candidate connection is verified live by invoking the lightweight
/// `GetModelInfo` RPC within a 5 s deadline before being admitted.
///
/// # Errors
/// Returns [`InferenceError::Connect`] if every attempt fails.
pub async fn connect_with_retry(addr: &str) -> Result<InferenceServiceClient<Channel>, InferenceError> {
    let mut backoff = INITIAL_BACKOFF;
    let mut last_err = InferenceError::Connect("no attempts made".to_owned());

    for attempt in 0..MAX_ATTEMPTS {
        match connect_once(addr).await {
            Ok(client) => return Ok(client),
            Err(err) => {
                warn!(attempt, %err, "inference client connect attempt failed");
                last_err = err;
                sleep(backoff).await;
                backoff = backoff.saturating_mul(BACKOFF_FACTOR).min(MAX_BACKOFF);
            }
        }
    }
    Err(last_err)
}

async fn connect_once(addr: &str) -> Result<InferenceServiceClient<Channel>, InferenceError> {
    let endpoint =
        Endpoint::from_shared(addr.to_owned()).map_err(|err| InferenceError::Connect(err.to_string()))?;
    let channel = endpoint.connect().await?;
    let mut client = InferenceServiceClient::new(channel);

    timeout(LIVENESS_DEADLINE, client.get_model_info(ModelInfoRequest {}))
        .await
        .map_err(|_elapsed| InferenceError::Connect("liveness check timed out".to_owned()))??;

    Ok(client)
}
