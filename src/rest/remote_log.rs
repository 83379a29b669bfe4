//! `POST /remote-log` — single or batched log ingestion.

use axum::{Json, extract::State};
use serde::Deserialize;

use super::{AppState, error::ApiError};
use crate::log_sink::LogEntry;

/// A single log record, as submitted without a batch wrapper.
#[derive(Debug, Deserialize)]
struct SingleLog {
    source: String,
    level: String,
    message: String,
    timestamp: String,
}

/// A batch of log records sharing one source.
#[derive(Debug, Deserialize)]
struct BatchLog {
    source: String,
    logs: Vec<BatchEntry>,
}

#[derive(Debug, Deserialize)]
struct BatchEntry {
    level: String,
    message: String,
    timestamp: String,
}

/// Either shape accepted by `POST /remote-log`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RemoteLogRequest {
    Batch(BatchLog),
    Single(SingleLog),
}

/// Accept a single or batched log submission and append it to the matching
/// source's sink file.
///
/// # Errors
/// Returns [`ApiError::Internal`] if the underlying write fails. An unknown
/// source is accepted and silently discarded, per the wire contract.
pub async fn ingest(
    State(state): State<AppState>,
    Json(request): Json<RemoteLogRequest>,
) -> Result<(), ApiError> {
    let (source, entries) = match request {
        RemoteLogRequest::Single(single) => (
            single.source,
            vec![LogEntry {
                level: single.level,
                message: single.message,
                timestamp: single.timestamp,
            }],
        ),
        RemoteLogRequest::Batch(batch) => {
            let entries = batch
                .logs
                .into_iter()
                .map(|entry| LogEntry {
                    level: entry.level,
                    message: entry.message,
                    timestamp: entry.timestamp,
                })
                .collect();
            (batch.source, entries)
        }
    };

    let sink = state.log_sink;
    tokio::task::spawn_blocking(move || sink.write_batch(&source, &entries))
        .await
        .map_err(|err| ApiError::Internal(err.into()))?
        .map_err(|err| ApiError::Internal(err.into()))
}
