//! The Frame Pipeline: parse, authenticate, validate, dispatch, respond, audit.
//!
//! [`PipelineContext::process_frame`] is the single execution path shared by
//! the connection-oriented binary transport and the UDP transport; callers
//! supply a [`Responder`] so the two transports can reuse the exact same
//! decode/auth/dispatch/audit logic.

mod responder;

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, warn};

pub use responder::{Responder, ResponderError};

use crate::{
    auth::{Claims, verify_token},
    db::{WritePool, record_scan},
    inference::{InferencePool, ProtoDetection},
    models::NewScanAudit,
    wire::{AiResults, BoundingBox, Detection, Envelope, FrameResponse, decode_envelope},
};

/// Shared, cheaply-cloneable state the pipeline needs for every frame.
#[derive(Clone)]
pub struct PipelineContext {
    /// HMAC secret used to verify bearer tokens carried in the envelope.
    pub auth_secret: Arc<str>,
    /// Pool of downstream inference RPC clients.
    pub inference: Arc<InferencePool>,
    /// Single-connection write pool, used for the best-effort audit insert.
    pub write_pool: WritePool,
}

const fn channel_count(format: &str) -> i32 {
    match format {
        "rgba" => 4,
        "grayscale" => 1,
        _ => 3,
    }
}

fn convert_detection(detection: ProtoDetection) -> Detection {
    let bbox = detection.bbox.unwrap_or_default();
    Detection {
        class_name: detection.class_name,
        confidence: f64::from(detection.confidence),
        bbox: BoundingBox {
            x_min: f64::from(bbox.x_min),
            y_min: f64::from(bbox.y_min),
            x_max: f64::from(bbox.x_max),
            y_max: f64::from(bbox.y_max),
        },
    }
}

impl PipelineContext {
    /// Run one envelope through the six-step pipeline.
    ///
    /// Never propagates an error: every failure mode is either translated
    /// into a client-facing response, or silently dropped per the edge
    /// policy for semantic-validation failures.
    pub async fn process_frame(&self, bytes: &[u8], responder: &mut dyn Responder) {
        let Some(envelope) = self.parse(bytes, responder).await else {
            return;
        };

        let Some(claims) = self.authenticate(&envelope, responder).await else {
            return;
        };

        if !semantically_valid(&envelope) {
            debug!(session_id = %envelope.session_id, "dropping frame that failed semantic validation");
            return;
        }

        let (response, outcome, detection_count) = self.dispatch(&envelope).await;

        if let Err(err) = responder.respond(response).await {
            warn!(%err, "failed to send frame response");
        }

        // Spawned so the audit write never delays the response already sent
        // above, nor serializes behind the next frame read on this connection.
        let ctx = self.clone();
        tokio::spawn(async move {
            ctx.audit(&envelope, &claims, outcome, detection_count).await;
        });
    }

    async fn parse(&self, bytes: &[u8], responder: &mut dyn Responder) -> Option<Envelope> {
        match decode_envelope(bytes) {
            Ok(envelope) => Some(envelope),
            Err(err) => {
                debug!(%err, "envelope parse failed");
                let response = FrameResponse::rejected(String::new(), 0, "malformed envelope");
                if let Err(send_err) = responder.respond(response).await {
                    warn!(%send_err, "failed to send malformed-envelope response");
                }
                None
            }
        }
    }

    async fn authenticate(&self, envelope: &Envelope, responder: &mut dyn Responder) -> Option<Claims> {
        match verify_token(&envelope.token, &self.auth_secret) {
            Ok(claims) => Some(claims),
            Err(err) => {
                debug!(%err, session_id = %envelope.session_id, "token verification failed");
                let response =
                    FrameResponse::rejected(envelope.session_id.clone(), envelope.frame_seq, "Unauthorized");
                if let Err(send_err) = responder.respond(response).await {
                    warn!(%send_err, "failed to send unauthorized response");
                }
                None
            }
        }
    }

    async fn dispatch(&self, envelope: &Envelope) -> (FrameResponse, &'static str, usize) {
        let channels = channel_count(&envelope.format);
        let result = self
            .inference
            .process_frame(
                envelope.image_bytes.clone(),
                envelope.width,
                envelope.height,
                channels,
                envelope.format.clone(),
            )
            .await;

        match result {
            Ok(result) => {
                let detections: Vec<Detection> = result.detections.into_iter().map(convert_detection).collect();
                let detection_count = detections.len();
                let response = FrameResponse {
                    success: result.success,
                    message: result.message,
                    frame_id: envelope.session_id.clone(),
                    frame_sequence: envelope.frame_seq,
                    ai_results: AiResults { detections },
                    original_width: envelope.width,
                    original_height: envelope.height,
                };
                (response, "success", detection_count)
            }
            Err(err) => {
                let response = FrameResponse::rejected(
                    envelope.session_id.clone(),
                    envelope.frame_seq,
                    format!("AI Error: {err}"),
                );
                (response, "error", 0)
            }
        }
    }

    async fn audit(&self, envelope: &Envelope, claims: &Claims, outcome: &'static str, detection_count: usize) {
        let Ok(mut conn) = self.write_pool.get().await else {
            warn!("audit write pool exhausted, dropping scan-audit row");
            return;
        };

        #[expect(
            clippy::cast_possible_wrap,
            reason = "frame sequence numbers never approach i64::MAX in practice"
        )]
        let frame_seq = envelope.frame_seq as i64;
        #[expect(
            clippy::cast_possible_wrap,
            reason = "detection counts are bounded by the inference response size"
        )]
        #[expect(
            clippy::cast_possible_truncation,
            reason = "detection counts are bounded by the inference response size"
        )]
        let detection_count = detection_count as i32;

        let audit = NewScanAudit {
            user_id: claims.user_id,
            device_id: &claims.device_id,
            session_id: &envelope.session_id,
            frame_seq,
            detection_count,
            outcome,
            created_at: Utc::now().naive_utc(),
        };

        if let Err(err) = record_scan(&mut conn, &audit).await {
            warn!(%err, "failed to record scan audit");
        }
    }
}

fn semantically_valid(envelope: &Envelope) -> bool {
    envelope.width > 0 && envelope.height > 0 && !envelope.image_bytes.is_empty()
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn envelope() -> Envelope {
        Envelope {
            token: "tok".to_owned(),
            session_id: "s1".to_owned(),
            frame_seq: 1,
            width: 640,
            height: 360,
            format: "jpeg".to_owned(),
            image_bytes: vec![1, 2, 3],
        }
    }

    #[rstest]
    fn channel_count_maps_known_formats() {
        assert_eq!(channel_count("rgba"), 4);
        assert_eq!(channel_count("grayscale"), 1);
        assert_eq!(channel_count("jpeg"), 3);
        assert_eq!(channel_count("unknown"), 3);
    }

    #[rstest]
    fn rejects_non_positive_dimensions() {
        let mut env = envelope();
        env.width = 0;
        assert!(!semantically_valid(&env));

        let mut env = envelope();
        env.height = -1;
        assert!(!semantically_valid(&env));
    }

    #[rstest]
    fn rejects_empty_image_bytes() {
        let mut env = envelope();
        env.image_bytes.clear();
        assert!(!semantically_valid(&env));
    }

    #[rstest]
    fn accepts_well_formed_envelope() {
        assert!(semantically_valid(&envelope()));
    }
}
