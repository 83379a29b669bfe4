#![expect(clippy::panic_in_result_fn, reason = "test assertions")]
#![expect(clippy::unwrap_used, reason = "test assertions")]

//! End-to-end frame-pipeline test against a mock inference backend: verifies
//! the response shape, echoed fields, and the resulting scan-audit row.

use std::net::TcpStream;

use test_util::{DatabaseUrl, MockDetection, MockInferenceServer, build_envelope, scan_audit_outcomes, send_frame, test_token, with_db};

mod common;

const AUTH_SECRET: &str = "change-me-in-production";

#[test]
fn successful_dispatch_returns_detections_and_audits_success() -> Result<(), test_util::AnyError> {
    let rt = tokio::runtime::Runtime::new()?;
    let mock = rt.block_on(MockInferenceServer::start(vec![MockDetection {
        class_name: "person".to_owned(),
        confidence: 0.92,
        bbox: (0.1, 0.2, 0.3, 0.4),
    }]))?;
    let inference_addr = mock.addr();

    let Some(server) = common::start_server_with_inference_or_skip(|_| Ok(()), inference_addr)? else {
        return Ok(());
    };

    let token = test_token(AUTH_SECRET, 1, "alice", "device-1")?;
    let envelope = build_envelope(&token, "session-happy", 42, 640, 480, "jpeg", vec![1, 2, 3, 4]);

    let mut stream = TcpStream::connect(("127.0.0.1", server.frame_port()))?;
    let response = send_frame(&mut stream, &envelope)?;

    assert!(response.success);
    assert_eq!(response.frame_id, "session-happy");
    assert_eq!(response.frame_sequence, 42);
    assert_eq!(response.original_width, 640);
    assert_eq!(response.original_height, 480);
    assert_eq!(response.ai_results.detections.len(), 1);
    assert_eq!(response.ai_results.detections[0].class_name, "person");

    let db_url = DatabaseUrl::new(server.db_url().as_str());
    with_db(db_url, |conn| {
        Box::pin(async move {
            let outcomes = scan_audit_outcomes(conn, "session-happy").await?;
            assert_eq!(outcomes, vec!["success".to_owned()]);
            Ok(())
        })
    })?;

    drop(mock);
    Ok(())
}
