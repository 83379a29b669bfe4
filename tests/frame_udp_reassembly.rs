#![expect(clippy::panic_in_result_fn, reason = "test assertions")]
#![expect(clippy::unwrap_used, reason = "test assertions")]
#![expect(clippy::expect_used, reason = "test assertions")]

//! Integration tests for the chunked UDP transport: out-of-order reassembly
//! and the staleness sweeper, run against a real gateway subprocess.

use std::{net::UdpSocket, time::Duration};

use frame_gateway::udp::{ChunkHeader, write_chunk};
use test_util::{build_envelope, recv_udp_response, test_token};

mod common;

const AUTH_SECRET: &str = "change-me-in-production";

fn client_socket() -> std::io::Result<UdpSocket> {
    let socket = UdpSocket::bind("127.0.0.1:0")?;
    socket.set_read_timeout(Some(Duration::from_secs(5)))?;
    Ok(socket)
}

#[test]
fn out_of_order_chunks_reassemble_byte_identical() -> Result<(), test_util::AnyError> {
    let Some(server) = common::start_server_or_skip(|_| Ok(()))? else {
        return Ok(());
    };
    let target = std::net::SocketAddr::from(([127, 0, 0, 1], server.udp_port()));

    let token = test_token(AUTH_SECRET, 1, "alice", "device-1")?;
    let image_bytes = vec![7u8; 5_000];
    let envelope = build_envelope(&token, "session-udp", 9, 640, 480, "jpeg", image_bytes);

    let body = frame_gateway::wire::encode_binary(&envelope);
    let chunks: Vec<&[u8]> = body.chunks(1400).collect();
    assert!(chunks.len() > 1, "fixture image must span multiple chunks");

    let socket = client_socket()?;
    let message_id = 0xABCD_EF01_u64;
    let total_chunks = u16::try_from(chunks.len()).unwrap();

    // Send the last chunk first, then the rest in forward order; the
    // reassembler must not care about arrival order.
    for index in (0..chunks.len()).rev() {
        let chunk_index = u16::try_from(index).unwrap();
        let header = ChunkHeader { message_id, chunk_index, total_chunks };
        let datagram = write_chunk(header, chunks[index]);
        socket.send_to(&datagram, target)?;
    }

    let response = recv_udp_response(&socket)?;
    assert!(response.success);
    assert_eq!(response.frame_id, "session-udp");
    assert_eq!(response.frame_sequence, 9);
    Ok(())
}

#[test]
fn stale_partial_messages_are_evicted_before_completion() -> Result<(), test_util::AnyError> {
    let staleness_secs = "1";
    let sweep_secs = "1";
    let Some(server) = common::start_server_with_env_or_skip(&[
        ("MXDGW_UDP_CHUNK_STALENESS_SECS".to_owned(), staleness_secs.to_owned()),
        ("MXDGW_UDP_SWEEP_INTERVAL_SECS".to_owned(), sweep_secs.to_owned()),
    ])?
    else {
        return Ok(());
    };
    let target = std::net::SocketAddr::from(([127, 0, 0, 1], server.udp_port()));

    let token = test_token(AUTH_SECRET, 1, "alice", "device-1")?;
    let envelope = build_envelope(&token, "session-stale", 1, 640, 480, "jpeg", vec![9u8; 4000]);
    let socket = client_socket()?;

    let body = frame_gateway::wire::encode_binary(&envelope);
    let chunks: Vec<&[u8]> = body.chunks(1400).collect();
    assert!(chunks.len() > 1, "fixture image must span multiple chunks");
    let total_chunks = u16::try_from(chunks.len()).unwrap();
    let message_id = 0xFEED_u64;

    // Send only the first chunk, then let it go stale well past the
    // staleness horizon and sweep interval before sending the rest.
    let first = ChunkHeader { message_id, chunk_index: 0, total_chunks };
    socket.send_to(&write_chunk(first, chunks[0]), target)?;
    std::thread::sleep(Duration::from_secs(4));

    // The original partial should have been evicted by now, so this starts
    // a brand-new partial message that can never complete from a single
    // further chunk: no response should ever arrive.
    let second = ChunkHeader { message_id, chunk_index: 1, total_chunks };
    socket.send_to(&write_chunk(second, chunks[1]), target)?;

    let err = recv_udp_response(&socket).expect_err("stale partial must not complete after eviction");
    assert_eq!(err.kind(), std::io::ErrorKind::WouldBlock);
    Ok(())
}
