//! Wire-level helpers shared by integration tests against the frame
//! transports.
//!
//! Mirrors the framing the server itself speaks: a 4-byte big-endian length
//! prefix for the TCP transport (matching `tokio_util`'s
//! `LengthDelimitedCodec` default), and the 12-byte chunk header for UDP.

use std::{
    collections::HashMap,
    io::{self, Read, Write},
    net::{TcpStream, UdpSocket},
};

use chrono::{Duration, Utc};
use frame_gateway::{
    auth::issue_token,
    udp::{ChunkHeader, parse_chunk, write_chunk},
    wire::{Envelope, FrameResponse, encode_binary},
};

/// Mint a bearer token for `username`/`device_id`, valid for one hour.
///
/// # Errors
/// Returns any error reported by the token issuer.
pub fn test_token(secret: &str, user_id: i32, username: &str, device_id: &str) -> io::Result<String> {
    let expires_at = Utc::now() + Duration::hours(1);
    issue_token(secret, user_id, username, device_id, "free", expires_at)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))
}

/// Build a binary-framed envelope carrying `image_bytes`.
#[must_use]
pub fn build_envelope(
    token: &str,
    session_id: &str,
    frame_seq: u64,
    width: i32,
    height: i32,
    format: &str,
    image_bytes: Vec<u8>,
) -> Envelope {
    Envelope {
        token: token.to_owned(),
        session_id: session_id.to_owned(),
        frame_seq,
        width,
        height,
        format: format.to_owned(),
        image_bytes,
    }
}

/// Send one envelope over a connected TCP frame-transport stream and read
/// back the JSON response.
///
/// # Errors
/// Returns an I/O error if the write or read fails, or the response body is
/// not valid JSON.
pub fn send_frame(stream: &mut TcpStream, envelope: &Envelope) -> io::Result<FrameResponse> {
    let body = encode_binary(envelope);
    let len = u32::try_from(body.len())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
    stream.write_all(&len.to_be_bytes())?;
    stream.write_all(&body)?;

    let mut len_buf = [0u8; 4];
    stream.read_exact(&mut len_buf)?;
    let reply_len = u32::from_be_bytes(len_buf) as usize;
    let mut reply_buf = vec![0u8; reply_len];
    stream.read_exact(&mut reply_buf)?;

    serde_json::from_slice(&reply_buf).map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))
}

/// Send an envelope to a UDP frame-transport socket, chunked under
/// `max_chunk_payload` bytes per datagram.
///
/// # Errors
/// Returns an I/O error if any chunk fails to send.
pub fn send_udp_envelope(
    socket: &UdpSocket,
    target: std::net::SocketAddr,
    envelope: &Envelope,
    message_id: u64,
    max_chunk_payload: usize,
) -> io::Result<()> {
    let body = encode_binary(envelope);
    let chunks: Vec<&[u8]> = body.chunks(max_chunk_payload.max(1)).collect();
    let total_chunks = u16::try_from(chunks.len())
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;

    for (index, payload) in chunks.into_iter().enumerate() {
        let chunk_index = u16::try_from(index)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidInput, err.to_string()))?;
        let header = ChunkHeader { message_id, chunk_index, total_chunks };
        let datagram = write_chunk(header, payload);
        socket.send_to(&datagram, target)?;
    }
    Ok(())
}

/// Receive and reassemble one chunked UDP response from `socket`.
///
/// Reads datagrams until every chunk of the first message id observed has
/// arrived, then parses the reassembled body as a [`FrameResponse`]. Chunks
/// belonging to other message ids (e.g. a stray retransmission) are buffered
/// and ignored until their own message completes.
///
/// # Errors
/// Returns an I/O error if a read fails or times out, or if the reassembled
/// body is not valid JSON.
pub fn recv_udp_response(socket: &UdpSocket) -> io::Result<FrameResponse> {
    let mut partials: HashMap<u64, HashMap<u16, Vec<u8>>> = HashMap::new();
    let mut buf = vec![0u8; 65_536];

    loop {
        let (len, _peer) = socket.recv_from(&mut buf)?;
        let Some((header, payload)) = parse_chunk(&buf[..len]) else {
            continue;
        };
        let chunks = partials.entry(header.message_id).or_default();
        chunks.insert(header.chunk_index, payload.to_vec());

        if chunks.len() as u16 >= header.total_chunks {
            let mut body = Vec::new();
            for index in 0..header.total_chunks {
                let Some(chunk) = chunks.get(&index) else {
                    break;
                };
                body.extend_from_slice(chunk);
            }
            return serde_json::from_slice(&body)
                .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()));
        }
    }
}
