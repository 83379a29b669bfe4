//! The connectionless chunked UDP frame transport.
//!
//! One receive loop owns the socket and hands completed envelopes to worker
//! tasks; the reassembly map's mutex is held only across hash-table
//! mutations, never across the dispatch to inference. A background sweeper
//! evicts stale partial messages on its own schedule.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use async_trait::async_trait;
use rand::random;
use tokio::{net::UdpSocket, sync::watch};
use tracing::{debug, info, warn};

use super::session_map::SessionMap;
use crate::{
    pipeline::{PipelineContext, Responder, ResponderError},
    udp::{ChunkHeader, Reassembler, parse_chunk, write_chunk},
    wire::{FrameResponse, decode_envelope},
};

/// Recommended maximum payload size per outgoing UDP chunk, per the wire
/// contract (clients are not required to honor this for inbound chunks).
const MAX_CHUNK_PAYLOAD: usize = 1400;

struct UdpResponder {
    socket: Arc<UdpSocket>,
    sessions: Arc<SessionMap>,
}

#[async_trait]
impl Responder for UdpResponder {
    async fn respond(&mut self, response: FrameResponse) -> Result<(), ResponderError> {
        let Some(addr) = self.sessions.get(&response.frame_id) else {
            warn!(session_id = %response.frame_id, "no known peer address for session, dropping response");
            return Ok(());
        };

        let body = serde_json::to_vec(&response).map_err(|err| ResponderError::Send(err.to_string()))?;
        let message_id = random::<u64>();
        let chunks: Vec<&[u8]> = body.chunks(MAX_CHUNK_PAYLOAD.max(1)).collect();
        #[expect(
            clippy::cast_possible_truncation,
            reason = "chunk counts are bounded by body size divided by a 1400-byte chunk"
        )]
        let total_chunks = chunks.len() as u16;

        for (index, payload) in chunks.into_iter().enumerate() {
            #[expect(
                clippy::cast_possible_truncation,
                reason = "chunk index is bounded by total_chunks, itself bounded above"
            )]
            let chunk_index = index as u16;
            let header = ChunkHeader {
                message_id,
                chunk_index,
                total_chunks,
            };
            let datagram = write_chunk(header, payload);
            self.socket
                .send_to(&datagram, addr)
                .await
                .map_err(|err| ResponderError::Send(err.to_string()))?;
        }

        Ok(())
    }
}

/// Receive chunked UDP frames until `shutdown` fires, running the staleness
/// sweeper alongside the receive loop.
///
/// # Errors
/// Returns any error binding the socket.
pub async fn serve(
    bind: String,
    staleness: Duration,
    sweep_interval: Duration,
    pipeline: Arc<PipelineContext>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let socket = Arc::new(UdpSocket::bind(&bind).await?);
    info!(%bind, "udp frame transport listening");

    let reassembler = Arc::new(Reassembler::new(staleness));
    let sessions = Arc::new(SessionMap::new());

    let sweep_task = tokio::spawn(sweep_loop(reassembler.clone(), sweep_interval, shutdown.clone()));

    let mut buf = vec![0u8; 65_536];
    loop {
        tokio::select! {
            _ = shutdown.changed() => {
                info!("udp frame transport shutting down");
                break;
            }
            received = socket.recv_from(&mut buf) => {
                match received {
                    Ok((len, peer)) => {
                        #[expect(
                            clippy::indexing_slicing,
                            reason = "len is bounded by the buffer's own allocation"
                        )]
                        let datagram = buf[..len].to_vec();
                        handle_datagram(datagram, peer, &socket, &reassembler, &sessions, &pipeline);
                    }
                    Err(err) => warn!(%err, "udp recv error"),
                }
            }
        }
    }

    let _ = sweep_task.await;
    Ok(())
}

fn handle_datagram(
    datagram: Vec<u8>,
    peer: SocketAddr,
    socket: &Arc<UdpSocket>,
    reassembler: &Arc<Reassembler>,
    sessions: &Arc<SessionMap>,
    pipeline: &Arc<PipelineContext>,
) {
    let Some((header, payload)) = parse_chunk(&datagram) else {
        debug!(%peer, "discarding short udp datagram");
        return;
    };

    let Some(envelope_bytes) = reassembler.insert_chunk(header, payload.to_vec()) else {
        return;
    };

    let socket = socket.clone();
    let sessions = sessions.clone();
    let pipeline = pipeline.clone();
    tokio::spawn(async move {
        if let Ok(envelope) = decode_envelope(&envelope_bytes) {
            sessions.update(&envelope.session_id, peer);
        }
        let mut responder = UdpResponder { socket, sessions };
        pipeline.process_frame(&envelope_bytes, &mut responder).await;
    });
}

async fn sweep_loop(reassembler: Arc<Reassembler>, interval: Duration, mut shutdown: watch::Receiver<bool>) {
    let mut ticker = tokio::time::interval(interval);
    loop {
        tokio::select! {
            _ = ticker.tick() => {
                let evicted = reassembler.sweep();
                if evicted > 0 {
                    debug!(evicted, "swept stale udp partial messages");
                }
            }
            _ = shutdown.changed() => break,
        }
    }
}
