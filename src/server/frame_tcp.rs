//! The connection-oriented binary frame transport.
//!
//! One reader loop per client; a dedicated mutex around the writer so
//! replies never interleave on the wire (responses are emitted in request
//! order, enforced by serializing the writer rather than the reader). Read
//! deadlines are refreshed on every inbound message.

use std::{net::SocketAddr, sync::Arc, time::Duration};

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use futures_util::{SinkExt, StreamExt};
use tokio::{
    net::{TcpListener, TcpStream},
    sync::{Mutex, watch},
};
use tokio_util::codec::{Framed, LengthDelimitedCodec};
use tracing::{info, warn};

use crate::{
    pipeline::{PipelineContext, Responder, ResponderError},
    wire::FrameResponse,
};

/// A single ping byte, recognized before it reaches the frame pipeline; it
/// refreshes the idle deadline but produces no pipeline work.
const PING_BYTE: u8 = 0x00;

type FrameSink = futures_util::stream::SplitSink<Framed<TcpStream, LengthDelimitedCodec>, Bytes>;

struct ConnectionResponder {
    writer: Arc<Mutex<FrameSink>>,
}

#[async_trait]
impl Responder for ConnectionResponder {
    async fn respond(&mut self, response: FrameResponse) -> Result<(), ResponderError> {
        let body = serde_json::to_vec(&response).map_err(|err| ResponderError::Send(err.to_string()))?;
        let mut writer = self.writer.lock().await;
        writer
            .send(Bytes::from(body))
            .await
            .map_err(|err| ResponderError::Send(err.to_string()))
    }
}

/// Accept connection-oriented binary-frame clients until `shutdown` fires.
///
/// # Errors
/// Returns any error binding the listener.
pub async fn serve(
    bind: String,
    idle_timeout: Duration,
    pipeline: Arc<PipelineContext>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let listener = TcpListener::bind(&bind).await?;
    info!(%bind, "frame transport listening");

    let mut connections = tokio::task::JoinSet::new();

    loop {
        tokio::select! {
            () = shutdown_signal(&mut shutdown) => {
                info!("frame transport shutting down");
                break;
            }
            accepted = listener.accept() => {
                match accepted {
                    Ok((socket, peer)) => {
                        let pipeline = pipeline.clone();
                        let shutdown = shutdown.clone();
                        connections.spawn(async move {
                            if let Err(err) = handle_connection(socket, peer, idle_timeout, pipeline, shutdown).await {
                                warn!(%peer, %err, "frame connection ended with error");
                            }
                        });
                    }
                    Err(err) => warn!(%err, "frame transport accept error"),
                }
            }
        }
    }

    while connections.join_next().await.is_some() {}
    Ok(())
}

async fn shutdown_signal(rx: &mut watch::Receiver<bool>) {
    let _ = rx.changed().await;
}

async fn handle_connection(
    socket: TcpStream,
    peer: SocketAddr,
    idle_timeout: Duration,
    pipeline: Arc<PipelineContext>,
    mut shutdown: watch::Receiver<bool>,
) -> anyhow::Result<()> {
    let framed = Framed::new(socket, LengthDelimitedCodec::new());
    let (sink, mut stream) = framed.split();
    let writer = Arc::new(Mutex::new(sink));

    loop {
        let frame = tokio::select! {
            frame = tokio::time::timeout(idle_timeout, stream.next()) => frame,
            _ = shutdown.changed() => break,
        };

        let frame = match frame {
            Ok(Some(Ok(bytes))) => bytes,
            Ok(Some(Err(err))) => return Err(err.into()),
            Ok(None) => break,
            Err(_elapsed) => {
                info!(%peer, "idle timeout elapsed, closing frame connection");
                break;
            }
        };

        if is_ping(&frame) {
            continue;
        }

        let mut responder = ConnectionResponder { writer: writer.clone() };
        pipeline.process_frame(&frame, &mut responder).await;
    }

    Ok(())
}

fn is_ping(frame: &BytesMut) -> bool { frame.len() == 1 && frame.first() == Some(&PING_BYTE) }

#[cfg(test)]
mod tests {
    use bytes::BytesMut;
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn recognizes_single_byte_ping() {
        let mut ping = BytesMut::new();
        ping.extend_from_slice(&[PING_BYTE]);
        assert!(is_ping(&ping));
    }

    #[rstest]
    fn does_not_treat_longer_frames_as_ping() {
        let mut frame = BytesMut::new();
        frame.extend_from_slice(&[PING_BYTE, 1]);
        assert!(!is_ping(&frame));
    }
}
