//! The 12-byte UDP chunk header: `[messageId:u64 BE][chunkIndex:u16 BE][totalChunks:u16 BE]`.

#![expect(
    clippy::big_endian_bytes,
    reason = "UDP chunk header is explicitly big-endian on the wire"
)]

/// Length of the chunk header in bytes, preceding the payload.
pub const HEADER_LEN: usize = 12;

/// A parsed UDP chunk header.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChunkHeader {
    /// Client-chosen message identifier, unique within the sender's session.
    pub message_id: u64,
    /// Zero-based index of this chunk within the message.
    pub chunk_index: u16,
    /// Total number of chunks declared by the first-seen datagram.
    pub total_chunks: u16,
}

/// Parse a chunk header and return it along with the remaining payload.
///
/// Returns `None` if the datagram is shorter than [`HEADER_LEN`] bytes; per
/// the wire contract, such datagrams are discarded silently rather than
/// reported as an error.
#[must_use]
pub fn parse_chunk(datagram: &[u8]) -> Option<(ChunkHeader, &[u8])> {
    let header_bytes = datagram.get(..HEADER_LEN)?;
    let payload = datagram.get(HEADER_LEN..)?;

    let message_id_bytes: [u8; 8] = header_bytes.get(0..8)?.try_into().ok()?;
    let chunk_index_bytes: [u8; 2] = header_bytes.get(8..10)?.try_into().ok()?;
    let total_chunks_bytes: [u8; 2] = header_bytes.get(10..12)?.try_into().ok()?;

    Some((
        ChunkHeader {
            message_id: u64::from_be_bytes(message_id_bytes),
            chunk_index: u16::from_be_bytes(chunk_index_bytes),
            total_chunks: u16::from_be_bytes(total_chunks_bytes),
        },
        payload,
    ))
}

/// Serialize a chunk header, followed by its payload, into a single datagram.
#[must_use]
pub fn write_chunk(header: ChunkHeader, payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_LEN + payload.len());
    out.extend_from_slice(&header.message_id.to_be_bytes());
    out.extend_from_slice(&header.chunk_index.to_be_bytes());
    out.extend_from_slice(&header.total_chunks.to_be_bytes());
    out.extend_from_slice(payload);
    out
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn round_trips_header_and_payload() {
        let header = ChunkHeader {
            message_id: 0xDEAD_BEEF,
            chunk_index: 1,
            total_chunks: 3,
        };
        let datagram = write_chunk(header, &[1, 2, 3]);
        let (parsed, payload) = parse_chunk(&datagram).expect("parse");
        assert_eq!(parsed, header);
        assert_eq!(payload, &[1, 2, 3]);
    }

    #[rstest]
    fn discards_short_datagrams() {
        assert!(parse_chunk(&[0u8; 11]).is_none());
    }

    #[rstest]
    fn accepts_zero_length_payload() {
        let header = ChunkHeader {
            message_id: 1,
            chunk_index: 0,
            total_chunks: 1,
        };
        let datagram = write_chunk(header, &[]);
        let (parsed, payload) = parse_chunk(&datagram).expect("parse");
        assert_eq!(parsed, header);
        assert!(payload.is_empty());
    }
}
