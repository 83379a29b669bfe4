//! Stateful reassembly of UDP datagram chunks into complete frame envelopes.

use std::{
    collections::HashMap,
    sync::Mutex,
    time::{Duration, Instant},
};

use super::chunk::ChunkHeader;

struct PartialMessage {
    total_chunks: u16,
    chunks: HashMap<u16, Vec<u8>>,
    last_updated: Instant,
}

impl PartialMessage {
    fn new(total_chunks: u16) -> Self {
        Self {
            total_chunks,
            chunks: HashMap::new(),
            last_updated: Instant::now(),
        }
    }

    fn is_complete(&self) -> bool {
        self.chunks.len() == usize::from(self.total_chunks)
    }

    fn concatenate(&self) -> Vec<u8> {
        let mut ordered: Vec<&Vec<u8>> = (0..self.total_chunks)
            .filter_map(|index| self.chunks.get(&index))
            .collect();
        ordered.truncate(self.chunks.len());
        ordered.into_iter().flatten().copied().collect()
    }
}

/// In-memory table of in-flight UDP partial messages.
///
/// Reads and writes of the underlying map are mutually exclusive via a
/// single mutex, held only across hash-table mutations; callers are
/// responsible for handing completed buffers off to a separate task so the
/// receive loop is never blocked on downstream work.
pub struct Reassembler {
    partials: Mutex<HashMap<u64, PartialMessage>>,
    staleness: Duration,
}

impl Reassembler {
    /// Create a reassembler with the given staleness horizon.
    #[must_use]
    pub fn new(staleness: Duration) -> Self {
        Self {
            partials: Mutex::new(HashMap::new()),
            staleness,
        }
    }

    /// Insert a chunk, returning the reassembled buffer once the message is complete.
    ///
    /// Invalid headers (`total_chunks == 0` or `chunk_index >= total_chunks`)
    /// are discarded silently, consistent with the malformed-input policy for
    /// this transport. If concatenation would yield zero bytes, the message
    /// is dropped rather than handed to the caller.
    #[must_use]
    pub fn insert_chunk(&self, header: ChunkHeader, payload: Vec<u8>) -> Option<Vec<u8>> {
        if header.total_chunks == 0 || header.chunk_index >= header.total_chunks {
            return None;
        }

        #[expect(clippy::unwrap_used, reason = "poisoned only if a prior holder panicked")]
        let mut partials = self.partials.lock().unwrap();

        let partial = partials
            .entry(header.message_id)
            .or_insert_with(|| PartialMessage::new(header.total_chunks));
        partial.chunks.insert(header.chunk_index, payload);
        partial.last_updated = Instant::now();

        if !partial.is_complete() {
            return None;
        }

        let completed = partials
            .remove(&header.message_id)
            .map(|partial| partial.concatenate())?;

        if completed.is_empty() {
            return None;
        }
        Some(completed)
    }

    /// Evict partial messages whose last update predates the staleness horizon.
    ///
    /// Returns the number of evicted entries. Evictions are counted but never
    /// reported to the client — incomplete frames are silently lost by design.
    pub fn sweep(&self) -> usize {
        #[expect(clippy::unwrap_used, reason = "poisoned only if a prior holder panicked")]
        let mut partials = self.partials.lock().unwrap();
        let before = partials.len();
        let staleness = self.staleness;
        partials.retain(|_, partial| partial.last_updated.elapsed() < staleness);
        before.saturating_sub(partials.len())
    }

    /// Current number of in-flight partial messages.
    #[must_use]
    pub fn len(&self) -> usize {
        #[expect(clippy::unwrap_used, reason = "poisoned only if a prior holder panicked")]
        let partials = self.partials.lock().unwrap();
        partials.len()
    }

    /// Whether there are no in-flight partial messages.
    #[must_use]
    pub fn is_empty(&self) -> bool { self.len() == 0 }
}

#[cfg(test)]
mod tests {
    use std::thread::sleep;

    use rstest::rstest;

    use super::*;

    fn header(message_id: u64, chunk_index: u16, total_chunks: u16) -> ChunkHeader {
        ChunkHeader {
            message_id,
            chunk_index,
            total_chunks,
        }
    }

    #[rstest]
    fn completes_after_all_chunks_in_order() {
        let reassembler = Reassembler::new(Duration::from_secs(3));
        assert!(reassembler.insert_chunk(header(1, 0, 2), vec![1, 2]).is_none());
        let done = reassembler.insert_chunk(header(1, 1, 2), vec![3, 4]);
        assert_eq!(done, Some(vec![1, 2, 3, 4]));
        assert!(reassembler.is_empty());
    }

    #[rstest]
    fn completion_is_insensitive_to_arrival_order() {
        let reassembler = Reassembler::new(Duration::from_secs(3));
        assert!(reassembler.insert_chunk(header(0xDEAD_BEEF, 2, 3), vec![7, 8]).is_none());
        assert!(reassembler.insert_chunk(header(0xDEAD_BEEF, 0, 3), vec![1, 2]).is_none());
        let done = reassembler.insert_chunk(header(0xDEAD_BEEF, 1, 3), vec![3, 4]);
        assert_eq!(done, Some(vec![1, 2, 3, 4, 7, 8]));
    }

    #[rstest]
    fn rejects_zero_total_chunks() {
        let reassembler = Reassembler::new(Duration::from_secs(3));
        assert!(reassembler.insert_chunk(header(1, 0, 0), vec![1]).is_none());
        assert!(reassembler.is_empty());
    }

    #[rstest]
    fn rejects_out_of_range_index() {
        let reassembler = Reassembler::new(Duration::from_secs(3));
        assert!(reassembler.insert_chunk(header(1, 5, 2), vec![1]).is_none());
        assert!(reassembler.is_empty());
    }

    #[rstest]
    fn sweep_evicts_stale_partials() {
        let reassembler = Reassembler::new(Duration::from_millis(10));
        reassembler.insert_chunk(header(1, 0, 2), vec![1]);
        sleep(Duration::from_millis(30));
        let evicted = reassembler.sweep();
        assert_eq!(evicted, 1);
        assert!(reassembler.is_empty());
    }

    #[rstest]
    fn sweep_keeps_fresh_partials() {
        let reassembler = Reassembler::new(Duration::from_secs(3));
        reassembler.insert_chunk(header(1, 0, 2), vec![1]);
        let evicted = reassembler.sweep();
        assert_eq!(evicted, 0);
        assert_eq!(reassembler.len(), 1);
    }
}
