//! The client-sessions map: session id to last-seen peer address.
//!
//! Writes happen as new UDP frames arrive; reads happen when a worker emits
//! a response and needs to know where to send it. Guarded by a read-write
//! lock rather than the reassembler's plain mutex, since reads (one per
//! response) are expected to dominate writes (one per frame).

use std::{collections::HashMap, net::SocketAddr, sync::RwLock};

/// Tracks the last peer address observed for each session id.
#[derive(Default)]
pub struct SessionMap {
    addresses: RwLock<HashMap<String, SocketAddr>>,
}

impl SessionMap {
    /// Create an empty session map.
    #[must_use]
    pub fn new() -> Self { Self::default() }

    /// Record `addr` as the last-seen peer for `session_id`.
    pub fn update(&self, session_id: &str, addr: SocketAddr) {
        #[expect(clippy::unwrap_used, reason = "poisoned only if a prior holder panicked")]
        let mut addresses = self.addresses.write().unwrap();
        addresses.insert(session_id.to_owned(), addr);
    }

    /// Look up the last-seen peer address for `session_id`.
    #[must_use]
    pub fn get(&self, session_id: &str) -> Option<SocketAddr> {
        #[expect(clippy::unwrap_used, reason = "poisoned only if a prior holder panicked")]
        let addresses = self.addresses.read().unwrap();
        addresses.get(session_id).copied()
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    fn records_and_returns_last_seen_address() {
        let map = SessionMap::new();
        let addr: SocketAddr = "127.0.0.1:4000".parse().expect("addr");
        map.update("s1", addr);
        assert_eq!(map.get("s1"), Some(addr));
    }

    #[rstest]
    fn unknown_session_returns_none() {
        let map = SessionMap::new();
        assert_eq!(map.get("missing"), None);
    }

    #[rstest]
    fn later_update_overwrites_earlier_one() {
        let map = SessionMap::new();
        let first: SocketAddr = "127.0.0.1:4000".parse().expect("addr");
        let second: SocketAddr = "127.0.0.1:5000".parse().expect("addr");
        map.update("s1", first);
        map.update("s1", second);
        assert_eq!(map.get("s1"), Some(second));
    }
}
