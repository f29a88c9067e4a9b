//! Receive-side reassembly of fragmented messages.
//!
//! Fragments are grouped by [`FragmentKey`]. An entry is released when its
//! last missing fragment arrives, when it turns out inconsistent, or when
//! [`ReassemblyTable::sweep`] finds it older than the configured timeout.

use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::time::{Duration, Instant};

use ldn_proto::{FragmentKey, Packet, ProtoError, limits::MAX_FRAGMENTS};
use tracing::{debug, trace, warn};

use crate::{config::SessionConfig, error::SessionError};

/// Fragments received so far for one message.
#[derive(Debug)]
struct PendingMessage {
    total_fragments: u32,
    slots: Vec<Option<Vec<u8>>>,
    received: usize,
    bytes: usize,
    first_seen: Instant,
}

impl PendingMessage {
    fn new(total_fragments: u32, first_seen: Instant) -> Self {
        Self {
            total_fragments,
            slots: vec![None; total_fragments as usize],
            received: 0,
            bytes: 0,
            first_seen,
        }
    }

    fn is_complete(&self) -> bool {
        self.received == self.slots.len()
    }

    fn into_message(self) -> Vec<u8> {
        let mut out = Vec::with_capacity(self.bytes);
        for payload in self.slots.into_iter().flatten() {
            out.extend_from_slice(&payload);
        }
        out
    }
}

/// Owned table of in-progress reassemblies.
#[derive(Debug)]
pub struct ReassemblyTable {
    pending: HashMap<FragmentKey, PendingMessage>,
    timeout: Duration,
    max_pending: usize,
    max_message_size: usize,
}

impl ReassemblyTable {
    pub fn new(timeout: Duration, max_pending: usize, max_message_size: usize) -> Self {
        Self {
            pending: HashMap::new(),
            timeout,
            max_pending,
            max_message_size,
        }
    }

    pub fn from_config(config: &SessionConfig) -> Self {
        Self::new(
            config.reassembly_timeout,
            config.max_pending_reassemblies,
            config.max_message_size,
        )
    }

    /// Add one fragment. The packet should already have passed validation.
    ///
    /// Returns the whole message once every fragment is present, `None` while
    /// fragments are outstanding. A repeated fragment is ignored. An
    /// inconsistent fragment drops the whole entry and returns an error.
    pub fn insert(&mut self, packet: Packet, now: Instant) -> Result<Option<Vec<u8>>, SessionError> {
        let h = packet.header;
        if !h.is_fragment() {
            return Err(ProtoError::NotAFragment.into());
        }
        let total_fragments = h.total_fragments;
        if h.fragment_id >= total_fragments {
            return Err(ProtoError::BadFragmentIndex {
                fragment_id: h.fragment_id,
                total_fragments,
            }
            .into());
        }
        if total_fragments > MAX_FRAGMENTS {
            return Err(ProtoError::TooManyFragments(total_fragments as usize).into());
        }

        let key = FragmentKey::of(&h);

        if total_fragments == 1 && !self.pending.contains_key(&key) {
            if packet.payload.len() > self.max_message_size {
                return Err(SessionError::MessageTooLarge(packet.payload.len()));
            }
            trace!(?key, len = packet.payload.len(), "Single-fragment message");
            return Ok(Some(packet.payload));
        }

        let table_full = self.pending.len() >= self.max_pending;
        let entry = match self.pending.entry(key) {
            Entry::Occupied(o) => o.into_mut(),
            Entry::Vacant(v) => {
                if table_full {
                    warn!(?key, limit = self.max_pending, "Reassembly table full, dropping fragment");
                    return Err(SessionError::TableFull(self.max_pending));
                }
                debug!(?key, total_fragments, "Reassembly started");
                v.insert(PendingMessage::new(total_fragments, now))
            }
        };

        if entry.total_fragments != total_fragments {
            let expected = entry.total_fragments;
            self.pending.remove(&key);
            warn!(?key, expected, found = total_fragments, "Fragment count changed mid-message, dropping");
            return Err(ProtoError::FragmentCountMismatch {
                expected,
                found: total_fragments,
            }
            .into());
        }

        let slot = &mut entry.slots[h.fragment_id as usize];
        if slot.is_some() {
            trace!(?key, fragment_id = h.fragment_id, "Duplicate fragment ignored");
            return Ok(None);
        }

        entry.bytes += packet.payload.len();
        *slot = Some(packet.payload);
        entry.received += 1;

        if entry.bytes > self.max_message_size {
            let bytes = entry.bytes;
            self.pending.remove(&key);
            warn!(?key, bytes, limit = self.max_message_size, "Reassembled message too large, dropping");
            return Err(SessionError::MessageTooLarge(bytes));
        }

        trace!(
            ?key,
            fragment_id = h.fragment_id,
            received = entry.received,
            total_fragments,
            "Fragment stored"
        );

        if !entry.is_complete() {
            return Ok(None);
        }

        let message = self
            .pending
            .remove(&key)
            .map(PendingMessage::into_message)
            .unwrap_or_default();
        debug!(?key, len = message.len(), "Reassembly complete");
        Ok(Some(message))
    }

    /// Evict entries first seen more than the timeout before `now`.
    ///
    /// Returns one `ReassemblyTimeout` error per evicted message.
    pub fn sweep(&mut self, now: Instant) -> Vec<SessionError> {
        let timeout = self.timeout;
        let mut expired = Vec::new();
        self.pending.retain(|key, msg| {
            let age = now.saturating_duration_since(msg.first_seen);
            if age <= timeout {
                return true;
            }
            warn!(
                ?key,
                received = msg.received,
                total_fragments = msg.total_fragments,
                age_ms = age.as_millis() as u64,
                "Reassembly timed out"
            );
            expired.push(SessionError::ReassemblyTimeout {
                key: *key,
                received: msg.received,
                total_fragments: msg.total_fragments,
            });
            false
        });
        expired
    }

    pub fn contains(&self, key: &FragmentKey) -> bool {
        self.pending.contains_key(key)
    }

    /// Number of messages currently being reassembled.
    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn clear(&mut self) {
        self.pending.clear();
    }
}
