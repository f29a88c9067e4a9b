//! Splitting oversized messages into `Fragment` packets and joining them back.
//!
//! All fragments of one message share the sender's `session_id`, node
//! addressing and `sequence_number`; together these form the [`FragmentKey`]
//! a receiver groups them by. Fragments may arrive in any order; `fragment_id`
//! fixes their position.

use crate::{
    error::ProtoError,
    header::PacketHeader,
    limits::MAX_PACKET_SIZE,
    packet::{Packet, now_timestamp},
    packet_type::PacketType,
};

/// Correlates the fragments of one message on the receiving side.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FragmentKey {
    pub session_id: u32,
    pub source_node_id: u8,
    pub dest_node_id: u8,
    pub sequence_number: u32,
}

impl FragmentKey {
    pub fn of(header: &PacketHeader) -> Self {
        Self {
            session_id: header.session_id,
            source_node_id: header.source_node_id,
            dest_node_id: header.dest_node_id,
            sequence_number: header.sequence_number,
        }
    }
}

/// Splits data into chunks of at most `chunk_size` bytes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fragmenter {
    chunk_size: usize,
}

impl Default for Fragmenter {
    fn default() -> Self {
        Self {
            chunk_size: MAX_PACKET_SIZE,
        }
    }
}

impl Fragmenter {
    /// `chunk_size` is clamped to `1..=MAX_PACKET_SIZE`.
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.clamp(1, MAX_PACKET_SIZE),
        }
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    /// `ceil(len / chunk_size)`; zero for empty input.
    pub fn fragment_count(&self, len: usize) -> usize {
        len.div_ceil(self.chunk_size)
    }

    pub fn needs_fragmentation(&self, len: usize) -> bool {
        len > self.chunk_size
    }

    /// Split `data` into ordered `Fragment` packets stamped with `sequence_number`.
    ///
    /// Every chunk but the last is exactly `chunk_size` bytes; the last holds
    /// the remainder and is never empty. Empty input yields no fragments.
    pub fn fragment(
        &self,
        data: &[u8],
        session_id: u32,
        source_node_id: u8,
        dest_node_id: u8,
        sequence_number: u32,
    ) -> Result<Vec<Packet>, ProtoError> {
        let count = self.fragment_count(data.len());
        let total_fragments =
            u32::try_from(count).map_err(|_| ProtoError::TooManyFragments(count))?;
        let timestamp = now_timestamp();

        let mut out = Vec::with_capacity(count);
        for (index, chunk) in data.chunks(self.chunk_size).enumerate() {
            let mut h =
                PacketHeader::new(PacketType::Fragment, session_id, source_node_id, dest_node_id);
            h.sequence_number = sequence_number;
            h.timestamp = timestamp;
            h.fragment_id = index as u32;
            h.total_fragments = total_fragments;
            out.push(Packet::new(h, chunk.to_vec()));
        }
        Ok(out)
    }
}

/// Split `data` into `MAX_PACKET_SIZE` fragments with sequence number `0`.
pub fn fragment_data(
    data: &[u8],
    session_id: u32,
    source_node_id: u8,
    dest_node_id: u8,
) -> Result<Vec<Packet>, ProtoError> {
    Fragmenter::default().fragment(data, session_id, source_node_id, dest_node_id, 0)
}

/// Rebuild a message from its complete, possibly shuffled, set of fragments.
///
/// Fails if a packet is not a `Fragment`, the `total_fragments` values
/// disagree, an index is out of range or repeated, or the set is incomplete.
/// Checksums are not re-checked; validate packets before grouping them.
pub fn reassemble_fragments(fragments: &[Packet]) -> Result<Vec<u8>, ProtoError> {
    let first = fragments.first().ok_or(ProtoError::NoFragments)?;
    let total_fragments = first.header.total_fragments;

    for f in fragments {
        if !f.header.is_fragment() {
            return Err(ProtoError::NotAFragment);
        }
        if f.header.total_fragments != total_fragments {
            return Err(ProtoError::FragmentCountMismatch {
                expected: total_fragments,
                found: f.header.total_fragments,
            });
        }
        if f.header.fragment_id >= total_fragments {
            return Err(ProtoError::BadFragmentIndex {
                fragment_id: f.header.fragment_id,
                total_fragments,
            });
        }
    }

    // Every index is below `total_fragments`, so a longer list must repeat one.
    // Checking the short case first bounds the slot table by the input length.
    if (fragments.len() as u64) < u64::from(total_fragments) {
        return Err(ProtoError::MissingFragments {
            received: fragments.len(),
            total_fragments,
        });
    }

    let mut slots: Vec<Option<&[u8]>> = vec![None; total_fragments as usize];
    for f in fragments {
        let slot = &mut slots[f.header.fragment_id as usize];
        if slot.is_some() {
            return Err(ProtoError::DuplicateFragment(f.header.fragment_id));
        }
        *slot = Some(f.payload.as_slice());
    }

    let len = fragments.iter().map(|f| f.payload.len()).sum();
    let mut out = Vec::with_capacity(len);
    for payload in slots.into_iter().flatten() {
        out.extend_from_slice(payload);
    }
    Ok(out)
}
