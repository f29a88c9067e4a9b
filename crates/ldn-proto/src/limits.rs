//! Size limits for the LDN packet protocol.
//!
//! Single source of truth for every bound the codec and the session layer enforce.

use crate::constants::FRAGMENT_HEADER_LEN;

/// Maximum payload carried by one packet (1400 bytes).
///
/// A full fragment (40-byte header + payload) plus IPv4/UDP headers stays
/// below a 1500-byte Ethernet MTU.
pub const MAX_PACKET_SIZE: usize = 1400;

/// Largest datagram the codec produces (`Fragment` header + maximum payload).
pub const MAX_DATAGRAM_SIZE: usize = FRAGMENT_HEADER_LEN + MAX_PACKET_SIZE;

/// Default ceiling for one application message before fragmentation (64 KiB).
pub const MAX_MESSAGE_SIZE: usize = 64 * 1024;

/// Upper bound on `total_fragments` accepted by the reassembly paths.
///
/// Caps the memory a single (possibly hostile) fragment header can make a
/// receiver reserve.
pub const MAX_FRAGMENTS: u32 = 1024;
