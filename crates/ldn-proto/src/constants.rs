/// Protocol identifier at the start of every packet.
/// Encoded little-endian, so the first two bytes on the wire are `0x44, 0x4C` ("DL").
pub const MAGIC: u16 = 0x4C44;

/// Wire-format protocol version.
/// Packets carrying any other value are rejected, never negotiated.
pub const VERSION: u16 = 1;

/// Length of the fixed part of the header in bytes.
pub const HEADER_LEN: usize = 32;

/// Extra header bytes carried by `Fragment` packets (`fragment_id` + `total_fragments`).
pub const FRAGMENT_EXT_LEN: usize = 8;

/// Full header length of a `Fragment` packet.
pub const FRAGMENT_HEADER_LEN: usize = HEADER_LEN + FRAGMENT_EXT_LEN;

/// Destination node id that addresses every node in a session.
pub const BROADCAST_NODE_ID: u8 = 0xFF;
