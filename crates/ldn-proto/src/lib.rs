//! LDN packet protocol codec.
//!
//! Framing, integrity checking, fragmentation and sequencing for local-wireless
//! (LDN) traffic carried over an unreliable transport. Pure computation over
//! in-memory buffers: nothing here performs I/O or spawns threads.
//!
//! # Modules
//!
//! - [`header`]: fixed little-endian header layout
//! - [`codec`]: `[Header][Payload]` serialization
//! - [`validate`]: magic/version/size/type/checksum checks
//! - [`fragment`]: splitting and reassembling oversized messages
//! - [`sequencer`]: per-sender sequence numbers
//! - [`error_packet`]: `Error` packet construction and parsing

pub mod codec;
pub mod constants;
pub mod crc;
pub mod error;
pub mod error_packet;
pub mod fragment;
pub mod header;
pub mod limits;
pub mod packet;
pub mod packet_type;
pub mod sequencer;
pub mod validate;

pub use codec::{deserialize_packet, serialize_packet};
pub use crc::calculate_crc32;
pub use error::ProtoError;
pub use error_packet::{ErrorCode, ErrorPayload, create_error_packet, parse_error_packet};
pub use fragment::{FragmentKey, Fragmenter, fragment_data, reassemble_fragments};
pub use header::PacketHeader;
pub use limits::MAX_PACKET_SIZE;
pub use packet::Packet;
pub use packet_type::PacketType;
pub use sequencer::PacketSequencer;
pub use validate::{check_packet, validate_packet, validate_packet_type};
