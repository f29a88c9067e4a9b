use crate::{
    constants::{FRAGMENT_HEADER_LEN, HEADER_LEN, MAGIC, VERSION},
    error::ProtoError,
    packet_type::PacketType,
};

/// Packet header (wire format).
///
/// Encoding rules:
/// - Integer fields are little-endian, written field by field at fixed offsets.
/// - `HEADER_LEN` bytes for every packet, plus `FRAGMENT_EXT_LEN` bytes for
///   `Fragment` packets.
///
/// The header stores raw values. `decode()` only checks that the buffer holds
/// a complete header and exactly `payload_size` payload bytes; magic, version,
/// type and checksum are checked by [`crate::validate`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PacketHeader {
    /// Protocol identifier, `MAGIC` for every well-formed packet.
    pub magic: u16,

    /// Wire-format version.
    pub version: u16,

    /// Logical connection this packet belongs to. Opaque to the codec.
    pub session_id: u32,

    /// Raw [`PacketType`] value. Kept raw so unknown values survive decoding.
    pub packet_type: u16,

    pub source_node_id: u8,
    pub dest_node_id: u8,

    /// Per-sender sequence number. All fragments of one message share it.
    pub sequence_number: u32,

    /// Creation time in milliseconds since the Unix epoch. Not validated.
    pub timestamp: u64,

    /// Payload length in bytes.
    pub payload_size: u32,

    /// CRC-32 of the payload bytes only.
    pub crc32: u32,

    /// Zero-based fragment index. Only transmitted for `Fragment` packets.
    pub fragment_id: u32,

    /// Number of fragments in the message. Only transmitted for `Fragment` packets.
    pub total_fragments: u32,
}

impl PacketHeader {
    /// Fixed header size in bytes (without the fragment extension).
    pub const LEN: usize = HEADER_LEN;

    /// Create a header with magic and version filled in and every other field zeroed.
    pub fn new(
        packet_type: PacketType,
        session_id: u32,
        source_node_id: u8,
        dest_node_id: u8,
    ) -> Self {
        Self {
            magic: MAGIC,
            version: VERSION,
            session_id,
            packet_type: packet_type.as_u16(),
            source_node_id,
            dest_node_id,
            sequence_number: 0,
            timestamp: 0,
            payload_size: 0,
            crc32: 0,
            fragment_id: 0,
            total_fragments: 0,
        }
    }

    /// The decoded packet type, or `None` for an unrecognized value.
    pub fn kind(&self) -> Option<PacketType> {
        PacketType::from_repr(self.packet_type)
    }

    pub fn is_fragment(&self) -> bool {
        self.packet_type == PacketType::Fragment.as_u16()
    }

    /// Number of bytes this header occupies on the wire.
    pub fn encoded_len(&self) -> usize {
        if self.is_fragment() {
            FRAGMENT_HEADER_LEN
        } else {
            HEADER_LEN
        }
    }

    /// Append this header to `out`.
    ///
    /// Offsets (bytes):
    /// - 0..2   magic (u16 LE)
    /// - 2..4   version (u16 LE)
    /// - 4..8   session_id (u32 LE)
    /// - 8..10  packet_type (u16 LE)
    /// - 10     source_node_id
    /// - 11     dest_node_id
    /// - 12..16 sequence_number (u32 LE)
    /// - 16..24 timestamp (u64 LE)
    /// - 24..28 payload_size (u32 LE)
    /// - 28..32 crc32 (u32 LE)
    /// - 32..36 fragment_id (u32 LE, `Fragment` only)
    /// - 36..40 total_fragments (u32 LE, `Fragment` only)
    pub fn encode_into(&self, out: &mut Vec<u8>) {
        out.reserve(self.encoded_len());
        out.extend_from_slice(&self.magic.to_le_bytes());
        out.extend_from_slice(&self.version.to_le_bytes());
        out.extend_from_slice(&self.session_id.to_le_bytes());
        out.extend_from_slice(&self.packet_type.to_le_bytes());
        out.push(self.source_node_id);
        out.push(self.dest_node_id);
        out.extend_from_slice(&self.sequence_number.to_le_bytes());
        out.extend_from_slice(&self.timestamp.to_le_bytes());
        out.extend_from_slice(&self.payload_size.to_le_bytes());
        out.extend_from_slice(&self.crc32.to_le_bytes());

        if self.is_fragment() {
            out.extend_from_slice(&self.fragment_id.to_le_bytes());
            out.extend_from_slice(&self.total_fragments.to_le_bytes());
        }
    }

    /// Decode a buffer that contains exactly `[Header][Payload]`.
    ///
    /// - If the buffer cannot hold the header (including the fragment
    ///   extension for `Fragment` packets), returns `TooShort`.
    /// - Requires the bytes after the header to number exactly `payload_size`,
    ///   otherwise returns `LengthMismatch`.
    /// - On success, returns `(PacketHeader, payload_slice)`.
    pub fn decode(buf: &[u8]) -> Result<(PacketHeader, &[u8]), ProtoError> {
        if buf.len() < HEADER_LEN {
            return Err(ProtoError::TooShort);
        }

        let mut h = PacketHeader {
            magic: read_u16_le(buf, 0)?,
            version: read_u16_le(buf, 2)?,
            session_id: read_u32_le(buf, 4)?,
            packet_type: read_u16_le(buf, 8)?,
            source_node_id: buf[10],
            dest_node_id: buf[11],
            sequence_number: read_u32_le(buf, 12)?,
            timestamp: read_u64_le(buf, 16)?,
            payload_size: read_u32_le(buf, 24)?,
            crc32: read_u32_le(buf, 28)?,
            fragment_id: 0,
            total_fragments: 0,
        };

        if h.is_fragment() {
            h.fragment_id = read_u32_le(buf, 32)?;
            h.total_fragments = read_u32_le(buf, 36)?;
        }

        let payload = &buf[h.encoded_len()..];
        if payload.len() != h.payload_size as usize {
            return Err(ProtoError::LengthMismatch {
                declared: h.payload_size,
                actual: payload.len(),
            });
        }

        Ok((h, payload))
    }
}

fn read_u16_le(buf: &[u8], start: usize) -> Result<u16, ProtoError> {
    let bytes: [u8; 2] = buf
        .get(start..start + 2)
        .ok_or(ProtoError::TooShort)?
        .try_into()
        .map_err(|_| ProtoError::TooShort)?;
    Ok(u16::from_le_bytes(bytes))
}

fn read_u32_le(buf: &[u8], start: usize) -> Result<u32, ProtoError> {
    let bytes: [u8; 4] = buf
        .get(start..start + 4)
        .ok_or(ProtoError::TooShort)?
        .try_into()
        .map_err(|_| ProtoError::TooShort)?;
    Ok(u32::from_le_bytes(bytes))
}

fn read_u64_le(buf: &[u8], start: usize) -> Result<u64, ProtoError> {
    let bytes: [u8; 8] = buf
        .get(start..start + 8)
        .ok_or(ProtoError::TooShort)?
        .try_into()
        .map_err(|_| ProtoError::TooShort)?;
    Ok(u64::from_le_bytes(bytes))
}
