use std::time::{SystemTime, UNIX_EPOCH};

use crate::{
    codec, crc::calculate_crc32, error::ProtoError, header::PacketHeader,
    packet_type::PacketType,
};

/// A header plus the payload bytes it describes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Packet {
    pub header: PacketHeader,
    pub payload: Vec<u8>,
}

impl Packet {
    /// Build a packet and fill in `payload_size` and `crc32` from `payload`.
    pub fn new(header: PacketHeader, payload: Vec<u8>) -> Self {
        let mut packet = Self { header, payload };
        packet.seal();
        packet
    }

    /// Build a packet without touching the header. The result may not validate.
    pub fn from_parts(header: PacketHeader, payload: Vec<u8>) -> Self {
        Self { header, payload }
    }

    /// Recompute `payload_size` and `crc32` after the payload changed.
    pub fn seal(&mut self) {
        self.header.payload_size = u32::try_from(self.payload.len()).unwrap_or(u32::MAX);
        self.header.crc32 = calculate_crc32(&self.payload);
    }

    pub fn kind(&self) -> Option<PacketType> {
        self.header.kind()
    }

    /// Size of the packet on the wire.
    pub fn encoded_len(&self) -> usize {
        self.header.encoded_len() + self.payload.len()
    }

    pub fn to_bytes(&self) -> Result<Vec<u8>, ProtoError> {
        codec::serialize_packet(self)
    }

    pub fn from_bytes(buf: &[u8]) -> Result<Self, ProtoError> {
        codec::deserialize_packet(buf)
    }
}

/// Milliseconds since the Unix epoch, used for the `timestamp` of packets the codec builds.
pub fn now_timestamp() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_seals_size_and_checksum() {
        let h = PacketHeader::new(PacketType::Data, 7, 1, 2);
        let p = Packet::new(h, b"Hello".to_vec());
        assert_eq!(p.header.payload_size, 5);
        assert_eq!(p.header.crc32, 0xF7D1_8982);
        assert_eq!(p.kind(), Some(PacketType::Data));
        assert_eq!(p.encoded_len(), 32 + 5);
    }

    #[test]
    fn seal_after_edit() {
        let h = PacketHeader::new(PacketType::Data, 7, 1, 2);
        let mut p = Packet::new(h, vec![1, 2, 3]);
        p.payload.push(4);
        assert_eq!(p.header.payload_size, 3);
        p.seal();
        assert_eq!(p.header.payload_size, 4);
        assert_eq!(p.header.crc32, calculate_crc32(&[1, 2, 3, 4]));
    }

    #[test]
    fn from_parts_keeps_header() {
        let mut h = PacketHeader::new(PacketType::Ack, 7, 1, 2);
        h.crc32 = 0xDEAD_BEEF;
        let p = Packet::from_parts(h, vec![]);
        assert_eq!(p.header.crc32, 0xDEAD_BEEF);
    }

    #[test]
    fn timestamp_is_recent() {
        // 2020-01-01T00:00:00Z
        assert!(now_timestamp() > 1_577_836_800_000);
    }
}
