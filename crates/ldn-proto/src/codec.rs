use crate::{
    error::ProtoError,
    header::PacketHeader,
    limits::{MAX_DATAGRAM_SIZE, MAX_PACKET_SIZE},
    packet::Packet,
};

/// Encode a packet as `[Header][Payload]`.
///
/// Fails if the header's `payload_size` disagrees with the payload length or
/// the payload exceeds `MAX_PACKET_SIZE`. Magic, version, type and checksum
/// are written as-is; use [`crate::validate`] to check them.
pub fn serialize_packet(packet: &Packet) -> Result<Vec<u8>, ProtoError> {
    let mut out = Vec::with_capacity(packet.encoded_len());
    serialize_into(packet, &mut out)?;
    Ok(out)
}

/// Append the encoded packet to `out`. On error `out` is left untouched.
pub fn serialize_into(packet: &Packet, out: &mut Vec<u8>) -> Result<(), ProtoError> {
    let actual = packet.payload.len();
    if packet.header.payload_size as usize != actual {
        return Err(ProtoError::LengthMismatch {
            declared: packet.header.payload_size,
            actual,
        });
    }
    if actual > MAX_PACKET_SIZE {
        return Err(ProtoError::PayloadTooLarge(actual));
    }

    let start = out.len();
    packet.header.encode_into(out);
    out.extend_from_slice(&packet.payload);
    debug_assert!(out.len() - start <= MAX_DATAGRAM_SIZE);
    Ok(())
}

/// Decode a buffer holding exactly one packet.
///
/// Only structural checks are applied (`TooShort`, `LengthMismatch`): a packet
/// with a wrong magic or checksum still decodes, so callers can tell malformed
/// bytes apart from a semantically invalid packet.
pub fn deserialize_packet(buf: &[u8]) -> Result<Packet, ProtoError> {
    let (header, payload) = PacketHeader::decode(buf)?;
    Ok(Packet::from_parts(header, payload.to_vec()))
}
