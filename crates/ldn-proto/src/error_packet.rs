//! `Error` packets: a little-endian `u32` error code followed by a UTF-8 message.
//!
//! The message has no length prefix; its length is `payload_size - 4`.

use strum::{EnumIter, FromRepr};

use crate::{
    error::ProtoError,
    header::PacketHeader,
    limits::MAX_PACKET_SIZE,
    packet::{Packet, now_timestamp},
    packet_type::PacketType,
};

/// Length of the error code prefix in an `Error` payload.
pub const ERROR_CODE_LEN: usize = 4;

/// Longest message that fits in one `Error` packet.
pub const MAX_ERROR_MESSAGE_LEN: usize = MAX_PACKET_SIZE - ERROR_CODE_LEN;

/// Error codes carried in `Error` packets. Numeric values are part of the wire format.
#[repr(u32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, EnumIter)]
pub enum ErrorCode {
    Success = 0,
    /// Packet failed decoding or validation
    InvalidPacket = 1,
    /// Payload checksum did not match the header
    ChecksumMismatch = 2,
    /// Peer speaks a different protocol version
    UnsupportedVersion = 3,
    /// No session with the given id
    SessionNotFound = 4,
    /// Session has no room for another node
    SessionFull = 5,
    /// Peer or reassembly timed out
    Timeout = 6,
    /// Fragment set was inconsistent or could not be completed
    FragmentationError = 7,
    /// Destination node is not part of the session
    NodeNotFound = 8,
    NotImplemented = 9,
    InternalError = 10,
}

impl ErrorCode {
    #[inline]
    pub const fn as_u32(self) -> u32 {
        self as u32
    }
}

impl From<&ProtoError> for ErrorCode {
    fn from(err: &ProtoError) -> Self {
        match err {
            ProtoError::ChecksumMismatch { .. } => ErrorCode::ChecksumMismatch,
            ProtoError::UnsupportedVersion(_) => ErrorCode::UnsupportedVersion,
            ProtoError::NoFragments
            | ProtoError::NotAFragment
            | ProtoError::FragmentCountMismatch { .. }
            | ProtoError::DuplicateFragment(_)
            | ProtoError::MissingFragments { .. }
            | ProtoError::TooManyFragments(_)
            | ProtoError::BadFragmentIndex { .. } => ErrorCode::FragmentationError,
            _ => ErrorCode::InvalidPacket,
        }
    }
}

/// Decoded contents of an `Error` packet.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorPayload {
    /// Raw code; see [`ErrorPayload::code`] for the typed value.
    pub raw_code: u32,
    pub message: String,
}

impl ErrorPayload {
    /// The typed code, or `None` if the peer sent a value this build does not know.
    pub fn code(&self) -> Option<ErrorCode> {
        ErrorCode::from_repr(self.raw_code)
    }
}

/// Build an `Error` packet with `payload_size` and `crc32` filled in.
///
/// Messages longer than [`MAX_ERROR_MESSAGE_LEN`] bytes are rejected with
/// `PayloadTooLarge`; error packets are never fragmented.
pub fn create_error_packet(
    session_id: u32,
    source_node_id: u8,
    dest_node_id: u8,
    error_code: ErrorCode,
    message: &str,
) -> Result<Packet, ProtoError> {
    let len = ERROR_CODE_LEN + message.len();
    if len > MAX_PACKET_SIZE {
        return Err(ProtoError::PayloadTooLarge(len));
    }

    let mut payload = Vec::with_capacity(len);
    payload.extend_from_slice(&error_code.as_u32().to_le_bytes());
    payload.extend_from_slice(message.as_bytes());

    let mut h = PacketHeader::new(PacketType::Error, session_id, source_node_id, dest_node_id);
    h.timestamp = now_timestamp();
    Ok(Packet::new(h, payload))
}

/// Cut `message` to at most [`MAX_ERROR_MESSAGE_LEN`] bytes on a char boundary.
pub fn truncate_error_message(message: &str) -> &str {
    if message.len() <= MAX_ERROR_MESSAGE_LEN {
        return message;
    }
    let mut end = MAX_ERROR_MESSAGE_LEN;
    while !message.is_char_boundary(end) {
        end -= 1;
    }
    &message[..end]
}

/// Decode the payload of an `Error` packet. Invalid UTF-8 is replaced lossily.
pub fn parse_error_packet(packet: &Packet) -> Result<ErrorPayload, ProtoError> {
    if packet.kind() != Some(PacketType::Error) {
        return Err(ProtoError::UnknownPacketType(packet.header.packet_type));
    }
    let (code, message) = packet
        .payload
        .split_first_chunk::<ERROR_CODE_LEN>()
        .ok_or(ProtoError::ErrorPayloadTooShort)?;

    Ok(ErrorPayload {
        raw_code: u32::from_le_bytes(*code),
        message: String::from_utf8_lossy(message).into_owned(),
    })
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;
    use crate::{codec, validate::validate_packet};

    #[test]
    fn error_packet_layout() {
        let p = create_error_packet(0x1234, 1, 2, ErrorCode::InvalidPacket, "Test error message")
            .unwrap();
        assert_eq!(p.kind(), Some(PacketType::Error));
        assert_eq!(p.header.session_id, 0x1234);
        assert_eq!(p.header.source_node_id, 1);
        assert_eq!(p.header.dest_node_id, 2);
        assert_eq!(
            u32::from_le_bytes(p.payload[..4].try_into().unwrap()),
            ErrorCode::InvalidPacket.as_u32()
        );
        assert_eq!(
            std::str::from_utf8(&p.payload[4..]).unwrap(),
            "Test error message"
        );
        assert_eq!(p.header.payload_size as usize, 4 + 18);
        assert!(validate_packet(&p));
    }

    #[test]
    fn parse_round_trip_through_wire() {
        let p = create_error_packet(9, 3, 4, ErrorCode::Timeout, "reassembly expired").unwrap();
        let decoded = codec::deserialize_packet(&codec::serialize_packet(&p).unwrap()).unwrap();
        let parsed = parse_error_packet(&decoded).unwrap();
        assert_eq!(parsed.code(), Some(ErrorCode::Timeout));
        assert_eq!(parsed.message, "reassembly expired");
    }

    #[test]
    fn empty_message() {
        let p = create_error_packet(1, 1, 2, ErrorCode::SessionFull, "").unwrap();
        assert_eq!(p.payload.len(), ERROR_CODE_LEN);
        assert_eq!(parse_error_packet(&p).unwrap().message, "");
    }

    #[test]
    fn oversized_message_rejected() {
        let msg = "x".repeat(MAX_ERROR_MESSAGE_LEN + 1);
        assert_eq!(
            create_error_packet(1, 1, 2, ErrorCode::InternalError, &msg),
            Err(ProtoError::PayloadTooLarge(MAX_PACKET_SIZE + 1))
        );
        let msg = "x".repeat(MAX_ERROR_MESSAGE_LEN);
        assert!(create_error_packet(1, 1, 2, ErrorCode::InternalError, &msg).is_ok());
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        let msg = "é".repeat(MAX_ERROR_MESSAGE_LEN);
        let cut = truncate_error_message(&msg);
        assert!(cut.len() <= MAX_ERROR_MESSAGE_LEN);
        assert!(create_error_packet(1, 1, 2, ErrorCode::InternalError, cut).is_ok());
        assert_eq!(truncate_error_message("short"), "short");
    }

    #[test]
    fn parse_rejects_short_and_wrong_type() {
        let mut p = create_error_packet(1, 1, 2, ErrorCode::Success, "").unwrap();
        p.payload.truncate(3);
        assert_eq!(
            parse_error_packet(&p),
            Err(ProtoError::ErrorPayloadTooShort)
        );
        p.header.packet_type = PacketType::Data.as_u16();
        assert!(parse_error_packet(&p).is_err());
    }

    #[test]
    fn unknown_code_is_preserved() {
        let mut p = create_error_packet(1, 1, 2, ErrorCode::Success, "hi").unwrap();
        p.payload[..4].copy_from_slice(&500u32.to_le_bytes());
        let parsed = parse_error_packet(&p).unwrap();
        assert_eq!(parsed.raw_code, 500);
        assert_eq!(parsed.code(), None);
    }

    #[test]
    fn codes_are_locked() {
        assert_eq!(ErrorCode::Success.as_u32(), 0);
        assert_eq!(ErrorCode::InvalidPacket.as_u32(), 1);
        assert_eq!(ErrorCode::InternalError.as_u32(), 10);
        for code in ErrorCode::iter() {
            assert_eq!(ErrorCode::from_repr(code.as_u32()), Some(code));
        }
    }

    #[test]
    fn proto_errors_map_to_codes() {
        assert_eq!(
            ErrorCode::from(&ProtoError::BadMagic(0)),
            ErrorCode::InvalidPacket
        );
        assert_eq!(
            ErrorCode::from(&ProtoError::ChecksumMismatch {
                expected: 1,
                actual: 2
            }),
            ErrorCode::ChecksumMismatch
        );
        assert_eq!(
            ErrorCode::from(&ProtoError::DuplicateFragment(1)),
            ErrorCode::FragmentationError
        );
    }
}
