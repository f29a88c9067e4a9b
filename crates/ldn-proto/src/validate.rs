//! Semantic packet checks.
//!
//! Checks run in a fixed order and stop at the first failure:
//! magic, version, payload size bound, packet type, fragment index
//! (`Fragment` packets only), checksum.

use crate::{
    constants::{MAGIC, VERSION},
    crc::calculate_crc32,
    error::ProtoError,
    limits::MAX_PACKET_SIZE,
    packet::Packet,
    packet_type::PacketType,
};

/// `true` iff `packet` passes every check.
pub fn validate_packet(packet: &Packet) -> bool {
    check_packet(packet).is_ok()
}

/// Like [`validate_packet`], but reports which check failed first.
pub fn check_packet(packet: &Packet) -> Result<(), ProtoError> {
    let h = &packet.header;

    if h.magic != MAGIC {
        return Err(ProtoError::BadMagic(h.magic));
    }
    if h.version != VERSION {
        return Err(ProtoError::UnsupportedVersion(h.version));
    }
    if h.payload_size as usize > MAX_PACKET_SIZE {
        return Err(ProtoError::PayloadOverLimit(h.payload_size));
    }
    let kind = PacketType::try_from(h.packet_type)?;
    if kind == PacketType::Fragment && h.fragment_id >= h.total_fragments {
        return Err(ProtoError::BadFragmentIndex {
            fragment_id: h.fragment_id,
            total_fragments: h.total_fragments,
        });
    }

    let actual = calculate_crc32(&packet.payload);
    if h.crc32 != actual {
        return Err(ProtoError::ChecksumMismatch {
            expected: h.crc32,
            actual,
        });
    }

    Ok(())
}

/// `true` iff `value` is a defined [`PacketType`].
#[inline]
pub fn validate_packet_type(value: u16) -> bool {
    PacketType::from_repr(value).is_some()
}

#[cfg(test)]
mod tests {
    use strum::IntoEnumIterator;

    use super::*;
    use crate::header::PacketHeader;

    fn valid() -> Packet {
        Packet::new(
            PacketHeader::new(PacketType::Data, 0x1234, 1, 2),
            b"Hello".to_vec(),
        )
    }

    #[test]
    fn accepts_well_formed_packet() {
        assert!(validate_packet(&valid()));
    }

    #[test]
    fn rejects_bad_magic() {
        let mut p = valid();
        p.header.magic = 0xFFFF;
        assert!(!validate_packet(&p));
        assert_eq!(check_packet(&p), Err(ProtoError::BadMagic(0xFFFF)));
    }

    #[test]
    fn rejects_bad_version() {
        let mut p = valid();
        p.header.version = 99;
        assert!(!validate_packet(&p));
        assert_eq!(check_packet(&p), Err(ProtoError::UnsupportedVersion(99)));
    }

    #[test]
    fn rejects_oversized_declared_payload() {
        let mut p = valid();
        p.header.payload_size = MAX_PACKET_SIZE as u32 + 1;
        assert!(!validate_packet(&p));
        assert!(matches!(
            check_packet(&p),
            Err(ProtoError::PayloadOverLimit(_))
        ));
    }

    #[test]
    fn rejects_unknown_type() {
        let mut p = valid();
        p.header.packet_type = 999;
        assert_eq!(check_packet(&p), Err(ProtoError::UnknownPacketType(999)));
    }

    #[test]
    fn rejects_tampered_payload() {
        let mut p = valid();
        p.payload[0] ^= 0xFF;
        assert!(!validate_packet(&p));
        assert!(matches!(
            check_packet(&p),
            Err(ProtoError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn rejects_fragment_index_out_of_range() {
        let mut h = PacketHeader::new(PacketType::Fragment, 1, 1, 2);
        h.fragment_id = 3;
        h.total_fragments = 3;
        let p = Packet::new(h, vec![1]);
        assert_eq!(
            check_packet(&p),
            Err(ProtoError::BadFragmentIndex {
                fragment_id: 3,
                total_fragments: 3
            })
        );
    }

    #[test]
    fn checks_run_in_order() {
        let mut p = valid();
        p.header.magic = 0;
        p.header.version = 0;
        p.header.packet_type = 0;
        p.payload.push(1);
        assert!(matches!(check_packet(&p), Err(ProtoError::BadMagic(_))));
        p.header.magic = MAGIC;
        assert!(matches!(
            check_packet(&p),
            Err(ProtoError::UnsupportedVersion(_))
        ));
        p.header.version = VERSION;
        assert!(matches!(
            check_packet(&p),
            Err(ProtoError::UnknownPacketType(0))
        ));
        p.header.packet_type = PacketType::Data.as_u16();
        assert!(matches!(
            check_packet(&p),
            Err(ProtoError::ChecksumMismatch { .. })
        ));
    }

    #[test]
    fn packet_type_values() {
        for ty in PacketType::iter() {
            assert!(validate_packet_type(ty.as_u16()));
        }
        assert!(!validate_packet_type(999));
        assert!(!validate_packet_type(0));
    }
}
