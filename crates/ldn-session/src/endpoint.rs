//! One local node's view of an LDN session.
//!
//! Outbound: application payloads become serialized datagrams, fragmented
//! when they exceed the configured payload size.
//! Inbound: datagrams are decoded, validated, filtered by session and
//! destination, and either delivered or fed to the reassembly table.

use std::time::Instant;

use ldn_proto::{
    ErrorCode, ErrorPayload, FragmentKey, Fragmenter, Packet, PacketHeader, PacketType,
    check_packet, constants::BROADCAST_NODE_ID, create_error_packet, deserialize_packet,
    error_packet::truncate_error_message, packet::now_timestamp, parse_error_packet,
    serialize_packet,
};
use tracing::{debug, trace, warn};

use crate::{
    config::SessionConfig, error::SessionError, reassembly::ReassemblyTable,
    sequencer::SharedSequencer,
};

/// Outcome of feeding one datagram to [`Endpoint::receive`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// A validated, unfragmented packet other than `Error`.
    Packet(Packet),
    /// The last fragment of a message arrived; `data` is the whole message.
    Message { key: FragmentKey, data: Vec<u8> },
    /// The peer reported an error.
    Error {
        header: PacketHeader,
        error: ErrorPayload,
    },
    /// Fragment stored; more are needed.
    Pending,
    /// The datagram was dropped. `reply` is a serialized `Error` packet for
    /// the sender, when one should be sent.
    Rejected {
        reason: SessionError,
        reply: Option<Vec<u8>>,
    },
}

#[derive(Debug)]
pub struct Endpoint {
    session_id: u32,
    node_id: u8,
    config: SessionConfig,
    fragmenter: Fragmenter,
    sequencer: SharedSequencer,
    reassembly: ReassemblyTable,
}

impl Endpoint {
    pub fn new(session_id: u32, node_id: u8, config: SessionConfig) -> Self {
        Self {
            session_id,
            node_id,
            fragmenter: Fragmenter::new(config.max_payload_size),
            sequencer: SharedSequencer::new(),
            reassembly: ReassemblyTable::from_config(&config),
            config,
        }
    }

    pub fn session_id(&self) -> u32 {
        self.session_id
    }

    pub fn node_id(&self) -> u8 {
        self.node_id
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn sequencer(&self) -> &SharedSequencer {
        &self.sequencer
    }

    pub fn pending_reassemblies(&self) -> usize {
        self.reassembly.len()
    }

    /// Serialize `payload` as one or more datagrams addressed to `dest`.
    ///
    /// `Data` payloads larger than the configured packet size are split into
    /// `Fragment` packets sharing one sequence number. Control packets must fit
    /// in a single packet. A rejected send does not consume a sequence number.
    pub fn encode(
        &self,
        packet_type: PacketType,
        dest: u8,
        payload: &[u8],
    ) -> Result<Vec<Vec<u8>>, SessionError> {
        if packet_type == PacketType::Fragment {
            return Err(SessionError::UnsupportedKind(packet_type));
        }
        if payload.len() > self.config.max_message_size {
            return Err(SessionError::MessageTooLarge(payload.len()));
        }

        let fragmented =
            !packet_type.is_control() && self.fragmenter.needs_fragmentation(payload.len());
        if !fragmented && payload.len() > self.fragmenter.chunk_size() {
            return Err(ldn_proto::ProtoError::PayloadTooLarge(payload.len()).into());
        }

        let sequence_number = self.sequencer.next_sequence();

        if fragmented {
            let frags = self.fragmenter.fragment(
                payload,
                self.session_id,
                self.node_id,
                dest,
                sequence_number,
            )?;
            debug!(
                session_id = self.session_id,
                dest,
                sequence_number,
                fragments = frags.len(),
                len = payload.len(),
                "Fragmenting outbound message"
            );
            return frags
                .iter()
                .map(|f| serialize_packet(f).map_err(SessionError::from))
                .collect();
        }

        let mut h = PacketHeader::new(packet_type, self.session_id, self.node_id, dest);
        h.sequence_number = sequence_number;
        h.timestamp = now_timestamp();
        let packet = Packet::new(h, payload.to_vec());
        trace!(
            session_id = self.session_id,
            dest,
            sequence_number,
            kind = ?packet_type,
            "Encoded packet"
        );
        Ok(vec![serialize_packet(&packet)?])
    }

    /// Serialize an `Error` packet for `dest`. Long messages are truncated.
    pub fn encode_error(
        &self,
        dest: u8,
        code: ErrorCode,
        message: &str,
    ) -> Result<Vec<u8>, SessionError> {
        self.encode_error_in(self.session_id, dest, code, message)
    }

    /// [`Self::encode_error`] addressed to an arbitrary `session_id`.
    fn encode_error_in(
        &self,
        session_id: u32,
        dest: u8,
        code: ErrorCode,
        message: &str,
    ) -> Result<Vec<u8>, SessionError> {
        let mut packet = create_error_packet(
            session_id,
            self.node_id,
            dest,
            code,
            truncate_error_message(message),
        )?;
        packet.header.sequence_number = self.sequencer.next_sequence();
        Ok(serialize_packet(&packet)?)
    }

    /// Process one received datagram.
    pub fn receive(&mut self, bytes: &[u8], now: Instant) -> Inbound {
        let packet = match deserialize_packet(bytes) {
            Ok(p) => p,
            Err(e) => {
                warn!(len = bytes.len(), error = %e, "Dropping malformed datagram");
                // The sender cannot be trusted from a malformed header.
                return Inbound::Rejected {
                    reason: e.into(),
                    reply: None,
                };
            }
        };

        let h = packet.header;
        if let Err(e) = check_packet(&packet) {
            warn!(
                session_id = h.session_id,
                source = h.source_node_id,
                sequence_number = h.sequence_number,
                error = %e,
                "Dropping invalid packet"
            );
            return self.reject(&h, e.into());
        }
        if h.session_id != self.session_id {
            debug!(session_id = h.session_id, expected = self.session_id, "Packet for another session");
            return self.reject(&h, SessionError::WrongSession(h.session_id));
        }
        if h.dest_node_id != self.node_id && h.dest_node_id != BROADCAST_NODE_ID {
            debug!(dest = h.dest_node_id, node_id = self.node_id, "Packet for another node");
            return self.reject(&h, SessionError::WrongNode(h.dest_node_id));
        }

        match packet.kind() {
            Some(PacketType::Fragment) => match self.reassembly.insert(packet, now) {
                Ok(Some(data)) => Inbound::Message {
                    key: FragmentKey::of(&h),
                    data,
                },
                Ok(None) => Inbound::Pending,
                Err(e) => self.reject(&h, e),
            },
            Some(PacketType::Error) => match parse_error_packet(&packet) {
                Ok(error) => {
                    debug!(
                        source = h.source_node_id,
                        code = error.raw_code,
                        message = %error.message,
                        "Peer reported error"
                    );
                    Inbound::Error { header: h, error }
                }
                Err(e) => self.reject(&h, e.into()),
            },
            _ => Inbound::Packet(packet),
        }
    }

    /// Evict stale reassemblies; returns a `ReassemblyTimeout` per evicted message.
    pub fn sweep(&mut self, now: Instant) -> Vec<SessionError> {
        self.reassembly.sweep(now)
    }

    fn reject(&self, header: &PacketHeader, reason: SessionError) -> Inbound {
        let reply = self.reply_for(header, &reason);
        Inbound::Rejected { reason, reply }
    }

    fn reply_for(&self, header: &PacketHeader, reason: &SessionError) -> Option<Vec<u8>> {
        // Never answer an error with an error.
        if !self.config.reply_with_errors || header.packet_type == PacketType::Error.as_u16() {
            return None;
        }
        match self.encode_error_in(
            header.session_id,
            header.source_node_id,
            reason.error_code(),
            &reason.to_string(),
        ) {
            Ok(bytes) => Some(bytes),
            Err(e) => {
                warn!(error = %e, "Failed to build error reply");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use ldn_proto::{MAX_PACKET_SIZE, ProtoError};

    use super::*;

    fn pair() -> (Endpoint, Endpoint) {
        (
            Endpoint::new(0x5EED, 1, SessionConfig::default()),
            Endpoint::new(0x5EED, 2, SessionConfig::default()),
        )
    }

    #[test]
    fn small_data_is_one_packet() {
        let (a, mut b) = pair();
        let wire = a.encode(PacketType::Data, 2, b"hi").unwrap();
        assert_eq!(wire.len(), 1);
        match b.receive(&wire[0], Instant::now()) {
            Inbound::Packet(p) => {
                assert_eq!(p.payload, b"hi");
                assert_eq!(p.header.source_node_id, 1);
                assert_eq!(p.header.sequence_number, 0);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn sequence_numbers_advance_per_send() {
        let (a, _) = pair();
        a.encode(PacketType::Heartbeat, 2, &[]).unwrap();
        a.encode(PacketType::Heartbeat, 2, &[]).unwrap();
        assert_eq!(a.sequencer().peek(), 2);
    }

    #[test]
    fn fragment_kind_cannot_be_sent_directly() {
        let (a, _) = pair();
        assert_eq!(
            a.encode(PacketType::Fragment, 2, b"x"),
            Err(SessionError::UnsupportedKind(PacketType::Fragment))
        );
    }

    #[test]
    fn oversized_control_packet_rejected() {
        let (a, _) = pair();
        let big = vec![0u8; MAX_PACKET_SIZE + 1];
        assert_eq!(
            a.encode(PacketType::Handshake, 2, &big),
            Err(SessionError::Protocol(ProtoError::PayloadTooLarge(
                MAX_PACKET_SIZE + 1
            )))
        );
    }

    #[test]
    fn rejected_send_keeps_sequence() {
        let (a, _) = pair();
        let big = vec![0u8; MAX_PACKET_SIZE + 1];
        assert!(a.encode(PacketType::Handshake, 2, &big).is_err());
        assert!(a.encode(PacketType::Fragment, 2, b"x").is_err());
        assert_eq!(a.sequencer().peek(), 0);

        let wire = a.encode(PacketType::Heartbeat, 2, &[]).unwrap();
        let p = ldn_proto::deserialize_packet(&wire[0]).unwrap();
        assert_eq!(p.header.sequence_number, 0);
    }

    #[test]
    fn reply_to_foreign_session_uses_its_session_id() {
        let stranger = Endpoint::new(0xBEEF, 7, SessionConfig::default());
        let (_, mut b) = pair();
        let wire = stranger.encode(PacketType::Heartbeat, 2, &[]).unwrap();
        let reply = match b.receive(&wire[0], Instant::now()) {
            Inbound::Rejected {
                reply: Some(reply), ..
            } => reply,
            other => panic!("unexpected {other:?}"),
        };
        let p = ldn_proto::deserialize_packet(&reply).unwrap();
        assert_eq!(p.header.session_id, 0xBEEF);
        assert_eq!(p.header.dest_node_id, 7);
        assert_eq!(p.header.source_node_id, 2);
    }

    #[test]
    fn message_limit_enforced_on_send() {
        let cfg = SessionConfig {
            max_message_size: 100,
            ..SessionConfig::default()
        };
        let a = Endpoint::new(1, 1, cfg);
        assert_eq!(
            a.encode(PacketType::Data, 2, &[0u8; 101]),
            Err(SessionError::MessageTooLarge(101))
        );
    }

    #[test]
    fn malformed_bytes_get_no_reply() {
        let (_, mut b) = pair();
        match b.receive(&[0u8; 5], Instant::now()) {
            Inbound::Rejected { reason, reply } => {
                assert_eq!(reason, SessionError::Protocol(ProtoError::TooShort));
                assert!(reply.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn error_packets_are_not_answered() {
        let (a, mut b) = pair();
        let mut bytes = a.encode_error(2, ErrorCode::Timeout, "late").unwrap();
        // Corrupt the payload so validation fails.
        let last = bytes.len() - 1;
        bytes[last] ^= 0xFF;
        match b.receive(&bytes, Instant::now()) {
            Inbound::Rejected { reply, .. } => assert!(reply.is_none()),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn replies_can_be_disabled() {
        let cfg = SessionConfig {
            reply_with_errors: false,
            ..SessionConfig::default()
        };
        let a = Endpoint::new(0x5EED, 1, SessionConfig::default());
        let mut b = Endpoint::new(0x5EED, 2, cfg);
        let wire = a.encode(PacketType::Data, 9, b"x").unwrap();
        match b.receive(&wire[0], Instant::now()) {
            Inbound::Rejected { reason, reply } => {
                assert_eq!(reason, SessionError::WrongNode(9));
                assert!(reply.is_none());
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
