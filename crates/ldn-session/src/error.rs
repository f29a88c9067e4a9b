//! Session layer error types.

use ldn_proto::{ErrorCode, FragmentKey, PacketType, ProtoError};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("protocol error: {0}")]
    Protocol(#[from] ProtoError),

    #[error("reassembly of {key:?} timed out with {received}/{total_fragments} fragments")]
    ReassemblyTimeout {
        key: FragmentKey,
        received: usize,
        total_fragments: u32,
    },

    #[error("reassembly table full ({0} pending messages)")]
    TableFull(usize),

    #[error("message too large: {0} bytes")]
    MessageTooLarge(usize),

    #[error("packet for session {0:#010x}")]
    WrongSession(u32),

    #[error("packet for node {0}")]
    WrongNode(u8),

    #[error("{0:?} packets cannot be sent directly")]
    UnsupportedKind(PacketType),
}

impl SessionError {
    /// Code to report to the peer in an `Error` packet.
    pub fn error_code(&self) -> ErrorCode {
        match self {
            SessionError::Protocol(e) => ErrorCode::from(e),
            SessionError::ReassemblyTimeout { .. } => ErrorCode::Timeout,
            SessionError::TableFull(_) | SessionError::MessageTooLarge(_) => {
                ErrorCode::FragmentationError
            }
            SessionError::WrongSession(_) => ErrorCode::SessionNotFound,
            SessionError::WrongNode(_) => ErrorCode::NodeNotFound,
            SessionError::UnsupportedKind(_) => ErrorCode::InvalidPacket,
        }
    }
}
