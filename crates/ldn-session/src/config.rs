use std::time::Duration;

use ldn_proto::limits::{MAX_MESSAGE_SIZE, MAX_PACKET_SIZE};
use serde::{Deserialize, Serialize};

/// Tunables for one [`crate::Endpoint`].
///
/// Missing fields fall back to [`SessionConfig::default`] when deserialized,
/// so hosts can embed a partial section in their own settings file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Payload bytes per outbound packet before fragmenting (clamped to `1..=MAX_PACKET_SIZE`).
    pub max_payload_size: usize,
    /// Largest application message accepted for sending or reassembly.
    pub max_message_size: usize,
    /// Incomplete reassemblies older than this are evicted by `sweep`.
    pub reassembly_timeout: Duration,
    /// Maximum number of messages being reassembled at once.
    pub max_pending_reassemblies: usize,
    /// Answer invalid inbound packets with an `Error` packet.
    pub reply_with_errors: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            max_payload_size: MAX_PACKET_SIZE,
            max_message_size: MAX_MESSAGE_SIZE,
            reassembly_timeout: Duration::from_secs(5),
            max_pending_reassemblies: 64,
            reply_with_errors: true,
        }
    }
}
