use strum::{EnumIter, FromRepr};

/// Packet kind carried in the header's `packet_type` field.
///
/// Numeric values are part of the wire format.
#[repr(u16)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, FromRepr, EnumIter)]
pub enum PacketType {
    Handshake = 0x01,
    HandshakeAck = 0x02,
    Data = 0x03,
    Ack = 0x04,
    Heartbeat = 0x05,
    Disconnect = 0x06,
    /// One piece of a message larger than `MAX_PACKET_SIZE`.
    /// Only this type carries the fragment header extension.
    Fragment = 0x07,
    Error = 0x08,
}

impl PacketType {
    #[inline]
    pub const fn as_u16(self) -> u16 {
        self as u16
    }

    /// Session-management traffic, as opposed to application payload.
    pub const fn is_control(self) -> bool {
        !matches!(self, Self::Data | Self::Fragment)
    }
}

impl From<PacketType> for u16 {
    fn from(value: PacketType) -> Self {
        value as u16
    }
}

impl TryFrom<u16> for PacketType {
    type Error = crate::error::ProtoError;

    fn try_from(value: u16) -> Result<Self, crate::error::ProtoError> {
        Self::from_repr(value).ok_or(crate::error::ProtoError::UnknownPacketType(value))
    }
}
