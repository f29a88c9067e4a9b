/// Issues per-sender sequence numbers.
///
/// Single owner: one sequencer per outbound session, mutated through `&mut self`.
/// Senders that share a session across threads should use an atomic counter
/// instead (see `ldn_session::SharedSequencer`).
///
/// The sequencer remembers the last number it issued. A fresh sequencer
/// behaves as if `u32::MAX` was issued last, so its first number is `0`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PacketSequencer {
    last: u32,
}

impl Default for PacketSequencer {
    fn default() -> Self {
        Self { last: u32::MAX }
    }
}

impl PacketSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue the next number. Wraps from `u32::MAX` to `0`.
    pub fn next_sequence(&mut self) -> u32 {
        self.last = self.last.wrapping_add(1);
        self.last
    }

    /// Resume after `value`: the next number issued is `value + 1` (wrapping).
    pub fn set_sequence(&mut self, value: u32) {
        self.last = value;
    }

    /// The number the next call to [`Self::next_sequence`] returns.
    pub fn peek(&self) -> u32 {
        self.last.wrapping_add(1)
    }
}
