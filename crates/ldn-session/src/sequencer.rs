use std::sync::atomic::{AtomicU32, Ordering};

/// Sequence numbers for a session whose outbound path is shared between threads.
///
/// Same numbering as [`ldn_proto::PacketSequencer`] (first number `0`,
/// `set_sequence(v)` resumes at `v + 1`, wraps at `u32::MAX`), but every
/// operation is a single atomic step, so concurrent callers never receive the
/// same number.
#[derive(Debug)]
pub struct SharedSequencer {
    last: AtomicU32,
}

impl Default for SharedSequencer {
    fn default() -> Self {
        Self {
            last: AtomicU32::new(u32::MAX),
        }
    }
}

impl SharedSequencer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_sequence(&self) -> u32 {
        // fetch_add wraps on overflow.
        self.last.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    pub fn set_sequence(&self, value: u32) {
        self.last.store(value, Ordering::Relaxed);
    }

    pub fn peek(&self) -> u32 {
        self.last.load(Ordering::Relaxed).wrapping_add(1)
    }
}
