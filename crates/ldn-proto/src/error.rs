use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ProtoError {
    #[error("buffer too short")]
    TooShort,
    #[error("payload length mismatch: header declares {declared}, found {actual}")]
    LengthMismatch { declared: u32, actual: usize },
    #[error("payload too large: {0}")]
    PayloadTooLarge(usize),

    #[error("bad magic {0:#06x}")]
    BadMagic(u16),
    #[error("unsupported version {0}")]
    UnsupportedVersion(u16),
    #[error("declared payload size over limit: {0}")]
    PayloadOverLimit(u32),
    #[error("unknown packet type: {0}")]
    UnknownPacketType(u16),
    #[error("fragment index {fragment_id} out of range for {total_fragments} fragments")]
    BadFragmentIndex {
        fragment_id: u32,
        total_fragments: u32,
    },
    #[error("checksum mismatch: header {expected:#010x}, payload {actual:#010x}")]
    ChecksumMismatch { expected: u32, actual: u32 },

    #[error("no fragments")]
    NoFragments,
    #[error("packet is not a fragment")]
    NotAFragment,
    #[error("fragment count mismatch: expected {expected}, found {found}")]
    FragmentCountMismatch { expected: u32, found: u32 },
    #[error("duplicate fragment {0}")]
    DuplicateFragment(u32),
    #[error("missing fragments: have {received} of {total_fragments}")]
    MissingFragments {
        received: usize,
        total_fragments: u32,
    },
    #[error("too many fragments: {0}")]
    TooManyFragments(usize),

    #[error("error payload too short")]
    ErrorPayloadTooShort,
}
