//! LDN session layer.
//!
//! Sits between a datagram transport and the emulator's LDN service and owns
//! the state the [`ldn_proto`] codec leaves to its caller:
//!
//! - [`reassembly`]: in-progress fragment sets with timeout eviction
//! - [`sequencer`]: sequence numbers for senders shared across threads
//! - [`endpoint`]: encode/receive pipeline for one local node
//! - [`config`]: tunables
//! - [`error`]: error types

pub mod config;
pub mod endpoint;
pub mod error;
pub mod reassembly;
pub mod sequencer;

pub use config::SessionConfig;
pub use endpoint::{Endpoint, Inbound};
pub use error::SessionError;
pub use reassembly::ReassemblyTable;
pub use sequencer::SharedSequencer;
