//! Pipeline execution
//!
//! [`execute`] runs a validated plan against the separated stems and
//! [`mix`] sums the retained buffers into the final track.

pub mod executor;
pub mod mixer;
pub mod store;

pub use executor::{execute, ExecutionOutput, ExecutionStats, NamedBuffer};
pub use mixer::{mix, FinalTrack, MixOptions};
pub use store::BufferStore;
