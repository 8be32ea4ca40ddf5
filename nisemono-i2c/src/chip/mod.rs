//! Emulated chip implementations.
//!
//! Each submodule provides one virtual device that plugs into the bus layer
//! as an [`Adapter`](crate::bus::Adapter). Only the stub test chip exists
//! today.

pub mod stub;

// Re-export the device most callers want
pub use stub::StubChip;
