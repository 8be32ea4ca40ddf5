//! Nisemono: a virtual I2C test chip.
//!
//! This crate emulates a command/response slave device on a software bus so
//! that client drivers can be exercised without real hardware. The stub chip
//! answers an identify command and a firmware-version query; the bus layer
//! provides the message model, the adapter trait, and an attach/detach
//! registry that stands in for a host's bus enumeration.

pub mod bus;
pub mod chip;
pub mod client;
pub mod error;
pub mod tracing;

// Re-export the types most callers need
pub use bus::{Adapter, BusNumber, Message, Registry};
pub use chip::stub::StubChip;
pub use client::TesterClient;
pub use error::{BusError, TransferError};
