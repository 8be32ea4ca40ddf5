//! Client drivers that talk to emulated chips over the bus layer.

pub mod tester;

pub use tester::{ChipIdentity, TesterClient};
