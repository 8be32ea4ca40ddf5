//! Error types for bus transfers.

use thiserror::Error;

/// Failures raised while handling a single bus message.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BusError {
    /// The message was addressed to a device nobody answers for.
    #[error("no device at address 0x{0:02x}")]
    DeviceNotFound(u8),

    /// The device cannot carry out the requested command.
    #[error("unsupported command: {0}")]
    NotSupported(String),

    /// A read asked for a different length than the device had armed.
    #[error("reply length mismatch: armed {armed}, requested {requested}")]
    InvalidArgument { armed: usize, requested: usize },
}

/// A transfer aborted at the message that failed.
///
/// `index` is the position of the failing message within the transfer, which
/// also tells the caller how many messages completed before it.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("transfer aborted at message {index}: {source}")]
pub struct TransferError {
    pub index: usize,
    #[source]
    pub source: BusError,
}
