//! Bus-level model for emulated I2C transfers.
//!
//! A transfer is an ordered slice of [`Message`]s handled atomically by one
//! [`Adapter`]. Write messages carry host-to-device payloads; read messages
//! carry a buffer the device fills in place. The [`Registry`] provides the
//! attach/detach enumeration that stands in for a host's bus numbering.

pub mod registry;

pub use registry::Registry;

use std::fmt;

use bytes::{Bytes, BytesMut};

use crate::error::TransferError;

/// Number an adapter is reachable under once attached to a [`Registry`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BusNumber(pub u8);

impl fmt::Display for BusNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "i2c-{}", self.0)
    }
}

/// A single directional unit within a transfer.
#[derive(Debug, Clone)]
pub enum Message {
    /// Host-to-device payload: a command opcode plus optional arguments.
    Write { addr: u8, data: Bytes },

    /// Device-to-host fetch. The buffer length is the number of bytes the
    /// host asks for; the device fills it in place.
    Read { addr: u8, buf: BytesMut },
}

impl Message {
    /// Build a write message carrying `data`.
    pub fn write(addr: u8, data: impl Into<Bytes>) -> Self {
        Message::Write {
            addr,
            data: data.into(),
        }
    }

    /// Build a read message asking for `len` bytes.
    pub fn read(addr: u8, len: usize) -> Self {
        Message::Read {
            addr,
            buf: BytesMut::zeroed(len),
        }
    }

    /// The bus address this message is directed at.
    pub fn addr(&self) -> u8 {
        match self {
            Message::Write { addr, .. } | Message::Read { addr, .. } => *addr,
        }
    }
}

/// An emulated bus adapter: the device-side endpoint of a transfer.
pub trait Adapter: Send {
    /// Human-readable adapter name for logs.
    fn name(&self) -> &str;

    /// Process one transfer under bus number `nr`.
    ///
    /// Messages are handled strictly in order and the first failure aborts
    /// the rest. Returns the number of messages in the transfer on success.
    fn transfer(&mut self, nr: BusNumber, msgs: &mut [Message]) -> Result<usize, TransferError>;
}

impl<A: Adapter + ?Sized> Adapter for &mut A {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn transfer(&mut self, nr: BusNumber, msgs: &mut [Message]) -> Result<usize, TransferError> {
        (**self).transfer(nr, msgs)
    }
}
