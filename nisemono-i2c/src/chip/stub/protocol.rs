//! Wire-level types for the stub test chip.
//!
//! The chip speaks a command/response protocol: byte 0 of every write
//! message selects an [`Opcode`], and the command arms a [`Reply`] that a
//! following read message of the exact armed length fetches. All of that
//! lives in a [`Transaction`], scratch state scoped to a single transfer.

use bytes::BytesMut;
use strum::FromRepr;

use crate::error::BusError;

/// Commands understood by the stub chip.
///
/// Unknown bytes fail to decode and are rejected with
/// [`BusError::NotSupported`].
#[derive(FromRepr, Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Opcode {
    /// Identify the chip and the bus it is attached under.
    Id = 0x00,
    /// Report the chip's firmware version.
    GetFirmwareVersion = 0x01,
}

/// Largest reply a command may arm, in values.
pub const MAX_REPLY: usize = 256;

/// Reply values armed by a command, waiting for a matching read.
///
/// Capacity is fixed at [`MAX_REPLY`]; `len` tracks how many leading values
/// are meaningful. Validation and copying key off `len`, never capacity.
pub struct Reply {
    values: [u16; MAX_REPLY],
    len: usize,
}

impl Reply {
    fn empty() -> Self {
        Self {
            values: [0; MAX_REPLY],
            len: 0,
        }
    }

    /// Replace the armed reply with `values`.
    pub(crate) fn arm(&mut self, values: &[u16]) {
        debug_assert!(values.len() <= MAX_REPLY);
        self.values[..values.len()].copy_from_slice(values);
        self.len = values.len();
    }

    /// Number of armed values.
    pub(crate) fn len(&self) -> usize {
        self.len
    }

    /// Deliver the armed values into a read buffer, one value per byte
    /// position in order (the low byte of each value travels).
    ///
    /// The buffer length must equal the armed length exactly; asking for
    /// more or fewer bytes fails with [`BusError::InvalidArgument`] and
    /// leaves the reply armed as it was.
    pub(crate) fn fill(&self, buf: &mut BytesMut) -> Result<(), BusError> {
        if buf.len() != self.len {
            return Err(BusError::InvalidArgument {
                armed: self.len,
                requested: buf.len(),
            });
        }

        for (slot, value) in buf.iter_mut().zip(&self.values[..self.len]) {
            *slot = *value as u8;
        }

        Ok(())
    }
}

/// Scratch state for one in-flight transfer.
///
/// Created fresh at the start of every transfer and discarded with it;
/// nothing here survives into the next transfer.
pub struct Transaction {
    /// Last decoded opcode, `None` before any write in this transfer.
    pub(crate) command: Option<Opcode>,
    /// Reply the next read must fetch.
    pub(crate) reply: Reply,
}

impl Transaction {
    pub(crate) fn new() -> Self {
        Self {
            command: None,
            reply: Reply::empty(),
        }
    }
}
