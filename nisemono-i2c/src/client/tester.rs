//! Client driver for the stub test chip.
//!
//! The consumer half of the protocol: each query issues a one-byte command
//! write followed by a read of the reply, both inside a single transfer. The
//! read must ask for exactly the length the command armed, or the chip
//! rejects the whole transfer.

use bytes::Bytes;

use crate::bus::{Adapter, BusNumber, Message};
use crate::chip::stub::bcd::bcd2bin;
use crate::chip::stub::{Opcode, DEFAULT_ADDRESS};
use crate::error::TransferError;
use crate::tracing::prelude::*;

/// Identity reported by the stub chip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipIdentity {
    /// Status byte; zero on a healthy reply.
    pub status: u8,
    /// Major version of the bus protocol.
    pub bus_major_version: u8,
    /// Bus number the chip is attached under.
    pub bus_number: u8,
}

/// Driver for the stub chip, generic over the bus it talks through.
pub struct TesterClient<A: Adapter> {
    bus: A,
    nr: BusNumber,
    address: u8,
}

impl<A: Adapter> TesterClient<A> {
    /// Create a client talking to the default slave address.
    pub fn new(bus: A, nr: BusNumber) -> Self {
        Self::new_with_address(bus, nr, DEFAULT_ADDRESS)
    }

    /// Create a client talking to a custom slave address.
    pub fn new_with_address(bus: A, nr: BusNumber, address: u8) -> Self {
        Self { bus, nr, address }
    }

    /// Ask the chip to identify itself.
    pub fn identify(&mut self) -> Result<ChipIdentity, TransferError> {
        let reply = self.command(Opcode::Id, 3)?;
        let identity = ChipIdentity {
            status: reply[0],
            bus_major_version: bcd2bin(reply[1]),
            bus_number: bcd2bin(reply[2]),
        };

        debug!(
            status = identity.status,
            version = identity.bus_major_version,
            bus = identity.bus_number,
            "chip identified"
        );
        Ok(identity)
    }

    /// Ask the chip for its firmware version.
    pub fn firmware_version(&mut self) -> Result<u16, TransferError> {
        let reply = self.command(Opcode::GetFirmwareVersion, 1)?;
        Ok(reply[0] as u16)
    }

    /// Issue a command write and fetch its `reply_len`-byte reply within one
    /// transfer.
    fn command(&mut self, opcode: Opcode, reply_len: usize) -> Result<Bytes, TransferError> {
        let mut msgs = [
            Message::write(self.address, vec![opcode as u8]),
            Message::read(self.address, reply_len),
        ];
        self.bus.transfer(self.nr, &mut msgs)?;

        let [_, reply] = msgs;
        match reply {
            Message::Read { buf, .. } => Ok(buf.freeze()),
            // A transfer never changes message kinds in place
            Message::Write { .. } => unreachable!("read message replaced during transfer"),
        }
    }
}
