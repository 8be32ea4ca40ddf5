//! The stub test chip: a virtual I2C slave device.
//!
//! Emulates a fixed-address chip that answers two commands, an identify
//! request and a firmware-version query. Write messages are decoded as
//! commands and arm a reply; read messages fetch the armed reply
//! byte-exactly. One transfer is processed atomically: messages run in
//! order against fresh per-transfer state and the first failure aborts the
//! rest.

pub mod bcd;
pub mod protocol;

pub use protocol::Opcode;

use crate::bus::{Adapter, BusNumber, Message};
use crate::error::{BusError, TransferError};
use crate::tracing::prelude::*;

use bcd::bin2bcd;
use protocol::Transaction;

/// Slave address the stub chip answers on by default.
pub const DEFAULT_ADDRESS: u8 = 0x24;

/// Firmware version the stub chip reports by default.
pub const DEFAULT_FIRMWARE_VERSION: u16 = 0x14;

/// Number of entries in the chip's register file.
pub const N_REGISTERS: usize = 256;

/// Major version of the bus protocol, reported by the identify reply.
pub const BUS_MAJOR_VERSION: u8 = 1;

/// Persistent state of the emulated chip.
///
/// Created once at device creation and owned exclusively by whoever drives
/// it (directly, or boxed inside a [`Registry`](crate::bus::Registry));
/// per-transfer state lives in [`protocol::Transaction`] instead and never
/// outlives a transfer.
pub struct StubChip {
    /// Addressable register file, zero-initialized. No current command
    /// touches it; the storage is reserved for register access commands.
    #[expect(dead_code, reason = "storage reserved for register access commands")]
    registers: [u16; N_REGISTERS],
    firmware_version: u16,
    address: u8,
}

impl StubChip {
    /// Create a chip with the reference firmware version at the default
    /// address.
    pub fn new() -> Self {
        Self::with_identity(DEFAULT_FIRMWARE_VERSION, DEFAULT_ADDRESS)
    }

    /// Create a chip reporting `firmware_version` and answering on
    /// `address`.
    pub fn with_identity(firmware_version: u16, address: u8) -> Self {
        Self {
            registers: [0; N_REGISTERS],
            firmware_version,
            address,
        }
    }

    /// Slave address this chip answers on.
    pub fn address(&self) -> u8 {
        self.address
    }

    /// Firmware version this chip reports.
    pub fn firmware_version(&self) -> u16 {
        self.firmware_version
    }

    /// Route one message to command or reply handling.
    fn handle_message(
        &mut self,
        nr: BusNumber,
        msg: &mut Message,
        txn: &mut Transaction,
    ) -> Result<(), BusError> {
        if msg.addr() != self.address {
            return Err(BusError::DeviceNotFound(msg.addr()));
        }

        match msg {
            Message::Read { buf, .. } => {
                trace!(command = ?txn.command, len = buf.len(), "reply fetch");
                txn.reply.fill(buf)
            }
            Message::Write { data, .. } => self.execute(nr, data, txn),
        }
    }

    /// Decode a command write and arm the reply a following read fetches.
    fn execute(&mut self, nr: BusNumber, data: &[u8], txn: &mut Transaction) -> Result<(), BusError> {
        let Some(&raw) = data.first() else {
            return Err(BusError::NotSupported("empty command write".into()));
        };
        let Some(opcode) = Opcode::from_repr(raw) else {
            debug!("unsupported command 0x{:02x}", raw);
            return Err(BusError::NotSupported(format!("command 0x{:02x}", raw)));
        };

        match opcode {
            Opcode::Id => {
                if data.len() > 1 {
                    return Err(BusError::NotSupported("identify takes no arguments".into()));
                }

                // Reply: status byte (zero on success), then the protocol
                // major version and the bus number, both in packed decimal.
                txn.reply.arm(&[
                    0,
                    bin2bcd(BUS_MAJOR_VERSION) as u16,
                    bin2bcd(nr.0) as u16,
                ]);
            }
            Opcode::GetFirmwareVersion => {
                txn.reply.arm(&[self.firmware_version]);
            }
        }

        txn.command = Some(opcode);
        Ok(())
    }
}

impl Default for StubChip {
    fn default() -> Self {
        Self::new()
    }
}

impl Adapter for StubChip {
    fn name(&self) -> &str {
        "nisemono stub chip"
    }

    fn transfer(&mut self, nr: BusNumber, msgs: &mut [Message]) -> Result<usize, TransferError> {
        // Fresh scratch state per transfer; nothing carries over between
        // transfer calls.
        let mut txn = Transaction::new();

        for (index, msg) in msgs.iter_mut().enumerate() {
            self.handle_message(nr, msg, &mut txn)
                .map_err(|source| TransferError { index, source })?;
        }

        Ok(msgs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    const BUS: BusNumber = BusNumber(0);

    fn write(data: &[u8]) -> Message {
        Message::write(DEFAULT_ADDRESS, data.to_vec())
    }

    fn read(len: usize) -> Message {
        Message::read(DEFAULT_ADDRESS, len)
    }

    fn payload(msg: &Message) -> &[u8] {
        match msg {
            Message::Read { buf, .. } => &buf[..],
            Message::Write { .. } => panic!("expected a read message"),
        }
    }

    #[test]
    fn firmware_version_query() {
        let mut chip = StubChip::new();
        let mut msgs = [write(&[0x01]), read(1)];

        assert_eq!(chip.transfer(BUS, &mut msgs), Ok(2));
        assert_eq!(payload(&msgs[1]), &[0x14]);
    }

    #[test]
    fn firmware_version_follows_configuration() {
        let mut chip = StubChip::with_identity(0x77, DEFAULT_ADDRESS);
        let mut msgs = [write(&[0x01]), read(1)];

        chip.transfer(BUS, &mut msgs).expect("valid exchange");
        assert_eq!(payload(&msgs[1]), &[0x77]);
    }

    #[test]
    fn identify_reply_is_status_then_packed_decimal_fields() {
        let mut chip = StubChip::new();
        let mut msgs = [write(&[0x00]), read(3)];

        chip.transfer(BusNumber(12), &mut msgs).expect("valid exchange");
        assert_eq!(payload(&msgs[1]), &[0x00, 0x01, 0x12]);
    }

    #[test]
    fn identify_status_byte_is_always_zero() {
        for nr in [0, 1, 42, 99] {
            let mut chip = StubChip::new();
            let mut msgs = [write(&[0x00]), read(3)];

            chip.transfer(BusNumber(nr), &mut msgs).expect("valid exchange");
            assert_eq!(payload(&msgs[1])[0], 0);
            assert_eq!(payload(&msgs[1])[2], bcd::bin2bcd(nr));
        }
    }

    #[test]
    fn identify_rejects_arguments() {
        let mut chip = StubChip::new();
        let mut msgs = [write(&[0x00, 0xaa])];

        let err = chip.transfer(BUS, &mut msgs).expect_err("overlong identify");
        assert_eq!(err.index, 0);
        assert!(matches!(err.source, BusError::NotSupported(_)));
    }

    #[test_case(&[0x02]; "first unassigned opcode")]
    #[test_case(&[0x7f]; "middle of the range")]
    #[test_case(&[0xff]; "top of the range")]
    #[test_case(&[]; "empty write")]
    fn unknown_commands_are_rejected(data: &[u8]) {
        let mut chip = StubChip::new();
        let mut msgs = [write(data)];

        let err = chip.transfer(BUS, &mut msgs).expect_err("unknown command");
        assert_eq!(err.index, 0);
        assert!(matches!(err.source, BusError::NotSupported(_)));
    }

    #[test]
    fn unknown_command_reports_its_position() {
        let mut chip = StubChip::new();
        let mut msgs = [write(&[0x01]), read(1), write(&[0x4c])];

        let err = chip.transfer(BUS, &mut msgs).expect_err("unknown command");
        assert_eq!(err.index, 2);
        assert!(matches!(err.source, BusError::NotSupported(_)));
    }

    #[test]
    fn failed_command_leaves_armed_reply_untouched() {
        let mut chip = StubChip::new();
        let mut txn = Transaction::new();

        chip.execute(BUS, &[0x01], &mut txn).expect("valid command");
        assert_eq!(txn.reply.len(), 1);

        chip.execute(BUS, &[0x4c], &mut txn).expect_err("unknown command");
        assert_eq!(txn.command, Some(Opcode::GetFirmwareVersion));
        assert_eq!(txn.reply.len(), 1);
    }

    #[test]
    fn every_mismatched_read_length_is_rejected() {
        for requested in (0..=255usize).filter(|&len| len != 3) {
            let mut chip = StubChip::new();
            let mut msgs = [write(&[0x00]), read(requested)];

            let err = chip.transfer(BUS, &mut msgs).expect_err("length mismatch");
            assert_eq!(err.index, 1);
            assert_eq!(
                err.source,
                BusError::InvalidArgument {
                    armed: 3,
                    requested,
                }
            );
        }
    }

    #[test_case(1; "single byte")]
    #[test_case(3; "identify sized")]
    #[test_case(200; "large request")]
    fn read_before_any_write_is_rejected(requested: usize) {
        let mut chip = StubChip::new();
        let mut msgs = [read(requested)];

        let err = chip.transfer(BUS, &mut msgs).expect_err("nothing armed");
        assert_eq!(err.index, 0);
        assert_eq!(
            err.source,
            BusError::InvalidArgument {
                armed: 0,
                requested,
            }
        );
    }

    #[test]
    fn zero_length_read_matches_idle_state() {
        let mut chip = StubChip::new();
        let mut msgs = [read(0)];

        assert_eq!(chip.transfer(BUS, &mut msgs), Ok(1));
    }

    #[test]
    fn foreign_address_aborts_the_transfer() {
        let mut chip = StubChip::new();
        let mut msgs = [
            write(&[0x01]),
            Message::write(0x51, vec![0x01]),
            read(1),
        ];

        let err = chip.transfer(BUS, &mut msgs).expect_err("foreign address");
        assert_eq!(err.index, 1);
        assert_eq!(err.source, BusError::DeviceNotFound(0x51));
    }

    #[test]
    fn foreign_address_fails_in_any_position() {
        let mut chip = StubChip::new();
        let mut msgs = [Message::read(0x23, 1), Message::write(0x24, vec![0x01])];

        let err = chip.transfer(BUS, &mut msgs).expect_err("foreign address");
        assert_eq!(err.index, 0);
        assert_eq!(err.source, BusError::DeviceNotFound(0x23));
    }

    #[test]
    fn chip_answers_on_a_custom_address() {
        let mut chip = StubChip::with_identity(DEFAULT_FIRMWARE_VERSION, 0x51);
        let mut msgs = [Message::write(0x51, vec![0x01]), Message::read(0x51, 1)];

        assert_eq!(chip.transfer(BUS, &mut msgs), Ok(2));
        assert_eq!(payload(&msgs[1]), &[0x14]);

        let mut msgs = [write(&[0x01])];
        let err = chip.transfer(BUS, &mut msgs).expect_err("default address unanswered");
        assert_eq!(err.source, BusError::DeviceNotFound(DEFAULT_ADDRESS));
    }

    #[test]
    fn success_count_equals_message_count() {
        let mut chip = StubChip::new();
        let mut msgs = [write(&[0x00]), read(3), write(&[0x01]), read(1)];

        assert_eq!(chip.transfer(BUS, &mut msgs), Ok(4));
        assert_eq!(payload(&msgs[1]), &[0x00, 0x01, 0x00]);
        assert_eq!(payload(&msgs[3]), &[0x14]);
    }

    #[test]
    fn empty_transfer_succeeds_with_zero_count() {
        let mut chip = StubChip::new();
        assert_eq!(chip.transfer(BUS, &mut []), Ok(0));
    }

    #[test]
    fn armed_state_does_not_leak_across_transfers() {
        let mut chip = StubChip::new();

        let mut first = [write(&[0x00])];
        assert_eq!(chip.transfer(BUS, &mut first), Ok(1));

        // The previous transfer armed a 3-byte reply, but each transfer
        // starts idle.
        let mut second = [read(3)];
        let err = chip.transfer(BUS, &mut second).expect_err("fresh transfer is idle");
        assert_eq!(
            err.source,
            BusError::InvalidArgument {
                armed: 0,
                requested: 3,
            }
        );
    }

    #[test]
    fn writes_rearm_within_one_transfer() {
        let mut chip = StubChip::new();
        let mut msgs = [write(&[0x00]), write(&[0x01]), read(1)];

        assert_eq!(chip.transfer(BUS, &mut msgs), Ok(3));
        assert_eq!(payload(&msgs[2]), &[0x14]);
    }
}
