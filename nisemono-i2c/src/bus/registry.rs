//! Bus enumeration: attach/detach lifecycle for emulated adapters.
//!
//! The registry stands in for a host's bus numbering. It owns attached
//! adapters and hands out bus numbers; no protocol state lives here. Each
//! adapter is exclusively owned, so transfers against one device are
//! naturally serialized.

use std::collections::BTreeMap;

use crate::bus::{Adapter, BusNumber, Message};
use crate::error::{BusError, TransferError};
use crate::tracing::prelude::*;

/// Registry of attached adapters, keyed by bus number.
#[derive(Default)]
pub struct Registry {
    adapters: BTreeMap<BusNumber, Box<dyn Adapter>>,
}

impl Registry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Attach an adapter, assigning it the lowest free bus number.
    pub fn attach(&mut self, adapter: Box<dyn Adapter>) -> BusNumber {
        let nr = self.lowest_free();
        info!(bus = %nr, adapter = adapter.name(), "adapter attached");
        self.adapters.insert(nr, adapter);
        nr
    }

    /// Detach the adapter at `nr`, returning it if one was attached.
    pub fn detach(&mut self, nr: BusNumber) -> Option<Box<dyn Adapter>> {
        let adapter = self.adapters.remove(&nr);
        match &adapter {
            Some(adapter) => info!(bus = %nr, adapter = adapter.name(), "adapter detached"),
            None => warn!(bus = %nr, "detach of unattached bus ignored"),
        }
        adapter
    }

    /// Borrow the adapter at `nr` for issuing transfers.
    pub fn adapter_mut(&mut self, nr: BusNumber) -> Option<&mut dyn Adapter> {
        self.adapters
            .get_mut(&nr)
            .map(|adapter| -> &mut dyn Adapter { adapter.as_mut() })
    }

    /// Issue one transfer on the bus at `nr`.
    ///
    /// With no adapter attached there, nobody answers for any address, so a
    /// non-empty transfer fails at its first message with
    /// [`BusError::DeviceNotFound`].
    pub fn transfer(&mut self, nr: BusNumber, msgs: &mut [Message]) -> Result<usize, TransferError> {
        match self.adapters.get_mut(&nr) {
            Some(adapter) => adapter.transfer(nr, msgs),
            None => match msgs.first() {
                Some(msg) => Err(TransferError {
                    index: 0,
                    source: BusError::DeviceNotFound(msg.addr()),
                }),
                None => Ok(0),
            },
        }
    }

    /// Number of attached adapters.
    pub fn len(&self) -> usize {
        self.adapters.len()
    }

    /// Whether no adapter is attached.
    pub fn is_empty(&self) -> bool {
        self.adapters.is_empty()
    }

    fn lowest_free(&self) -> BusNumber {
        let mut nr = 0;
        while self.adapters.contains_key(&BusNumber(nr)) {
            nr += 1;
        }
        BusNumber(nr)
    }
}
