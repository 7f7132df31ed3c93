//! smoltcp backend for the link manager.
//!
//! Concrete collaborators over a smoltcp TCP/IP stack:
//!
//! - [`NetworkDevice`] - what a NIC driver provides
//! - [`DeviceAdapter`] - exposes a `NetworkDevice` to smoltcp
//! - [`EthernetStack`] - interface, sockets and DHCP, polled every tick
//! - [`StackDriver`] - the link manager's interface driver
//! - [`TelnetAcceptor`] / [`TcpSession`] - the console listener and its client
//!
//! # Usage
//!
//! ```ignore
//! use morpheus_netconsole::stack::EthernetStack;
//! use morpheus_netconsole::{LinkManager, RingLog};
//!
//! let stack = EthernetStack::new(nic);
//! let mut console = LinkManager::new(stack.driver(), stack.acceptor(), RingLog::new());
//! console.initialize(&config);
//!
//! loop {
//!     stack.poll(get_time_ms());
//!     console.poll();
//! }
//! ```

mod interface;
mod telnet;

use smoltcp::phy::{Device, DeviceCapabilities, Medium, RxToken, TxToken};
use smoltcp::time::Instant;

use crate::error::Result;

pub use interface::{EthernetStack, StackDriver, TCP_RX_BUFFER_SIZE, TCP_TX_BUFFER_SIZE};
pub use telnet::{TcpSession, TelnetAcceptor, TELNET_PORT};

const MTU: usize = 1536;

/// NIC driver interface.
pub trait NetworkDevice {
    /// MAC address burned into the controller.
    fn mac_address(&self) -> [u8; 6];

    /// Whether the device has space to transmit a frame.
    fn can_transmit(&self) -> bool;

    /// Transmit a frame.
    fn transmit(&mut self, frame: &[u8]) -> Result<()>;

    /// Receive a frame into the provided buffer.
    ///
    /// Returns `Ok(Some(len))` when a frame was read, `Ok(None)` when no frame
    /// is available.
    fn receive(&mut self, buffer: &mut [u8]) -> Result<Option<usize>>;

    /// Whether the controller responded during probe.
    fn hardware_present(&self) -> bool {
        true
    }

    /// PHY link status.
    fn link_up(&self) -> bool {
        true
    }
}

/// Thin adapter that exposes a `NetworkDevice` to smoltcp.
pub struct DeviceAdapter<D: NetworkDevice> {
    pub inner: D,
}

impl<D: NetworkDevice> DeviceAdapter<D> {
    pub fn new(inner: D) -> Self {
        Self { inner }
    }
}

impl<D: NetworkDevice> Device for DeviceAdapter<D> {
    type RxToken<'a> = AdapterRxToken where Self: 'a;
    type TxToken<'a> = AdapterTxToken<'a, D> where Self: 'a;

    fn capabilities(&self) -> DeviceCapabilities {
        let mut caps = DeviceCapabilities::default();
        caps.max_transmission_unit = MTU;
        caps.medium = Medium::Ethernet;
        caps
    }

    fn receive(&mut self, _timestamp: Instant) -> Option<(Self::RxToken<'_>, Self::TxToken<'_>)> {
        // Only hand out tokens once a frame is actually in hand
        let mut token = AdapterRxToken { buffer: [0u8; MTU], len: 0 };
        match self.inner.receive(&mut token.buffer) {
            Ok(Some(len)) if len > 0 => {
                token.len = len.min(MTU);
                Some((token, AdapterTxToken { device: &mut self.inner }))
            }
            _ => None,
        }
    }

    fn transmit(&mut self, _timestamp: Instant) -> Option<Self::TxToken<'_>> {
        if self.inner.can_transmit() {
            Some(AdapterTxToken { device: &mut self.inner })
        } else {
            None
        }
    }
}

/// Received frame, copied out of the device.
pub struct AdapterRxToken {
    buffer: [u8; MTU],
    len: usize,
}

impl RxToken for AdapterRxToken {
    fn consume<R, F>(mut self, f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        f(&mut self.buffer[..self.len])
    }
}

pub struct AdapterTxToken<'a, D: NetworkDevice> {
    device: &'a mut D,
}

impl<'a, D: NetworkDevice> TxToken for AdapterTxToken<'a, D> {
    fn consume<R, F>(self, len: usize, f: F) -> R
    where
        F: FnOnce(&mut [u8]) -> R,
    {
        let len = len.min(MTU);
        let mut buffer = [0u8; MTU];
        let result = f(&mut buffer[..len]);

        // smoltcp retransmits on its own; a dropped frame is not an error here
        let _ = self.device.transmit(&buffer[..len]);

        result
    }
}
