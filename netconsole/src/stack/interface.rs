//! Shared smoltcp interface and the interface-driver view of it.
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │ EthernetStack (main loop: poll(now_ms))      │
//! │   Rc<RefCell<StackInner>>                    │
//! │     ├── DeviceAdapter<D>                     │
//! │     ├── smoltcp::iface::Interface            │
//! │     └── SocketSet (DHCPv4, console TCP)      │
//! └──────┬────────────────────┬──────────────────┘
//!        │                    │
//!   StackDriver         TelnetAcceptor ──> TcpSession
//! ```

use alloc::rc::Rc;
use alloc::vec;
use alloc::vec::Vec;
use core::cell::RefCell;

use smoltcp::iface::{Config, Interface, SocketHandle, SocketSet};
use smoltcp::socket::dhcpv4::{Event as DhcpEvent, Socket as DhcpSocket};
use smoltcp::socket::tcp::{Socket as TcpSocket, State as TcpState};
use smoltcp::time::Instant;
use smoltcp::wire::{EthernetAddress, HardwareAddress, IpCidr, Ipv4Address, Ipv4Cidr};

use super::telnet::{TelnetAcceptor, TELNET_PORT};
use super::{DeviceAdapter, NetworkDevice};
use crate::config::StaticAddressing;
use crate::driver::InterfaceDriver;
use crate::types::{Ipv4Addr, MacAddress};

/// TCP receive buffer size.
pub const TCP_RX_BUFFER_SIZE: usize = 1024;

/// TCP transmit buffer size.
pub const TCP_TX_BUFFER_SIZE: usize = 4096;

/// Locally administered address used when the NIC reports a multicast one.
const FALLBACK_MAC: [u8; 6] = [0x02, 0x00, 0x00, 0x00, 0x00, 0x01];

pub(crate) struct StackInner<D: NetworkDevice> {
    pub(crate) device: DeviceAdapter<D>,
    pub(crate) iface: Interface,
    pub(crate) sockets: SocketSet<'static>,
    /// Hardware address the interface is using.
    mac: MacAddress,
    /// DHCP socket handle (dynamic bring-up only).
    dhcp_handle: Option<SocketHandle>,
    /// Closed console sockets waiting for their close handshake to finish.
    pub(crate) retiring: Vec<SocketHandle>,
}

impl<D: NetworkDevice> StackInner<D> {
    fn set_mac(&mut self, hw_address: MacAddress) {
        let mac = EthernetAddress(hw_address.octets());
        // Unset or multicast addresses keep whatever the NIC came up with
        if hw_address != MacAddress::ZERO && mac.is_unicast() {
            self.iface.set_hardware_addr(HardwareAddress::Ethernet(mac));
            self.mac = hw_address;
        }
    }

    fn ipv4_addr(&self) -> Option<Ipv4Addr> {
        self.iface.ip_addrs().iter().next().map(|cidr| {
            let IpCidr::Ipv4(v4) = cidr;
            from_wire(v4.address())
        })
    }

    fn handle_dhcp(&mut self) {
        let Some(handle) = self.dhcp_handle else {
            return;
        };
        match self.sockets.get_mut::<DhcpSocket>(handle).poll() {
            Some(DhcpEvent::Configured(config)) => {
                let address = config.address;
                let router = config.router;

                self.iface.update_ip_addrs(|addrs| {
                    addrs.clear();
                    addrs.push(IpCidr::Ipv4(address)).ok();
                });
                match router {
                    Some(router) => {
                        self.iface.routes_mut().add_default_ipv4_route(router).ok();
                    }
                    None => {
                        self.iface.routes_mut().remove_default_ipv4_route();
                    }
                }
            }
            Some(DhcpEvent::Deconfigured) => {
                self.iface.update_ip_addrs(|addrs| addrs.clear());
                self.iface.routes_mut().remove_default_ipv4_route();
            }
            None => {}
        }
    }

    /// Drop console sockets whose close has completed.
    fn reap(&mut self) {
        let sockets = &mut self.sockets;
        self.retiring.retain(|&handle| {
            let done = sockets.get::<TcpSocket>(handle).state() == TcpState::Closed;
            if done {
                sockets.remove(handle);
            }
            !done
        });
    }
}

/// smoltcp stack shared between the driver, the acceptor and sessions.
///
/// Single-threaded: clones of the inner handle live in the collaborators the
/// link manager owns, and the main loop calls [`EthernetStack::poll`] between
/// manager polls.
pub struct EthernetStack<D: NetworkDevice> {
    inner: Rc<RefCell<StackInner<D>>>,
}

impl<D: NetworkDevice> EthernetStack<D> {
    pub fn new(device: D) -> Self {
        let mac = EthernetAddress(device.mac_address());
        let mac = if mac.is_unicast() { mac } else { EthernetAddress(FALLBACK_MAC) };

        let mut device = DeviceAdapter::new(device);
        let config = Config::new(mac.into());
        let iface = Interface::new(config, &mut device, Instant::from_millis(0));
        let sockets = SocketSet::new(vec![]);

        Self {
            inner: Rc::new(RefCell::new(StackInner {
                device,
                iface,
                sockets,
                mac: MacAddress(mac.0),
                dhcp_handle: None,
                retiring: Vec::new(),
            })),
        }
    }

    /// Poll the interface - must be called regularly.
    ///
    /// Returns `true` if any socket activity occurred.
    pub fn poll(&self, timestamp_ms: u64) -> bool {
        let mut guard = self.inner.borrow_mut();
        let inner = &mut *guard;

        let timestamp = Instant::from_millis(timestamp_ms as i64);
        let activity = inner.iface.poll(timestamp, &mut inner.device, &mut inner.sockets);

        inner.handle_dhcp();
        inner.reap();
        activity
    }

    /// Interface-driver handle for the link manager.
    pub fn driver(&self) -> StackDriver<D> {
        StackDriver { stack: self.inner.clone() }
    }

    /// Console acceptor on the telnet port.
    pub fn acceptor(&self) -> TelnetAcceptor<D> {
        self.acceptor_on(TELNET_PORT)
    }

    /// Console acceptor on a custom port.
    pub fn acceptor_on(&self, port: u16) -> TelnetAcceptor<D> {
        TelnetAcceptor::new(self.inner.clone(), port)
    }

    /// Current IPv4 address, if configured.
    pub fn ipv4_addr(&self) -> Option<Ipv4Addr> {
        self.inner.borrow().ipv4_addr()
    }

    /// Current hardware address of the interface.
    pub fn mac_address(&self) -> MacAddress {
        self.inner.borrow().mac
    }

    /// Run `f` with the NIC driver.
    pub fn with_device<R>(&self, f: impl FnOnce(&mut D) -> R) -> R {
        f(&mut self.inner.borrow_mut().device.inner)
    }

    #[cfg(test)]
    pub(crate) fn shared(&self) -> Rc<RefCell<StackInner<D>>> {
        self.inner.clone()
    }
}

/// [`InterfaceDriver`] over an [`EthernetStack`].
pub struct StackDriver<D: NetworkDevice> {
    stack: Rc<RefCell<StackInner<D>>>,
}

impl<D: NetworkDevice> InterfaceDriver for StackDriver<D> {
    fn bring_up_dynamic(&mut self, hw_address: MacAddress) {
        let mut inner = self.stack.borrow_mut();
        inner.set_mac(hw_address);
        if inner.dhcp_handle.is_none() {
            let handle = inner.sockets.add(DhcpSocket::new());
            inner.dhcp_handle = Some(handle);
        }
    }

    fn bring_up_static(&mut self, hw_address: MacAddress, addressing: &StaticAddressing) {
        let mut inner = self.stack.borrow_mut();
        inner.set_mac(hw_address);

        let cidr = Ipv4Cidr::new(to_wire(addressing.address), addressing.prefix_len());
        inner.iface.update_ip_addrs(|addrs| {
            addrs.clear();
            addrs.push(IpCidr::Ipv4(cidr)).ok();
        });
        inner
            .iface
            .routes_mut()
            .add_default_ipv4_route(to_wire(addressing.gateway))
            .ok();
    }

    fn hardware_present(&self) -> bool {
        self.stack.borrow().device.inner.hardware_present()
    }

    fn link_up(&self) -> bool {
        self.stack.borrow().device.inner.link_up()
    }

    fn assigned_address(&self) -> Option<Ipv4Addr> {
        self.stack.borrow().ipv4_addr()
    }
}

fn to_wire(addr: Ipv4Addr) -> Ipv4Address {
    Ipv4Address::from_bytes(&addr.octets())
}

fn from_wire(addr: Ipv4Address) -> Ipv4Addr {
    let bytes = addr.as_bytes();
    Ipv4Addr::new(bytes[0], bytes[1], bytes[2], bytes[3])
}

#[cfg(test)]
mod tests {
    use super::super::testing::SilentDevice;
    use super::*;
    use crate::config::{AddressPlan, InterfaceConfig};

    fn static_plan(config: &InterfaceConfig) -> StaticAddressing {
        match config.address_plan() {
            AddressPlan::Static(addressing) => addressing,
            AddressPlan::Dynamic => panic!("expected static addressing"),
        }
    }

    #[test]
    fn test_static_bring_up_assigns_address() {
        let stack = EthernetStack::new(SilentDevice::new());
        let mut driver = stack.driver();
        assert_eq!(driver.assigned_address(), None);

        let mac = MacAddress::new([0x02, 0xaa, 0xbb, 0xcc, 0xdd, 0xee]);
        let config = InterfaceConfig::static_ip(mac, Ipv4Addr::new(192, 168, 1, 50));
        driver.bring_up_static(mac, &static_plan(&config));

        assert_eq!(driver.assigned_address(), Some(Ipv4Addr::new(192, 168, 1, 50)));
        assert_eq!(stack.ipv4_addr(), Some(Ipv4Addr::new(192, 168, 1, 50)));
        assert_eq!(stack.mac_address(), mac);
    }

    #[test]
    fn test_dynamic_bring_up_waits_for_lease() {
        let stack = EthernetStack::new(SilentDevice::new());
        let mut driver = stack.driver();
        driver.bring_up_dynamic(MacAddress::ZERO);

        stack.poll(0);
        stack.poll(10);
        assert_eq!(driver.assigned_address(), None);
        // Zero MAC keeps the NIC's own
        assert_eq!(stack.mac_address(), MacAddress::new([0x02, 0x00, 0x00, 0x12, 0x34, 0x56]));
    }

    #[test]
    fn test_link_and_presence_follow_device() {
        let stack = EthernetStack::new(SilentDevice::new());
        let driver = stack.driver();
        assert!(driver.hardware_present());
        assert!(driver.link_up());

        stack.with_device(|dev| {
            dev.link = false;
            dev.present = false;
        });
        assert!(!driver.hardware_present());
        assert!(!driver.link_up());
    }

    #[test]
    fn test_address_conversion() {
        let addr = Ipv4Addr::new(10, 1, 2, 3);
        assert_eq!(from_wire(to_wire(addr)), addr);
    }
}
