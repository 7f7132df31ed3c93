//! Common test utilities: scripted driver, acceptor and sessions

#![allow(dead_code)]

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;

use morpheus_netconsole::{
    Acceptor, InterfaceConfig, InterfaceDriver, Ipv4Addr, LinkManager, LinkState, LogLevel,
    MacAddress, NetConsoleError, Result, RingLog, SessionHandle, StaticAddressing,
};

pub const BOARD_MAC: MacAddress = MacAddress::new([0x02, 0x4d, 0x58, 0x00, 0x00, 0x01]);
pub const BOARD_IP: Ipv4Addr = Ipv4Addr::new(192, 168, 1, 50);

/// One remote peer as seen from the test.
#[derive(Debug)]
pub struct Wire {
    pub connected: bool,
    pub lines: Vec<String>,
    pub bytes: Vec<u8>,
    pub inbound: Vec<u8>,
    pub closes: usize,
    pub fail_writes: bool,
}

impl Wire {
    fn new() -> Self {
        Self {
            connected: true,
            lines: Vec::new(),
            bytes: Vec::new(),
            inbound: Vec::new(),
            closes: 0,
            fail_writes: false,
        }
    }
}

pub type SharedWire = Rc<RefCell<Wire>>;

/// Everything the fakes read from and record into.
#[derive(Debug)]
pub struct Board {
    pub present: bool,
    pub link: bool,
    pub address: Option<Ipv4Addr>,
    pub listen_fails: bool,
    pub peers: VecDeque<SharedWire>,

    pub driver_calls: usize,
    pub acceptor_calls: usize,
    pub listen_calls: usize,
    pub dynamic_bring_ups: Vec<MacAddress>,
    pub static_bring_ups: Vec<(MacAddress, StaticAddressing)>,
}

pub type Shared = Rc<RefCell<Board>>;

/// Board with a controller fitted, no cable, no address.
pub fn board() -> Shared {
    Rc::new(RefCell::new(Board {
        present: true,
        link: false,
        address: None,
        listen_fails: false,
        peers: VecDeque::new(),
        driver_calls: 0,
        acceptor_calls: 0,
        listen_calls: 0,
        dynamic_bring_ups: Vec::new(),
        static_bring_ups: Vec::new(),
    }))
}

pub struct FakeDriver(pub Shared);

impl InterfaceDriver for FakeDriver {
    fn bring_up_dynamic(&mut self, hw_address: MacAddress) {
        let mut b = self.0.borrow_mut();
        b.driver_calls += 1;
        b.dynamic_bring_ups.push(hw_address);
    }

    fn bring_up_static(&mut self, hw_address: MacAddress, addressing: &StaticAddressing) {
        let mut b = self.0.borrow_mut();
        b.driver_calls += 1;
        b.static_bring_ups.push((hw_address, *addressing));
    }

    fn hardware_present(&self) -> bool {
        let mut b = self.0.borrow_mut();
        b.driver_calls += 1;
        b.present
    }

    fn link_up(&self) -> bool {
        let mut b = self.0.borrow_mut();
        b.driver_calls += 1;
        b.link
    }

    fn assigned_address(&self) -> Option<Ipv4Addr> {
        let mut b = self.0.borrow_mut();
        b.driver_calls += 1;
        b.address
    }
}

pub struct FakeAcceptor(pub Shared);

impl Acceptor for FakeAcceptor {
    type Session = FakeSession;

    fn listen(&mut self) -> Result<()> {
        let mut b = self.0.borrow_mut();
        b.acceptor_calls += 1;
        b.listen_calls += 1;
        if b.listen_fails {
            Err(NetConsoleError::ListenFailed)
        } else {
            Ok(())
        }
    }

    fn poll_peer(&mut self) -> Option<FakeSession> {
        let mut b = self.0.borrow_mut();
        b.acceptor_calls += 1;
        b.peers.pop_front().map(FakeSession)
    }
}

pub struct FakeSession(pub SharedWire);

impl SessionHandle for FakeSession {
    fn is_connected(&self) -> bool {
        self.0.borrow().connected
    }

    fn write_line(&mut self, text: &str) -> Result<()> {
        let mut w = self.0.borrow_mut();
        if w.fail_writes {
            return Err(NetConsoleError::SendFailed);
        }
        w.lines.push(text.to_string());
        Ok(())
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        let mut w = self.0.borrow_mut();
        if !w.connected {
            return Err(NetConsoleError::NotConnected);
        }
        w.bytes.extend_from_slice(data);
        Ok(data.len())
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        let mut w = self.0.borrow_mut();
        let n = w.inbound.len().min(buf.len());
        buf[..n].copy_from_slice(&w.inbound[..n]);
        w.inbound.drain(..n);
        Ok(n)
    }

    fn close(&mut self) {
        let mut w = self.0.borrow_mut();
        w.closes += 1;
        w.connected = false;
    }
}

pub type TestManager = LinkManager<FakeDriver, FakeAcceptor, RingLog>;

pub fn manager(board: &Shared) -> TestManager {
    LinkManager::new(FakeDriver(board.clone()), FakeAcceptor(board.clone()), RingLog::new())
}

/// Queue a peer for the acceptor to hand out.
pub fn queue_peer(board: &Shared) -> SharedWire {
    let wire = Rc::new(RefCell::new(Wire::new()));
    board.borrow_mut().peers.push_back(wire.clone());
    wire
}

/// Everything logged so far, oldest first.
pub fn logged(mgr: &TestManager) -> Vec<(LogLevel, String)> {
    mgr.log()
        .iter()
        .map(|e| (e.level, e.message().to_string()))
        .collect()
}

/// Initialize with a static address and walk up to `Linked`.
pub fn linked_manager(board: &Shared) -> TestManager {
    let mut mgr = manager(board);
    mgr.initialize(&InterfaceConfig::static_ip(BOARD_MAC, BOARD_IP));

    board.borrow_mut().link = true;
    mgr.poll();
    board.borrow_mut().address = Some(BOARD_IP);
    mgr.poll();
    assert_eq!(mgr.state(), Some(LinkState::Linked));
    mgr
}

/// Walk up to `Connected` with a fresh peer.
pub fn connected_manager(board: &Shared) -> (TestManager, SharedWire) {
    let mut mgr = linked_manager(board);
    let wire = queue_peer(board);
    mgr.poll();
    mgr.poll();
    assert_eq!(mgr.state(), Some(LinkState::Connected));
    (mgr, wire)
}
