//! Link manager - owns the link state and the session gate.
//!
//! The board's main loop calls [`LinkManager::initialize`] once and
//! [`LinkManager::poll`] every tick. Each poll reads only what the current
//! state needs, runs one step of [`transition`] and executes its actions
//! before returning. Nothing here blocks and nothing here fails: a missing
//! cable, address or peer just means the transition happens on a later poll.
//!
//! # Usage
//!
//! ```ignore
//! use morpheus_netconsole::{LinkManager, StoredRecord, RingLog};
//!
//! let mut console = LinkManager::new(driver, acceptor, RingLog::new());
//! console.initialize_from(&mut StoredRecord::new(&eeprom[NET_RECORD]));
//!
//! loop {
//!     stack.poll(now_ms());
//!     console.poll();
//!     if let Some(session) = console.current_session_mut() {
//!         // mirror console output to the remote client
//!     }
//! }
//! ```

use alloc::format;

use crate::banner::Banner;
use crate::config::{AddressPlan, ConfigSource, InterfaceConfig};
use crate::driver::{Acceptor, InterfaceDriver, SessionHandle};
use crate::gate::SessionGate;
use crate::log::LogSink;
use crate::state::{transition, Action, LinkEvent, LinkState, Observation};

const MSG_NO_HARDWARE: &str = "Ethernet hardware was not found. Networking disabled.";
const MSG_NO_CABLE: &str = "Ethernet cable is not connected.";
const MSG_CABLE_CONNECTED: &str = "Ethernet cable connected";
const MSG_CLIENT_CONNECTED: &str = "Client connected";
const MSG_CLIENT_DISCONNECTED: &str = "Client disconnected";

/// Link lifecycle and single-client session manager.
pub struct LinkManager<D, A, L>
where
    D: InterfaceDriver,
    A: Acceptor,
    L: LogSink,
{
    driver: D,
    acceptor: A,
    log: L,
    banner: Banner,
    /// `None` until initialized with networking enabled.
    state: Option<LinkState>,
    gate: SessionGate<A::Session>,
    /// Peer taken from the acceptor during observation, adopted by the step.
    pending_peer: Option<A::Session>,
}

impl<D, A, L> LinkManager<D, A, L>
where
    D: InterfaceDriver,
    A: Acceptor,
    L: LogSink,
{
    /// Create an uninitialized manager; nothing is touched until `initialize`.
    pub fn new(driver: D, acceptor: A, log: L) -> Self {
        Self {
            driver,
            acceptor,
            log,
            banner: Banner::default(),
            state: None,
            gate: SessionGate::new(),
            pending_peer: None,
        }
    }

    /// Replace the greeting sent to new clients.
    pub fn with_banner(mut self, banner: Banner) -> Self {
        self.banner = banner;
        self
    }

    /// Bring the interface up. Call once, before the first poll.
    ///
    /// With networking disabled this does nothing at all and every later
    /// poll stays a no-op.
    pub fn initialize(&mut self, config: &InterfaceConfig) {
        if !config.enabled {
            return;
        }
        if self.state.is_some() {
            self.log.warn("Network already initialized, ignoring");
            return;
        }

        match config.address_plan() {
            AddressPlan::Dynamic => self.driver.bring_up_dynamic(config.hardware_address),
            AddressPlan::Static(addressing) => {
                self.driver.bring_up_static(config.hardware_address, &addressing)
            }
        }

        if !self.driver.hardware_present() {
            self.log.warn(MSG_NO_HARDWARE);
            self.state = Some(LinkState::NoHardware);
            return;
        }

        self.state = Some(LinkState::Unlinked);

        // Not fatal, the first poll with a cable moves on
        if !self.driver.link_up() {
            self.log.warn(MSG_NO_CABLE);
        }
    }

    /// Load the configuration once from `source` and initialize with it.
    ///
    /// An unreadable record leaves networking off, like `enabled == false`.
    pub fn initialize_from<C: ConfigSource>(&mut self, source: &mut C) {
        match source.load() {
            Ok(config) => self.initialize(&config),
            Err(e) => {
                self.log.warn(&format!("Network config unreadable ({}). Networking disabled.", e))
            }
        }
    }

    /// Advance the link state machine by at most one transition.
    pub fn poll(&mut self) {
        let Some(state) = self.state else {
            return;
        };
        if state == LinkState::NoHardware {
            return;
        }

        let obs = self.observe(state);
        let step = transition(state, &obs);
        for action in step.actions {
            self.apply(action);
        }

        // A peer is only taken when the step adopts it
        if let Some(mut stray) = self.pending_peer.take() {
            stray.close();
        }

        self.state = Some(step.next);
    }

    /// Current state, `None` while inert.
    pub fn state(&self) -> Option<LinkState> {
        self.state
    }

    /// Whether remote console I/O should be routed to a session.
    pub fn has_active_session(&self) -> bool {
        self.state.is_some_and(|s| s.holds_session()) && self.gate.is_occupied()
    }

    /// Borrow the live session. Do not hold on to it across polls.
    pub fn current_session(&self) -> Option<&A::Session> {
        self.gate.session()
    }

    /// Mutably borrow the live session for console I/O.
    pub fn current_session_mut(&mut self) -> Option<&mut A::Session> {
        self.gate.session_mut()
    }

    /// Interface driver the manager polls.
    pub fn driver(&self) -> &D {
        &self.driver
    }

    /// Console acceptor the manager takes peers from.
    pub fn acceptor(&self) -> &A {
        &self.acceptor
    }

    /// Log sink holding the status lines.
    pub fn log(&self) -> &L {
        &self.log
    }

    /// Mutable log sink, e.g. to drain a ring.
    pub fn log_mut(&mut self) -> &mut L {
        &mut self.log
    }

    /// Query collaborators for what `state` looks at, nothing more.
    fn observe(&mut self, state: LinkState) -> Observation {
        let mut obs = Observation::default();
        match state {
            LinkState::NoHardware | LinkState::Connecting => {}
            LinkState::Unlinked => {
                obs.link_up = self.driver.link_up();
            }
            LinkState::Linking => {
                obs.address = self.driver.assigned_address();
            }
            LinkState::Linked => {
                obs.link_up = self.driver.link_up();
                if obs.link_up {
                    self.pending_peer = self.acceptor.poll_peer();
                    obs.peer_waiting = self.pending_peer.is_some();
                }
            }
            LinkState::Connected => {
                obs.session_connected = self.gate.session().is_some_and(|s| s.is_connected());
                obs.link_up = self.driver.link_up();
            }
        }
        obs
    }

    fn apply(&mut self, action: Action) {
        match action {
            Action::Listen => {
                if let Err(e) = self.acceptor.listen() {
                    self.log.warn(&format!("Console listener not started: {}", e));
                }
            }
            Action::AdoptPeer => {
                if let Some(peer) = self.pending_peer.take() {
                    self.gate.adopt(peer);
                }
            }
            Action::SendGreeting => self.send_greeting(),
            Action::CloseSession => {
                self.gate.close();
            }
            Action::Log(event) => self.report(event),
        }
    }

    fn send_greeting(&mut self) {
        let Some(session) = self.gate.session_mut() else {
            return;
        };
        for line in self.banner.lines() {
            if let Err(e) = session.write_line(&line) {
                self.log.warn(&format!("Greeting not delivered: {}", e));
                break;
            }
        }
    }

    fn report(&mut self, event: LinkEvent) {
        match event {
            LinkEvent::CableConnected => self.log.info(MSG_CABLE_CONNECTED),
            LinkEvent::AddressAssigned(ip) => {
                self.log.info(&format!("Console server started with IP {}", ip))
            }
            LinkEvent::LinkLost => self.log.warn(MSG_NO_CABLE),
            LinkEvent::ClientConnected => self.log.info(MSG_CLIENT_CONNECTED),
            LinkEvent::ClientDisconnected => self.log.info(MSG_CLIENT_DISCONNECTED),
        }
    }
}
