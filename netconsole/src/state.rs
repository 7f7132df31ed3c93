//! Link state machine.
//!
//! Pure transition table. The manager gathers an [`Observation`] for the
//! current state, calls [`transition`], then executes the returned actions.
//! Nothing in here touches hardware.
//!
//! # States
//!
//! ```text
//!              link up             address            peer
//! Unlinked ─────────────> Linking ─────────> Linked ────────> Connecting
//!    ^                                       ^  │                 │
//!    │         link down                     │  │                 │ greet
//!    ├───────────────────────────────────────┼──┘                 v
//!    │                                       │ disconnect     Connected
//!    │                                       └────────────────────┤
//!    └────────────────────────────────────────────────────────────┘
//!                               link down
//!
//! NoHardware: entered at init only, never left
//! ```

use alloc::vec::Vec;

use crate::types::Ipv4Addr;

/// Link and session state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// No controller found at init. Absorbing.
    NoHardware,
    /// Waiting for a cable.
    Unlinked,
    /// Cable present, listener open, waiting for an address.
    Linking,
    /// Addressed and listening, no peer.
    Linked,
    /// Peer accepted, greeting not sent yet.
    Connecting,
    /// Peer greeted and attached.
    Connected,
}

impl LinkState {
    /// Get human-readable state name
    pub const fn name(&self) -> &'static str {
        match self {
            Self::NoHardware => "NO_HARDWARE",
            Self::Unlinked => "UNLINKED",
            Self::Linking => "LINKING",
            Self::Linked => "LINKED",
            Self::Connecting => "CONNECTING",
            Self::Connected => "CONNECTED",
        }
    }

    /// States in which a session is held.
    pub const fn holds_session(&self) -> bool {
        matches!(self, Self::Connecting | Self::Connected)
    }
}

/// Collaborator readings taken for one poll.
///
/// Only the fields the current state looks at are meaningful; the manager
/// leaves the rest at their defaults and does not query for them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Observation {
    /// Physical link present.
    pub link_up: bool,
    /// Address assigned to the interface.
    pub address: Option<Ipv4Addr>,
    /// Acceptor produced a peer.
    pub peer_waiting: bool,
    /// Held session still reports connected.
    pub session_connected: bool,
}

/// Status line emitted by a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkEvent {
    CableConnected,
    AddressAssigned(Ipv4Addr),
    LinkLost,
    ClientConnected,
    ClientDisconnected,
}

/// Side effect requested by a transition, executed in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Open the acceptor for listening.
    Listen,
    /// Move the peer taken from the acceptor into the session slot.
    AdoptPeer,
    /// Send the greeting lines to the held session.
    SendGreeting,
    /// Close and drop the held session, if any.
    CloseSession,
    /// Report a status line.
    Log(LinkEvent),
}

/// Result of one step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transition {
    pub next: LinkState,
    pub actions: Vec<Action>,
}

impl Transition {
    fn stay(state: LinkState) -> Self {
        Self { next: state, actions: Vec::new() }
    }
}

/// Advance the state machine by at most one transition.
pub fn transition(state: LinkState, obs: &Observation) -> Transition {
    let mut actions = Vec::new();

    let next = match state {
        LinkState::NoHardware => return Transition::stay(state),

        LinkState::Unlinked => {
            if !obs.link_up {
                return Transition::stay(state);
            }
            actions.push(Action::Log(LinkEvent::CableConnected));
            actions.push(Action::Listen);
            LinkState::Linking
        }

        LinkState::Linking => {
            let Some(address) = obs.address else {
                return Transition::stay(state);
            };
            actions.push(Action::Log(LinkEvent::AddressAssigned(address)));
            LinkState::Linked
        }

        LinkState::Linked => {
            if !obs.link_up {
                actions.push(Action::Log(LinkEvent::LinkLost));
                LinkState::Unlinked
            } else if obs.peer_waiting {
                actions.push(Action::AdoptPeer);
                LinkState::Connecting
            } else {
                return Transition::stay(state);
            }
        }

        LinkState::Connecting => {
            actions.push(Action::SendGreeting);
            actions.push(Action::Log(LinkEvent::ClientConnected));
            LinkState::Connected
        }

        LinkState::Connected => {
            // Both checks run; link loss decides the final state
            let mut next = LinkState::Connected;
            if !obs.session_connected {
                actions.push(Action::CloseSession);
                actions.push(Action::Log(LinkEvent::ClientDisconnected));
                next = LinkState::Linked;
            }
            if !obs.link_up {
                actions.push(Action::Log(LinkEvent::LinkLost));
                if next == LinkState::Connected {
                    actions.push(Action::CloseSession);
                }
                next = LinkState::Unlinked;
            }
            next
        }
    };

    Transition { next, actions }
}
