//! Property-based tests for the link state machine and manager.
//!
//! Random driver responses are fed poll by poll; the invariants must hold
//! after every single poll:
//! - A session is held exactly while the state is Connecting or Connected
//! - NoHardware never changes and never touches the collaborators again
//! - A disabled manager stays inert
//! - Every accepted session is closed at most once

mod common;

use std::rc::Rc;

use common::*;
use morpheus_netconsole::{
    transition, Action, InterfaceConfig, Ipv4Addr, LinkState, Observation,
};
use proptest::prelude::*;

/// What the outside world looks like during one poll.
#[derive(Debug, Clone, Copy)]
struct Step {
    link: bool,
    address: bool,
    peer_arrives: bool,
    peer_connected: bool,
}

fn step_strategy() -> impl Strategy<Value = Step> {
    (any::<bool>(), any::<bool>(), any::<bool>(), prop::bool::weighted(0.8)).prop_map(
        |(link, address, peer_arrives, peer_connected)| Step {
            link,
            address,
            peer_arrives,
            peer_connected,
        },
    )
}

fn config_strategy() -> impl Strategy<Value = InterfaceConfig> {
    prop_oneof![
        Just(InterfaceConfig::dynamic(BOARD_MAC)),
        any::<[u8; 4]>().prop_map(|a| InterfaceConfig::static_ip(BOARD_MAC, Ipv4Addr::from(a))),
    ]
}

fn state_strategy() -> impl Strategy<Value = LinkState> {
    prop_oneof![
        Just(LinkState::NoHardware),
        Just(LinkState::Unlinked),
        Just(LinkState::Linking),
        Just(LinkState::Linked),
        Just(LinkState::Connecting),
        Just(LinkState::Connected),
    ]
}

fn observation_strategy() -> impl Strategy<Value = Observation> {
    (
        any::<bool>(),
        prop::option::of(any::<[u8; 4]>()),
        any::<bool>(),
        any::<bool>(),
    )
        .prop_map(|(link_up, address, peer_waiting, session_connected)| Observation {
            link_up,
            address: address.map(Ipv4Addr::from),
            peer_waiting,
            session_connected,
        })
}

/// Apply `step` to the board and the live session, then poll once.
fn drive(board: &Shared, mgr: &mut TestManager, wires: &mut Vec<SharedWire>, step: Step) {
    {
        let mut b = board.borrow_mut();
        b.link = step.link;
        b.address = if step.address { Some(BOARD_IP) } else { None };
    }
    if step.peer_arrives && board.borrow().peers.is_empty() {
        wires.push(queue_peer(board));
    }
    if let Some(session) = mgr.current_session() {
        session.0.borrow_mut().connected = step.peer_connected;
    }
    mgr.poll();
}

#[test]
fn prop_session_held_iff_state_holds_one() {
    proptest!(|(
        config in config_strategy(),
        steps in prop::collection::vec(step_strategy(), 0..80),
    )| {
        let board = board();
        let mut mgr = manager(&board);
        let mut wires = Vec::new();
        mgr.initialize(&config);

        for step in steps {
            drive(&board, &mut mgr, &mut wires, step);

            let state = mgr.state();
            prop_assert!(state.is_some());
            prop_assert_ne!(state, Some(LinkState::NoHardware));

            let holds = state.is_some_and(|s| s.holds_session());
            prop_assert_eq!(mgr.current_session().is_some(), holds);
            prop_assert_eq!(mgr.has_active_session(), holds);
        }
    });
}

#[test]
fn prop_sessions_closed_at_most_once() {
    proptest!(|(steps in prop::collection::vec(step_strategy(), 0..80))| {
        let board = board();
        let mut mgr = manager(&board);
        let mut wires = Vec::new();
        mgr.initialize(&InterfaceConfig::static_ip(BOARD_MAC, BOARD_IP));

        for step in steps {
            drive(&board, &mut mgr, &mut wires, step);
        }

        let live = mgr.current_session().map(|s| s.0.clone());
        let waiting: Vec<SharedWire> = board.borrow().peers.iter().cloned().collect();
        for wire in &wires {
            let closes = wire.borrow().closes;
            let is_live = live.as_ref().is_some_and(|l| Rc::ptr_eq(l, wire));
            let never_taken = waiting.iter().any(|w| Rc::ptr_eq(w, wire));

            if is_live || never_taken {
                prop_assert_eq!(closes, 0);
            } else {
                prop_assert_eq!(closes, 1);
            }
        }
    });
}

#[test]
fn prop_no_hardware_absorbs_everything() {
    proptest!(|(
        config in config_strategy(),
        steps in prop::collection::vec(step_strategy(), 0..40),
    )| {
        let board = board();
        board.borrow_mut().present = false;
        let mut mgr = manager(&board);
        let mut wires = Vec::new();
        mgr.initialize(&config);

        let calls = board.borrow().driver_calls;
        for step in steps {
            drive(&board, &mut mgr, &mut wires, step);
            prop_assert_eq!(mgr.state(), Some(LinkState::NoHardware));
        }
        prop_assert_eq!(board.borrow().driver_calls, calls);
        prop_assert_eq!(board.borrow().acceptor_calls, 0);
        prop_assert_eq!(mgr.log().count(), 1);
    });
}

#[test]
fn prop_disabled_stays_inert() {
    proptest!(|(steps in prop::collection::vec(step_strategy(), 0..40))| {
        let board = board();
        let mut mgr = manager(&board);
        let mut wires = Vec::new();
        mgr.initialize(&InterfaceConfig::disabled());

        for step in steps {
            drive(&board, &mut mgr, &mut wires, step);
            prop_assert_eq!(mgr.state(), None);
        }
        prop_assert_eq!(board.borrow().driver_calls, 0);
        prop_assert_eq!(board.borrow().acceptor_calls, 0);
        prop_assert_eq!(mgr.log().count(), 0);
    });
}

#[test]
fn prop_staying_put_does_nothing() {
    proptest!(|(state in state_strategy(), obs in observation_strategy())| {
        let t = transition(state, &obs);
        if t.next == state {
            prop_assert!(t.actions.is_empty());
        }
        let closes = t.actions.iter().filter(|a| **a == Action::CloseSession).count();
        prop_assert!(closes <= 1);
    });
}

#[test]
fn prop_no_hardware_is_terminal() {
    proptest!(|(state in state_strategy(), obs in observation_strategy())| {
        let t = transition(state, &obs);
        prop_assert_eq!(t.next == LinkState::NoHardware, state == LinkState::NoHardware);
    });
}
