//! MorpheusX Network Console
//!
//! Ethernet link lifecycle and single-client remote console for boards with
//! a wired interface. Cooperative: the board's main loop polls, nothing here
//! blocks or spawns.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │              Board main loop                                │
//! │  initialize(config) once, poll() every tick                 │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!                              ▼
//! ┌─────────────────────────────────────────────────────────────┐
//! │              LinkManager                                    │
//! │  LinkState + SessionGate, runs state::transition            │
//! └─────────────────────────────────────────────────────────────┘
//!                              │
//!         ┌────────────────────┼────────────────────┐
//!         ▼                    ▼                    ▼
//!  InterfaceDriver          Acceptor             LogSink
//!         └─────── stack (smoltcp) ──────┘       RingLog / FmtLog
//! ```
//!
//! # Features
//!
//! - `smoltcp-stack` (default) - [`stack`] backend over smoltcp.

#![no_std]

extern crate alloc;

pub mod banner;
pub mod config;
pub mod driver;
pub mod error;
pub mod gate;
pub mod log;
pub mod manager;
pub mod state;
pub mod types;

#[cfg(feature = "smoltcp-stack")]
pub mod stack;

pub use banner::Banner;
pub use config::{AddressPlan, ConfigSource, InterfaceConfig, StaticAddressing, StoredRecord};
pub use driver::{Acceptor, InterfaceDriver, SessionHandle};
pub use error::{NetConsoleError, Result};
pub use gate::SessionGate;
pub use log::{FmtLog, LogEntry, LogLevel, LogSink, RingLog};
pub use manager::LinkManager;
pub use state::{transition, Action, LinkEvent, LinkState, Observation, Transition};
pub use types::{Ipv4Addr, MacAddress};
