//! Collaborator capability traits.
//!
//! The link manager only ever talks to hardware and sockets through these.
//! Every query here MUST return immediately: the manager runs inside a
//! cooperative main loop and never waits on anything.

use crate::config::StaticAddressing;
use crate::error::Result;
use crate::types::{Ipv4Addr, MacAddress};

/// Wired interface driver.
pub trait InterfaceDriver {
    /// Bring the interface up and start DHCP.
    fn bring_up_dynamic(&mut self, hw_address: MacAddress);

    /// Bring the interface up with fully resolved static addressing.
    fn bring_up_static(&mut self, hw_address: MacAddress, addressing: &StaticAddressing);

    /// Whether the controller answered at bring-up.
    fn hardware_present(&self) -> bool;

    /// Physical link (cable present and negotiated).
    fn link_up(&self) -> bool;

    /// Address currently assigned to the interface, if any yet.
    fn assigned_address(&self) -> Option<Ipv4Addr>;
}

/// Listening endpoint yielding at most one pending peer per call.
pub trait Acceptor {
    type Session: SessionHandle;

    /// Start listening. Calling it again while listening is harmless.
    fn listen(&mut self) -> Result<()>;

    /// Take a peer that is waiting to be accepted.
    fn poll_peer(&mut self) -> Option<Self::Session>;
}

/// An accepted remote peer's byte stream.
pub trait SessionHandle {
    /// Peer still attached.
    fn is_connected(&self) -> bool;

    /// Send one newline-terminated text line.
    fn write_line(&mut self, text: &str) -> Result<()>;

    /// Queue raw bytes. Returns how many were accepted.
    fn write(&mut self, data: &[u8]) -> Result<usize>;

    /// Read whatever the peer has sent. `Ok(0)` when nothing is pending.
    fn read(&mut self, buf: &mut [u8]) -> Result<usize>;

    /// Close the connection.
    fn close(&mut self);
}
