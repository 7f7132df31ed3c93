//! Console listener and remote session over smoltcp TCP sockets.

use alloc::rc::Rc;
use alloc::vec;
use core::cell::RefCell;

use smoltcp::iface::SocketHandle;
use smoltcp::socket::tcp::{Socket as TcpSocket, SocketBuffer as TcpSocketBuffer, State as TcpState};
use smoltcp::time::Duration;

use super::interface::{StackInner, TCP_RX_BUFFER_SIZE, TCP_TX_BUFFER_SIZE};
use super::NetworkDevice;
use crate::driver::{Acceptor, SessionHandle};
use crate::error::{NetConsoleError, Result};

/// Telnet port the console listens on by default.
pub const TELNET_PORT: u16 = 23;

/// How long a closed session may wait for the peer to finish the close.
const CLOSE_TIMEOUT_SECS: u64 = 10;

/// Listening endpoint for the remote console.
///
/// One TCP socket sits in LISTEN. Once a peer completes the handshake the
/// socket is handed out as a [`TcpSession`] and a fresh one takes its place.
pub struct TelnetAcceptor<D: NetworkDevice> {
    stack: Rc<RefCell<StackInner<D>>>,
    port: u16,
    listener: Option<SocketHandle>,
    /// `listen` was requested; keep a listener open from then on.
    armed: bool,
}

impl<D: NetworkDevice> TelnetAcceptor<D> {
    pub(crate) fn new(stack: Rc<RefCell<StackInner<D>>>, port: u16) -> Self {
        Self {
            stack,
            port,
            listener: None,
            armed: false,
        }
    }

    /// Port this acceptor listens on.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Whether a socket is currently waiting for a peer.
    pub fn is_listening(&self) -> bool {
        match self.listener {
            Some(handle) => self.stack.borrow().sockets.get::<TcpSocket>(handle).is_listening(),
            None => false,
        }
    }

    fn open_listener(&mut self) -> Result<()> {
        let mut socket = TcpSocket::new(
            TcpSocketBuffer::new(vec![0u8; TCP_RX_BUFFER_SIZE]),
            TcpSocketBuffer::new(vec![0u8; TCP_TX_BUFFER_SIZE]),
        );
        socket.listen(self.port).map_err(|_| NetConsoleError::ListenFailed)?;

        let handle = self.stack.borrow_mut().sockets.add(socket);
        self.listener = Some(handle);
        Ok(())
    }

    /// Hand a dead listening socket to the stack for reaping.
    fn discard_listener(&mut self, handle: SocketHandle) {
        self.listener = None;
        let mut stack = self.stack.borrow_mut();
        stack.sockets.get_mut::<TcpSocket>(handle).abort();
        stack.retiring.push(handle);
    }
}

impl<D: NetworkDevice> Acceptor for TelnetAcceptor<D> {
    type Session = TcpSession<D>;

    fn listen(&mut self) -> Result<()> {
        if self.listener.is_some() {
            return Ok(());
        }
        // Armed even on failure, so poll_peer keeps retrying
        self.armed = true;
        self.open_listener()
    }

    fn poll_peer(&mut self) -> Option<TcpSession<D>> {
        if self.listener.is_none() && self.armed {
            self.open_listener().ok()?;
        }
        let handle = self.listener?;

        let state = self.stack.borrow().sockets.get::<TcpSocket>(handle).state();
        match state {
            TcpState::Listen | TcpState::SynReceived => None,
            TcpState::Established | TcpState::CloseWait => {
                self.listener = None;
                // Re-arm now; if it fails the next poll tries again
                self.open_listener().ok();

                Some(TcpSession {
                    stack: self.stack.clone(),
                    handle,
                    closed: false,
                })
            }
            _ => {
                // Peer connected and went away before it was picked up
                self.discard_listener(handle);
                self.open_listener().ok();
                None
            }
        }
    }
}

/// Accepted console client.
pub struct TcpSession<D: NetworkDevice> {
    stack: Rc<RefCell<StackInner<D>>>,
    handle: SocketHandle,
    closed: bool,
}

impl<D: NetworkDevice> TcpSession<D> {
    /// Current TCP state of the underlying socket.
    pub fn tcp_state(&self) -> TcpState {
        self.stack.borrow().sockets.get::<TcpSocket>(self.handle).state()
    }

    fn send_all(&mut self, data: &[u8]) -> Result<()> {
        let sent = self.write(data)?;
        if sent < data.len() {
            return Err(NetConsoleError::SendFailed);
        }
        Ok(())
    }
}

impl<D: NetworkDevice> SessionHandle for TcpSession<D> {
    fn is_connected(&self) -> bool {
        if self.closed {
            return false;
        }
        let stack = self.stack.borrow();
        let socket = stack.sockets.get::<TcpSocket>(self.handle);
        socket.may_recv() || socket.can_recv()
    }

    fn write_line(&mut self, text: &str) -> Result<()> {
        self.send_all(text.as_bytes())?;
        self.send_all(b"\r\n")
    }

    fn write(&mut self, data: &[u8]) -> Result<usize> {
        if self.closed {
            return Err(NetConsoleError::NotConnected);
        }
        let mut stack = self.stack.borrow_mut();
        let socket = stack.sockets.get_mut::<TcpSocket>(self.handle);
        if !socket.may_send() {
            return Err(NetConsoleError::NotConnected);
        }
        socket.send_slice(data).map_err(|_| NetConsoleError::SendFailed)
    }

    fn read(&mut self, buf: &mut [u8]) -> Result<usize> {
        if self.closed {
            return Err(NetConsoleError::NotConnected);
        }
        let mut stack = self.stack.borrow_mut();
        let socket = stack.sockets.get_mut::<TcpSocket>(self.handle);
        if !socket.can_recv() {
            return if socket.may_recv() {
                Ok(0)
            } else {
                Err(NetConsoleError::NotConnected)
            };
        }
        socket.recv_slice(buf).map_err(|_| NetConsoleError::ReceiveFailed)
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;

        let mut stack = self.stack.borrow_mut();
        let socket = stack.sockets.get_mut::<TcpSocket>(self.handle);
        socket.set_timeout(Some(Duration::from_secs(CLOSE_TIMEOUT_SECS)));
        socket.close();
        stack.retiring.push(self.handle);
    }
}

impl<D: NetworkDevice> Drop for TcpSession<D> {
    fn drop(&mut self) {
        self.close();
    }
}
