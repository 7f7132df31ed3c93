//! Session gate - the single slot holding the accepted remote session.
//!
//! Console routing borrows the session through the manager; the gate is the
//! only owner, so a poll that closes the session leaves nothing dangling.

use crate::driver::SessionHandle;

/// Single-slot session holder.
#[derive(Debug)]
pub struct SessionGate<S: SessionHandle> {
    slot: Option<S>,
}

impl<S: SessionHandle> SessionGate<S> {
    pub const fn new() -> Self {
        Self { slot: None }
    }

    /// Put a freshly accepted session in the slot.
    ///
    /// A session already held is closed first; the slot never leaks one.
    pub fn adopt(&mut self, session: S) {
        self.close();
        self.slot = Some(session);
    }

    /// Close and drop the held session. Returns whether one was held.
    pub fn close(&mut self) -> bool {
        match self.slot.take() {
            Some(mut session) => {
                session.close();
                true
            }
            None => false,
        }
    }

    /// Whether a session is held.
    pub fn is_occupied(&self) -> bool {
        self.slot.is_some()
    }

    /// Borrow the held session.
    pub fn session(&self) -> Option<&S> {
        self.slot.as_ref()
    }

    /// Mutably borrow the held session.
    pub fn session_mut(&mut self) -> Option<&mut S> {
        self.slot.as_mut()
    }
}

impl<S: SessionHandle> Default for SessionGate<S> {
    fn default() -> Self {
        Self::new()
    }
}
