//! Network console error types.
//!
//! The link state machine itself never fails - "not yet" is expressed as
//! state. These errors cover the seams that can: decoding the stored
//! configuration record and the socket operations behind a session.

use core::fmt;

/// Result type for network console operations.
pub type Result<T> = core::result::Result<T, NetConsoleError>;

/// Network console error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NetConsoleError {
    /// Stored configuration record is shorter than the fixed layout.
    RecordTooShort,
    /// Stored configuration record does not start with the expected magic.
    BadMagic,
    /// Stored configuration record has a layout version we do not know.
    UnsupportedVersion(u8),
    /// Stored configuration record failed its checksum.
    ChecksumMismatch,
    /// The listening socket could not be opened.
    ListenFailed,
    /// Session is no longer connected.
    NotConnected,
    /// Send operation failed or was truncated.
    SendFailed,
    /// Receive operation failed.
    ReceiveFailed,
}

impl NetConsoleError {
    /// Get a human-readable description of the error.
    pub fn description(&self) -> &'static str {
        match self {
            Self::RecordTooShort => "Stored network config record is truncated",
            Self::BadMagic => "Stored network config record has bad magic",
            Self::UnsupportedVersion(_) => "Stored network config record version unsupported",
            Self::ChecksumMismatch => "Stored network config record checksum mismatch",
            Self::ListenFailed => "Console listener could not be opened",
            Self::NotConnected => "Session not connected",
            Self::SendFailed => "Send failed",
            Self::ReceiveFailed => "Receive failed",
        }
    }
}

impl fmt::Display for NetConsoleError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnsupportedVersion(v) => write!(f, "{} ({})", self.description(), v),
            other => f.write_str(other.description()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::string::ToString;

    #[test]
    fn test_error_descriptions() {
        assert!(!NetConsoleError::ChecksumMismatch.description().is_empty());
        assert_eq!(NetConsoleError::SendFailed.to_string(), "Send failed");
    }

    #[test]
    fn test_version_is_rendered() {
        let msg = NetConsoleError::UnsupportedVersion(7).to_string();
        assert!(msg.ends_with("(7)"));
    }
}
