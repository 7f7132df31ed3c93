//! Core address types.

use core::fmt;

pub use core::net::Ipv4Addr;

/// MAC address (6 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct MacAddress(pub [u8; 6]);

impl MacAddress {
    /// Create a new MAC address
    pub const fn new(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }

    /// Zero MAC address
    pub const ZERO: Self = Self([0x00; 6]);

    /// Build the address burned into the two OTP fuse words.
    ///
    /// `mac1` carries the two high bytes in its low half, `mac0` the
    /// remaining four, most significant first.
    pub const fn from_fuse_words(mac1: u32, mac0: u32) -> Self {
        Self([
            (mac1 >> 8) as u8,
            mac1 as u8,
            (mac0 >> 24) as u8,
            (mac0 >> 16) as u8,
            (mac0 >> 8) as u8,
            mac0 as u8,
        ])
    }

    /// Get raw bytes
    pub const fn as_bytes(&self) -> &[u8; 6] {
        &self.0
    }

    /// Get octets
    pub const fn octets(&self) -> [u8; 6] {
        self.0
    }
}

impl From<[u8; 6]> for MacAddress {
    fn from(bytes: [u8; 6]) -> Self {
        Self(bytes)
    }
}

impl fmt::Display for MacAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{:02x}:{:02x}:{:02x}:{:02x}:{:02x}:{:02x}",
            self.0[0], self.0[1], self.0[2], self.0[3], self.0[4], self.0[5]
        )
    }
}
