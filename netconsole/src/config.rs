//! Interface configuration.
//!
//! `InterfaceConfig` is what the board loads from non-volatile storage at
//! startup. It is read once; changing it needs a restart of the console.
//!
//! # Addressing
//!
//! No static address means DHCP. A static address with missing companions
//! fills each one in on its own:
//!
//! ```text
//! gateway = address with the host octet forced to 1
//! dns     = gateway
//! mask    = 255.255.255.0
//! ```
//!
//! # Stored record
//!
//! ```text
//! 0      4    5     6       12     16    20     24    28     30      32
//! ├──────┼────┼─────┼───────┼──────┼─────┼──────┼─────┼──────┼───────┤
//! │ MXNC │ver │flags│  mac  │ addr │ dns │ gway │mask │ rsvd │ csum  │
//! └──────┴────┴─────┴───────┴──────┴─────┴──────┴─────┴──────┴───────┘
//! ```
//!
//! Every address has its own presence bit in `flags`, so `0.0.0.0` is kept
//! as a configured value. `csum` is the RFC 1071 one's complement sum over
//! the whole record, stored big-endian.

use crate::error::{NetConsoleError, Result};
use crate::types::{Ipv4Addr, MacAddress};

/// Subnet mask used when a static address comes without one.
pub const DEFAULT_SUBNET_MASK: Ipv4Addr = Ipv4Addr::new(255, 255, 255, 0);

/// Size of the stored configuration record in bytes.
pub const RECORD_LEN: usize = 32;

/// Current stored record layout version.
pub const RECORD_VERSION: u8 = 1;

const RECORD_MAGIC: [u8; 4] = *b"MXNC";

const FLAG_ENABLED: u8 = 1 << 0;
const FLAG_ADDRESS: u8 = 1 << 1;
const FLAG_DNS: u8 = 1 << 2;
const FLAG_GATEWAY: u8 = 1 << 3;
const FLAG_MASK: u8 = 1 << 4;

const OFF_VERSION: usize = 4;
const OFF_FLAGS: usize = 5;
const OFF_MAC: usize = 6;
const OFF_ADDRESS: usize = 12;
const OFF_DNS: usize = 16;
const OFF_GATEWAY: usize = 20;
const OFF_MASK: usize = 24;
const OFF_CHECKSUM: usize = 30;

/// Network interface configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterfaceConfig {
    /// Hardware (MAC) address to bring the interface up with.
    pub hardware_address: MacAddress,
    /// Static IPv4 address. `None` selects DHCP.
    pub static_address: Option<Ipv4Addr>,
    /// DNS server.
    pub dns: Option<Ipv4Addr>,
    /// Default gateway.
    pub gateway: Option<Ipv4Addr>,
    /// Subnet mask.
    pub subnet_mask: Option<Ipv4Addr>,
    /// Networking enabled at all.
    pub enabled: bool,
}

impl Default for InterfaceConfig {
    fn default() -> Self {
        Self::disabled()
    }
}

impl InterfaceConfig {
    /// Networking switched off. The manager stays inert.
    pub const fn disabled() -> Self {
        Self {
            hardware_address: MacAddress::ZERO,
            static_address: None,
            dns: None,
            gateway: None,
            subnet_mask: None,
            enabled: false,
        }
    }

    /// Enabled, addressed by DHCP.
    pub const fn dynamic(hardware_address: MacAddress) -> Self {
        Self {
            hardware_address,
            enabled: true,
            ..Self::disabled()
        }
    }

    /// Enabled with a static address. Companions are derived unless set.
    pub const fn static_ip(hardware_address: MacAddress, address: Ipv4Addr) -> Self {
        Self {
            hardware_address,
            static_address: Some(address),
            enabled: true,
            ..Self::disabled()
        }
    }

    /// Set DNS server.
    pub fn dns(mut self, dns: Ipv4Addr) -> Self {
        self.dns = Some(dns);
        self
    }

    /// Set default gateway.
    pub fn gateway(mut self, gateway: Ipv4Addr) -> Self {
        self.gateway = Some(gateway);
        self
    }

    /// Set subnet mask.
    pub fn mask(mut self, mask: Ipv4Addr) -> Self {
        self.subnet_mask = Some(mask);
        self
    }

    /// Resolve how the interface gets its address.
    ///
    /// Each missing companion is derived on its own: gateway `a.b.c.1`, DNS
    /// from the gateway, mask /24. An explicit DNS or mask is kept even when
    /// the gateway has to be derived.
    pub fn address_plan(&self) -> AddressPlan {
        let Some(address) = self.static_address else {
            return AddressPlan::Dynamic;
        };

        let gateway = self.gateway.unwrap_or_else(|| default_gateway(address));
        AddressPlan::Static(StaticAddressing {
            address,
            dns: self.dns.unwrap_or(gateway),
            gateway,
            subnet_mask: self.subnet_mask.unwrap_or(DEFAULT_SUBNET_MASK),
        })
    }

    /// Decode a stored configuration record.
    pub fn decode(record: &[u8]) -> Result<Self> {
        if record.len() < RECORD_LEN {
            return Err(NetConsoleError::RecordTooShort);
        }
        let record = &record[..RECORD_LEN];

        if record[..4] != RECORD_MAGIC {
            return Err(NetConsoleError::BadMagic);
        }
        if record[OFF_VERSION] != RECORD_VERSION {
            return Err(NetConsoleError::UnsupportedVersion(record[OFF_VERSION]));
        }
        if record_checksum(record) != 0 {
            return Err(NetConsoleError::ChecksumMismatch);
        }

        let flags = record[OFF_FLAGS];
        let mut mac = [0u8; 6];
        mac.copy_from_slice(&record[OFF_MAC..OFF_MAC + 6]);

        Ok(Self {
            hardware_address: MacAddress(mac),
            static_address: read_addr(record, flags, FLAG_ADDRESS, OFF_ADDRESS),
            dns: read_addr(record, flags, FLAG_DNS, OFF_DNS),
            gateway: read_addr(record, flags, FLAG_GATEWAY, OFF_GATEWAY),
            subnet_mask: read_addr(record, flags, FLAG_MASK, OFF_MASK),
            enabled: flags & FLAG_ENABLED != 0,
        })
    }

    /// Encode into a stored configuration record.
    pub fn encode(&self) -> [u8; RECORD_LEN] {
        let mut record = [0u8; RECORD_LEN];
        record[..4].copy_from_slice(&RECORD_MAGIC);
        record[OFF_VERSION] = RECORD_VERSION;
        record[OFF_MAC..OFF_MAC + 6].copy_from_slice(self.hardware_address.as_bytes());

        let mut flags = if self.enabled { FLAG_ENABLED } else { 0 };
        flags |= write_addr(&mut record, self.static_address, FLAG_ADDRESS, OFF_ADDRESS);
        flags |= write_addr(&mut record, self.dns, FLAG_DNS, OFF_DNS);
        flags |= write_addr(&mut record, self.gateway, FLAG_GATEWAY, OFF_GATEWAY);
        flags |= write_addr(&mut record, self.subnet_mask, FLAG_MASK, OFF_MASK);
        record[OFF_FLAGS] = flags;

        let csum = record_checksum(&record);
        record[OFF_CHECKSUM..].copy_from_slice(&csum.to_be_bytes());
        record
    }
}

/// How the interface obtains its IPv4 address.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddressPlan {
    /// Acquire an address via DHCP.
    Dynamic,
    /// Fully resolved static addressing.
    Static(StaticAddressing),
}

/// Static addressing with every companion resolved.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaticAddressing {
    pub address: Ipv4Addr,
    pub dns: Ipv4Addr,
    pub gateway: Ipv4Addr,
    pub subnet_mask: Ipv4Addr,
}

impl StaticAddressing {
    /// Prefix length of the subnet mask (leading one bits).
    pub fn prefix_len(&self) -> u8 {
        u32::from(self.subnet_mask).leading_ones() as u8
    }
}

/// Source of the configuration loaded once at startup.
pub trait ConfigSource {
    /// Load the interface configuration.
    fn load(&mut self) -> Result<InterfaceConfig>;
}

/// Configuration held as a stored record image (EEPROM, flash page, ...).
#[derive(Debug, Clone, Copy)]
pub struct StoredRecord<'a> {
    bytes: &'a [u8],
}

impl<'a> StoredRecord<'a> {
    pub const fn new(bytes: &'a [u8]) -> Self {
        Self { bytes }
    }
}

impl ConfigSource for StoredRecord<'_> {
    fn load(&mut self) -> Result<InterfaceConfig> {
        InterfaceConfig::decode(self.bytes)
    }
}

impl ConfigSource for InterfaceConfig {
    fn load(&mut self) -> Result<InterfaceConfig> {
        Ok(*self)
    }
}

fn default_gateway(address: Ipv4Addr) -> Ipv4Addr {
    let [a, b, c, _] = address.octets();
    Ipv4Addr::new(a, b, c, 1)
}

fn read_addr(record: &[u8], flags: u8, bit: u8, off: usize) -> Option<Ipv4Addr> {
    if flags & bit == 0 {
        return None;
    }
    Some(Ipv4Addr::new(record[off], record[off + 1], record[off + 2], record[off + 3]))
}

fn write_addr(record: &mut [u8], addr: Option<Ipv4Addr>, bit: u8, off: usize) -> u8 {
    match addr {
        Some(addr) => {
            record[off..off + 4].copy_from_slice(&addr.octets());
            bit
        }
        None => 0,
    }
}

/// RFC 1071 one's complement checksum over 16-bit big-endian words.
fn record_checksum(data: &[u8]) -> u16 {
    let mut sum: u32 = data
        .chunks(2)
        .map(|w| u32::from(u16::from_be_bytes([w[0], *w.get(1).unwrap_or(&0)])))
        .sum();

    while sum >> 16 != 0 {
        sum = (sum & 0xFFFF) + (sum >> 16);
    }
    !(sum as u16)
}
