//! Core Types for Ping Utility

use core::fmt;

/// IPv4 address (4 bytes)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Ipv4Addr(pub [u8; 4]);

impl Ipv4Addr {
    /// Create a new IPv4 address
    pub const fn new(a: u8, b: u8, c: u8, d: u8) -> Self {
        Self([a, b, c, d])
    }

    /// Create from u32 (network byte order)
    pub const fn from_u32(addr: u32) -> Self {
        Self(addr.to_be_bytes())
    }

    /// Convert to u32 (network byte order)
    pub const fn to_u32(&self) -> u32 {
        u32::from_be_bytes(self.0)
    }

    /// Unspecified address (0.0.0.0)
    pub const UNSPECIFIED: Self = Self([0, 0, 0, 0]);

    pub const fn octets(&self) -> [u8; 4] {
        self.0
    }
}

impl From<[u8; 4]> for Ipv4Addr {
    fn from(octets: [u8; 4]) -> Self {
        Self(octets)
    }
}

impl fmt::Display for Ipv4Addr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}.{}", self.0[0], self.0[1], self.0[2], self.0[3])
    }
}

/// Default wait for an echo reply
pub const DEFAULT_REPLY_TIMEOUT_MS: u32 = 1000;

/// Ping configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PingConfig {
    /// How long each attempt polls for a reply
    pub reply_timeout_ms: u32,
}

impl PingConfig {
    pub const fn new(reply_timeout_ms: u32) -> Self {
        Self { reply_timeout_ms }
    }
}

impl Default for PingConfig {
    fn default() -> Self {
        Self::new(DEFAULT_REPLY_TIMEOUT_MS)
    }
}
