//! ICMP Ping over a W5100 Hardware Socket
//!
//! A minimal, no_std ping client for boards that reach the network through
//! a WIZnet W5100. The chip terminates IP itself; this crate opens one
//! socket in IPRAW mode, writes ICMP Echo Requests into it and reads the
//! replies back out.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Ping Utility Structure                       │
//! ├─────────────────────────────────────────────────────────────────┤
//! │                                                                 │
//! │  ┌────────────┐  ┌────────────┐  ┌──────────────┐               │
//! │  │   Types    │  │   Packet   │  │ EchoSession  │               │
//! │  │            │  │            │  │              │               │
//! │  │ Ipv4Addr   │  │ IcmpHeader │  │ open socket  │               │
//! │  │ PingConfig │  │ EchoMessage│  │ send / wait  │               │
//! │  │            │  │ counters   │  │ receive      │               │
//! │  └────────────┘  └────────────┘  └──────┬───────┘               │
//! │                                         │ SocketRegisters       │
//! │                                         ▼                       │
//! │                                   w5100::W5100<Bus>             │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use w5100::{Socket, W5100};
//! use w5100_ping::{EchoSession, Ipv4Addr, LineBuffer};
//!
//! let mut session: EchoSession<_, _, 32> =
//!     EchoSession::new(&mut chip, || board.millis(), Socket::new(0)?);
//!
//! let mut text: LineBuffer<64> = LineBuffer::new();
//! if session.ping_report(4, Ipv4Addr::new(192, 168, 1, 1), &mut text) {
//!     // "Reply[1] from: 192.168.1.1: bytes=32 time=3ms TTL=64"
//! }
//! ```

#![cfg_attr(not(test), no_std)]
#![forbid(unsafe_code)]

mod types;
mod packet;
mod pinger;
mod checksum;
mod clock;
mod text;
pub mod logger;

pub use types::{Ipv4Addr, PingConfig, DEFAULT_REPLY_TIMEOUT_MS};
pub use packet::{
    EchoCounters, EchoMessage, IcmpHeader, IcmpType, ECHO_PREFIX_SIZE, GLOBAL_COUNTERS,
    ICMP_HEADER_SIZE, ICMP_PROTOCOL, RAW_IP_PREFIX_SIZE,
};
pub use pinger::{EchoReply, EchoSession, PingError};
pub use checksum::{calculate_checksum, finalize_checksum, partial_checksum, verify_checksum};
pub use clock::{elapsed_ms, Clock};
pub use text::LineBuffer;
