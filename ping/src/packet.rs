//! ICMP Echo wire format
//!
//! Echo message image, all fields big-endian, no padding:
//!
//! ```text
//!  0      1      2      4      6      8            12          12+N
//!  ┌──────┬──────┬──────┬──────┬──────┬────────────┬─────────────┐
//!  │ type │ code │ csum │  id  │ seq  │ sent at ms │ payload[N]  │
//!  └──────┴──────┴──────┴──────┴──────┴────────────┴─────────────┘
//! ```

use core::sync::atomic::{AtomicU16, Ordering};

use crate::checksum::{finalize_checksum, partial_checksum};

/// ICMP protocol number in IP header
pub const ICMP_PROTOCOL: u8 = 1;

/// ICMP header size
pub const ICMP_HEADER_SIZE: usize = 8;

/// Send timestamp size
pub const TIMESTAMP_SIZE: usize = 4;

/// Header plus timestamp: the fixed part of an echo message
pub const ECHO_PREFIX_SIZE: usize = ICMP_HEADER_SIZE + TIMESTAMP_SIZE;

/// Prefix the chip puts before each datagram in IPRAW mode:
/// source address (4) + datagram length (2, big-endian)
pub const RAW_IP_PREFIX_SIZE: usize = 6;

/// ICMP message types used by echo
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum IcmpType {
    /// Echo Reply (type 0)
    EchoReply = 0,
    /// Echo Request (type 8) - ping
    EchoRequest = 8,
}

/// Identifier and sequence sources for echo requests.
///
/// Each counter is pre-incremented when a request header is built, so the
/// first request carries id 1 and sequence 1. Both wrap from 0xFFFF to 0.
#[derive(Debug)]
pub struct EchoCounters {
    id: AtomicU16,
    sequence: AtomicU16,
}

impl EchoCounters {
    pub const fn new() -> Self {
        Self::starting_at(0, 0)
    }

    /// Counters whose next values are `id + 1` and `sequence + 1`
    pub const fn starting_at(id: u16, sequence: u16) -> Self {
        Self {
            id: AtomicU16::new(id),
            sequence: AtomicU16::new(sequence),
        }
    }

    pub fn next_id(&self) -> u16 {
        self.id.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    pub fn next_sequence(&self) -> u16 {
        self.sequence.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    /// Identifier of the most recent request (0 before the first)
    pub fn last_id(&self) -> u16 {
        self.id.load(Ordering::Relaxed)
    }

    /// Sequence of the most recent request (0 before the first)
    pub fn last_sequence(&self) -> u16 {
        self.sequence.load(Ordering::Relaxed)
    }
}

impl Default for EchoCounters {
    fn default() -> Self {
        Self::new()
    }
}

/// Counters shared by every session that is not given its own
pub static GLOBAL_COUNTERS: EchoCounters = EchoCounters::new();

/// ICMP echo header
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct IcmpHeader {
    pub icmp_type: u8,
    pub code: u8,
    pub checksum: u16,
    pub id: u16,
    pub sequence: u16,
}

impl IcmpHeader {
    /// Echo request header with fresh id and sequence
    pub fn request(counters: &EchoCounters) -> Self {
        Self {
            icmp_type: IcmpType::EchoRequest as u8,
            code: 0,
            checksum: 0,
            id: counters.next_id(),
            sequence: counters.next_sequence(),
        }
    }

    /// All-zero header, filled in when decoding a reply
    pub const fn empty() -> Self {
        Self {
            icmp_type: 0,
            code: 0,
            checksum: 0,
            id: 0,
            sequence: 0,
        }
    }

    pub fn to_bytes(&self) -> [u8; ICMP_HEADER_SIZE] {
        let mut b = [0u8; ICMP_HEADER_SIZE];
        b[0] = self.icmp_type;
        b[1] = self.code;
        b[2..4].copy_from_slice(&self.checksum.to_be_bytes());
        b[4..6].copy_from_slice(&self.id.to_be_bytes());
        b[6..8].copy_from_slice(&self.sequence.to_be_bytes());
        b
    }

    pub fn from_bytes(b: &[u8; ICMP_HEADER_SIZE]) -> Self {
        Self {
            icmp_type: b[0],
            code: b[1],
            checksum: u16::from_be_bytes([b[2], b[3]]),
            id: u16::from_be_bytes([b[4], b[5]]),
            sequence: u16::from_be_bytes([b[6], b[7]]),
        }
    }
}

/// Echo message: header, send timestamp and an `N` byte payload
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoMessage<const N: usize> {
    pub header: IcmpHeader,
    /// Sender's clock when the request was built (ms)
    pub timestamp: u32,
    payload: [u8; N],
}

impl<const N: usize> EchoMessage<N> {
    /// Size of the serialized message
    pub const WIRE_LEN: usize = ECHO_PREFIX_SIZE + N;

    /// Echo request stamped with `now_ms`, payload `' ' + i` per byte.
    ///
    /// The checksum is left zero; call [`fill_checksum`](Self::fill_checksum)
    /// before sending.
    pub fn request(counters: &EchoCounters, now_ms: u32) -> Self {
        let mut payload = [0u8; N];
        for (i, byte) in payload.iter_mut().enumerate() {
            *byte = b' '.wrapping_add(i as u8);
        }

        Self {
            header: IcmpHeader::request(counters),
            timestamp: now_ms,
            payload,
        }
    }

    pub const fn empty() -> Self {
        Self {
            header: IcmpHeader::empty(),
            timestamp: 0,
            payload: [0u8; N],
        }
    }

    /// Rebuild a message from its serialized prefix and payload.
    pub fn from_parts(prefix: &[u8; ECHO_PREFIX_SIZE], payload: [u8; N]) -> Self {
        let mut msg = Self::empty();
        msg.payload = payload;
        msg.decode_prefix(prefix);
        msg
    }

    /// Overwrite header and timestamp from their wire form
    pub fn decode_prefix(&mut self, prefix: &[u8; ECHO_PREFIX_SIZE]) {
        let mut header = [0u8; ICMP_HEADER_SIZE];
        header.copy_from_slice(&prefix[..ICMP_HEADER_SIZE]);

        self.header = IcmpHeader::from_bytes(&header);
        self.timestamp = u32::from_be_bytes([prefix[8], prefix[9], prefix[10], prefix[11]]);
    }

    pub fn payload(&self) -> &[u8; N] {
        &self.payload
    }

    pub fn payload_mut(&mut self) -> &mut [u8; N] {
        &mut self.payload
    }

    /// Header and timestamp as they appear on the wire
    pub fn prefix_bytes(&self) -> [u8; ECHO_PREFIX_SIZE] {
        let mut b = [0u8; ECHO_PREFIX_SIZE];
        b[..ICMP_HEADER_SIZE].copy_from_slice(&self.header.to_bytes());
        b[ICMP_HEADER_SIZE..].copy_from_slice(&self.timestamp.to_be_bytes());
        b
    }

    /// Serialize into `out`; `None` if it is shorter than `WIRE_LEN`.
    pub fn write_to(&self, out: &mut [u8]) -> Option<usize> {
        let out = out.get_mut(..Self::WIRE_LEN)?;
        out[..ECHO_PREFIX_SIZE].copy_from_slice(&self.prefix_bytes());
        out[ECHO_PREFIX_SIZE..].copy_from_slice(&self.payload);
        Some(Self::WIRE_LEN)
    }

    /// Zero the checksum field, checksum the image, store the result.
    pub fn fill_checksum(&mut self) {
        self.header.checksum = 0;
        self.header.checksum = self.image_checksum();
    }

    /// True when the stored checksum matches the image.
    pub fn verify_checksum(&self) -> bool {
        self.image_checksum() == 0
    }

    // The prefix is even-length so the payload starts on a word boundary
    fn image_checksum(&self) -> u16 {
        let sum = partial_checksum(&self.prefix_bytes(), 0);
        finalize_checksum(partial_checksum(&self.payload, sum))
    }
}
