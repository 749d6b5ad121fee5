//! W5100 register definitions and constants.
//!
//! Addresses are in the chip's 16-bit address space. Socket registers are
//! offsets from [`socket_base`].

/// Common registers
pub mod common {
    /// Mode
    pub const MR: u16 = 0x0000;
    /// Gateway Address
    pub const GAR: u16 = 0x0001;
    /// Subnet Mask
    pub const SUBR: u16 = 0x0005;
    /// Source Hardware Address
    pub const SHAR: u16 = 0x0009;
    /// Source IP Address
    pub const SIPR: u16 = 0x000F;
    /// Retry Time (100us units)
    pub const RTR: u16 = 0x0017;
    /// Retry Count
    pub const RCR: u16 = 0x0019;
    /// RX Memory Size
    pub const RMSR: u16 = 0x001A;
    /// TX Memory Size
    pub const TMSR: u16 = 0x001B;
}

/// Mode register bits
pub mod mr {
    pub const RST: u8 = 1 << 7; // Software reset
}

/// Socket registers (offset from `socket_base(n)`)
pub mod sn {
    /// Mode
    pub const MR: u16 = 0x00;
    /// Command
    pub const CR: u16 = 0x01;
    /// Interrupt
    pub const IR: u16 = 0x02;
    /// Status
    pub const SR: u16 = 0x03;
    /// Source Port
    pub const PORT: u16 = 0x04;
    /// Destination IP Address
    pub const DIPR: u16 = 0x0C;
    /// Destination Port
    pub const DPORT: u16 = 0x10;
    /// IP Protocol (IPRAW mode)
    pub const PROTO: u16 = 0x14;
    /// IP TTL
    pub const TTL: u16 = 0x16;
    /// TX Free Size
    pub const TX_FSR: u16 = 0x20;
    /// TX Read Pointer
    pub const TX_RD: u16 = 0x22;
    /// TX Write Pointer
    pub const TX_WR: u16 = 0x24;
    /// RX Received Size
    pub const RX_RSR: u16 = 0x26;
    /// RX Read Pointer
    pub const RX_RD: u16 = 0x28;
}

/// Socket modes (Sn_MR protocol field)
pub mod mode {
    pub const CLOSE: u8 = 0x00;
    pub const TCP: u8 = 0x01;
    pub const UDP: u8 = 0x02;
    pub const IPRAW: u8 = 0x03;
    pub const MACRAW: u8 = 0x04;
}

/// Socket commands (Sn_CR)
pub mod cmd {
    pub const OPEN: u8 = 0x01;
    pub const LISTEN: u8 = 0x02;
    pub const CONNECT: u8 = 0x04;
    pub const DISCON: u8 = 0x08;
    pub const CLOSE: u8 = 0x10;
    pub const SEND: u8 = 0x20;
    pub const SEND_MAC: u8 = 0x21;
    pub const SEND_KEEP: u8 = 0x22;
    pub const RECV: u8 = 0x40;
}

/// Socket interrupt bits (Sn_IR)
pub mod ir {
    pub const CON: u8 = 1 << 0;
    pub const DISCON: u8 = 1 << 1;
    pub const RECV: u8 = 1 << 2;
    pub const TIMEOUT: u8 = 1 << 3;
    pub const SEND_OK: u8 = 1 << 4;
    /// Write-1-to-clear mask for every flag
    pub const ALL: u8 = 0xFF;
}

/// Socket status values (Sn_SR)
pub mod status {
    pub const CLOSED: u8 = 0x00;
    pub const INIT: u8 = 0x13;
    pub const LISTEN: u8 = 0x14;
    pub const ESTABLISHED: u8 = 0x17;
    pub const UDP: u8 = 0x22;
    pub const IPRAW: u8 = 0x32;
    pub const MACRAW: u8 = 0x42;
}

/// IP protocol numbers used with IPRAW sockets
pub mod proto {
    pub const ICMP: u8 = 1;
}

/// Buffer memory layout (default 2KB per socket split)
pub mod buf {
    /// TX memory base
    pub const TX_BASE: u16 = 0x4000;
    /// RX memory base
    pub const RX_BASE: u16 = 0x6000;
    /// Per-socket buffer size
    pub const SIZE: u16 = 2048;
    /// Offset mask within a socket buffer
    pub const MASK: u16 = SIZE - 1;
    /// RMSR/TMSR value assigning 2KB to each of the 4 sockets
    pub const SPLIT_2K: u8 = 0x55;
}

/// Number of hardware sockets
pub const SOCKETS: u8 = 4;

/// Base address of socket `n`'s register block
pub const fn socket_base(n: u8) -> u16 {
    0x0400 + (n as u16) * 0x0100
}
