//! WIZnet W5100 Driver
//!
//! Register-level, no_std driver for the W5100 hardwired TCP/IP chip.
//! The chip terminates Ethernet and IP in hardware and exposes four
//! sockets, each with a register block and a circular TX/RX buffer.
//!
//! ```text
//!   protocol code ──► SocketRegisters ──► W5100<B> ──► Bus ──► SPI / parallel
//! ```
//!
//! # Usage
//!
//! ```ignore
//! use w5100::{ChipConfig, SpiBus, Socket, W5100};
//!
//! let mut chip = W5100::new(SpiBus::new(spi));
//! chip.init(&ChipConfig { ip: [192, 168, 1, 177], ..Default::default() })?;
//! let s0 = Socket::new(0)?;
//! ```

#![no_std]
#![forbid(unsafe_code)]

pub mod regs;
mod bus;
mod chip;

pub use bus::{read_frame, write_frame, Bus, SpiBus, SpiTransfer, SPI_READ, SPI_WRITE};
pub use chip::{ChipConfig, ChipError, Socket, SocketError, SocketRegisters, W5100};
