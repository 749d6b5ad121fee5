//! W5100 chip driver.
//!
//! Register-level access to the common block and the four hardware
//! sockets. Nothing here interprets the data moving through a socket.

use core::fmt;

use log::debug;

use crate::bus::Bus;
use crate::regs::{self, buf, common, mr, sn};

/// Socket error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SocketError {
    /// Socket index outside 0..SOCKETS
    InvalidSocket(u8),
}

impl fmt::Display for SocketError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidSocket(n) => write!(f, "invalid socket index {}", n),
        }
    }
}

/// Chip-level error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChipError {
    /// MR.RST never self-cleared after a software reset
    ResetTimeout,
}

impl fmt::Display for ChipError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ResetTimeout => write!(f, "chip reset did not complete"),
        }
    }
}

/// Hardware socket index (0..4)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Socket(u8);

impl Socket {
    pub const fn new(index: u8) -> Result<Self, SocketError> {
        if index < regs::SOCKETS {
            Ok(Self(index))
        } else {
            Err(SocketError::InvalidSocket(index))
        }
    }

    pub const fn index(&self) -> u8 {
        self.0
    }

    /// Absolute address of a socket register
    pub const fn reg(&self, offset: u16) -> u16 {
        regs::socket_base(self.0) + offset
    }

    const fn tx_base(&self) -> u16 {
        buf::TX_BASE + self.0 as u16 * buf::SIZE
    }

    const fn rx_base(&self) -> u16 {
        buf::RX_BASE + self.0 as u16 * buf::SIZE
    }
}

impl fmt::Display for Socket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// Network and retransmission settings applied by [`W5100::init`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChipConfig {
    pub mac: [u8; 6],
    pub ip: [u8; 4],
    pub gateway: [u8; 4],
    pub subnet: [u8; 4],
    /// Retransmission timeout in 100us units
    pub retry_time: u16,
    /// Retransmissions before Sn_IR.TIMEOUT is raised
    pub retry_count: u8,
}

impl Default for ChipConfig {
    fn default() -> Self {
        Self {
            mac: [0xDE, 0xAD, 0xBE, 0xEF, 0xFE, 0xED],
            ip: [0, 0, 0, 0],
            gateway: [0, 0, 0, 0],
            subnet: [255, 255, 255, 0],
            retry_time: 2000,
            retry_count: 8,
        }
    }
}

/// Per-socket register operations.
///
/// This is the surface protocol code drives a socket through. [`W5100`]
/// implements it over a [`Bus`]; tests implement it with a simulated chip.
pub trait SocketRegisters {
    /// Issue a command (see [`regs::cmd`]) and wait for the chip to accept it.
    fn exec_command(&mut self, s: Socket, command: u8);

    fn read_interrupts(&mut self, s: Socket) -> u8;

    /// Clear the given interrupt bits (write-1-to-clear).
    fn write_interrupts(&mut self, s: Socket, flags: u8);

    fn write_mode(&mut self, s: Socket, mode: u8);

    fn write_protocol(&mut self, s: Socket, protocol: u8);

    fn write_port(&mut self, s: Socket, port: u16);

    fn write_dest_ip(&mut self, s: Socket, addr: [u8; 4]);

    fn write_dest_port(&mut self, s: Socket, port: u16);

    /// Bytes waiting in the RX buffer.
    fn rx_received_size(&mut self, s: Socket) -> u16;

    fn rx_read_pointer(&mut self, s: Socket) -> u16;

    fn write_rx_read_pointer(&mut self, s: Socket, ptr: u16);

    /// Copy RX buffer bytes starting at read pointer `ptr` into `buf`.
    fn read_rx(&mut self, s: Socket, ptr: u16, buf: &mut [u8]);

    /// Append `data` to the TX buffer. Transmission starts on `cmd::SEND`.
    fn send_data(&mut self, s: Socket, data: &[u8]);

    /// TTL of the last received datagram.
    fn ttl(&mut self, s: Socket) -> u8;
}

impl<R: SocketRegisters + ?Sized> SocketRegisters for &mut R {
    fn exec_command(&mut self, s: Socket, command: u8) {
        (**self).exec_command(s, command)
    }

    fn read_interrupts(&mut self, s: Socket) -> u8 {
        (**self).read_interrupts(s)
    }

    fn write_interrupts(&mut self, s: Socket, flags: u8) {
        (**self).write_interrupts(s, flags)
    }

    fn write_mode(&mut self, s: Socket, mode: u8) {
        (**self).write_mode(s, mode)
    }

    fn write_protocol(&mut self, s: Socket, protocol: u8) {
        (**self).write_protocol(s, protocol)
    }

    fn write_port(&mut self, s: Socket, port: u16) {
        (**self).write_port(s, port)
    }

    fn write_dest_ip(&mut self, s: Socket, addr: [u8; 4]) {
        (**self).write_dest_ip(s, addr)
    }

    fn write_dest_port(&mut self, s: Socket, port: u16) {
        (**self).write_dest_port(s, port)
    }

    fn rx_received_size(&mut self, s: Socket) -> u16 {
        (**self).rx_received_size(s)
    }

    fn rx_read_pointer(&mut self, s: Socket) -> u16 {
        (**self).rx_read_pointer(s)
    }

    fn write_rx_read_pointer(&mut self, s: Socket, ptr: u16) {
        (**self).write_rx_read_pointer(s, ptr)
    }

    fn read_rx(&mut self, s: Socket, ptr: u16, buf: &mut [u8]) {
        (**self).read_rx(s, ptr, buf)
    }

    fn send_data(&mut self, s: Socket, data: &[u8]) {
        (**self).send_data(s, data)
    }

    fn ttl(&mut self, s: Socket) -> u8 {
        (**self).ttl(s)
    }
}

/// Polls of MR before a reset is considered stuck
const RESET_POLL_LIMIT: u32 = 10_000;

/// W5100 driver over a register bus
#[derive(Debug)]
pub struct W5100<B> {
    bus: B,
}

impl<B: Bus> W5100<B> {
    pub const fn new(bus: B) -> Self {
        Self { bus }
    }

    /// Release the bus
    pub fn release(self) -> B {
        self.bus
    }

    /// Software reset, 2KB buffers per socket, then network settings.
    pub fn init(&mut self, config: &ChipConfig) -> Result<(), ChipError> {
        self.write_u8(common::MR, mr::RST);
        let mut polls = 0;
        while self.read_u8(common::MR) & mr::RST != 0 {
            polls += 1;
            if polls >= RESET_POLL_LIMIT {
                return Err(ChipError::ResetTimeout);
            }
            core::hint::spin_loop();
        }

        self.write_u8(common::TMSR, buf::SPLIT_2K);
        self.write_u8(common::RMSR, buf::SPLIT_2K);

        self.bus.write(common::SHAR, &config.mac);
        self.bus.write(common::SIPR, &config.ip);
        self.bus.write(common::GAR, &config.gateway);
        self.bus.write(common::SUBR, &config.subnet);
        self.set_retransmission(config.retry_time, config.retry_count);

        debug!(
            "w5100: up, ip {}.{}.{}.{} rtr={} rcr={}",
            config.ip[0], config.ip[1], config.ip[2], config.ip[3],
            config.retry_time, config.retry_count
        );
        Ok(())
    }

    /// Retransmission timeout (100us units) and count.
    pub fn set_retransmission(&mut self, time: u16, count: u8) {
        self.write_u16(common::RTR, time);
        self.write_u8(common::RCR, count);
    }

    pub fn set_ip_address(&mut self, ip: [u8; 4]) {
        self.bus.write(common::SIPR, &ip);
    }

    pub fn ip_address(&mut self) -> [u8; 4] {
        let mut ip = [0u8; 4];
        self.bus.read(common::SIPR, &mut ip);
        ip
    }

    /// Socket status (see [`regs::status`])
    pub fn status(&mut self, s: Socket) -> u8 {
        self.read_u8(s.reg(sn::SR))
    }

    /// Free space in the TX buffer
    pub fn tx_free_size(&mut self, s: Socket) -> u16 {
        self.read_stable_u16(s.reg(sn::TX_FSR))
    }

    fn read_u8(&mut self, addr: u16) -> u8 {
        let mut b = [0u8; 1];
        self.bus.read(addr, &mut b);
        b[0]
    }

    fn write_u8(&mut self, addr: u16, value: u8) {
        self.bus.write(addr, &[value]);
    }

    fn read_u16(&mut self, addr: u16) -> u16 {
        let mut b = [0u8; 2];
        self.bus.read(addr, &mut b);
        u16::from_be_bytes(b)
    }

    fn write_u16(&mut self, addr: u16, value: u16) {
        self.bus.write(addr, &value.to_be_bytes());
    }

    /// 16-bit counters are updated by the chip between the two byte reads;
    /// re-read until two consecutive values agree.
    fn read_stable_u16(&mut self, addr: u16) -> u16 {
        loop {
            let first = self.read_u16(addr);
            if first == 0 {
                return 0;
            }
            if self.read_u16(addr) == first {
                return first;
            }
        }
    }
}

impl<B: Bus> SocketRegisters for W5100<B> {
    fn exec_command(&mut self, s: Socket, command: u8) {
        self.write_u8(s.reg(sn::CR), command);
        while self.read_u8(s.reg(sn::CR)) != 0 {
            core::hint::spin_loop();
        }
    }

    fn read_interrupts(&mut self, s: Socket) -> u8 {
        self.read_u8(s.reg(sn::IR))
    }

    fn write_interrupts(&mut self, s: Socket, flags: u8) {
        self.write_u8(s.reg(sn::IR), flags);
    }

    fn write_mode(&mut self, s: Socket, mode: u8) {
        self.write_u8(s.reg(sn::MR), mode);
    }

    fn write_protocol(&mut self, s: Socket, protocol: u8) {
        self.write_u8(s.reg(sn::PROTO), protocol);
    }

    fn write_port(&mut self, s: Socket, port: u16) {
        self.write_u16(s.reg(sn::PORT), port);
    }

    fn write_dest_ip(&mut self, s: Socket, addr: [u8; 4]) {
        self.bus.write(s.reg(sn::DIPR), &addr);
    }

    fn write_dest_port(&mut self, s: Socket, port: u16) {
        self.write_u16(s.reg(sn::DPORT), port);
    }

    fn rx_received_size(&mut self, s: Socket) -> u16 {
        self.read_stable_u16(s.reg(sn::RX_RSR))
    }

    fn rx_read_pointer(&mut self, s: Socket) -> u16 {
        self.read_u16(s.reg(sn::RX_RD))
    }

    fn write_rx_read_pointer(&mut self, s: Socket, ptr: u16) {
        self.write_u16(s.reg(sn::RX_RD), ptr);
    }

    fn read_rx(&mut self, s: Socket, ptr: u16, out: &mut [u8]) {
        debug_assert!(out.len() <= buf::SIZE as usize);
        let offset = ptr & buf::MASK;
        let src = s.rx_base() + offset;

        let room = (buf::SIZE - offset) as usize;
        if out.len() > room {
            let (head, tail) = out.split_at_mut(room);
            self.bus.read(src, head);
            self.bus.read(s.rx_base(), tail);
        } else {
            self.bus.read(src, out);
        }
    }

    fn send_data(&mut self, s: Socket, data: &[u8]) {
        debug_assert!(data.len() <= buf::SIZE as usize);
        let ptr = self.read_u16(s.reg(sn::TX_WR));
        let offset = ptr & buf::MASK;
        let dst = s.tx_base() + offset;

        let room = (buf::SIZE - offset) as usize;
        if data.len() > room {
            let (head, tail) = data.split_at(room);
            self.bus.write(dst, head);
            self.bus.write(s.tx_base(), tail);
        } else {
            self.bus.write(dst, data);
        }

        self.write_u16(s.reg(sn::TX_WR), ptr.wrapping_add(data.len() as u16));
    }

    fn ttl(&mut self, s: Socket) -> u8 {
        self.read_u8(s.reg(sn::TTL))
    }
}
