//! Simulated W5100 socket and a stepping clock for session tests.

#![allow(dead_code)]

use std::collections::VecDeque;

use w5100::regs::{cmd, ir, mode};
use w5100::{Socket, SocketRegisters};
use w5100_ping::calculate_checksum;

const RING: usize = 2048;
const MASK: u16 = (RING as u16) - 1;

/// How the chip answers a SEND command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendOutcome {
    Ok,
    /// ARP/retransmission gave up: Sn_IR.TIMEOUT
    Timeout,
}

/// What shows up in the RX buffer after a datagram goes out
#[derive(Debug, Clone)]
pub enum Responder {
    Silent,
    /// Turn the request around as an echo reply from the destination
    Echo { ttl: u8 },
    /// Deliver these bytes verbatim (IPRAW prefix included)
    Raw { bytes: Vec<u8>, ttl: u8 },
}

/// Single-socket IPRAW model with a 2KB RX ring.
pub struct FakeChip {
    pub commands: Vec<(u8, u8)>,
    pub interrupt_clears: Vec<u8>,
    pub mode: u8,
    pub protocol: u8,
    pub port: Option<u16>,
    pub dest_ip: [u8; 4],
    pub dest_port: Option<u16>,
    pub open: bool,
    pub sent: Vec<Vec<u8>>,
    pub rx_reads: Vec<usize>,
    pub send_outcome: SendOutcome,
    pub responders: VecDeque<Responder>,
    tx: Vec<u8>,
    ir: u8,
    ttl: u8,
    rx: Vec<u8>,
    rx_rd: u16,
    rx_wr: u16,
    rx_size: u16,
}

impl FakeChip {
    pub fn new() -> Self {
        Self::with_rx_pointer(0)
    }

    /// Start both RX pointers at `ptr`
    pub fn with_rx_pointer(ptr: u16) -> Self {
        Self {
            commands: Vec::new(),
            interrupt_clears: Vec::new(),
            mode: mode::CLOSE,
            protocol: 0,
            port: None,
            dest_ip: [0; 4],
            dest_port: None,
            open: false,
            sent: Vec::new(),
            rx_reads: Vec::new(),
            send_outcome: SendOutcome::Ok,
            responders: VecDeque::new(),
            tx: Vec::new(),
            ir: 0,
            ttl: 0,
            rx: vec![0; RING],
            rx_rd: ptr,
            rx_wr: ptr,
            rx_size: 0,
        }
    }

    pub fn respond(mut self, responder: Responder) -> Self {
        self.responders.push_back(responder);
        self
    }

    pub fn failing_sends(mut self) -> Self {
        self.send_outcome = SendOutcome::Timeout;
        self
    }

    pub fn command_codes(&self) -> Vec<u8> {
        self.commands.iter().map(|&(_, c)| c).collect()
    }

    pub fn rx_read_pointer_value(&self) -> u16 {
        self.rx_rd
    }

    fn deliver(&mut self, bytes: &[u8], ttl: u8) {
        for &b in bytes {
            self.rx[(self.rx_wr & MASK) as usize] = b;
            self.rx_wr = self.rx_wr.wrapping_add(1);
        }
        self.rx_size += bytes.len() as u16;
        self.ttl = ttl;
        self.ir |= ir::RECV;
    }

    fn transmit(&mut self) {
        let datagram = std::mem::take(&mut self.tx);
        self.sent.push(datagram.clone());

        match self.send_outcome {
            SendOutcome::Timeout => {
                self.ir |= ir::TIMEOUT;
                return;
            }
            SendOutcome::Ok => self.ir |= ir::SEND_OK,
        }

        match self.responders.pop_front().unwrap_or(Responder::Silent) {
            Responder::Silent => {}
            Responder::Echo { ttl } => {
                let reply = echo_reply(self.dest_ip, &datagram);
                self.deliver(&reply, ttl);
            }
            Responder::Raw { bytes, ttl } => self.deliver(&bytes, ttl),
        }
    }
}

/// IPRAW delivery of an echo reply to `request`, sent by `from`
pub fn echo_reply(from: [u8; 4], request: &[u8]) -> Vec<u8> {
    let mut icmp = request.to_vec();
    icmp[0] = 0;
    icmp[2] = 0;
    icmp[3] = 0;
    let checksum = calculate_checksum(&icmp);
    icmp[2..4].copy_from_slice(&checksum.to_be_bytes());

    raw_ip(from, &icmp)
}

/// Prefix `icmp` with the 6-byte IPRAW header
pub fn raw_ip(from: [u8; 4], icmp: &[u8]) -> Vec<u8> {
    let mut out = from.to_vec();
    out.extend_from_slice(&(icmp.len() as u16).to_be_bytes());
    out.extend_from_slice(icmp);
    out
}

impl SocketRegisters for FakeChip {
    fn exec_command(&mut self, s: Socket, command: u8) {
        self.commands.push((s.index(), command));
        match command {
            cmd::OPEN => {
                assert_eq!(self.mode, mode::IPRAW, "opened before IPRAW mode was set");
                self.open = true;
            }
            cmd::CLOSE => {
                self.open = false;
                self.tx.clear();
            }
            cmd::SEND => {
                assert!(self.open, "SEND on a closed socket");
                self.transmit();
            }
            _ => {}
        }
    }

    fn read_interrupts(&mut self, _s: Socket) -> u8 {
        self.ir
    }

    fn write_interrupts(&mut self, _s: Socket, flags: u8) {
        self.interrupt_clears.push(flags);
        self.ir &= !flags;
    }

    fn write_mode(&mut self, _s: Socket, mode: u8) {
        self.mode = mode;
    }

    fn write_protocol(&mut self, _s: Socket, protocol: u8) {
        self.protocol = protocol;
    }

    fn write_port(&mut self, _s: Socket, port: u16) {
        self.port = Some(port);
    }

    fn write_dest_ip(&mut self, _s: Socket, addr: [u8; 4]) {
        self.dest_ip = addr;
    }

    fn write_dest_port(&mut self, _s: Socket, port: u16) {
        self.dest_port = Some(port);
    }

    fn rx_received_size(&mut self, _s: Socket) -> u16 {
        self.rx_size
    }

    fn rx_read_pointer(&mut self, _s: Socket) -> u16 {
        self.rx_rd
    }

    fn write_rx_read_pointer(&mut self, _s: Socket, ptr: u16) {
        let consumed = ptr.wrapping_sub(self.rx_rd);
        self.rx_size = self.rx_size.saturating_sub(consumed);
        self.rx_rd = ptr;
    }

    fn read_rx(&mut self, _s: Socket, ptr: u16, buf: &mut [u8]) {
        self.rx_reads.push(buf.len());
        for (i, b) in buf.iter_mut().enumerate() {
            *b = self.rx[(ptr.wrapping_add(i as u16) & MASK) as usize];
        }
    }

    fn send_data(&mut self, _s: Socket, data: &[u8]) {
        self.tx.extend_from_slice(data);
    }

    fn ttl(&mut self, _s: Socket) -> u8 {
        self.ttl
    }
}

/// Returns `now`, then advances by `step`
pub struct SteppingClock {
    pub now: u32,
    pub step: u32,
}

impl SteppingClock {
    pub fn new(start: u32, step: u32) -> Self {
        Self { now: start, step }
    }
}

impl w5100_ping::Clock for SteppingClock {
    fn millis(&mut self) -> u32 {
        let t = self.now;
        self.now = self.now.wrapping_add(self.step);
        t
    }
}

/// Send timestamp carried in an emitted request
pub fn timestamp_of(request: &[u8]) -> u32 {
    u32::from_be_bytes([request[8], request[9], request[10], request[11]])
}

/// (id, sequence) of an emitted request
pub fn id_seq_of(request: &[u8]) -> (u16, u16) {
    (
        u16::from_be_bytes([request[4], request[5]]),
        u16::from_be_bytes([request[6], request[7]]),
    )
}
