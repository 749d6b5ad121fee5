//! Echo session - ping over one IPRAW hardware socket

use core::fmt;

use log::{debug, info, trace, warn};
use w5100::regs::{cmd, ir, mode, proto};
use w5100::{Socket, SocketRegisters};

use crate::clock::{elapsed_ms, Clock};
use crate::packet::{
    EchoCounters, EchoMessage, IcmpType, ECHO_PREFIX_SIZE, GLOBAL_COUNTERS, RAW_IP_PREFIX_SIZE,
};
use crate::types::{Ipv4Addr, PingConfig};

/// Ping error types
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PingError {
    /// The chip gave up transmitting (Sn_IR.TIMEOUT). Ends the whole call.
    SendFailed,
    /// No reply within the reply window on the last attempt
    TimedOut,
}

impl fmt::Display for PingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SendFailed => write!(f, "Echo request send failed"),
            Self::TimedOut => write!(f, "Request timed out"),
        }
    }
}

/// A received echo reply
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EchoReply {
    /// 1-based attempt that got the reply
    pub attempt: u32,
    /// Sender of the datagram
    pub source: Ipv4Addr,
    /// Payload size of the request
    pub bytes: usize,
    /// Now minus the timestamp carried in the reply
    pub rtt_ms: u32,
    pub ttl: u8,
    /// ICMP fields as received; not checked against the request
    pub icmp_type: u8,
    pub id: u16,
    pub sequence: u16,
}

impl fmt::Display for EchoReply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Reply[{}] from: {}: bytes={} time={}ms TTL={}",
            self.attempt, self.source, self.bytes, self.rtt_ms, self.ttl
        )
    }
}

/// ICMP echo client bound to one hardware socket.
///
/// `N` is the request payload size. Sessions draw id and sequence numbers
/// from [`GLOBAL_COUNTERS`] unless given their own with
/// [`with_counters`](Self::with_counters).
#[derive(Debug)]
pub struct EchoSession<'c, R, C, const N: usize> {
    chip: R,
    clock: C,
    socket: Socket,
    config: PingConfig,
    counters: &'c EchoCounters,
}

impl<R: SocketRegisters, C: Clock, const N: usize> EchoSession<'static, R, C, N> {
    pub fn new(chip: R, clock: C, socket: Socket) -> Self {
        Self {
            chip,
            clock,
            socket,
            config: PingConfig::default(),
            counters: &GLOBAL_COUNTERS,
        }
    }
}

impl<'c, R: SocketRegisters, C: Clock, const N: usize> EchoSession<'c, R, C, N> {
    pub fn with_config(mut self, config: PingConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_counters<'n>(self, counters: &'n EchoCounters) -> EchoSession<'n, R, C, N> {
        EchoSession {
            chip: self.chip,
            clock: self.clock,
            socket: self.socket,
            config: self.config,
            counters,
        }
    }

    pub const fn socket(&self) -> Socket {
        self.socket
    }

    pub const fn config(&self) -> &PingConfig {
        &self.config
    }

    /// Give back the chip and clock
    pub fn release(self) -> (R, C) {
        (self.chip, self.clock)
    }

    /// Ping `target` up to `max_retries` times; the first reply wins.
    ///
    /// The socket is reopened in IPRAW/ICMP mode on entry and closed on
    /// every exit. A send timeout aborts without further attempts; a reply
    /// timeout moves on to the next attempt.
    pub fn ping(&mut self, max_retries: u32, target: Ipv4Addr) -> Result<EchoReply, PingError> {
        let mut socket = IcmpSocket::open(&mut self.chip, self.socket);
        let mut outcome = Err(PingError::TimedOut);

        for attempt in 1..=max_retries {
            let mut request = EchoMessage::<N>::request(self.counters, self.clock.millis());
            request.fill_checksum();
            trace!(
                "{}: echo request to {} id={} seq={}",
                self.socket, target, request.header.id, request.header.sequence
            );

            if let Err(err) = socket.send(target, &request) {
                warn!("{}: send to {} timed out in hardware", self.socket, target);
                outcome = Err(err);
                break;
            }

            if !socket.wait_for_data(&mut self.clock, self.config.reply_timeout_ms) {
                debug!("{}: no reply from {} (attempt {})", self.socket, target, attempt);
                outcome = Err(PingError::TimedOut);
                continue;
            }

            let (source, reply, ttl) = socket.receive::<N>();
            if reply.header.icmp_type != IcmpType::EchoReply as u8 {
                let kind = reply.header.icmp_type;
                debug!("{}: datagram from {} is ICMP type {}", self.socket, source, kind);
            }
            let reply = EchoReply {
                attempt,
                source,
                bytes: N,
                rtt_ms: elapsed_ms(reply.timestamp, self.clock.millis()),
                ttl,
                icmp_type: reply.header.icmp_type,
                id: reply.header.id,
                sequence: reply.header.sequence,
            };
            info!("{}: {}", self.socket, reply);
            outcome = Ok(reply);
            break;
        }

        outcome
    }

    /// [`ping`](Self::ping), rendering the outcome as text into `out`.
    ///
    /// Returns true on a reply.
    pub fn ping_report<W: fmt::Write>(&mut self, max_retries: u32, target: Ipv4Addr, out: &mut W) -> bool {
        // A sink that runs out of room keeps what fit
        match self.ping(max_retries, target) {
            Ok(reply) => {
                let _ = write!(out, "{}", reply);
                true
            }
            Err(err) => {
                let _ = write!(out, "{}", err);
                false
            }
        }
    }
}

/// Socket held open in IPRAW/ICMP mode; closed on drop.
struct IcmpSocket<'r, R: SocketRegisters> {
    chip: &'r mut R,
    socket: Socket,
}

impl<'r, R: SocketRegisters> IcmpSocket<'r, R> {
    fn open(chip: &'r mut R, socket: Socket) -> Self {
        chip.exec_command(socket, cmd::CLOSE);
        chip.write_interrupts(socket, ir::ALL);
        chip.write_mode(socket, mode::IPRAW);
        chip.write_protocol(socket, proto::ICMP);
        chip.write_port(socket, 0);
        chip.exec_command(socket, cmd::OPEN);
        debug!("{}: opened IPRAW/ICMP", socket);

        Self { chip, socket }
    }

    /// Queue the request and wait for the chip to report the outcome.
    fn send<const N: usize>(&mut self, target: Ipv4Addr, request: &EchoMessage<N>) -> Result<(), PingError> {
        let s = self.socket;
        self.chip.write_dest_ip(s, target.octets());
        self.chip.write_dest_port(s, 0);
        self.chip.send_data(s, &request.prefix_bytes());
        if N > 0 {
            self.chip.send_data(s, request.payload());
        }
        self.chip.exec_command(s, cmd::SEND);

        loop {
            let flags = self.chip.read_interrupts(s);
            if flags & ir::SEND_OK != 0 {
                self.chip.write_interrupts(s, ir::SEND_OK);
                return Ok(());
            }
            if flags & ir::TIMEOUT != 0 {
                self.chip.write_interrupts(s, ir::SEND_OK | ir::TIMEOUT);
                return Err(PingError::SendFailed);
            }
            core::hint::spin_loop();
        }
    }

    /// Spin until the RX buffer holds data or `timeout_ms` has passed.
    fn wait_for_data<C: Clock>(&mut self, clock: &mut C, timeout_ms: u32) -> bool {
        let start = clock.millis();
        while self.chip.rx_received_size(self.socket) == 0 {
            if elapsed_ms(start, clock.millis()) > timeout_ms {
                return false;
            }
            core::hint::spin_loop();
        }
        true
    }

    /// Pull one datagram out of the RX buffer.
    ///
    /// At most `WIRE_LEN` bytes are copied. The read pointer moves past the
    /// datagram as declared in the IPRAW prefix, but never beyond the bytes
    /// the chip reports as received.
    fn receive<const N: usize>(&mut self) -> (Ipv4Addr, EchoMessage<N>, u8) {
        let s = self.socket;
        let received = self.chip.rx_received_size(s);
        let start = self.chip.rx_read_pointer(s);

        let mut prefix = [0u8; RAW_IP_PREFIX_SIZE];
        self.chip.read_rx(s, start, &mut prefix);
        let ptr = start.wrapping_add(RAW_IP_PREFIX_SIZE as u16);

        let source = Ipv4Addr::new(prefix[0], prefix[1], prefix[2], prefix[3]);
        let declared = u16::from_be_bytes([prefix[4], prefix[5]]);
        let len = (declared as usize).min(EchoMessage::<N>::WIRE_LEN);

        let mut reply = EchoMessage::<N>::empty();
        let mut head = [0u8; ECHO_PREFIX_SIZE];
        let head_len = len.min(ECHO_PREFIX_SIZE);
        self.chip.read_rx(s, ptr, &mut head[..head_len]);
        if len > ECHO_PREFIX_SIZE {
            let body = ptr.wrapping_add(ECHO_PREFIX_SIZE as u16);
            self.chip.read_rx(s, body, &mut reply.payload_mut()[..len - ECHO_PREFIX_SIZE]);
        }
        reply.decode_prefix(&head);
        if len < declared as usize {
            trace!("{}: reply of {} bytes cut to {}", s, declared, len);
        }

        let wanted = (RAW_IP_PREFIX_SIZE as u16).saturating_add(declared);
        let consumed = wanted.min(received);
        if consumed < wanted {
            warn!("{}: datagram declares {} bytes, only {} received", s, declared, received);
        }
        self.chip.write_rx_read_pointer(s, start.wrapping_add(consumed));
        self.chip.exec_command(s, cmd::RECV);
        let ttl = self.chip.ttl(s);

        (source, reply, ttl)
    }
}

impl<R: SocketRegisters> Drop for IcmpSocket<'_, R> {
    fn drop(&mut self) {
        self.chip.exec_command(self.socket, cmd::CLOSE);
        self.chip.write_interrupts(self.socket, ir::ALL);
    }
}
