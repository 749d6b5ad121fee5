//! Register bus abstraction.
//!
//! The chip is reached through a byte-addressed register space. Transport
//! errors are not modelled here: a bus that can fail must retry or latch the
//! fault on its own side.

/// Byte-addressed access to the chip's register and buffer memory.
pub trait Bus {
    /// Read `buf.len()` consecutive bytes starting at `addr`.
    fn read(&mut self, addr: u16, buf: &mut [u8]);

    /// Write `data` to consecutive addresses starting at `addr`.
    fn write(&mut self, addr: u16, data: &[u8]);
}

impl<B: Bus + ?Sized> Bus for &mut B {
    fn read(&mut self, addr: u16, buf: &mut [u8]) {
        (**self).read(addr, buf)
    }

    fn write(&mut self, addr: u16, data: &[u8]) {
        (**self).write(addr, data)
    }
}

/// SPI opcode for a register write
pub const SPI_WRITE: u8 = 0xF0;
/// SPI opcode for a register read
pub const SPI_READ: u8 = 0x0F;

/// Full-duplex exchange of one 4-byte W5100 SPI frame.
///
/// The implementation clocks `frame` out (with chip select asserted around
/// it) and overwrites it in place with the bytes clocked in.
pub trait SpiTransfer {
    fn transfer(&mut self, frame: &mut [u8; 4]);
}

/// [`Bus`] over the W5100 SPI protocol: one byte per frame.
#[derive(Debug)]
pub struct SpiBus<T> {
    spi: T,
}

impl<T: SpiTransfer> SpiBus<T> {
    pub const fn new(spi: T) -> Self {
        Self { spi }
    }

    /// Release the underlying transport
    pub fn into_inner(self) -> T {
        self.spi
    }
}

/// Build the frame for writing `value` at `addr`.
pub const fn write_frame(addr: u16, value: u8) -> [u8; 4] {
    let a = addr.to_be_bytes();
    [SPI_WRITE, a[0], a[1], value]
}

/// Build the frame for reading `addr`; the data byte comes back in slot 3.
pub const fn read_frame(addr: u16) -> [u8; 4] {
    let a = addr.to_be_bytes();
    [SPI_READ, a[0], a[1], 0]
}

impl<T: SpiTransfer> Bus for SpiBus<T> {
    fn read(&mut self, addr: u16, buf: &mut [u8]) {
        for (i, byte) in buf.iter_mut().enumerate() {
            let mut frame = read_frame(addr.wrapping_add(i as u16));
            self.spi.transfer(&mut frame);
            *byte = frame[3];
        }
    }

    fn write(&mut self, addr: u16, data: &[u8]) {
        for (i, &byte) in data.iter().enumerate() {
            let mut frame = write_frame(addr.wrapping_add(i as u16), byte);
            self.spi.transfer(&mut frame);
        }
    }
}
