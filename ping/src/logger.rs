//! In-memory log sink
//!
//! Keeps the last [`LOG_LINES`] formatted records for boards with no console
//! attached. Install once at startup:
//!
//! ```ignore
//! static LOGGER: RingLogger = RingLogger::new(log::LevelFilter::Debug);
//! w5100_ping::logger::init(&LOGGER)?;
//! ```

use core::fmt::Write;

use log::{Level, LevelFilter, Log, Metadata, Record, SetLoggerError};
use spin::Mutex;

use crate::text::LineBuffer;

/// Records retained before the oldest is overwritten
pub const LOG_LINES: usize = 32;

/// Bytes kept per record; the rest is cut
pub const LINE_WIDTH: usize = 96;

/// One retained record
#[derive(Debug, Clone)]
pub struct LogLine {
    pub level: Level,
    pub text: LineBuffer<LINE_WIDTH>,
}

struct Ring {
    lines: [Option<LogLine>; LOG_LINES],
    next: usize,
    total: usize,
}

const EMPTY: Option<LogLine> = None;

impl Ring {
    const fn new() -> Self {
        Self {
            lines: [EMPTY; LOG_LINES],
            next: 0,
            total: 0,
        }
    }

    fn push(&mut self, line: LogLine) {
        self.lines[self.next] = Some(line);
        self.next = (self.next + 1) % LOG_LINES;
        self.total = self.total.saturating_add(1);
    }

    fn retained(&self) -> usize {
        self.total.min(LOG_LINES)
    }
}

/// Bounded ring of log lines behind a spinlock
pub struct RingLogger {
    level: LevelFilter,
    ring: Mutex<Ring>,
}

impl RingLogger {
    pub const fn new(level: LevelFilter) -> Self {
        Self {
            level,
            ring: Mutex::new(Ring::new()),
        }
    }

    pub fn level(&self) -> LevelFilter {
        self.level
    }

    /// Lines currently held
    pub fn len(&self) -> usize {
        self.ring.lock().retained()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Records overwritten since the last clear
    pub fn dropped(&self) -> usize {
        let ring = self.ring.lock();
        ring.total - ring.retained()
    }

    /// Visit retained lines, oldest first.
    ///
    /// Each line is copied out before `f` runs, so `f` may log. Lines pushed
    /// during the walk are not visited; lines they overwrite are skipped.
    pub fn for_each(&self, mut f: impl FnMut(Level, &str)) {
        let end = self.ring.lock().total;
        let start = end - end.min(LOG_LINES);

        for seq in start..end {
            let line = {
                let ring = self.ring.lock();
                if seq >= ring.total || ring.total - seq > LOG_LINES {
                    continue;
                }
                ring.lines[seq % LOG_LINES].clone()
            };
            if let Some(line) = line {
                f(line.level, line.text.as_str());
            }
        }
    }

    pub fn clear(&self) {
        *self.ring.lock() = Ring::new();
    }
}

impl Log for RingLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= self.level
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }

        let mut text = LineBuffer::new();
        let _ = write!(text, "[{}] {}: {}", record.level(), record.target(), record.args());

        self.ring.lock().push(LogLine {
            level: record.level(),
            text,
        });
    }

    fn flush(&self) {}
}

/// Register `logger` as the global `log` backend.
pub fn init(logger: &'static RingLogger) -> Result<(), SetLoggerError> {
    log::set_logger(logger)?;
    log::set_max_level(logger.level);
    Ok(())
}
