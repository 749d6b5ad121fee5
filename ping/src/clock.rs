//! Millisecond time source

/// Free-running millisecond counter.
///
/// Wraps at `u32::MAX`; callers compare instants with `wrapping_sub`.
pub trait Clock {
    fn millis(&mut self) -> u32;
}

impl<F: FnMut() -> u32> Clock for F {
    fn millis(&mut self) -> u32 {
        self()
    }
}

/// Milliseconds from `start` to `now`, correct across one wrap.
#[inline]
pub const fn elapsed_ms(start: u32, now: u32) -> u32 {
    now.wrapping_sub(start)
}
