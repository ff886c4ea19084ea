//! Monotonic counter capability and the stock implementations.
//!
//! Discharge timing needs two things from the platform: a cheap wrapping
//! tick counter and a busy-wait delay. Both live on one trait so a backend
//! cannot mix a counter with an unrelated delay source — the calibration
//! math only holds when the delay actually advances the counter it is
//! measured against.

use embedded_hal::delay::DelayNs;

/// Ticks the synthetic counter gains per simulated millisecond of delay.
pub const FAKE_TICKS_PER_MS: u32 = 830;

/// Monotonic counter with a matching busy-wait delay.
///
/// Counters wrap; compare readings only through [`delta`].
pub trait TimeSource: DelayNs {
    /// Current counter value.
    fn now(&mut self) -> u32;

    /// Diagnostic label for attach-time logging.
    fn name(&self) -> &'static str;

    /// Whether readings track real elapsed time.
    ///
    /// `false` for synthetic counters; decoding stays numerically
    /// self-consistent but loses precision.
    fn stable(&self) -> bool {
        true
    }
}

/// Wrapping tick delta between two counter readings.
#[inline]
#[must_use]
pub const fn delta(earlier: u32, later: u32) -> u32 {
    later.wrapping_sub(earlier)
}

/// Software-incrementing counter for machines without a usable hardware one.
///
/// Each reading advances the count by one, and delays advance it by
/// [`FAKE_TICKS_PER_MS`] per millisecond, so calibration still derives a
/// non-zero native speed and all later timing math stays in a consistent
/// numeric domain.
#[derive(Debug, Default)]
pub struct FakeCounter {
    ticks: u32,
}

impl FakeCounter {
    #[must_use]
    pub const fn new() -> Self {
        Self { ticks: 0 }
    }
}

impl DelayNs for FakeCounter {
    fn delay_ns(&mut self, ns: u32) {
        let gained = (u64::from(ns) * u64::from(FAKE_TICKS_PER_MS)) / 1_000_000;
        self.ticks = self.ticks.wrapping_add(gained as u32);
    }
}

impl TimeSource for FakeCounter {
    fn now(&mut self) -> u32 {
        self.ticks = self.ticks.wrapping_add(1);
        self.ticks
    }

    fn name(&self) -> &'static str {
        "unreliable"
    }

    fn stable(&self) -> bool {
        false
    }
}

/// Host clock counter with nanosecond resolution.
#[cfg(feature = "std")]
#[derive(Debug)]
pub struct StdCounter {
    origin: std::time::Instant,
}

#[cfg(feature = "std")]
impl StdCounter {
    #[must_use]
    pub fn new() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

#[cfg(feature = "std")]
impl Default for StdCounter {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "std")]
impl DelayNs for StdCounter {
    fn delay_ns(&mut self, ns: u32) {
        let end = std::time::Instant::now() + core::time::Duration::from_nanos(u64::from(ns));
        while std::time::Instant::now() < end {
            core::hint::spin_loop();
        }
    }
}

#[cfg(feature = "std")]
impl TimeSource for StdCounter {
    fn now(&mut self) -> u32 {
        self.origin.elapsed().as_nanos() as u32
    }

    fn name(&self) -> &'static str {
        "host-ns"
    }
}
