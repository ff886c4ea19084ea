//! Timer calibration: native speed, loop window, and decode timeout.
//!
//! Nothing here assumes a particular counter frequency. The native speed is
//! measured against a known 1 ms busy-wait, and the loop window against the
//! real cost of back-to-back port reads, so the derived constants are in
//! whatever unit the counter ticks in.

use embedded_hal::delay::DelayNs;
use gameport_hal::{delta, Gameport, TimeSource};

/// Decode timeout in milliseconds of calibrated clock.
pub const MAX_DECODE_MS: u32 = 3;

/// Loop window scale: 1.5x the measured per-read overhead, in permille
/// against the 50x50 read total below.
const LOOP_SCALE: u32 = 1500;

/// Overhead measurement: trials and reads per trial.
const OVERHEAD_TRIALS: u32 = 50;
const READS_PER_TRIAL: u32 = 50;

/// Calibrated timing constants for one port. Immutable after attach.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Calibration {
    /// Counter ticks per millisecond.
    pub speed: u32,
    /// Max ticks one decode-loop iteration may take for its sample to count.
    pub loop_window: u32,
    /// Max ticks one decode pass may take before giving up.
    pub timeout: u32,
}

/// Measure the counter's tick rate and the port-read overhead, and derive
/// the loop window and decode timeout.
///
/// The speed measurement subtracts the cost of one counter read (taken from
/// two back-to-back readings) from a timed 1 ms busy-wait. The overhead
/// measurement keeps the *minimum* of 50 trials, each with a growing settle
/// delay between them: interrupts and cache misses only ever add time, so
/// the minimum is the closest observation of the true cost.
pub fn calibrate<G: Gameport, T: TimeSource>(gameport: &mut G, counter: &mut T) -> Calibration {
    let mut t1 = 0;
    let mut t2 = 0;
    let mut t3 = 0;

    critical_section::with(|_| {
        t1 = counter.now();
        counter.delay_us(1000);
        t2 = counter.now();
        t3 = counter.now();
    });

    let speed = delta(t1, t2).saturating_sub(delta(t2, t3)).max(1);

    let mut overhead = u32::MAX;
    for trial in 0..OVERHEAD_TRIALS {
        critical_section::with(|_| {
            t1 = counter.now();
            for _ in 0..READS_PER_TRIAL {
                gameport.read();
                t2 = counter.now();
            }
            t3 = counter.now();
        });
        counter.delay_us(trial);
        let t = delta(t1, t2).saturating_sub(delta(t2, t3));
        if t < overhead {
            overhead = t;
        }
    }

    Calibration {
        speed,
        loop_window: ((u64::from(LOOP_SCALE) * u64::from(overhead)) / 50_000) as u32,
        timeout: MAX_DECODE_MS * speed,
    }
}
