//! Gameport hardware access and timing capabilities.
//!
//! This crate defines the two seams between an analog joystick decoder and
//! the machine it runs on:
//!
//! - [`Gameport`]: a 4-bit analog game port — trigger an RC discharge, read
//!   the digital pin state, and optionally hand back pre-decoded ("cooked")
//!   samples when the hardware does its own timing.
//! - [`TimeSource`]: a monotonic counter with a busy-wait delay, used to time
//!   discharge edges. Three interchangeable implementations are provided:
//!   [`StdCounter`] (host clock, `std` feature), [`FakeCounter`] (synthetic
//!   software counter for hardware without one), and [`sim::SimCounter`]
//!   (deterministic simulated time, `sim` feature).
//!
//! # Port pinout
//!
//! A raw read returns one byte: the low nibble carries the four axis
//! comparator lines (a bit stays high while its RC circuit is still
//! discharging after a trigger), the high nibble carries the four button
//! lines, active low.
//!
//! # Features
//!
//! - **`std`**: Enable standard library support and [`StdCounter`]
//! - **`sim`**: Simulated gameport backend for host testing (implies `std`)
//! - **`defmt`**: Enable defmt formatting for embedded logging
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod time;

#[cfg(feature = "sim")]
pub mod sim;

pub use time::{delta, FakeCounter, TimeSource};

#[cfg(feature = "std")]
pub use time::StdCounter;

#[cfg(feature = "sim")]
pub use sim::{SimClock, SimCounter, SimPort};

/// Gameport operating modes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum PortMode {
    /// Port inactive.
    Disabled,
    /// Digital pin state exposed directly; the driver times discharges itself.
    Raw,
    /// The backend performs RC timing internally and exposes decoded samples.
    Cooked,
}

/// Error type for gameport operations.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum GameportError {
    /// The backend does not implement the requested operation or mode.
    NotSupported,
    /// A cooked read failed; retry next cycle.
    ReadFailed,
}

/// One pre-decoded sample from a cooked backend.
///
/// `axes[i]` is `None` for channels the backend has no pot connected to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CookedSample {
    pub axes: [Option<i32>; 4],
    pub buttons: u16,
}

/// Hardware access capability for one physical game port.
///
/// Implementations cover real port hardware, ADC-backed ports that decode
/// internally, and the simulated port used in tests. Only [`trigger`] and
/// [`read`] are mandatory; the cooked path and mode switching default to
/// unsupported, mirroring plain ISA-style ports.
///
/// [`trigger`]: Gameport::trigger
/// [`read`]: Gameport::read
pub trait Gameport {
    /// Start an RC discharge cycle on all axis channels.
    fn trigger(&mut self);

    /// Read the current digital state of the port.
    fn read(&mut self) -> u8;

    /// Read one pre-decoded sample, if the backend supports cooked mode.
    fn cooked_read(&mut self) -> Result<CookedSample, GameportError> {
        Err(GameportError::NotSupported)
    }

    /// Switch the port into the given mode.
    ///
    /// The default accepts only [`PortMode::Raw`].
    fn set_mode(&mut self, mode: PortMode) -> Result<(), GameportError> {
        match mode {
            PortMode::Raw => Ok(()),
            _ => Err(GameportError::NotSupported),
        }
    }

    /// Seed expected per-axis maxima for range calibration.
    ///
    /// Only meaningful for cooked backends; the default discards the hint.
    fn calibrate(&mut self, _axes: &[i32; 4], _max: &[i32; 4]) {}

    /// Backend speed hint in kHz, for comparing time deltas across
    /// heterogeneous hardware.
    fn speed(&self) -> u32 {
        1000
    }

    /// Backend noise estimate for cooked samples.
    fn fuzz(&self) -> i32 {
        0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct BarePort;

    impl Gameport for BarePort {
        fn trigger(&mut self) {}

        fn read(&mut self) -> u8 {
            0xf0
        }
    }

    #[test]
    fn test_defaults_reject_cooked() {
        let mut port = BarePort;
        assert_eq!(port.cooked_read(), Err(GameportError::NotSupported));
        assert_eq!(port.set_mode(PortMode::Cooked), Err(GameportError::NotSupported));
        assert_eq!(port.set_mode(PortMode::Raw), Ok(()));
    }

    #[test]
    fn test_default_hints() {
        let port = BarePort;
        assert_eq!(port.speed(), 1000);
        assert_eq!(port.fuzz(), 0);
    }
}
