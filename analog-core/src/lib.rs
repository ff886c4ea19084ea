//! Analog gameport joystick and gamepad decoding engine.
//!
//! Turns the electrical timing behavior of RC-based analog sticks, sampled
//! through a single 4-bit game port, into calibrated axis positions, button
//! states, and hat directions. The hardware and the clock sit behind the
//! `gameport_hal` capabilities, so the same engine runs against real port
//! hardware, ADC-backed "cooked" ports, or the simulated port used in
//! tests.
//!
//! # Overview
//!
//! The crate is organized into several modules:
//!
//! - [`caps`]: Capability flag word, named presets, logical devices
//!   ([`Caps`], [`PortConfig`], [`LogicalDevice`])
//! - [`timing`]: Counter calibration ([`Calibration`], [`timing::calibrate`])
//! - [`decode`]: The timed RC discharge pass
//! - [`buttons`]: Plain and 16-button extension nibble reads
//! - [`negotiate`]: Capability negotiation ([`negotiate::negotiate`])
//! - [`event`]: Event vocabulary and the per-tick decode ([`EventSink`])
//! - [`port`]: Per-port attach/poll/detach driver ([`AnalogPort`])
//!
//! # Example
//!
//! ```ignore
//! use analog_core::{AnalogPort, PortConfig};
//! use gameport_hal::StdCounter;
//!
//! // `port` is your hardware backend, `sink` your input subsystem glue.
//! let mut joystick = AnalogPort::attach(port, StdCounter::new(), PortConfig::AUTO, &mut sink)?;
//!
//! // Called by a periodic scheduler every ~10 ms:
//! joystick.poll(&mut sink);
//! ```
//!
//! # Decode flow
//!
//! Per tick, data flows one way: calibrated timing constants feed the RC
//! decoder and button reader, their raw samples feed the event decoder
//! together with the attach-time capability mask, and the event decoder
//! reports to the external sink. Negotiation runs once at attach and its
//! masks never change afterwards.
//!
//! # Features
//!
//! - **`std`**: Enable standard library support (for host testing)
//! - **`defmt`**: Enable defmt formatting (for embedded logging)
//!
//! # No-std Support
//!
//! This crate is `#![no_std]` by default and uses no heap allocations,
//! making it suitable for embedded and kernel-adjacent environments.

#![cfg_attr(not(feature = "std"), no_std)]

#[cfg(feature = "std")]
extern crate std;

pub mod buttons;
pub mod caps;
pub mod decode;
pub mod event;
pub mod negotiate;
pub mod port;
pub mod timing;

// Re-export main types at crate root
pub use caps::{Caps, LogicalDevice, PortConfig, PRESETS};
pub use decode::{axis_value, DecodeError, AXIS_RESOLUTION};
pub use event::{decode as decode_events, AxisId, AxisRange, ButtonId, EventSink};
pub use negotiate::{negotiate, NegotiatedMasks, NoDevice};
pub use port::{AnalogPort, AttachError, PortStats, POLL_INTERVAL_MS};
pub use timing::{Calibration, MAX_DECODE_MS};
