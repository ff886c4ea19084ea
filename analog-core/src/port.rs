//! Per-port attach, polling, and teardown.
//!
//! [`AnalogPort`] owns one physical connector: the hardware capability, the
//! timing source, the calibrated constants, the raw sample buffers, and the
//! 0–2 logical devices negotiation produced. An external scheduler calls
//! [`poll`](AnalogPort::poll) at a fixed short interval; attach and detach
//! are serialized by the caller's open/close accounting, so no poll ever
//! races a teardown.

use embedded_hal::delay::DelayNs;
use gameport_hal::{Gameport, PortMode, TimeSource};
use heapless::Vec;

use crate::buttons::{read_buttons, read_extended_buttons};
use crate::caps::{Caps, LogicalDevice, PortConfig};
use crate::decode::rc_pass;
use crate::event::{decode, AxisId, AxisRange, EventSink, HAT_AXES};
use crate::negotiate::{cooked_maxima, negotiate};
use crate::timing::{calibrate, Calibration, MAX_DECODE_MS};

/// Recommended polling interval for the external scheduler, in ms.
pub const POLL_INTERVAL_MS: u32 = 10;

/// Poll ticks skipped between RC passes; button state changes fast, axis
/// positions don't, and the timing pass is the expensive part.
const AXIS_REFRESH_TICKS: u8 = 2;

/// Probe attempts before accepting whatever the port produced.
const INIT_RETRIES: u32 = 8;

/// Sample noise of the raw timing decode, in sample units.
const RAW_FUZZ: i32 = 16;

/// Error type for attach.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AttachError {
    /// The probed pattern is not a recognized analog joystick; the caller
    /// must not register the port.
    NoDevice,
    /// The backend accepts neither raw nor cooked mode.
    ModeUnsupported,
}

/// Lifetime read counters. Diagnostic only, never gates correctness.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortStats {
    /// Decode attempts (RC passes and cooked reads).
    pub reads: u32,
    /// Attempts that produced no new sample.
    pub bads: u32,
}

impl PortStats {
    /// Failed share of all reads, in percent.
    #[must_use]
    pub const fn failure_percent(&self) -> u32 {
        if self.reads > 0 {
            self.bads * 100 / self.reads
        } else {
            0
        }
    }
}

/// One physical gameport connector and its decoding state.
pub struct AnalogPort<G: Gameport, T: TimeSource> {
    gameport: G,
    counter: T,
    cal: Calibration,
    detected: u8,
    cooked: bool,
    extended: bool,
    axes: [i32; 4],
    buttons: u16,
    initial: [i32; 4],
    stats: PortStats,
    axis_countdown: u8,
    devices: Vec<LogicalDevice, 2>,
}

impl<G: Gameport, T: TimeSource> AnalogPort<G, T> {
    /// Probe the port, negotiate capabilities, and set up the logical
    /// devices.
    ///
    /// Runs once per connector. The sink receives each device's axis range
    /// announcements and one initial decode. `Err(NoDevice)` means nothing
    /// usable is attached and the port must be torn down by the caller.
    pub fn attach<S: EventSink>(
        mut gameport: G,
        mut counter: T,
        config: PortConfig,
        sink: &mut S,
    ) -> Result<Self, AttachError> {
        // The 16-button extension needs the multi-step nibble protocol,
        // which the cooked path cannot express.
        let cooked = if config.forces_extended_buttons() {
            false
        } else {
            gameport.set_mode(PortMode::Cooked).is_ok()
        };
        if !cooked {
            gameport
                .set_mode(PortMode::Raw)
                .map_err(|_| AttachError::ModeUnsupported)?;
        }

        let mut cal = Calibration::default();
        let mut detected = 0u8;
        let mut axes = [0i32; 4];
        let mut buttons = 0u16;
        let mut fuzz = gameport.fuzz();

        if cooked {
            for _ in 0..INIT_RETRIES {
                if let Ok(sample) = gameport.cooked_read() {
                    for (channel, axis) in sample.axes.iter().enumerate() {
                        if let Some(value) = axis {
                            axes[channel] = *value;
                            detected |= 1 << channel;
                        }
                    }
                    buttons = sample.buttons;
                    break;
                }
            }
        } else {
            cal = calibrate(&mut gameport, &mut counter);
            if !counter.stable() {
                log::warn!(
                    "no stable counter available; timing decode degraded to the {} clock",
                    counter.name()
                );
            }

            // Channels that charged on the trigger and settled within the
            // decode window are the ones with a pot behind them.
            gameport.trigger();
            let charged = gameport.read();
            counter.delay_ms(MAX_DECODE_MS);
            detected = (gameport.read() ^ charged) & charged & 0xf;

            for _ in 0..INIT_RETRIES {
                if rc_pass(&mut gameport, &mut counter, &cal, detected, &mut axes).is_ok() {
                    break;
                }
            }
            fuzz = RAW_FUZZ;
        }

        let masks = match negotiate(detected, config) {
            Ok(masks) => masks,
            Err(_) => {
                log::warn!(
                    "unknown device pattern {detected:#x}, probably not an analog joystick"
                );
                return Err(AttachError::NoDevice);
            }
        };

        if cooked {
            let max = cooked_maxima(masks.primary, &axes);
            gameport.calibrate(&axes, &max);
        }

        let mut port = Self {
            gameport,
            counter,
            cal,
            detected,
            cooked,
            extended: masks.primary.contains(Caps::BTN16),
            axes,
            buttons,
            initial: axes,
            stats: PortStats::default(),
            axis_countdown: 0,
            devices: Vec::new(),
        };

        for mask in [masks.primary, masks.secondary] {
            if !mask.is_empty() {
                let device = LogicalDevice::new(mask);
                port.announce(&device, fuzz, sink);
                let _ = port.devices.push(device);
            }
        }

        Ok(port)
    }

    /// Announce one logical device to the sink: axis ranges, the attach
    /// log line, and an initial decode.
    fn announce<S: EventSink>(&self, device: &LogicalDevice, fuzz: i32, sink: &mut S) {
        let mut next = 0;
        for channel in 0..4 {
            if device.caps().raw() & (1 << channel) != 0 {
                let id = device.axes()[next];
                let mut x = self.axes[channel];
                let mut flat = x >> 3;
                // Rudder/throttle pots rest anywhere; center their range
                // expectation on the primary stick instead.
                if channel >= 2 && matches!(id, AxisId::Rudder | AxisId::Throttle) {
                    x = (self.axes[0] + self.axes[1]) >> 1;
                    flat = 0;
                }
                sink.configure_axis(
                    id,
                    AxisRange {
                        min: x >> 3,
                        max: (x << 1) - (x >> 3),
                        fuzz,
                        flat,
                    },
                );
                next += 1;
            }
        }

        let mut next = 0;
        for style in [Caps::HAT1_CHF, Caps::HAT2_CHF, Caps::HAT_FCS] {
            if device.caps().intersects(style) {
                for _ in 0..2 {
                    sink.configure_axis(
                        HAT_AXES[next],
                        AxisRange {
                            min: -1,
                            max: 1,
                            fuzz: 0,
                            flat: 0,
                        },
                    );
                    next += 1;
                }
            }
        }

        if self.cooked {
            log::info!("{} [ADC port]", device.name());
        } else {
            let (rate, unit) = if self.cal.speed > 10_000 {
                ((self.cal.speed + 800) / 1000, "M")
            } else {
                (self.cal.speed, "k")
            };
            let res_ns = (u64::from(self.cal.loop_window) * 1_000_000
                / u64::from(self.cal.speed))
                * 1000
                / 1500;
            log::info!(
                "{} [{} timer, {} {}Hz clock, {} ns res]",
                device.name(),
                self.counter.name(),
                rate,
                unit,
                res_ns
            );
        }

        decode(device, &self.axes, &self.initial, self.buttons, sink);
    }

    /// Run one polling tick: refresh samples and decode every device.
    pub fn poll<S: EventSink>(&mut self, sink: &mut S) {
        if self.cooked {
            self.stats.reads += 1;
            match self.gameport.cooked_read() {
                Ok(sample) => {
                    for (channel, axis) in sample.axes.iter().enumerate() {
                        if let Some(value) = axis {
                            self.axes[channel] = *value;
                        }
                    }
                    self.buttons = sample.buttons;
                }
                Err(_) => self.stats.bads += 1,
            }
        } else {
            if !self.extended {
                self.buttons = read_buttons(&mut self.gameport);
            }
            if self.axis_countdown == 0 {
                self.stats.reads += 1;
                if rc_pass(
                    &mut self.gameport,
                    &mut self.counter,
                    &self.cal,
                    self.detected,
                    &mut self.axes,
                )
                .is_err()
                {
                    self.stats.bads += 1;
                }
                self.axis_countdown = AXIS_REFRESH_TICKS;
                if self.extended {
                    self.buttons = 0;
                    read_extended_buttons(&mut self.gameport, &mut self.counter, &mut self.buttons);
                }
            } else {
                self.axis_countdown -= 1;
            }
        }

        for device in &self.devices {
            decode(device, &self.axes, &self.initial, self.buttons, sink);
        }
    }

    /// Tear the port down, logging the lifetime read statistics.
    pub fn detach(self) {
        log::info!(
            "detached: {} out of {} reads ({}%) failed",
            self.stats.bads,
            self.stats.reads,
            self.stats.failure_percent()
        );
    }

    /// The logical devices on this port.
    #[inline]
    #[must_use]
    pub fn devices(&self) -> &[LogicalDevice] {
        &self.devices
    }

    /// Lifetime read counters.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> PortStats {
        self.stats
    }

    /// Whether the backend decodes samples itself.
    #[inline]
    #[must_use]
    pub const fn is_cooked(&self) -> bool {
        self.cooked
    }

    /// Channels that responded during probing.
    #[inline]
    #[must_use]
    pub const fn detected_channels(&self) -> u8 {
        self.detected
    }

    /// Calibrated timing constants (zero in cooked mode).
    #[inline]
    #[must_use]
    pub const fn calibration(&self) -> Calibration {
        self.cal
    }

    /// Current raw axis samples.
    #[inline]
    #[must_use]
    pub const fn axes(&self) -> &[i32; 4] {
        &self.axes
    }

    /// Get a mutable reference to the hardware backend.
    pub fn gameport_mut(&mut self) -> &mut G {
        &mut self.gameport
    }

    /// Decompose the port into its hardware and timing parts.
    pub fn into_parts(self) -> (G, T) {
        (self.gameport, self.counter)
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec as StdVec;

    use gameport_hal::sim::{SimClock, SimCounter, SimPort};
    use gameport_hal::{CookedSample, GameportError};

    use super::*;
    use crate::event::ButtonId;

    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    enum Report {
        Axis(AxisId, i32),
        Button(ButtonId, bool),
    }

    #[derive(Default)]
    struct MockSink {
        reports: StdVec<Report>,
        ranges: StdVec<(AxisId, AxisRange)>,
    }

    impl MockSink {
        fn button(&self, id: ButtonId) -> Option<bool> {
            self.reports.iter().rev().find_map(|r| match r {
                Report::Button(b, v) if *b == id => Some(*v),
                _ => None,
            })
        }
    }

    impl EventSink for MockSink {
        fn report_axis(&mut self, axis: AxisId, value: i32) {
            self.reports.push(Report::Axis(axis, value));
        }

        fn report_button(&mut self, button: ButtonId, pressed: bool) {
            self.reports.push(Report::Button(button, pressed));
        }

        fn configure_axis(&mut self, axis: AxisId, range: AxisRange) {
            self.ranges.push((axis, range));
        }
    }

    struct CookedPort {
        sample: CookedSample,
        fail: bool,
        seeded_max: Option<[i32; 4]>,
    }

    impl CookedPort {
        fn new(axes: [Option<i32>; 4], buttons: u16) -> Self {
            Self {
                sample: CookedSample { axes, buttons },
                fail: false,
                seeded_max: None,
            }
        }
    }

    impl Gameport for CookedPort {
        fn trigger(&mut self) {}

        fn read(&mut self) -> u8 {
            0xf0
        }

        fn cooked_read(&mut self) -> Result<CookedSample, GameportError> {
            if self.fail {
                Err(GameportError::ReadFailed)
            } else {
                Ok(self.sample)
            }
        }

        fn set_mode(&mut self, _mode: PortMode) -> Result<(), GameportError> {
            Ok(())
        }

        fn calibrate(&mut self, _axes: &[i32; 4], max: &[i32; 4]) {
            self.seeded_max = Some(*max);
        }

        fn fuzz(&self) -> i32 {
            2
        }
    }

    fn sim_parts(channels: [Option<u32>; 4]) -> (SimPort, SimCounter) {
        let clock = SimClock::new();
        (SimPort::new(clock.clone(), channels), SimCounter::new(clock))
    }

    #[test]
    fn test_attach_four_button_joystick() {
        let (port, counter) = sim_parts([Some(300), Some(500), Some(700), Some(900)]);
        let mut sink = MockSink::default();

        let port = AnalogPort::attach(
            port,
            counter,
            PortConfig::from_name("4btn").unwrap(),
            &mut sink,
        )
        .unwrap();

        assert!(!port.is_cooked());
        assert_eq!(port.detected_channels(), 0xf);
        assert_eq!(port.devices().len(), 1);

        let device = &port.devices()[0];
        assert_eq!(device.caps(), Caps::AXES_STD | Caps::BTNS_STD);
        assert!(!device.caps().intersects(Caps::HATS_ALL));
        assert!(device.name().ends_with("joystick"));

        // Four axis ranges announced, and the initial decode ran.
        assert_eq!(sink.ranges.len(), 4);
        assert!(!sink.reports.is_empty());
    }

    #[test]
    fn test_attach_rejects_quiet_port() {
        let (port, counter) = sim_parts([None; 4]);
        let mut sink = MockSink::default();

        let result = AnalogPort::attach(port, counter, PortConfig::AUTO, &mut sink);
        assert!(matches!(result, Err(AttachError::NoDevice)));
    }

    #[test]
    fn test_attach_skips_undetected_channels() {
        let (port, counter) = sim_parts([Some(300), Some(500), None, None]);
        let mut sink = MockSink::default();

        let port = AnalogPort::attach(port, counter, PortConfig::AUTO, &mut sink).unwrap();
        assert_eq!(port.detected_channels(), 0x3);
        assert_eq!(port.devices()[0].caps().axis_count(), 2);
    }

    #[test]
    fn test_attach_y_cable_two_devices() {
        let (port, counter) = sim_parts([Some(300), Some(500), Some(700), Some(900)]);
        let mut sink = MockSink::default();

        let port = AnalogPort::attach(
            port,
            counter,
            PortConfig::from_name("y-joy").unwrap(),
            &mut sink,
        )
        .unwrap();

        assert_eq!(port.devices().len(), 2);
        assert_eq!(port.devices()[0].caps().axis_count(), 2);
        assert_eq!(port.devices()[1].caps().axis_count(), 2);
    }

    #[test]
    fn test_attach_cooked_seeds_maxima() {
        let port = CookedPort::new([Some(100), Some(200), Some(300), Some(400)], 0);
        let counter = SimCounter::new(SimClock::new());
        let mut sink = MockSink::default();

        let port = AnalogPort::attach(port, counter, PortConfig::AUTO, &mut sink).unwrap();

        assert!(port.is_cooked());
        assert_eq!(port.detected_channels(), 0xf);
        let (gameport, _) = port.into_parts();
        assert_eq!(gameport.seeded_max, Some([200, 400, 300, 300]));
    }

    #[test]
    fn test_poll_runs_rc_pass_every_third_tick() {
        let (port, counter) = sim_parts([Some(300), Some(500), Some(700), Some(900)]);
        let mut sink = MockSink::default();
        let mut port = AnalogPort::attach(port, counter, PortConfig::AUTO, &mut sink).unwrap();

        for _ in 0..6 {
            port.poll(&mut sink);
        }
        // Ticks 1 and 4 carry the timing pass; buttons refresh every tick.
        assert_eq!(port.stats(), PortStats { reads: 2, bads: 0 });
    }

    #[test]
    fn test_poll_timeout_keeps_stale_samples() {
        let (port, counter) = sim_parts([Some(300), Some(500), Some(700), Some(900)]);
        let mut sink = MockSink::default();
        let mut port = AnalogPort::attach(port, counter, PortConfig::AUTO, &mut sink).unwrap();
        let before = *port.axes();

        // Channel 3 goes stuck-high after attach: the next pass times out,
        // the failure counter bumps once, and no sample moves.
        port.gameport_mut().set_channel(3, Some(u32::MAX));
        port.poll(&mut sink);

        assert_eq!(port.stats(), PortStats { reads: 1, bads: 1 });
        assert_eq!(port.axes(), &before);
    }

    #[test]
    fn test_poll_cooked_failure_is_nonfatal() {
        let port = CookedPort::new([Some(100), Some(200), Some(300), Some(400)], 0);
        let counter = SimCounter::new(SimClock::new());
        let mut sink = MockSink::default();
        let mut port = AnalogPort::attach(port, counter, PortConfig::AUTO, &mut sink).unwrap();

        port.gameport_mut().fail = true;
        port.poll(&mut sink);
        port.gameport_mut().fail = false;
        port.poll(&mut sink);

        assert_eq!(port.stats(), PortStats { reads: 2, bads: 1 });
    }

    #[test]
    fn test_poll_extended_buttons_aggregate() {
        let (port, counter) = sim_parts([Some(300), Some(500), Some(700), Some(900)]);
        let mut sink = MockSink::default();
        let mut port = AnalogPort::attach(
            port,
            counter,
            PortConfig::from_name("16btn").unwrap(),
            &mut sink,
        )
        .unwrap();

        assert!(!port.is_cooked());

        // The RC pass trigger steps the chain once before the button reads.
        port.gameport_mut().feed_code(&[0, 3, 7, 0]);
        port.poll(&mut sink);

        assert_eq!(sink.button(ButtonId::Top2), Some(true)); // bit 3
        assert_eq!(sink.button(ButtonId::Base3), Some(true)); // bit 7
        assert_eq!(sink.button(ButtonId::Trigger), Some(false));
    }

    #[test]
    fn test_detach_consumes_port() {
        let (port, counter) = sim_parts([Some(300), Some(500), None, None]);
        let mut sink = MockSink::default();
        let port = AnalogPort::attach(port, counter, PortConfig::AUTO, &mut sink).unwrap();
        port.detach();
    }
}
