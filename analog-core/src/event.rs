//! Event vocabulary, sink trait, and the per-tick decode.
//!
//! [`decode`] is a pure function: it maps one set of raw samples plus a
//! device's capability mask into axis and button reports on an
//! [`EventSink`]. It keeps no state between calls — edge detection,
//! deduplication, and delivery are the sink's business.
//!
//! # Report order
//!
//! Within one call: extra/standard buttons in mask-bit order, shoulder
//! buttons, the 16-button extension block, axis channels in mask-bit order,
//! then hat X/Y pairs. No ordering is guaranteed across ports or ticks
//! beyond "monotonic per port".

use crate::caps::{Caps, LogicalDevice};

/// Semantic axis identifiers reported to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum AxisId {
    X,
    Y,
    Rudder,
    Throttle,
    RotX,
    Hat0X,
    Hat0Y,
    Hat1X,
    Hat1Y,
    Hat2X,
    Hat2Y,
}

/// Semantic button identifiers reported to the sink.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ButtonId {
    // Joystick layout
    Trigger,
    Thumb,
    Thumb2,
    Top,
    Top2,
    Base,
    Base2,
    Base3,
    Base4,
    Base5,
    // Gamepad layout
    A,
    B,
    C,
    X,
    Y,
    Z,
    TL,
    TR,
    TL2,
    TR2,
}

/// Value range metadata for one axis, delivered once at attach time.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisRange {
    pub min: i32,
    pub max: i32,
    pub fuzz: i32,
    pub flat: i32,
}

/// Destination for decoded input events.
///
/// Implementations forward to whatever input subsystem hosts the driver.
/// [`configure_axis`](EventSink::configure_axis) defaults to a no-op for
/// sinks that don't track ranges.
pub trait EventSink {
    /// Report one axis sample.
    fn report_axis(&mut self, axis: AxisId, value: i32);

    /// Report one button state.
    fn report_button(&mut self, button: ButtonId, pressed: bool);

    /// Announce an axis and its expected value range at attach time.
    fn configure_axis(&mut self, _axis: AxisId, _range: AxisRange) {}
}

/// Axis identifiers for the joystick layout, in channel order.
pub(crate) const JOY_AXES: [AxisId; 4] = [AxisId::X, AxisId::Y, AxisId::Rudder, AxisId::Throttle];

/// Axis identifiers for the 16-button extension layout.
pub(crate) const EXT16_AXES: [AxisId; 4] = [AxisId::X, AxisId::Y, AxisId::RotX, AxisId::Throttle];

/// Hat axis identifiers, X/Y interleaved per hat.
pub(crate) const HAT_AXES: [AxisId; 6] = [
    AxisId::Hat0X,
    AxisId::Hat0Y,
    AxisId::Hat1X,
    AxisId::Hat1Y,
    AxisId::Hat2X,
    AxisId::Hat2Y,
];

/// Button identifiers for the joystick layout, in mask-bit order.
pub(crate) const JOY_BUTTONS: [ButtonId; 10] = [
    ButtonId::Trigger,
    ButtonId::Thumb,
    ButtonId::Top,
    ButtonId::Top2,
    ButtonId::Base,
    ButtonId::Base2,
    ButtonId::Base3,
    ButtonId::Base4,
    ButtonId::Base5,
    ButtonId::Thumb2,
];

/// Button identifiers for the gamepad layout, in mask-bit order.
pub(crate) const PAD_BUTTONS: [ButtonId; 10] = [
    ButtonId::A,
    ButtonId::B,
    ButtonId::C,
    ButtonId::X,
    ButtonId::TL2,
    ButtonId::TR2,
    ButtonId::Y,
    ButtonId::Z,
    ButtonId::TL,
    ButtonId::TR,
];

/// Button identifiers for the 16-button extension, by nibble code.
pub(crate) const EXT16_BUTTONS: [ButtonId; 16] = [
    ButtonId::Trigger,
    ButtonId::Thumb,
    ButtonId::Top,
    ButtonId::Top2,
    ButtonId::Base,
    ButtonId::Base2,
    ButtonId::Base3,
    ButtonId::Base4,
    ButtonId::Base5,
    ButtonId::Thumb2,
    ButtonId::A,
    ButtonId::B,
    ButtonId::C,
    ButtonId::X,
    ButtonId::Y,
    ButtonId::Z,
];

/// The three hat styles, in hat slot order.
const HAT_STYLES: [Caps; 3] = [Caps::HAT1_CHF, Caps::HAT2_CHF, Caps::HAT_FCS];

/// Hat direction to X/Y vector: center, up, right, down, left.
const HAT_TO_AXIS: [(i32, i32); 5] = [(0, 0), (0, -1), (1, 0), (0, 1), (-1, 0)];

/// Decode one set of raw samples for one logical device.
///
/// `axes` are the current 12-bit fixed-point samples, `initial` the
/// attach-time snapshot used as the zero reference for shoulder buttons and
/// the FCS rocker, `buttons` the aggregated raw button bits.
pub fn decode<S: EventSink>(
    device: &LogicalDevice,
    axes: &[i32; 4],
    initial: &[i32; 4],
    buttons: u16,
    sink: &mut S,
) {
    let caps = device.caps();
    let mut buttons = buttons;
    let mut hat = [0usize; 3];

    // CHF multiplexes two hats and two extra buttons onto the button nibble.
    // Codes 0x5/0x9 are the diagonal extra buttons; the two-adjacent-bit
    // codes are hat directions and their bits must not double as buttons.
    if caps.intersects(Caps::ANY_CHF) {
        match buttons & 0xf {
            0x5 => buttons = 0x10,
            0x9 => buttons = 0x20,
            0xf => {
                hat[0] = 1;
                buttons = 0;
            }
            0xb => {
                hat[0] = 2;
                buttons = 0;
            }
            0x7 => {
                hat[0] = 3;
                buttons = 0;
            }
            0x3 => {
                hat[0] = 4;
                buttons = 0;
            }
            0xe => {
                hat[1] = 1;
                buttons = 0;
            }
            0xa => {
                hat[1] = 2;
                buttons = 0;
            }
            0x6 => {
                hat[1] = 3;
                buttons = 0;
            }
            0xc => {
                hat[1] = 4;
                buttons = 0;
            }
            _ => {}
        }
    }

    let mut next = 0;
    for bit in 0..6 {
        if caps.raw() & (0x10 << bit) != 0 {
            sink.report_button(device.buttons()[next], (buttons >> bit) & 1 != 0);
            next += 1;
        }
    }

    // Shoulder buttons are resistor taps on the rudder/throttle channels:
    // well below half the initial sample is the primary button, well above
    // 1.5x the initial sample is the secondary one.
    if caps.contains(Caps::BTN_TL) {
        sink.report_button(device.buttons()[6], axes[2] < initial[2] >> 1);
    }
    if caps.contains(Caps::BTN_TR) {
        sink.report_button(device.buttons()[7], axes[3] < initial[3] >> 1);
    }
    if caps.contains(Caps::BTN_TL2) {
        sink.report_button(device.buttons()[8], axes[2] > initial[2] + (initial[2] >> 1));
    }
    if caps.contains(Caps::BTN_TR2) {
        sink.report_button(device.buttons()[9], axes[3] > initial[3] + (initial[3] >> 1));
    }

    if caps.contains(Caps::BTN16) {
        for bit in 0..16 {
            sink.report_button(EXT16_BUTTONS[bit], (buttons >> bit) & 1 != 0);
        }
    }

    // FCS rocker: the throttle channel divided into four bands below its
    // initial value, one per direction.
    if caps.contains(Caps::HAT_FCS) {
        for band in 0..4i32 {
            if axes[3] < (initial[3] * ((band << 1) + 1)) >> 3 {
                hat[2] = (band + 1) as usize;
                break;
            }
        }
    }

    let mut next = 0;
    for channel in 0..4 {
        if caps.raw() & (1 << channel) != 0 {
            sink.report_axis(device.axes()[next], axes[channel]);
            next += 1;
        }
    }

    let mut next = 0;
    for (slot, style) in HAT_STYLES.iter().enumerate() {
        if caps.intersects(*style) {
            let (x, y) = HAT_TO_AXIS[hat[slot]];
            sink.report_axis(HAT_AXES[next], x);
            sink.report_axis(HAT_AXES[next + 1], y);
            next += 2;
        }
    }
}

#[cfg(test)]
mod tests {
    extern crate std;

    use std::vec::Vec;

    use super::*;

    #[derive(Debug, PartialEq, Eq, Clone, Copy)]
    enum Report {
        Axis(AxisId, i32),
        Button(ButtonId, bool),
    }

    #[derive(Default)]
    struct MockSink {
        reports: Vec<Report>,
    }

    impl MockSink {
        fn axis(&self, id: AxisId) -> Option<i32> {
            self.reports.iter().find_map(|r| match r {
                Report::Axis(a, v) if *a == id => Some(*v),
                _ => None,
            })
        }

        fn button(&self, id: ButtonId) -> Option<bool> {
            self.reports.iter().find_map(|r| match r {
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
    }

    const NEUTRAL: [i32; 4] = [2000, 2000, 2000, 2000];

    fn run(caps: Caps, axes: [i32; 4], buttons: u16) -> MockSink {
        let device = LogicalDevice::new(caps);
        let mut sink = MockSink::default();
        decode(&device, &axes, &NEUTRAL, buttons, &mut sink);
        sink
    }

    #[test]
    fn test_plain_buttons_in_mask_order() {
        let sink = run(Caps::AXES_STD | Caps::BTNS_STD, NEUTRAL, 0b0101);
        assert_eq!(sink.button(ButtonId::Trigger), Some(true));
        assert_eq!(sink.button(ButtonId::Thumb), Some(false));
        assert_eq!(sink.button(ButtonId::Top), Some(true));
        assert_eq!(sink.button(ButtonId::Top2), Some(false));
    }

    #[test]
    fn test_axes_in_mask_order() {
        let sink = run(Caps::AXES_STD, [100, 200, 300, 400], 0);
        assert_eq!(
            sink.reports,
            [
                Report::Axis(AxisId::X, 100),
                Report::Axis(AxisId::Y, 200),
                Report::Axis(AxisId::Rudder, 300),
                Report::Axis(AxisId::Throttle, 400),
            ]
        );
    }

    #[test]
    fn test_two_axis_stick_on_high_channels() {
        // A rudder+throttle-only stick reports as X/Y.
        let sink = run(Caps::RUDDER | Caps::THROTTLE, [0, 0, 700, 900], 0);
        assert_eq!(sink.axis(AxisId::X), Some(700));
        assert_eq!(sink.axis(AxisId::Y), Some(900));
    }

    #[test]
    fn test_chf_diagonal_suppresses_hat_and_buttons() {
        // Spec'd encoding: nibble 0x5 is the first diagonal extra button.
        let caps = Caps::AXES_STD | Caps::BTNS_STD | Caps::BTNS_CHF | Caps::HAT1_CHF;
        let sink = run(caps, NEUTRAL, 0x5);

        // The four standard buttons are suppressed, the diagonal reports
        // pressed, and the hat stays centered.
        for id in [ButtonId::Trigger, ButtonId::Thumb, ButtonId::Top, ButtonId::Top2] {
            assert_eq!(sink.button(id), Some(false));
        }
        assert_eq!(sink.button(ButtonId::Base), Some(true));
        assert_eq!(sink.axis(AxisId::Hat0X), Some(0));
        assert_eq!(sink.axis(AxisId::Hat0Y), Some(0));
    }

    #[test]
    fn test_chf_hat_directions() {
        let caps = Caps::AXES_STD | Caps::BTNS_STD | Caps::BTNS_CHF | Caps::HAT1_CHF | Caps::HAT2_CHF;
        for (code, hat0, hat1) in [
            (0xfu16, (0, -1), (0, 0)),
            (0xb, (1, 0), (0, 0)),
            (0x7, (0, 1), (0, 0)),
            (0x3, (-1, 0), (0, 0)),
            (0xe, (0, 0), (0, -1)),
            (0xa, (0, 0), (1, 0)),
            (0x6, (0, 0), (0, 1)),
            (0xc, (0, 0), (-1, 0)),
        ] {
            let sink = run(caps, NEUTRAL, code);
            assert_eq!(sink.axis(AxisId::Hat0X), Some(hat0.0), "code {code:#x}");
            assert_eq!(sink.axis(AxisId::Hat0Y), Some(hat0.1), "code {code:#x}");
            assert_eq!(sink.axis(AxisId::Hat1X), Some(hat1.0), "code {code:#x}");
            assert_eq!(sink.axis(AxisId::Hat1Y), Some(hat1.1), "code {code:#x}");
            // Hat direction bits never leak into plain buttons.
            assert_eq!(sink.button(ButtonId::Trigger), Some(false), "code {code:#x}");
        }
    }

    #[test]
    fn test_hat_code_totality() {
        // Every 4-bit code maps to exactly one outcome: a diagonal button,
        // one hat direction, or plain buttons.
        let caps = Caps::AXES_STD | Caps::BTNS_STD | Caps::BTNS_CHF | Caps::HAT1_CHF | Caps::HAT2_CHF;
        for code in 0u16..16 {
            let sink = run(caps, NEUTRAL, code);

            let hat0 = (sink.axis(AxisId::Hat0X).unwrap(), sink.axis(AxisId::Hat0Y).unwrap());
            let hat1 = (sink.axis(AxisId::Hat1X).unwrap(), sink.axis(AxisId::Hat1Y).unwrap());
            let moved = usize::from(hat0 != (0, 0)) + usize::from(hat1 != (0, 0));
            let diagonal = sink.button(ButtonId::Base) == Some(true)
                || sink.button(ButtonId::Base2) == Some(true);
            let plain = [ButtonId::Trigger, ButtonId::Thumb, ButtonId::Top, ButtonId::Top2]
                .iter()
                .any(|&b| sink.button(b) == Some(true));

            match code {
                0x5 | 0x9 => {
                    assert!(diagonal && moved == 0 && !plain, "code {code:#x}");
                }
                0x3 | 0x7 | 0xb | 0xf | 0x6 | 0xa | 0xc | 0xe => {
                    assert!(moved == 1 && !diagonal && !plain, "code {code:#x}");
                }
                0 => assert!(moved == 0 && !diagonal && !plain),
                _ => {
                    // 0x1, 0x2, 0x4, 0x8, 0xd: plain button combinations.
                    assert!(moved == 0 && !diagonal && plain, "code {code:#x}");
                }
            }
        }
    }

    #[test]
    fn test_shoulder_buttons_against_initial_midpoint() {
        // Gamepad slots 6..9 are Y, Z, TL, TR: the primary shoulder pair
        // lands on the third button row, the secondary pair on TL/TR.
        let caps = Caps::X | Caps::Y | Caps::BTNS_TLR | Caps::BTNS_TLR2 | Caps::GAMEPAD;

        // Channel 2 far below half initial: primary left pressed.
        let sink = run(caps, [0, 0, 400, 2000], 0);
        assert_eq!(sink.button(ButtonId::Y), Some(true));
        assert_eq!(sink.button(ButtonId::TL), Some(false));
        assert_eq!(sink.button(ButtonId::Z), Some(false));

        // Channel 3 far above 1.5x initial: secondary right pressed.
        let sink = run(caps, [0, 0, 2000, 3500], 0);
        assert_eq!(sink.button(ButtonId::TR), Some(true));
        assert_eq!(sink.button(ButtonId::Z), Some(false));
    }

    #[test]
    fn test_extension_reports_all_sixteen_bits() {
        let caps = Caps::AXES_STD | Caps::BTN16;
        let sink = run(caps, NEUTRAL, 0x8088);
        assert_eq!(sink.button(ButtonId::Top2), Some(true)); // bit 3
        assert_eq!(sink.button(ButtonId::Base3), Some(true)); // bit 7
        assert_eq!(sink.button(ButtonId::Z), Some(true)); // bit 15
        assert_eq!(sink.button(ButtonId::Trigger), Some(false)); // bit 0
    }

    #[test]
    fn test_fcs_rocker_bands() {
        let caps = Caps::X | Caps::Y | Caps::HAT_FCS;
        // initial[3] = 2000; band thresholds at 250, 750, 1250, 1750.
        for (value, expected) in [
            (100, (0, -1)),  // up
            (600, (1, 0)),   // right
            (1100, (0, 1)),  // down
            (1600, (-1, 0)), // left
            (1900, (0, 0)),  // center
        ] {
            let sink = run(caps, [0, 0, 0, value], 0);
            assert_eq!(sink.axis(AxisId::Hat0X), Some(expected.0), "value {value}");
            assert_eq!(sink.axis(AxisId::Hat0Y), Some(expected.1), "value {value}");
        }
    }

    #[test]
    fn test_decode_is_pure() {
        let caps = Caps::AXES_STD | Caps::BTNS_STD | Caps::BTNS_CHF | Caps::HAT1_CHF;
        let a = run(caps, [10, 20, 30, 40], 0xb);
        let b = run(caps, [10, 20, 30, 40], 0xb);
        assert_eq!(a.reports, b.reports);
    }
}
