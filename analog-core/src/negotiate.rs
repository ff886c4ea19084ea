//! Capability negotiation: from a probed channel mask and a configuration
//! override to the final capability masks of up to two logical devices.
//!
//! Runs once per port at attach time. The override can add hat styles,
//! shoulder buttons, or the 16-button extension on top of what probing
//! found, but it can never claim an axis channel the hardware did not
//! produce — except for the derived cases encoded in the rules below. Each
//! rule is a plain bit formula; together they reproduce the established
//! override semantics exactly.

use crate::caps::{Caps, PortConfig};

/// The one raw pattern accepted without both primary channels: a two-axis
/// stick wired to the rudder/throttle pair of a Y-cable.
const LEGACY_HIGH_PAIR: u8 = 0x0c;

/// Negotiation failure: the probed pattern does not look like an analog
/// joystick. The port produces no devices and must be torn down.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NoDevice;

/// Negotiated capability masks for the port's logical devices.
///
/// An empty mask means the slot is unpopulated; at least one slot is
/// non-empty whenever negotiation succeeds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct NegotiatedMasks {
    pub primary: Caps,
    pub secondary: Caps,
}

/// Derive the device masks for a port.
///
/// `detected` is the probed channel mask (low 4 bits), `config` the
/// caller-resolved override.
pub fn negotiate(detected: u8, config: PortConfig) -> Result<NegotiatedMasks, NoDevice> {
    let detected = detected & 0xf;

    if detected == 0 {
        return Err(NoDevice);
    }
    // Anything without both primary channels is not a recognized joystick,
    // with the single legacy exception.
    if detected & 0x3 != 0x3 && detected != LEGACY_HIGH_PAIR {
        return Err(NoDevice);
    }

    let primary = derive_primary(detected, Caps(config.primary_bits()));
    let secondary = derive_secondary(detected, primary, Caps(config.secondary_bits()));

    if primary.is_empty() && secondary.is_empty() {
        return Err(NoDevice);
    }

    Ok(NegotiatedMasks { primary, secondary })
}

/// Apply the derivation rules for the primary device.
fn derive_primary(detected: u8, requested: Caps) -> Caps {
    let d = u32::from(detected);
    let mut mask = requested.raw();

    // Axis presence: axes only on detected channels; the FCS hat needs
    // channel 3, TL/TL2 need channel 2, TR/TR2 need channel 3.
    mask &= !(Caps::AXES_STD.raw() | Caps::HAT_FCS.raw() | Caps::BTNS_GAMEPAD.raw())
        | d
        | ((d << 8) & Caps::HAT_FCS.raw())
        | ((d << 10) & Caps::BTNS_TLR.raw())
        | ((d << 12) & Caps::BTNS_TLR2.raw());

    // Vendor exclusivity: the 16-button extension keeps only the axes.
    if mask & Caps::BTN16.raw() != 0 {
        mask &= Caps::BTN16.raw() | Caps::AXES_STD.raw();
    }

    // FCS channel ownership: an enabled FCS hat reads channel 3 itself, so
    // the throttle axis and the TR/TR2 taps go.
    mask &= !(Caps::THROTTLE.raw() | Caps::BTN_TR.raw() | Caps::BTN_TR2.raw())
        | ((!mask & Caps::HAT_FCS.raw()) >> 8)
        | ((!mask & Caps::HAT_FCS.raw()) << 2)
        | ((!mask & Caps::HAT_FCS.raw()) << 4);

    // Shoulder channel ownership: a channel with any shoulder tap on it
    // cannot double as an axis — rudder survives only without TL and TL2,
    // throttle only without TR and TR2.
    mask &= !(Caps::THROTTLE.raw() | Caps::RUDDER.raw())
        | (((!mask & Caps::BTNS_TLR.raw()) >> 10) & ((!mask & Caps::BTNS_TLR2.raw()) >> 12));

    Caps(mask)
}

/// Apply the derivation rules for the second device on a Y-cable.
fn derive_secondary(detected: u8, primary: Caps, requested: Caps) -> Caps {
    // Only populated when the primary claims none of the extension space.
    if primary.intersects(Caps::EXTENSIONS) {
        return Caps::NONE;
    }
    // Standard buttons and detected channels the primary left free, plus
    // the layout flag.
    let free = (Caps::BTNS_STD.raw() | u32::from(detected)) & !primary.raw();
    Caps(requested.raw() & (free | Caps::GAMEPAD.raw()))
}

/// Expected per-axis maxima handed to cooked backends for range
/// calibration.
///
/// A plain axis is expected to span twice its attach-time sample. Where
/// the 3-axis patterns apply, a rudder/throttle instead spans the midpoint
/// of channels 0/1; channels carrying a single shoulder tap or the FCS
/// rocker only ever reach half the span.
pub(crate) fn cooked_maxima(primary: Caps, axes: &[i32; 4]) -> [i32; 4] {
    let mut max = [0i32; 4];
    for (i, axis) in axes.iter().enumerate() {
        max[i] = axis << 1;
    }

    if primary.raw() & 0x7 == 0x7 {
        max[2] = (max[0] + max[1]) >> 1;
    }
    if primary.raw() & 0xb == 0xb {
        max[3] = (max[0] + max[1]) >> 1;
    }
    if primary.contains(Caps::BTN_TL) && !primary.contains(Caps::BTN_TL2) {
        max[2] >>= 1;
    }
    if primary.contains(Caps::BTN_TR) && !primary.contains(Caps::BTN_TR2) {
        max[3] >>= 1;
    }
    if primary.contains(Caps::HAT_FCS) {
        max[3] >>= 1;
    }
    max
}
