//! Capability flag word, named presets, and derived logical devices.
//!
//! A device's capabilities are one packed flag word. The low 20 bits
//! describe the primary device on a port:
//!
//! - bits 0–3: axis channels (X, Y, rudder, throttle)
//! - bits 4–7: standard buttons
//! - bit 8: CHF diagonal extra buttons; bits 9–10: CHF hats
//! - bit 11: FCS rocker hat
//! - bits 12–15: shoulder buttons (TL, TR, TL2, TR2)
//! - bit 16: gamepad button layout
//! - bit 17: 16-button extension protocol
//!
//! A configuration word packs a second device — a joystick multiplexed onto
//! the same port through a Y-cable — into bits 20–27 (its axes and
//! buttons) and bit 28 (its gamepad flag).
//!
//! # Example
//!
//! ```
//! use analog_core::Caps;
//!
//! let caps = Caps::AXES_STD | Caps::BTNS_STD;
//! assert_eq!(caps.axis_count(), 4);
//! assert_eq!(caps.button_count(), 4);
//! assert!(!caps.intersects(Caps::ANY_CHF));
//! ```

use core::fmt::Write as _;
use core::ops::{BitAnd, BitAndAssign, BitOr, BitOrAssign, Not};

use crate::event::{AxisId, ButtonId, EXT16_AXES, JOY_AXES, JOY_BUTTONS, PAD_BUTTONS};

/// Capability flags for one logical device.
#[derive(Clone, Copy, Default, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Caps(pub u32);

impl Caps {
    /// X axis channel.
    pub const X: Self = Self(1 << 0);
    /// Y axis channel.
    pub const Y: Self = Self(1 << 1);
    /// Rudder axis channel.
    pub const RUDDER: Self = Self(1 << 2);
    /// Throttle axis channel.
    pub const THROTTLE: Self = Self(1 << 3);
    /// All four axis channels.
    pub const AXES_STD: Self = Self(0x0f);

    /// The four standard buttons.
    pub const BTNS_STD: Self = Self(0xf0);

    /// CHF diagonal extra buttons.
    pub const BTNS_CHF: Self = Self(0x0100);
    /// First CHF hat.
    pub const HAT1_CHF: Self = Self(0x0200);
    /// Second CHF hat.
    pub const HAT2_CHF: Self = Self(0x0400);
    /// Any part of the CHF encoding.
    pub const ANY_CHF: Self = Self(0x0700);
    /// FCS rocker hat on the throttle channel.
    pub const HAT_FCS: Self = Self(0x0800);
    /// All hat styles.
    pub const HATS_ALL: Self = Self(0x0e00);

    /// Left shoulder button, read from the rudder channel.
    pub const BTN_TL: Self = Self(0x1000);
    /// Right shoulder button, read from the throttle channel.
    pub const BTN_TR: Self = Self(0x2000);
    /// Secondary left shoulder button.
    pub const BTN_TL2: Self = Self(0x4000);
    /// Secondary right shoulder button.
    pub const BTN_TR2: Self = Self(0x8000);
    /// Primary shoulder pair.
    pub const BTNS_TLR: Self = Self(0x3000);
    /// Secondary shoulder pair.
    pub const BTNS_TLR2: Self = Self(0xc000);
    /// All shoulder buttons.
    pub const BTNS_GAMEPAD: Self = Self(0xf000);
    /// All hat/extension bits.
    pub const EXTENSIONS: Self = Self(0xff00);

    /// Gamepad button layout instead of the joystick one.
    pub const GAMEPAD: Self = Self(0x10000);
    /// 16-button extension read through the multi-step nibble protocol.
    pub const BTN16: Self = Self(0x20000);

    /// No capabilities.
    pub const NONE: Self = Self(0);

    /// Check if all of the given flags are present.
    #[inline]
    #[must_use]
    pub const fn contains(self, caps: Caps) -> bool {
        (self.0 & caps.0) == caps.0
    }

    /// Check if any of the given flags are present.
    #[inline]
    #[must_use]
    pub const fn intersects(self, caps: Caps) -> bool {
        (self.0 & caps.0) != 0
    }

    /// Check if no capability is present.
    #[inline]
    #[must_use]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    /// Get the raw flag word.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Number of axis channels present.
    #[must_use]
    pub const fn axis_count(self) -> u32 {
        (self.0 & Self::AXES_STD.0).count_ones()
    }

    /// Number of buttons present: standard buttons, the CHF diagonal pair,
    /// and shoulder buttons. The 16-button extension is not counted here;
    /// its buttons live outside the flag word.
    #[must_use]
    pub const fn button_count(self) -> u32 {
        (self.0 & Self::BTNS_STD.0).count_ones()
            + if self.0 & Self::BTNS_CHF.0 != 0 { 2 } else { 0 }
            + (self.0 & Self::BTNS_GAMEPAD.0).count_ones()
    }

    /// Number of hats present.
    #[must_use]
    pub const fn hat_count(self) -> u32 {
        (self.0 & Self::HATS_ALL.0).count_ones()
    }
}

impl BitOr for Caps {
    type Output = Self;

    #[inline]
    fn bitor(self, rhs: Self) -> Self::Output {
        Self(self.0 | rhs.0)
    }
}

impl BitOrAssign for Caps {
    #[inline]
    fn bitor_assign(&mut self, rhs: Self) {
        self.0 |= rhs.0;
    }
}

impl BitAnd for Caps {
    type Output = Self;

    #[inline]
    fn bitand(self, rhs: Self) -> Self::Output {
        Self(self.0 & rhs.0)
    }
}

impl BitAndAssign for Caps {
    #[inline]
    fn bitand_assign(&mut self, rhs: Self) {
        self.0 &= rhs.0;
    }
}

impl Not for Caps {
    type Output = Self;

    #[inline]
    fn not(self) -> Self::Output {
        Self(!self.0)
    }
}

/// Named capability presets.
///
/// `auto` leaves everything to hardware detection; the rest force specific
/// extensions on top of it. `y-joy`/`y-pad` describe two devices sharing the
/// port through a Y-cable.
pub const PRESETS: &[(&str, u32)] = &[
    ("none", 0x0000_0000),
    ("auto", 0x0000_00ff),
    ("2btn", 0x0000_003f),
    ("4btn", 0x0000_00ff),
    ("y-joy", 0x0cc0_0033),
    ("y-pad", 0x1cc1_0033),
    ("fcs", 0x0000_08f7),
    ("chf", 0x0000_02ff),
    ("fullchf", 0x0000_07ff),
    ("gamepad", 0x0001_30f3),
    ("gamepad8", 0x0001_f0f3),
    ("16btn", 0x0002_00ff),
];

/// Per-port capability override, applied at attach time.
///
/// Built from a named preset or a raw numeric mask resolved by the caller's
/// own configuration layer; [`PortConfig::AUTO`] requests full detection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct PortConfig(u32);

impl PortConfig {
    /// Full auto-detection, no forced extensions.
    pub const AUTO: Self = Self(0x0000_00ff);

    /// Build a config from a raw override word.
    #[inline]
    #[must_use]
    pub const fn from_mask(mask: u32) -> Self {
        Self(mask)
    }

    /// Look up a named preset.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        PRESETS
            .iter()
            .find(|(preset, _)| *preset == name)
            .map(|(_, mask)| Self(*mask))
    }

    /// Get the raw override word.
    #[inline]
    #[must_use]
    pub const fn raw(self) -> u32 {
        self.0
    }

    /// Flags requested for the primary device.
    #[inline]
    pub(crate) const fn primary_bits(self) -> u32 {
        self.0 & 0xfffff
    }

    /// Flags requested for the second device on a Y-cable.
    #[inline]
    pub(crate) const fn secondary_bits(self) -> u32 {
        ((self.0 >> 20) & 0xff) | ((self.0 >> 12) & Caps::GAMEPAD.0)
    }

    /// Whether the 16-button extension is forced; it requires raw mode.
    #[inline]
    #[must_use]
    pub const fn forces_extended_buttons(self) -> bool {
        self.0 & Caps::BTN16.0 != 0
    }
}

impl Default for PortConfig {
    fn default() -> Self {
        Self::AUTO
    }
}

/// One logical device derived from a negotiated capability mask.
///
/// Holds the mask, the axis/button identifier tables the mask bit positions
/// map onto, and the derived display name. Immutable for the life of the
/// port.
#[derive(Debug, Clone)]
pub struct LogicalDevice {
    caps: Caps,
    axes: &'static [AxisId; 4],
    buttons: &'static [ButtonId],
    name: heapless::String<64>,
}

impl LogicalDevice {
    pub(crate) fn new(caps: Caps) -> Self {
        Self {
            caps,
            axes: if caps.contains(Caps::BTN16) {
                &EXT16_AXES
            } else {
                &JOY_AXES
            },
            buttons: if caps.contains(Caps::GAMEPAD) {
                &PAD_BUTTONS
            } else {
                &JOY_BUTTONS
            },
            name: device_name(caps),
        }
    }

    /// The negotiated capability mask.
    #[inline]
    #[must_use]
    pub const fn caps(&self) -> Caps {
        self.caps
    }

    /// Axis identifiers in mask-bit order.
    #[inline]
    #[must_use]
    pub const fn axes(&self) -> &'static [AxisId; 4] {
        self.axes
    }

    /// Button identifiers in mask-bit order.
    #[inline]
    #[must_use]
    pub const fn buttons(&self) -> &'static [ButtonId] {
        self.buttons
    }

    /// Human-readable device description.
    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Build the display name for a capability mask.
fn device_name(caps: Caps) -> heapless::String<64> {
    let mut name = heapless::String::new();
    let _ = write!(
        name,
        "Analog {}-axis {}-button",
        caps.axis_count(),
        caps.button_count()
    );
    if caps.intersects(Caps::HATS_ALL) {
        let _ = write!(name, " {}-hat", caps.hat_count());
    }
    if caps.contains(Caps::HAT_FCS) {
        let _ = name.push_str(" FCS");
    }
    if caps.intersects(Caps::ANY_CHF) {
        let _ = name.push_str(" CHF");
    }
    let _ = name.push_str(if caps.contains(Caps::GAMEPAD) {
        " gamepad"
    } else {
        " joystick"
    });
    name
}
