//! Button nibble reads, plain and through the 16-button extension protocol.

use embedded_hal::delay::DelayNs;
use gameport_hal::{Gameport, TimeSource};

/// Settle delay before re-triggering the extension's button chain, in µs.
const EXT_SETTLE_US: u32 = 310;

/// Settle delay after the re-trigger before the next read, in µs.
const EXT_RETRIGGER_US: u32 = 70;

/// Upper bound on extension reads per call; a stuck contact reporting a
/// non-zero nibble forever terminates here.
const EXT_MAX_READS: u32 = 16;

/// The pressed-button nibble: button lines are active low on the high four
/// bits of the port.
#[inline]
fn read_nibble<G: Gameport>(gameport: &mut G) -> u8 {
    (!gameport.read() >> 4) & 0xf
}

/// Read the four standard button lines.
#[inline]
pub fn read_buttons<G: Gameport>(gameport: &mut G) -> u16 {
    u16::from(read_nibble(gameport))
}

/// Read up to 16 buttons through the multi-step extension protocol.
///
/// The controller reports one pressed button per read as a nibble code;
/// re-triggering steps to the next one, and a zero nibble means the chain
/// is exhausted. This only ever sets bits in `buttons` — callers wanting a
/// fresh sample clear the aggregate first.
pub fn read_extended_buttons<G: Gameport, T: TimeSource>(
    gameport: &mut G,
    counter: &mut T,
    buttons: &mut u16,
) {
    let mut nibble = read_nibble(gameport);
    let mut reads = 0;

    while nibble != 0 && reads < EXT_MAX_READS {
        *buttons |= 1 << nibble;
        counter.delay_us(EXT_SETTLE_US);
        gameport.trigger();
        counter.delay_us(EXT_RETRIGGER_US);
        nibble = read_nibble(gameport);
        reads += 1;
    }
}
