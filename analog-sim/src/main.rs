//! Host demonstration: attach the decoding engine to a simulated RC
//! joystick, wiggle it for a while, and log what comes out.

use analog_core::{AnalogPort, AxisId, AxisRange, ButtonId, EventSink, PortConfig, PRESETS};
use argh::FromArgs;
use gameport_hal::sim::{SimClock, SimCounter, SimPort};
use log::{debug, info};

#[derive(FromArgs)]
/// Analog gameport decoding demo against a simulated joystick.
struct Args {
    /// capability preset (auto, 2btn, 4btn, fcs, chf, fullchf, gamepad, y-joy, 16btn, ...)
    #[argh(option, short = 'p', default = "String::from(\"auto\")")]
    preset: String,

    /// number of polling ticks to run
    #[argh(option, short = 'n', default = "60")]
    ticks: u32,

    /// log level
    #[argh(option, short = 'l', default = "log::LevelFilter::Debug")]
    log_level: log::LevelFilter,
}

/// Sink that logs axis samples and button transitions.
#[derive(Default)]
struct LogSink {
    buttons: Vec<(ButtonId, bool)>,
}

impl EventSink for LogSink {
    fn report_axis(&mut self, axis: AxisId, value: i32) {
        debug!("axis {axis:?} = {value}");
    }

    fn report_button(&mut self, button: ButtonId, pressed: bool) {
        match self.buttons.iter_mut().find(|(id, _)| *id == button) {
            Some(entry) if entry.1 == pressed => return,
            Some(entry) => entry.1 = pressed,
            None => self.buttons.push((button, pressed)),
        }
        info!("button {button:?} {}", if pressed { "down" } else { "up" });
    }

    fn configure_axis(&mut self, axis: AxisId, range: AxisRange) {
        info!(
            "axis {axis:?} range {}..{} (fuzz {}, flat {})",
            range.min, range.max, range.fuzz, range.flat
        );
    }
}

fn main() {
    let Args {
        preset,
        ticks,
        log_level,
    } = argh::from_env();

    simple_logger::SimpleLogger::new()
        .with_level(log_level)
        .init()
        .expect("failed to initialize logger");

    let Some(config) = PortConfig::from_name(&preset) else {
        eprintln!("unknown preset {preset:?}");
        eprint!("known presets:");
        for (name, _) in PRESETS {
            eprint!(" {name}");
        }
        eprintln!();
        std::process::exit(1);
    };

    let clock = SimClock::new();
    let sim = SimPort::new(
        clock.clone(),
        [Some(480), Some(520), Some(700), Some(610)],
    );
    let counter = SimCounter::new(clock);

    let mut sink = LogSink::default();
    let mut port = match AnalogPort::attach(sim, counter, config, &mut sink) {
        Ok(port) => port,
        Err(e) => {
            eprintln!("attach failed: {e:?}");
            std::process::exit(1);
        }
    };

    for device in port.devices() {
        info!("attached {}", device.name());
    }

    for tick in 0..ticks {
        let sim = port.gameport_mut();
        // Sweep the stick around and tap the trigger now and then.
        sim.set_channel(0, Some(480 + (tick * 13) % 240));
        sim.set_channel(1, Some(520 + (tick * 7) % 180));
        sim.press(if tick % 10 < 3 { 0b0001 } else { 0 });

        port.poll(&mut sink);
    }

    let stats = port.stats();
    info!("{} reads, {} failed", stats.reads, stats.bads);
    port.detach();
}
