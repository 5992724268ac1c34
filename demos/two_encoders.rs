//! Two encoders on one shared bus, reporting button presses.
//!
//! Runs against `SimulatedBus` so it works without hardware; a scripted
//! "user" turns the knobs and presses the buttons. Swap the bus for a
//! `HalBus` wrapping your platform's I2C controller to drive real modules.
//!
//! Run with `RUST_LOG=debug cargo run --example two_encoders` to see register
//! traffic.

use std::thread;
use std::time::Duration;
use visual_rotary_encoder::sim::SimulatedBus;
use visual_rotary_encoder::{EncoderConfig, I2cAddress, PollStatus, Result, VisualRotaryEncoder};

fn main() -> Result<()> {
    env_logger::init();

    let addr1 = I2cAddress::new(0x54)?;
    let addr2 = I2cAddress::new(0x55)?;
    let bus = SimulatedBus::new();
    bus.attach(addr1);
    bus.attach(addr2);

    let mut sensor1 = VisualRotaryEncoder::new(&bus, EncoderConfig::new(0x54).gain(51))?;
    let mut sensor2 = VisualRotaryEncoder::new(&bus, EncoderConfig::new(0x55).gain(51))?;

    for sensor in [&sensor1, &sensor2] {
        let identity = sensor.identify()?;
        if !identity.matches {
            eprintln!(
                "Unexpected device {} at {}",
                identity.product_id,
                sensor.address()
            );
            return Ok(());
        }
        let info = sensor.read_info()?;
        println!(
            "Found {} (VID 0x{:04X}, firmware {}) at {}",
            info.product_id,
            info.vendor_id,
            info.version,
            sensor.address()
        );
    }

    // (tick, action) script at 20 ms per tick.
    let script: &[(u32, fn(&SimulatedBus, I2cAddress, I2cAddress))] = &[
        (10, |bus, a, _| bus.press_key(a)),
        (15, |bus, a, _| bus.set_counter(a, 700)),
        (30, |bus, a, _| bus.press_key(a)),
        (40, |bus, _, b| bus.press_key(b)),
        // Sensor 2's release edge is never seen; it recovers by timeout.
    ];

    for tick in 0..200u32 {
        for (_, action) in script.iter().filter(|(at, _)| *at == tick) {
            action(&bus, addr1, addr2);
        }

        sensor1.poll()?;
        if sensor2.poll()? == PollStatus::StuckReleased {
            println!("Sensor 2 button forced up after timeout");
        }

        if sensor1.take_down_pending() {
            println!(
                "Sensor 1 button pressed! (value {:.3})",
                sensor1.encoder_as_fraction()?
            );
        }
        if sensor1.take_up_pending() {
            println!(
                "Sensor 1 button released (value {:.3})",
                sensor1.encoder_as_fraction()?
            );
        }
        if sensor2.take_down_pending() {
            println!("Sensor 2 button pressed!");
        }

        thread::sleep(Duration::from_millis(20));
    }

    Ok(())
}
