// Motor bring-up check: careful, step-by-step hardware test
//
// Usage: cargo run --example motor_check -- [port]
//
// Safety features:
// - Explicit confirmation before any motion
// - Very slow test speed, wheels expected off the ground
// - Motors stopped again before exit (and by the driver's drop backstop)

use std::io::{self, Write};
use std::thread::sleep;
use std::time::Duration;

use rover_drive_runtime::config::{DriveConfig, DEFAULT_PORT};
use rover_drive_runtime::motor::{MotorChannel, MotorDriver, WheelSpeeds};
use rover_drive_runtime::telemetry;

const TEST_SPEED: i16 = 150;
const SPIN_TIME: Duration = Duration::from_secs(2);

fn confirm(prompt: &str) -> bool {
    print!("{} [y/N]: ", prompt);
    io::stdout().flush().unwrap();
    let mut input = String::new();
    io::stdin().read_line(&mut input).unwrap();
    input.trim().eq_ignore_ascii_case("y")
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("info".parse().unwrap()),
        )
        .with_writer(std::io::stderr)
        .init();

    let port = std::env::args()
        .nth(1)
        .unwrap_or_else(|| DEFAULT_PORT.to_string());

    println!("Rover motor check on {}", port);
    println!("This tool WILL spin the wheels in its last step.");
    println!();

    let config = DriveConfig {
        port,
        ..DriveConfig::default()
    };

    // Step 1: open the bus and push the profile
    println!("Step 1: configuring motor profile...");
    let mut driver = MotorDriver::connect(&config)?;
    driver.configure()?;
    println!("  ok: {} profile written", driver.profile().model.name());

    // Step 2: read-only telemetry
    println!("Step 2: reading telemetry...");
    match telemetry::read_battery_voltage(&mut driver).as_option() {
        Some(v) => println!("  battery: {:.2} V", v),
        None => println!("  battery: unavailable"),
    }
    for channel in MotorChannel::ALL {
        let short = driver.encoder_short(channel)?;
        let total = driver.encoder_total(channel)?;
        println!(
            "  M{}: short-term {} ticks, accumulated {} ticks",
            channel.id(),
            short,
            total
        );
    }

    // Step 3: optional slow spin
    if !confirm("Spin all wheels slowly for 2 seconds? Wheels OFF THE GROUND?") {
        println!("Skipping motion test.");
        return Ok(());
    }

    println!("Step 3: spinning at {}...", TEST_SPEED);
    driver.apply_wheel_speeds(WheelSpeeds::new(TEST_SPEED, TEST_SPEED))?;
    sleep(SPIN_TIME);
    driver.stop()?;
    println!("  stopped");

    for channel in MotorChannel::ALL {
        let total = driver.encoder_total(channel)?;
        println!("  M{}: accumulated {} ticks after spin", channel.id(), total);
    }

    println!("Motor check complete.");
    Ok(())
}
