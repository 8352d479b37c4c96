use clap::Parser;
use tracing_subscriber::EnvFilter;

use rover_drive_runtime::config::{
    DriveConfig, DEFAULT_BASE_SPEED, DEFAULT_BAUDRATE, DEFAULT_BUS_ADDRESS, DEFAULT_PORT,
    DEFAULT_TURN_FACTOR,
};
use rover_drive_runtime::motor::MotorModel;

/// Motor-controller driver for the rover base.
///
/// Reads one JSON command per line on stdin, answers one JSON response
/// per line on stdout. Logs go to stderr.
#[derive(Parser, Debug)]
#[command(name = "rover-drive-runtime")]
struct Cli {
    /// Serial port of the motor-driver board
    #[arg(long, default_value = DEFAULT_PORT)]
    port: String,

    #[arg(long, default_value_t = DEFAULT_BAUDRATE)]
    baudrate: u32,

    /// Bus address of the motor-driver board
    #[arg(long, default_value_t = DEFAULT_BUS_ADDRESS)]
    bus_address: u8,

    /// Motor profile: 520, 310 or tt
    #[arg(long, default_value = "520")]
    profile: String,

    /// Velocity setpoint magnitude while a movement key is held
    #[arg(long, default_value_t = DEFAULT_BASE_SPEED)]
    base_speed: f64,

    /// Fraction of base speed applied while steering
    #[arg(long, default_value_t = DEFAULT_TURN_FACTOR)]
    turn_factor: f64,

    /// Skip all bus writes (simulation/testing without the board)
    #[arg(long)]
    no_hardware: bool,
}

#[tokio::main]
async fn main() {
    // Setup logging (set RUST_LOG=info or debug). stdout carries the
    // response protocol, so the subscriber writes to stderr.
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse().unwrap()))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let Some(profile) = MotorModel::from_name(&cli.profile) else {
        eprintln!("Unknown motor profile: {}", cli.profile);
        std::process::exit(2);
    };

    let config = DriveConfig {
        port: cli.port,
        baudrate: cli.baudrate,
        bus_address: cli.bus_address,
        base_speed: cli.base_speed,
        turn_factor: cli.turn_factor,
        profile,
        hardware_enabled: !cli.no_hardware,
    };

    if let Err(e) = rover_drive_runtime::runtime::run(config).await {
        eprintln!("Runtime error: {}", e);
        std::process::exit(1);
    }
}
