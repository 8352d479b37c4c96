// Runtime configuration: bus parameters, drive tuning, motor profile

use std::time::Duration;

use crate::motor::profile::MotorModel;

// Serial port of the motor-driver board
pub const DEFAULT_PORT: &str = "/dev/ttyAMA0";
pub const DEFAULT_BAUDRATE: u32 = 115_200;

// Bus address of the motor-driver board
pub const DEFAULT_BUS_ADDRESS: u8 = 0x26;

// Drive tuning
pub const DEFAULT_BASE_SPEED: f64 = 500.0;
pub const DEFAULT_TURN_FACTOR: f64 = 0.3;

// The board needs settling time after each configuration register write
pub const REGISTER_SETTLE_DELAY: Duration = Duration::from_millis(100);

/// Consolidated runtime configuration.
///
/// One parameterized implementation replaces the source's divergent
/// per-script constants; everything tunable lives here.
#[derive(Debug, Clone)]
pub struct DriveConfig {
    pub port: String,
    pub baudrate: u32,
    pub bus_address: u8,
    pub base_speed: f64,
    pub turn_factor: f64,
    pub profile: MotorModel,
    /// Disable for simulation/testing: bus writes are skipped and reads
    /// return defaults.
    pub hardware_enabled: bool,
}

impl Default for DriveConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT.to_string(),
            baudrate: DEFAULT_BAUDRATE,
            bus_address: DEFAULT_BUS_ADDRESS,
            base_speed: DEFAULT_BASE_SPEED,
            turn_factor: DEFAULT_TURN_FACTOR,
            profile: MotorModel::M520,
            hardware_enabled: true,
        }
    }
}
