// High-level motor driver for the rover base
//
// Combines the register protocol and motor profile to provide a simple
// API for configuration, velocity/PWM commands and telemetry reads.

use std::thread::sleep;

use tracing::{debug, info, warn};

use super::kinematics::WheelSpeeds;
use super::profile::MotorProfile;
use super::registers::{
    self, encode_channel_values, encode_u16_be, encode_wheel_diameter, reg, BusError, RegisterBus,
};
use super::MotorChannel;
use crate::config::{DriveConfig, REGISTER_SETTLE_DELAY};
use crate::transport::SerialTransport;

/// Motor driver for the four-channel base.
///
/// With hardware disabled (`bus` absent) writes are skipped and reads
/// return defaults, so the control loop can run in simulation.
pub struct MotorDriver {
    bus: Option<RegisterBus>,
    profile: MotorProfile,
    stopped: bool,
}

impl MotorDriver {
    /// Open the bus per the runtime configuration
    pub fn connect(config: &DriveConfig) -> Result<Self, BusError> {
        let bus = if config.hardware_enabled {
            info!(
                "Opening motor bus on {} (board 0x{:02X})",
                config.port, config.bus_address
            );
            let transport = SerialTransport::open(&config.port, config.baudrate)?;
            Some(RegisterBus::new(Box::new(transport), config.bus_address))
        } else {
            info!("Hardware disabled, running without a motor bus");
            None
        };

        Ok(Self {
            bus,
            profile: MotorProfile::for_model(config.profile),
            stopped: false,
        })
    }

    /// Build a driver over an existing bus (tests, diagnostics)
    pub fn with_bus(bus: RegisterBus, profile: MotorProfile) -> Self {
        Self {
            bus: Some(bus),
            profile,
            stopped: false,
        }
    }

    pub fn profile(&self) -> &MotorProfile {
        &self.profile
    }

    /// Write the motor profile to the board.
    ///
    /// Register order is fixed and each write is followed by a settling
    /// delay; the board is not ready for the next register immediately.
    pub fn configure(&mut self) -> Result<(), BusError> {
        let profile = self.profile;
        info!(
            "Configuring {} motor profile (type {}, {} lines, {}:1, {} mm wheel)",
            profile.model.name(),
            profile.type_code,
            profile.pulse_lines,
            profile.reduction_ratio,
            profile.wheel_diameter_mm
        );

        self.settle_write(reg::MOTOR_TYPE, &[profile.type_code])?;
        self.settle_write(reg::PULSE_PHASE, &encode_u16_be(profile.reduction_ratio))?;
        self.settle_write(reg::PULSE_LINE, &encode_u16_be(profile.pulse_lines))?;
        self.settle_write(
            reg::WHEEL_DIAMETER,
            &encode_wheel_diameter(profile.wheel_diameter_mm),
        )?;
        self.settle_write(reg::DEADZONE, &encode_u16_be(profile.deadzone))?;

        info!("Motor profile configured");
        Ok(())
    }

    fn settle_write(&mut self, register: u8, data: &[u8]) -> Result<(), BusError> {
        self.write_register(register, data)?;
        sleep(REGISTER_SETTLE_DELAY);
        Ok(())
    }

    fn write_register(&mut self, register: u8, data: &[u8]) -> Result<(), BusError> {
        match self.bus.as_mut() {
            Some(bus) => bus.write_register(register, data),
            None => {
                debug!("Hardware disabled, skipping write to reg 0x{:02X}", register);
                Ok(())
            }
        }
    }

    /// Apply a side-pair setpoint: left speed to the front-left and
    /// rear-left channels, right speed to the other two. Zero on both
    /// sides also zeroes the PWM register, bypassing the board's
    /// deceleration ramp so the motors stop immediately.
    pub fn apply_wheel_speeds(&mut self, speeds: WheelSpeeds) -> Result<(), BusError> {
        debug!(
            "Setting wheel speeds: left={}, right={}",
            speeds.left, speeds.right
        );
        let values = MotorChannel::ALL.map(|channel| {
            if channel.is_left_side() {
                speeds.left
            } else {
                speeds.right
            }
        });
        self.control_speed(values)?;
        if speeds.is_zero() {
            self.control_pwm([0; 4])?;
        } else {
            self.stopped = false;
        }
        Ok(())
    }

    /// Send per-channel velocity setpoints to the board's PID loop
    pub fn control_speed(&mut self, values: [i16; 4]) -> Result<(), BusError> {
        self.write_register(reg::VELOCITY_CONTROL, &encode_channel_values(values))
    }

    /// Send raw per-channel PWM duty values
    pub fn control_pwm(&mut self, values: [i16; 4]) -> Result<(), BusError> {
        self.write_register(reg::PWM_CONTROL, &encode_channel_values(values))
    }

    /// Read one channel's short-term tick counter
    pub fn encoder_short(&mut self, channel: MotorChannel) -> Result<i16, BusError> {
        let Some(bus) = self.bus.as_mut() else {
            return Ok(0);
        };
        let bytes = bus.read_register(reg::encoder_short(channel), 2)?;
        Ok(registers::decode_i16_be([bytes[0], bytes[1]]))
    }

    /// Read one channel's accumulated tick counter (two 16-bit halves)
    pub fn encoder_total(&mut self, channel: MotorChannel) -> Result<i32, BusError> {
        let Some(bus) = self.bus.as_mut() else {
            return Ok(0);
        };
        let bytes = bus.read_register(reg::encoder_total(channel), 4)?;
        Ok(registers::decode_i32_halves([
            bytes[0], bytes[1], bytes[2], bytes[3],
        ]))
    }

    /// Read the raw battery register
    pub fn battery_raw(&mut self) -> Result<u16, BusError> {
        let Some(bus) = self.bus.as_mut() else {
            return Err(BusError::Disabled);
        };
        let bytes = bus.read_register(reg::BATTERY_VOLTAGE, 2)?;
        Ok(registers::decode_u16_be([bytes[0], bytes[1]]))
    }

    /// Issue the safety stop: zero velocity on all four channels plus a
    /// zero PWM write. Idempotent; repeated calls do not touch the bus
    /// again until a new nonzero command has been applied.
    pub fn stop(&mut self) -> Result<(), BusError> {
        if self.stopped {
            return Ok(());
        }
        info!("Stopping all motors");
        self.apply_wheel_speeds(WheelSpeeds::zero())?;
        self.stopped = true;
        Ok(())
    }
}

impl Drop for MotorDriver {
    fn drop(&mut self) {
        // Backstop for exit paths that never reached an explicit stop
        if !self.stopped {
            if let Err(e) = self.stop() {
                warn!("Failed to stop motors on drop: {}", e);
            }
        }
    }
}
