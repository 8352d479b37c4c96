// Motor-family profiles
//
// The driver board supports a small set of motor families. Each profile
// carries the register values written to the board at startup and the
// constants odometry needs to turn ticks into millimeters.

use std::f64::consts::PI;

/// Supported motor families
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MotorModel {
    /// 520-class gearmotor with magnetic encoder (reference hardware)
    M520,
    /// 310-class gearmotor
    M310,
    /// TT gearbox motor
    Tt,
}

impl MotorModel {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "520" => Some(MotorModel::M520),
            "310" => Some(MotorModel::M310),
            "tt" => Some(MotorModel::Tt),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            MotorModel::M520 => "520",
            MotorModel::M310 => "310",
            MotorModel::Tt => "tt",
        }
    }
}

/// Configuration bundle for one motor family
#[derive(Debug, Clone, Copy)]
pub struct MotorProfile {
    pub model: MotorModel,
    /// Motor-type code understood by the board
    pub type_code: u8,
    /// Encoder pulse lines per motor-shaft revolution
    pub pulse_lines: u16,
    /// Gearbox reduction ratio
    pub reduction_ratio: u16,
    /// Wheel diameter in millimeters
    pub wheel_diameter_mm: f32,
    /// Minimum command magnitude the board's control loop acts on
    pub deadzone: u16,
}

impl MotorProfile {
    pub fn for_model(model: MotorModel) -> Self {
        match model {
            MotorModel::M520 => MotorProfile {
                model,
                type_code: 1,
                pulse_lines: 11,
                reduction_ratio: 30,
                wheel_diameter_mm: 67.0,
                deadzone: 1600,
            },
            MotorModel::M310 => MotorProfile {
                model,
                type_code: 2,
                pulse_lines: 13,
                reduction_ratio: 20,
                wheel_diameter_mm: 48.5,
                deadzone: 1600,
            },
            MotorModel::Tt => MotorProfile {
                model,
                type_code: 3,
                pulse_lines: 13,
                reduction_ratio: 48,
                wheel_diameter_mm: 65.0,
                deadzone: 1300,
            },
        }
    }

    /// Encoder ticks per wheel revolution
    pub fn ticks_per_revolution(&self) -> f64 {
        self.pulse_lines as f64 * self.reduction_ratio as f64
    }

    /// Wheel circumference in millimeters
    pub fn wheel_circumference_mm(&self) -> f64 {
        self.wheel_diameter_mm as f64 * PI
    }

    /// Calibrated distance per encoder tick
    pub fn mm_per_tick(&self) -> f64 {
        self.wheel_circumference_mm() / self.ticks_per_revolution()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_profile_constants() {
        let profile = MotorProfile::for_model(MotorModel::M520);
        assert_eq!(profile.type_code, 1);
        assert_eq!(profile.ticks_per_revolution(), 330.0);
        assert!((profile.wheel_circumference_mm() - 67.0 * PI).abs() < 1e-9);
    }

    #[test]
    fn test_model_lookup() {
        assert_eq!(MotorModel::from_name("520"), Some(MotorModel::M520));
        assert_eq!(MotorModel::from_name("TT"), Some(MotorModel::Tt));
        assert_eq!(MotorModel::from_name("999"), None);
    }
}
