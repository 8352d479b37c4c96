// Battery telemetry
//
// The raw register value's unit depends on the board firmware revision;
// the scaling heuristic below has no documented justification and must
// not be strengthened without hardware verification. Keeping it in one
// named function makes a future calibration fix a single-point change.

use tracing::{debug, warn};

use crate::motor::MotorDriver;

/// Raw values below this are treated as deci-volts, everything else as
/// millivolts.
const DECIVOLT_THRESHOLD: u16 = 200;

/// Pack voltage window for the 3S LiPo percentage mapping
const PACK_FULL_VOLTS: f64 = 12.6;
const PACK_EMPTY_VOLTS: f64 = 9.0;

/// A battery voltage sample.
///
/// Unavailable is an expected state (bus failure, hardware disabled),
/// not an error: telemetry absence must never interrupt motion control.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum VoltageReading {
    Measured(f64),
    Unavailable,
}

impl VoltageReading {
    /// Null on the wire when unavailable
    pub fn as_option(self) -> Option<f64> {
        match self {
            VoltageReading::Measured(v) => Some(v),
            VoltageReading::Unavailable => None,
        }
    }
}

/// Read the battery register and derive volts. Degrades to Unavailable
/// on any bus failure.
pub fn read_battery_voltage(driver: &mut MotorDriver) -> VoltageReading {
    match driver.battery_raw() {
        Ok(raw) => VoltageReading::Measured(scale_battery_raw(raw)),
        Err(e) => {
            warn!("Battery read failed, reporting unavailable: {}", e);
            VoltageReading::Unavailable
        }
    }
}

/// Scale a raw battery register value to volts, rounded to 2 decimals.
pub fn scale_battery_raw(raw: u16) -> f64 {
    let volts = if raw < DECIVOLT_THRESHOLD {
        debug!("Battery raw {} scaled as deci-volts", raw);
        raw as f64 * 0.1
    } else {
        debug!("Battery raw {} scaled as millivolts", raw);
        raw as f64 / 1000.0
    };
    (volts * 100.0).round() / 100.0
}

/// Map pack voltage to a 0-100% charge estimate, rounded to 1 decimal.
pub fn battery_percentage(volts: f64) -> f64 {
    let pct = (volts - PACK_EMPTY_VOLTS) / (PACK_FULL_VOLTS - PACK_EMPTY_VOLTS) * 100.0;
    (pct.clamp(0.0, 100.0) * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decivolt_branch() {
        assert_eq!(scale_battery_raw(121), 12.1);
    }

    #[test]
    fn test_millivolt_branch() {
        assert_eq!(scale_battery_raw(12100), 12.1);
    }

    #[test]
    fn test_threshold_boundary() {
        // 199 still reads as deci-volts, 200 flips to millivolts
        assert_eq!(scale_battery_raw(199), 19.9);
        assert_eq!(scale_battery_raw(200), 0.2);
    }

    #[test]
    fn test_rounding() {
        assert_eq!(scale_battery_raw(12345), 12.35);
    }

    #[test]
    fn test_percentage_window() {
        assert_eq!(battery_percentage(12.6), 100.0);
        assert_eq!(battery_percentage(9.0), 0.0);
        assert_eq!(battery_percentage(10.8), 50.0);
        // Clamped outside the window
        assert_eq!(battery_percentage(13.2), 100.0);
        assert_eq!(battery_percentage(7.4), 0.0);
    }

    #[test]
    fn test_reading_as_option() {
        assert_eq!(VoltageReading::Measured(12.1).as_option(), Some(12.1));
        assert_eq!(VoltageReading::Unavailable.as_option(), None);
    }
}
