// Differential-drive kinematics for the four-wheel rover
// Converts the set of active directional keys to a left/right wheel speed pair.

/// Active directional inputs for one control tick.
///
/// Recomputed fresh on every input line; there is no memory of previous
/// key state. Opposing keys are additive and cancel.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct KeyState {
    pub forward: bool,
    pub backward: bool,
    pub left: bool,
    pub right: bool,
}

/// Wheel speed setpoints for the two sides of the chassis
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WheelSpeeds {
    pub left: i16,
    pub right: i16,
}

impl WheelSpeeds {
    pub fn new(left: i16, right: i16) -> Self {
        Self { left, right }
    }

    pub fn zero() -> Self {
        Self::default()
    }

    /// Both sides at rest; triggers the immediate-stop PWM path
    pub fn is_zero(&self) -> bool {
        self.left == 0 && self.right == 0
    }
}

/// Key set to wheel speeds mapping.
///
/// Base speed and turn factor are configuration; base_speed * (1 +
/// turn_factor) must stay inside the signed 16-bit range.
#[derive(Debug, Clone, Copy)]
pub struct DriveKinematics {
    base_speed: f64,
    turn_factor: f64,
}

impl DriveKinematics {
    pub fn new(base_speed: f64, turn_factor: f64) -> Self {
        Self {
            base_speed,
            turn_factor,
        }
    }

    /// Compute per-side speeds from the active key set
    pub fn wheel_speeds(&self, keys: KeyState) -> WheelSpeeds {
        let mut v = 0.0;
        if keys.forward {
            v += self.base_speed;
        }
        if keys.backward {
            v -= self.base_speed;
        }

        let mut h = 0.0;
        if keys.left {
            h -= self.base_speed * self.turn_factor;
        }
        if keys.right {
            h += self.base_speed * self.turn_factor;
        }

        // Tank turn: with no forward/backward component, spin in place at
        // full speed rather than at the turn-factor-scaled speed.
        if v == 0.0 && h != 0.0 {
            h = if h > 0.0 {
                self.base_speed
            } else {
                -self.base_speed
            };
        }

        WheelSpeeds {
            left: to_raw(v + h),
            right: to_raw(v - h),
        }
    }
}

/// Round a speed to the raw integer command, clamped to the signed
/// 16-bit range the wire encoding carries.
fn to_raw(speed: f64) -> i16 {
    (speed.round() as i64).clamp(i16::MIN as i64, i16::MAX as i64) as i16
}

#[cfg(test)]
mod tests {
    use super::*;

    const BASE: f64 = 500.0;
    const TURN: f64 = 0.3;

    fn kin() -> DriveKinematics {
        DriveKinematics::new(BASE, TURN)
    }

    #[test]
    fn test_no_keys_is_zero() {
        let speeds = kin().wheel_speeds(KeyState::default());
        assert_eq!(speeds, WheelSpeeds::zero());
        assert!(speeds.is_zero());
    }

    #[test]
    fn test_forward() {
        let speeds = kin().wheel_speeds(KeyState {
            forward: true,
            ..Default::default()
        });
        assert_eq!(speeds, WheelSpeeds::new(500, 500));
    }

    #[test]
    fn test_backward() {
        let speeds = kin().wheel_speeds(KeyState {
            backward: true,
            ..Default::default()
        });
        assert_eq!(speeds, WheelSpeeds::new(-500, -500));
    }

    #[test]
    fn test_left_alone_is_full_speed_tank_turn() {
        // Not the turn-factor-scaled -150/150: the override clamps h to base
        let speeds = kin().wheel_speeds(KeyState {
            left: true,
            ..Default::default()
        });
        assert_eq!(speeds, WheelSpeeds::new(-500, 500));
    }

    #[test]
    fn test_right_alone_is_full_speed_tank_turn() {
        let speeds = kin().wheel_speeds(KeyState {
            right: true,
            ..Default::default()
        });
        assert_eq!(speeds, WheelSpeeds::new(500, -500));
    }

    #[test]
    fn test_forward_right_blends_turn_factor() {
        let speeds = kin().wheel_speeds(KeyState {
            forward: true,
            right: true,
            ..Default::default()
        });
        // h = 500 * 0.3 = 150
        assert_eq!(speeds, WheelSpeeds::new(650, 350));
    }

    #[test]
    fn test_opposing_keys_cancel() {
        let speeds = kin().wheel_speeds(KeyState {
            forward: true,
            backward: true,
            ..Default::default()
        });
        assert!(speeds.is_zero());

        let speeds = kin().wheel_speeds(KeyState {
            left: true,
            right: true,
            ..Default::default()
        });
        assert!(speeds.is_zero());
    }

    #[test]
    fn test_raw_conversion_clamps() {
        let kin = DriveKinematics::new(40000.0, 0.3);
        let speeds = kin.wheel_speeds(KeyState {
            forward: true,
            ..Default::default()
        });
        assert_eq!(speeds, WheelSpeeds::new(i16::MAX, i16::MAX));
    }
}
