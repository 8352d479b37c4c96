// Per-wheel odometry from accumulated encoder ticks
//
// Each call is a discrete sample; the caller supplies the cadence. Delta
// arithmetic is gap-agnostic, but a 32-bit counter wraparound inside a
// single gap is unrepresentable and not handled.

use crate::motor::profile::MotorProfile;
use crate::motor::MotorChannel;

#[derive(Debug, Clone, Copy, Default)]
struct ChannelState {
    last_ticks: i32,
    total_mm: f64,
}

/// Tracks accumulated travel per motor channel.
///
/// Mileage only ever increases: the absolute value of each tick delta is
/// accumulated, so reversing direction adds distance instead of
/// cancelling it.
pub struct OdometryTracker {
    mm_per_tick: f64,
    channels: [ChannelState; 4],
}

impl OdometryTracker {
    pub fn new(profile: &MotorProfile) -> Self {
        Self {
            mm_per_tick: profile.mm_per_tick(),
            channels: [ChannelState::default(); 4],
        }
    }

    /// Fold a new accumulated tick sample into one channel's mileage.
    /// Returns the channel's updated total, rounded to 2 decimal mm.
    pub fn record(&mut self, channel: MotorChannel, ticks: i32) -> f64 {
        let state = &mut self.channels[channel.index()];
        let delta = ticks.wrapping_sub(state.last_ticks);
        state.total_mm += (delta as f64).abs() * self.mm_per_tick;
        state.last_ticks = ticks;
        round2(state.total_mm)
    }

    /// Per-channel totals, rounded to 2 decimal mm
    pub fn totals(&self) -> [f64; 4] {
        let mut out = [0.0; 4];
        for (slot, state) in out.iter_mut().zip(self.channels.iter()) {
            *slot = round2(state.total_mm);
        }
        out
    }

    /// Rover travel: mean of the four per-wheel totals
    pub fn mean_total(&self) -> f64 {
        let sum: f64 = self.channels.iter().map(|s| s.total_mm).sum();
        round2(sum / self.channels.len() as f64)
    }
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::motor::profile::MotorModel;

    fn tracker() -> OdometryTracker {
        OdometryTracker::new(&MotorProfile::for_model(MotorModel::M520))
    }

    #[test]
    fn test_reversal_adds_mileage() {
        let mut odo = tracker();
        let mm_per_tick = MotorProfile::for_model(MotorModel::M520).mm_per_tick();

        odo.record(MotorChannel::FrontLeft, 100);
        odo.record(MotorChannel::FrontLeft, 50);
        let total = odo.record(MotorChannel::FrontLeft, 200);

        // 100 + 50 + 150 ticks of travel, never a net-cancelling value
        let expected = (100.0 + 50.0 + 150.0) * mm_per_tick;
        assert!((total - expected).abs() < 0.01);
    }

    #[test]
    fn test_monotonically_non_decreasing() {
        let mut odo = tracker();
        let mut previous = 0.0;
        for ticks in [0, 37, -81, -81, 12000, 11999] {
            let total = odo.record(MotorChannel::RearLeft, ticks);
            assert!(total >= previous);
            previous = total;
        }
    }

    #[test]
    fn test_channels_are_independent() {
        let mut odo = tracker();
        odo.record(MotorChannel::FrontLeft, 330);
        let totals = odo.totals();
        assert!(totals[0] > 0.0);
        assert_eq!(totals[1], 0.0);
        assert_eq!(totals[2], 0.0);
        assert_eq!(totals[3], 0.0);
    }

    #[test]
    fn test_reference_profile_scale() {
        // One wheel revolution: 330 ticks -> 67π mm
        let mut odo = tracker();
        let total = odo.record(MotorChannel::FrontRight, 330);
        assert_eq!(total, 210.49);
    }

    #[test]
    fn test_mean_total() {
        let mut odo = tracker();
        odo.record(MotorChannel::FrontLeft, 330);
        odo.record(MotorChannel::FrontRight, 330);
        // Two wheels moved one revolution, two stood still
        assert_eq!(odo.mean_total(), 105.24);
    }
}
