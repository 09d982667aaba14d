use super::{Kinematics, MovementStrategy};
use core::f64::consts::PI;

/// Horizontal drift with a vertical oscillation around the depth the
/// beacon had on the first call.
///
/// The offset is computed from an internal tick counter rather than
/// accumulated from the previous position, so the wave does not drift.
#[derive(Debug, Clone)]
pub struct SinusoidalMovement {
    horizontal_step: i32,
    amplitude: i32,
    frequency: i32,
    time_step: u64,
    baseline_y: Option<i32>,
}

impl SinusoidalMovement {
    pub fn new(horizontal_step: i32, amplitude: i32, frequency: i32) -> Self {
        Self {
            horizontal_step,
            amplitude,
            frequency,
            time_step: 0,
            baseline_y: None,
        }
    }

    pub fn time_step(&self) -> u64 {
        self.time_step
    }

    pub fn baseline_y(&self) -> Option<i32> {
        self.baseline_y
    }

    #[allow(clippy::cast_precision_loss)]
    fn offset_at(&self, time_step: u64) -> i32 {
        let angle = 2.0 * PI * f64::from(self.frequency) * time_step as f64 / 100.0;
        // Truncation toward zero keeps the wave symmetric around the baseline.
        (f64::from(self.amplitude) * angle.sin()) as i32
    }
}

impl MovementStrategy for SinusoidalMovement {
    fn advance(&mut self, kinematics: &mut Kinematics) {
        let delta = kinematics.heading().sign().saturating_mul(self.horizontal_step);
        kinematics.set_x(kinematics.x().saturating_add(delta));

        let baseline = *self.baseline_y.get_or_insert(kinematics.y());
        kinematics.set_y(baseline.saturating_add(self.offset_at(self.time_step)));

        self.time_step += 1;
    }

    fn name(&self) -> &'static str {
        "sinusoidal"
    }
}
