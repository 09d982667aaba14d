use super::{Kinematics, MovementStrategy};

/// Constant-velocity horizontal drift along the beacon's heading.
#[derive(Debug, Clone)]
pub struct LinearMovement {
    step: i32,
}

impl LinearMovement {
    pub fn new(step: i32) -> Self {
        Self { step }
    }

    pub fn step(&self) -> i32 {
        self.step
    }
}

impl MovementStrategy for LinearMovement {
    fn advance(&mut self, kinematics: &mut Kinematics) {
        let delta = kinematics.heading().sign().saturating_mul(self.step);
        kinematics.set_x(kinematics.x().saturating_add(delta));
    }

    fn name(&self) -> &'static str {
        "linear"
    }
}
