use super::{Kinematics, MovementStrategy};

/// Pins the beacon to one coordinate, overriding any displacement applied
/// since the previous tick.
#[derive(Debug, Clone)]
pub struct StaticMovement {
    x: i32,
    y: i32,
}

impl StaticMovement {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

impl MovementStrategy for StaticMovement {
    fn advance(&mut self, kinematics: &mut Kinematics) {
        kinematics.set_x(self.x);
        kinematics.set_y(self.y);
    }

    fn name(&self) -> &'static str {
        "static"
    }
}
