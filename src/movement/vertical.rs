use super::{Kinematics, MovementStrategy};

/// Depth-only movement between two limits.
///
/// With `bounce` (the default) the beacon ping-pongs between the limits;
/// without it the beacon stops at whichever limit it reaches.
#[derive(Debug, Clone)]
pub struct VerticalMovement {
    step: i32,
    min_depth: i32,
    max_depth: i32,
    direction: i32,
    bounce: bool,
}

impl VerticalMovement {
    pub fn new(step: i32, min_depth: i32, max_depth: i32) -> Self {
        Self {
            step,
            min_depth,
            max_depth,
            direction: 1,
            bounce: true,
        }
    }

    pub fn with_bounce(mut self, bounce: bool) -> Self {
        self.bounce = bounce;
        self
    }

    /// `1` moves deeper, `-1` moves toward the surface.
    pub fn direction(&self) -> i32 {
        self.direction
    }

    pub fn set_direction(&mut self, direction: i32) {
        self.direction = if direction > 0 { 1 } else { -1 };
    }

    pub fn bounces(&self) -> bool {
        self.bounce
    }
}

impl MovementStrategy for VerticalMovement {
    fn advance(&mut self, kinematics: &mut Kinematics) {
        let mut new_y = kinematics.y().saturating_add(self.direction.saturating_mul(self.step));

        if self.bounce {
            if new_y >= self.max_depth {
                new_y = self.max_depth;
                self.direction = -1;
            } else if new_y <= self.min_depth {
                new_y = self.min_depth;
                self.direction = 1;
            }
        } else {
            new_y = new_y.clamp(self.min_depth, self.max_depth);
        }

        kinematics.set_y(new_y);
    }

    fn name(&self) -> &'static str {
        "vertical"
    }
}
