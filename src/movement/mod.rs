pub mod fixed;
pub mod linear;
pub mod sinusoidal;
pub mod vertical;

pub use fixed::StaticMovement;
pub use linear::LinearMovement;
pub use sinusoidal::SinusoidalMovement;
pub use vertical::VerticalMovement;

use serde::{Deserialize, Serialize};

pub const DEFAULT_OCEAN_WIDTH: i32 = 800;
pub const DEFAULT_SURFACE_Y: i32 = 300;
pub const DEFAULT_FLOOR_Y: i32 = 600;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Heading {
    Left,
    Still,
    Right,
}

impl Heading {
    pub fn sign(self) -> i32 {
        match self {
            Heading::Left => -1,
            Heading::Still => 0,
            Heading::Right => 1,
        }
    }

    pub fn from_sign(sign: i32) -> Self {
        match sign.signum() {
            -1 => Heading::Left,
            1 => Heading::Right,
            _ => Heading::Still,
        }
    }

    pub fn reversed(self) -> Self {
        Heading::from_sign(-self.sign())
    }
}

/// Region a beacon may occupy. Screen coordinates: `y` grows with depth,
/// so `surface_y < floor_y`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OceanBounds {
    pub width: i32,
    pub surface_y: i32,
    pub floor_y: i32,
}

impl Default for OceanBounds {
    fn default() -> Self {
        Self {
            width: DEFAULT_OCEAN_WIDTH,
            surface_y: DEFAULT_SURFACE_Y,
            floor_y: DEFAULT_FLOOR_Y,
        }
    }
}

/// Position and heading of a beacon. The setters own the bounds policy:
/// horizontal edges reverse the heading, depth is clamped to the water
/// column.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Kinematics {
    x: i32,
    y: i32,
    heading: Heading,
    bounds: OceanBounds,
}

impl Kinematics {
    pub fn new(x: i32, y: i32, heading: Heading, bounds: OceanBounds) -> Self {
        let mut kinematics = Self { x: 0, y: bounds.surface_y, heading, bounds };
        kinematics.set_x(x);
        kinematics.set_y(y);
        kinematics
    }

    pub fn x(&self) -> i32 {
        self.x
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn bounds(&self) -> OceanBounds {
        self.bounds
    }

    pub fn set_x(&mut self, x: i32) {
        if x < 0 {
            self.x = 0;
            self.heading = self.heading.reversed();
        } else if x > self.bounds.width {
            self.x = self.bounds.width;
            self.heading = self.heading.reversed();
        } else {
            self.x = x;
        }
    }

    pub fn set_y(&mut self, y: i32) {
        self.y = y.clamp(self.bounds.surface_y, self.bounds.floor_y);
    }

    pub fn set_heading(&mut self, heading: Heading) {
        self.heading = heading;
    }
}

/// Per-tick position update applied to a collecting beacon.
///
/// A strategy instance belongs to exactly one beacon; implementations may
/// keep per-beacon state such as a phase counter.
pub trait MovementStrategy: Send {
    fn advance(&mut self, kinematics: &mut Kinematics);

    fn name(&self) -> &'static str;
}

/// Serializable description of a strategy, used by configuration and the
/// runner to build fresh per-beacon instances.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StrategyKind {
    Linear { step: i32 },
    Sinusoidal { horizontal_step: i32, amplitude: i32, frequency: i32 },
    Vertical { step: i32, min_depth: i32, max_depth: i32, bounce: bool },
    /// Holds the beacon at the coordinates it was spawned at.
    Static,
}

impl StrategyKind {
    pub fn build(&self, spawn_x: i32, spawn_y: i32) -> Box<dyn MovementStrategy> {
        match *self {
            StrategyKind::Linear { step } => Box::new(LinearMovement::new(step)),
            StrategyKind::Sinusoidal { horizontal_step, amplitude, frequency } => {
                Box::new(SinusoidalMovement::new(horizontal_step, amplitude, frequency))
            }
            StrategyKind::Vertical { step, min_depth, max_depth, bounce } => {
                Box::new(VerticalMovement::new(step, min_depth, max_depth).with_bounce(bounce))
            }
            StrategyKind::Static => Box::new(StaticMovement::new(spawn_x, spawn_y)),
        }
    }
}

impl Default for StrategyKind {
    fn default() -> Self {
        StrategyKind::Linear { step: 2 }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_heading_reversal() {
        assert_eq!(Heading::Left.reversed(), Heading::Right);
        assert_eq!(Heading::Right.reversed(), Heading::Left);
        assert_eq!(Heading::Still.reversed(), Heading::Still);
        assert_eq!(Heading::from_sign(-7), Heading::Left);
    }

    #[test]
    fn test_kinematics_clamps_construction() {
        let k = Kinematics::new(-5, 10, Heading::Left, OceanBounds::default());
        assert_eq!(k.x(), 0);
        assert_eq!(k.y(), DEFAULT_SURFACE_Y);
        assert_eq!(k.heading(), Heading::Right);
    }

    #[test]
    fn test_strategy_kind_from_json() {
        let kind: StrategyKind =
            serde_json::from_str(r#"{"kind":"vertical","step":3,"min_depth":320,"max_depth":500,"bounce":false}"#)
                .unwrap();
        assert_eq!(kind.build(0, 400).name(), "vertical");
    }
}
