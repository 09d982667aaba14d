use crate::error::SimError;
use crate::movement::{OceanBounds, StrategyKind};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::path::Path;

pub const DEFAULT_SEED: u64 = 42;
pub const DEFAULT_TICK_PERIOD_MS: u64 = 30;

// Per-instance beacon parameter ranges, drawn once at construction
const DEFAULT_CAPACITY: ValueRange = ValueRange { min: 100, max: 200 };
const DEFAULT_COLLECT_RATE: ValueRange = ValueRange { min: 3, max: 7 };
const DEFAULT_RISE_SPEED: ValueRange = ValueRange { min: 1, max: 3 };
const DEFAULT_DESCENT_SPEED: ValueRange = ValueRange { min: 1, max: 3 };

pub const DEFAULT_ALIGNMENT_TOLERANCE_PX: u32 = 10;
pub const DEFAULT_TRANSFER_RATE: u32 = 10;
pub const DEFAULT_SYNC_WINDOW_MS: u64 = 3000;

pub const DEFAULT_SATELLITE_STEP: i32 = 3;
pub const DEFAULT_SATELLITE_ALTITUDE_Y: i32 = 50;

/// Inclusive range a per-instance parameter is drawn from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueRange {
    pub min: u32,
    pub max: u32,
}

impl ValueRange {
    pub const fn fixed(value: u32) -> Self {
        Self { min: value, max: value }
    }

    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> u32 {
        rng.gen_range(self.min..=self.max)
    }

    fn validate(&self, name: &str) -> Result<(), SimError> {
        if self.min == 0 {
            return Err(SimError::InvalidConfig(format!("{name} must be at least 1")));
        }
        if self.min > self.max {
            return Err(SimError::InvalidConfig(format!(
                "{name} range is empty ({}..={})",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BeaconProfile {
    pub capacity: ValueRange,
    pub collect_rate: ValueRange,
    pub rise_speed: ValueRange,
    pub descent_speed: ValueRange,
}

impl Default for BeaconProfile {
    fn default() -> Self {
        Self {
            capacity: DEFAULT_CAPACITY,
            collect_rate: DEFAULT_COLLECT_RATE,
            rise_speed: DEFAULT_RISE_SPEED,
            descent_speed: DEFAULT_DESCENT_SPEED,
        }
    }
}

/// How close a satellite must be horizontally for a beacon to sync with it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "policy", rename_all = "snake_case")]
pub enum AlignmentPolicy {
    Tolerance { pixels: u32 },
    Exact,
}

impl AlignmentPolicy {
    pub fn accepts(self, a: i32, b: i32) -> bool {
        let distance = (i64::from(a) - i64::from(b)).unsigned_abs();
        match self {
            AlignmentPolicy::Tolerance { pixels } => distance <= u64::from(pixels),
            AlignmentPolicy::Exact => distance == 0,
        }
    }
}

impl Default for AlignmentPolicy {
    fn default() -> Self {
        AlignmentPolicy::Tolerance { pixels: DEFAULT_ALIGNMENT_TOLERANCE_PX }
    }
}

/// How a synchronizing beacon drains its memory into the satellite.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "snake_case")]
pub enum TransferMode {
    /// Fixed number of units per tick.
    RateBased { units_per_tick: u32 },
    /// Proportional to elapsed wall-clock time; completes at the deadline.
    DurationBased { window_ms: u64 },
}

impl Default for TransferMode {
    fn default() -> Self {
        TransferMode::RateBased { units_per_tick: DEFAULT_TRANSFER_RATE }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncOptions {
    pub alignment: AlignmentPolicy,
    pub transfer: TransferMode,
    /// Ticks a surfaced beacon waits for a satellite before descending
    /// with its data. `None` waits forever.
    pub surface_timeout_ticks: Option<u32>,
}

impl SyncOptions {
    pub fn validate(&self) -> Result<(), SimError> {
        match self.transfer {
            TransferMode::RateBased { units_per_tick: 0 } => {
                return Err(SimError::InvalidConfig("transfer rate must be at least 1".into()));
            }
            TransferMode::DurationBased { window_ms: 0 } => {
                return Err(SimError::InvalidConfig("transfer window must be at least 1 ms".into()));
            }
            _ => {}
        }
        if self.surface_timeout_ticks == Some(0) {
            return Err(SimError::InvalidConfig("surface timeout must be at least 1 tick".into()));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SatelliteOptions {
    /// Horizontal pixels moved per tick.
    pub step: i32,
    pub screen_width: i32,
    pub altitude_y: i32,
    /// Hold position while a beacon holds the lock.
    pub freeze_while_locked: bool,
}

impl Default for SatelliteOptions {
    fn default() -> Self {
        Self {
            step: DEFAULT_SATELLITE_STEP,
            screen_width: crate::movement::DEFAULT_OCEAN_WIDTH,
            altitude_y: DEFAULT_SATELLITE_ALTITUDE_Y,
            freeze_while_locked: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    pub seed: u64,
    pub tick_period_ms: u64,
    pub ocean: OceanBounds,
    pub beacon: BeaconProfile,
    pub sync: SyncOptions,
    pub satellite: SatelliteOptions,
    /// Strategy given to beacons spawned without an explicit one.
    pub default_strategy: StrategyKind,
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            seed: DEFAULT_SEED,
            tick_period_ms: DEFAULT_TICK_PERIOD_MS,
            ocean: OceanBounds::default(),
            beacon: BeaconProfile::default(),
            sync: SyncOptions::default(),
            satellite: SatelliteOptions::default(),
            default_strategy: StrategyKind::default(),
        }
    }
}

impl SimulationConfig {
    pub fn from_json_str(json: &str) -> Result<Self, SimError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, SimError> {
        let json = std::fs::read_to_string(path)?;
        Self::from_json_str(&json)
    }

    pub fn validate(&self) -> Result<(), SimError> {
        if self.tick_period_ms == 0 {
            return Err(SimError::InvalidConfig("tick period must be at least 1 ms".into()));
        }
        if self.ocean.width <= 0 {
            return Err(SimError::InvalidConfig("ocean width must be positive".into()));
        }
        if self.ocean.surface_y >= self.ocean.floor_y {
            return Err(SimError::InvalidConfig(format!(
                "surface y {} must be above floor y {}",
                self.ocean.surface_y, self.ocean.floor_y
            )));
        }

        self.beacon.capacity.validate("capacity")?;
        self.beacon.collect_rate.validate("collect rate")?;
        self.beacon.rise_speed.validate("rise speed")?;
        self.beacon.descent_speed.validate("descent speed")?;
        self.sync.validate()?;

        if self.satellite.screen_width <= 0 {
            return Err(SimError::InvalidConfig("satellite screen width must be positive".into()));
        }
        if self.satellite.step < 0 {
            return Err(SimError::InvalidConfig("satellite step must not be negative".into()));
        }
        Ok(())
    }
}
