//! Beacon lifecycle: collect, rise, synchronize, descend.
//!
//! A beacon only changes state from its own [`Beacon::tick`], except for
//! the RISING → SYNCHRONIZING edge which the simulation loop triggers
//! through [`Beacon::try_synchronize`]. The satellite handle lives inside
//! the synchronizing phase, so a beacon holds a satellite exactly while it
//! is synchronizing.

use crate::announcer::Announcer;
use crate::clock::{Clock, SystemClock};
use crate::config::{BeaconProfile, SyncOptions, TransferMode};
use crate::error::SimError;
use crate::events::{BeaconEvent, BeaconEventKind, BeaconListener, BeaconSnapshot};
use crate::ids::{BeaconId, SatelliteId};
use crate::movement::{Heading, Kinematics, MovementStrategy};
use crate::satellite::Satellite;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeaconState {
    /// Drifting at depth and filling memory.
    Collecting,
    /// Memory full, heading for the surface or waiting there.
    Rising,
    /// Offloading memory to a locked satellite.
    Synchronizing,
    /// Returning to the initial depth.
    Descending,
}

impl BeaconState {
    pub const ALL: [BeaconState; 4] = [
        BeaconState::Collecting,
        BeaconState::Rising,
        BeaconState::Synchronizing,
        BeaconState::Descending,
    ];

    pub fn description(self) -> &'static str {
        match self {
            BeaconState::Collecting => "collecting at depth",
            BeaconState::Rising => "rising, awaiting satellite",
            BeaconState::Synchronizing => "synchronizing",
            BeaconState::Descending => "descending to depth",
        }
    }
}

impl fmt::Display for BeaconState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.description())
    }
}

/// Per-instance parameters, fixed at construction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconParams {
    pub max_memory: u32,
    pub collect_rate: u32,
    pub rise_speed: u32,
    pub descent_speed: u32,
}

impl BeaconParams {
    pub fn sample<R: Rng + ?Sized>(profile: &BeaconProfile, rng: &mut R) -> Self {
        Self {
            max_memory: profile.capacity.sample(rng),
            collect_rate: profile.collect_rate.sample(rng),
            rise_speed: profile.rise_speed.sample(rng),
            descent_speed: profile.descent_speed.sample(rng),
        }
    }

    /// Every parameter must be at least 1, otherwise the lifecycle could
    /// stall in a state and never return to collecting.
    pub fn validate(&self) -> Result<(), SimError> {
        let fields = [
            ("max memory", self.max_memory),
            ("collect rate", self.collect_rate),
            ("rise speed", self.rise_speed),
            ("descent speed", self.descent_speed),
        ];
        for (name, value) in fields {
            if value == 0 {
                return Err(SimError::InvalidConfig(format!("{name} must be at least 1")));
            }
        }
        Ok(())
    }
}

/// A finished synchronization session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncSummary {
    pub beacon: BeaconId,
    pub satellite: SatelliteId,
    pub transferred: u32,
    pub ticks: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TickOutcome {
    pub previous: BeaconState,
    pub current: BeaconState,
    pub completed: Option<SyncSummary>,
}

impl TickOutcome {
    pub fn transitioned(&self) -> bool {
        self.previous != self.current
    }
}

#[derive(Debug)]
struct SyncSession {
    satellite: Arc<Satellite>,
    total: u32,
    transferred: u32,
    started_at_ms: u64,
    ticks: u32,
}

#[derive(Debug)]
enum Phase {
    Collecting,
    Rising { surfaced_ticks: u32 },
    Synchronizing(SyncSession),
    Descending,
}

impl Phase {
    fn state(&self) -> BeaconState {
        match self {
            Phase::Collecting => BeaconState::Collecting,
            Phase::Rising { .. } => BeaconState::Rising,
            Phase::Synchronizing(_) => BeaconState::Synchronizing,
            Phase::Descending => BeaconState::Descending,
        }
    }
}

pub struct Beacon {
    id: BeaconId,
    kinematics: Kinematics,
    initial_depth: i32,
    phase: Phase,
    memory: u32,
    params: BeaconParams,
    sync: SyncOptions,
    strategy: Option<Box<dyn MovementStrategy>>,
    clock: Arc<dyn Clock>,
    announcer: Arc<Announcer<BeaconEvent>>,

    completed_syncs: u32,
    total_offloaded: u64,
}

impl Beacon {
    /// New collecting beacon with empty memory. Its current depth becomes
    /// the depth it returns to after each synchronization.
    pub fn new(id: BeaconId, kinematics: Kinematics, params: BeaconParams) -> Result<Self, SimError> {
        params.validate()?;
        Ok(Self {
            id,
            initial_depth: kinematics.y(),
            kinematics,
            phase: Phase::Collecting,
            memory: 0,
            params,
            sync: SyncOptions::default(),
            strategy: None,
            clock: Arc::new(SystemClock::new()),
            announcer: Arc::new(Announcer::new()),
            completed_syncs: 0,
            total_offloaded: 0,
        })
    }

    pub fn with_strategy(mut self, strategy: Box<dyn MovementStrategy>) -> Self {
        self.strategy = Some(strategy);
        self
    }

    pub fn with_sync_options(mut self, sync: SyncOptions) -> Result<Self, SimError> {
        sync.validate()?;
        self.sync = sync;
        Ok(self)
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Advance the lifecycle by one step and publish a move event.
    pub fn tick(&mut self) -> TickOutcome {
        let previous = self.state();
        let mut completed = None;

        match self.phase {
            Phase::Collecting => self.collect(),
            Phase::Rising { .. } => self.rise(),
            Phase::Synchronizing(_) => completed = self.transfer(),
            Phase::Descending => self.descend(),
        }

        self.announcer.publish(&BeaconEvent::Move(self.snapshot()));

        TickOutcome {
            previous,
            current: self.state(),
            completed,
        }
    }

    /// Start synchronizing with `satellite` if this beacon is waiting at
    /// the surface, the satellite is aligned and its lock is granted.
    /// A refusal is an ordinary outcome, not an error.
    pub fn try_synchronize(&mut self, satellite: &Arc<Satellite>) -> bool {
        if !self.is_sync_eligible() {
            return false;
        }
        if !satellite.is_aligned_with(self.kinematics.x(), self.sync.alignment) {
            return false;
        }
        if !satellite.try_lock(&self.id) {
            return false;
        }

        let session = SyncSession {
            satellite: Arc::clone(satellite),
            total: self.memory,
            transferred: 0,
            started_at_ms: self.clock.now_ms(),
            ticks: 0,
        };
        self.enter(Phase::Synchronizing(session));

        info!(beacon = %self.id, satellite = %satellite.id(), memory = self.memory, "synchronization started");
        self.announcer.publish(&BeaconEvent::SynchronizationStart {
            beacon: self.snapshot(),
            satellite: satellite.snapshot(),
        });
        true
    }

    /// Rising and exactly at the surface.
    pub fn is_sync_eligible(&self) -> bool {
        matches!(self.phase, Phase::Rising { .. }) && self.kinematics.y() == self.surface_y()
    }

    fn collect(&mut self) {
        if let Some(strategy) = self.strategy.as_mut() {
            strategy.advance(&mut self.kinematics);
        }

        self.memory = self
            .memory
            .saturating_add(self.params.collect_rate)
            .min(self.params.max_memory);

        if self.memory >= self.params.max_memory {
            self.enter(Phase::Rising { surfaced_ticks: 0 });
        }
    }

    fn rise(&mut self) {
        let surface = self.surface_y();
        if self.kinematics.y() > surface {
            let y = self.kinematics.y().saturating_sub(speed(self.params.rise_speed));
            self.kinematics.set_y(y.max(surface));
            return;
        }

        let waited = match &mut self.phase {
            Phase::Rising { surfaced_ticks } => {
                *surfaced_ticks += 1;
                *surfaced_ticks
            }
            _ => return,
        };

        if self.sync.surface_timeout_ticks.is_some_and(|limit| waited >= limit) {
            info!(beacon = %self.id, waited, memory = self.memory, "no satellite in range, descending with data");
            self.enter(Phase::Descending);
        }
    }

    fn transfer(&mut self) -> Option<SyncSummary> {
        let Phase::Synchronizing(session) = &mut self.phase else {
            return None;
        };
        session.ticks += 1;

        let amount = match self.sync.transfer {
            TransferMode::RateBased { units_per_tick } => units_per_tick.min(self.memory),
            TransferMode::DurationBased { window_ms } => {
                let elapsed = self.clock.now_ms().saturating_sub(session.started_at_ms);
                if elapsed >= window_ms {
                    // Deadline reached: everything left goes now.
                    self.memory
                } else {
                    let due = u128::from(session.total) * u128::from(elapsed) / u128::from(window_ms);
                    let due = u32::try_from(due).unwrap_or(session.total);
                    due.saturating_sub(session.transferred).min(self.memory)
                }
            }
        };

        if amount > 0 {
            session.satellite.receive_data(amount);
            session.transferred += amount;
            self.memory -= amount;
        }

        debug_assert_eq!(
            session.transferred + self.memory,
            session.total,
            "transfer must conserve data"
        );

        if self.memory > 0 {
            return None;
        }
        self.finish_synchronization()
    }

    fn finish_synchronization(&mut self) -> Option<SyncSummary> {
        let session = match std::mem::replace(&mut self.phase, Phase::Descending) {
            Phase::Synchronizing(session) => session,
            other => {
                self.phase = other;
                return None;
            }
        };

        session.satellite.unlock(&self.id);
        self.memory = 0;
        self.completed_syncs += 1;
        self.total_offloaded += u64::from(session.transferred);

        let summary = SyncSummary {
            beacon: self.id,
            satellite: session.satellite.id(),
            transferred: session.transferred,
            ticks: session.ticks,
        };

        info!(
            beacon = %self.id,
            satellite = %summary.satellite,
            transferred = summary.transferred,
            ticks = summary.ticks,
            "synchronization complete"
        );
        self.announce_transition(BeaconState::Synchronizing, BeaconState::Descending);
        self.announcer.publish(&BeaconEvent::SynchronizationEnd {
            beacon: self.snapshot(),
            satellite: session.satellite.snapshot(),
            transferred: session.transferred,
        });

        Some(summary)
    }

    fn descend(&mut self) {
        let target = self.initial_depth;
        let y = self.kinematics.y();
        let step = speed(self.params.descent_speed);
        let next = if y < target {
            y.saturating_add(step).min(target)
        } else {
            y.saturating_sub(step).max(target)
        };
        self.kinematics.set_y(next);

        if self.kinematics.y() == target {
            self.enter(Phase::Collecting);
        }
    }

    fn enter(&mut self, next: Phase) {
        let previous = self.phase.state();
        self.phase = next;
        let new_state = self.phase.state();
        if previous != new_state {
            self.announce_transition(previous, new_state);
        }
    }

    fn announce_transition(&self, previous: BeaconState, new_state: BeaconState) {
        debug!(beacon = %self.id, ?previous, ?new_state, memory = self.memory, "beacon state change");
        self.announcer.publish(&BeaconEvent::StateChange {
            beacon: self.snapshot(),
            previous,
            new_state,
        });
    }

    fn surface_y(&self) -> i32 {
        self.kinematics.bounds().surface_y
    }

    pub fn id(&self) -> BeaconId {
        self.id
    }

    pub fn x(&self) -> i32 {
        self.kinematics.x()
    }

    pub fn y(&self) -> i32 {
        self.kinematics.y()
    }

    pub fn heading(&self) -> Heading {
        self.kinematics.heading()
    }

    pub fn kinematics(&self) -> &Kinematics {
        &self.kinematics
    }

    /// Reposition the beacon outside the tick loop. Bounds still apply.
    pub fn set_position(&mut self, x: i32, y: i32) {
        self.kinematics.set_x(x);
        self.kinematics.set_y(y);
    }

    pub fn set_heading(&mut self, heading: Heading) {
        self.kinematics.set_heading(heading);
    }

    pub fn state(&self) -> BeaconState {
        self.phase.state()
    }

    pub fn memory(&self) -> u32 {
        self.memory
    }

    pub fn max_memory(&self) -> u32 {
        self.params.max_memory
    }

    pub fn params(&self) -> &BeaconParams {
        &self.params
    }

    pub fn sync_options(&self) -> &SyncOptions {
        &self.sync
    }

    pub fn initial_depth(&self) -> i32 {
        self.initial_depth
    }

    pub fn strategy_name(&self) -> Option<&'static str> {
        self.strategy.as_ref().map(|strategy| strategy.name())
    }

    pub fn current_satellite(&self) -> Option<&Arc<Satellite>> {
        match &self.phase {
            Phase::Synchronizing(session) => Some(&session.satellite),
            _ => None,
        }
    }

    /// `(transferred, total)` of the running session.
    pub fn sync_progress(&self) -> Option<(u32, u32)> {
        match &self.phase {
            Phase::Synchronizing(session) => Some((session.transferred, session.total)),
            _ => None,
        }
    }

    /// Ticks spent waiting at the surface in the current rise.
    pub fn surfaced_ticks(&self) -> u32 {
        match self.phase {
            Phase::Rising { surfaced_ticks } => surfaced_ticks,
            _ => 0,
        }
    }

    pub fn completed_syncs(&self) -> u32 {
        self.completed_syncs
    }

    pub fn total_offloaded(&self) -> u64 {
        self.total_offloaded
    }

    pub fn snapshot(&self) -> BeaconSnapshot {
        BeaconSnapshot {
            id: self.id,
            x: self.kinematics.x(),
            y: self.kinematics.y(),
            heading: self.kinematics.heading(),
            state: self.state(),
            memory: self.memory,
            max_memory: self.params.max_memory,
        }
    }

    pub fn announcer(&self) -> &Arc<Announcer<BeaconEvent>> {
        &self.announcer
    }

    pub fn register_move_listener(&self, listener: Arc<dyn BeaconListener>) {
        self.announcer.subscribe(BeaconEventKind::Move, listener);
    }

    pub fn unregister_move_listener(&self, listener: &Arc<dyn BeaconListener>) -> usize {
        self.announcer.unsubscribe(BeaconEventKind::Move, listener)
    }

    pub fn register_state_listener(&self, listener: Arc<dyn BeaconListener>) {
        self.announcer.subscribe(BeaconEventKind::StateChange, listener);
    }

    pub fn unregister_state_listener(&self, listener: &Arc<dyn BeaconListener>) -> usize {
        self.announcer.unsubscribe(BeaconEventKind::StateChange, listener)
    }

    /// Subscribe to both synchronization start and end.
    pub fn register_synchronization_listener(&self, listener: Arc<dyn BeaconListener>) {
        self.announcer
            .subscribe(BeaconEventKind::SynchronizationStart, Arc::clone(&listener));
        self.announcer.subscribe(BeaconEventKind::SynchronizationEnd, listener);
    }

    pub fn unregister_synchronization_listener(&self, listener: &Arc<dyn BeaconListener>) -> usize {
        self.announcer.unsubscribe(BeaconEventKind::SynchronizationStart, listener)
            + self.announcer.unsubscribe(BeaconEventKind::SynchronizationEnd, listener)
    }
}

impl Drop for Beacon {
    fn drop(&mut self) {
        // A beacon removed mid-session must not strand the satellite.
        if let Phase::Synchronizing(session) = &self.phase {
            session.satellite.unlock(&self.id);
        }
    }
}

impl fmt::Debug for Beacon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Beacon")
            .field("id", &self.id)
            .field("kinematics", &self.kinematics)
            .field("state", &self.state())
            .field("memory", &self.memory)
            .field("params", &self.params)
            .field("strategy", &self.strategy_name())
            .field("satellite", &self.current_satellite().map(|s| s.id()))
            .finish_non_exhaustive()
    }
}

static_assertions::assert_impl_all!(Beacon: Send);

fn speed(value: u32) -> i32 {
    i32::try_from(value).unwrap_or(i32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::movement::OceanBounds;

    fn params(max_memory: u32, collect_rate: u32) -> BeaconParams {
        BeaconParams { max_memory, collect_rate, rise_speed: 2, descent_speed: 2 }
    }

    #[test]
    fn test_memory_never_exceeds_capacity() {
        let kinematics = Kinematics::new(100, 400, Heading::Right, OceanBounds::default());
        let mut beacon = Beacon::new(BeaconId::numbered(1), kinematics, params(12, 5)).unwrap();

        beacon.tick();
        beacon.tick();
        assert_eq!(beacon.state(), BeaconState::Collecting);
        let outcome = beacon.tick();
        assert_eq!(beacon.memory(), 12);
        assert!(outcome.transitioned());
        assert_eq!(outcome.current, BeaconState::Rising);
    }

    #[test]
    fn test_rise_clamps_at_surface() {
        let kinematics = Kinematics::new(100, 305, Heading::Right, OceanBounds::default());
        let mut beacon = Beacon::new(BeaconId::numbered(1), kinematics, params(1, 1)).unwrap();
        beacon.tick();
        assert_eq!(beacon.state(), BeaconState::Rising);

        beacon.tick();
        beacon.tick();
        assert_eq!(beacon.y(), 301);
        assert!(!beacon.is_sync_eligible());
        beacon.tick();
        assert_eq!(beacon.y(), 300);
        assert!(beacon.is_sync_eligible());
        assert_eq!(beacon.surfaced_ticks(), 0);

        beacon.tick();
        assert_eq!(beacon.surfaced_ticks(), 1);
    }

    #[test]
    fn test_collecting_beacon_has_no_satellite() {
        let kinematics = Kinematics::new(0, 400, Heading::Right, OceanBounds::default());
        let beacon = Beacon::new(BeaconId::numbered(1), kinematics, params(10, 1)).unwrap();
        assert!(beacon.current_satellite().is_none());
        assert!(beacon.sync_progress().is_none());
    }

    #[test]
    fn test_zero_params_rejected() {
        let zeroed = [
            BeaconParams { max_memory: 0, ..params(10, 1) },
            BeaconParams { collect_rate: 0, ..params(10, 1) },
            BeaconParams { rise_speed: 0, ..params(10, 1) },
            BeaconParams { descent_speed: 0, ..params(10, 1) },
        ];
        for bad in zeroed {
            let kinematics = Kinematics::new(0, 400, Heading::Right, OceanBounds::default());
            assert!(matches!(
                Beacon::new(BeaconId::numbered(1), kinematics, bad),
                Err(SimError::InvalidConfig(_))
            ));
        }
    }

    #[test]
    fn test_duration_due_does_not_overflow_with_huge_window() {
        let kinematics = Kinematics::new(100, 300, Heading::Still, OceanBounds::default());
        let clock = Arc::new(crate::clock::ManualClock::new(0));
        let sync = SyncOptions {
            transfer: TransferMode::DurationBased { window_ms: u64::MAX },
            ..SyncOptions::default()
        };
        let mut beacon = Beacon::new(BeaconId::numbered(1), kinematics, params(u32::MAX, u32::MAX))
            .unwrap()
            .with_sync_options(sync)
            .unwrap()
            .with_clock(clock.clone());
        let satellite = Arc::new(Satellite::new(
            crate::ids::SatelliteId::numbered(1),
            100,
            Heading::Still,
            &crate::config::SatelliteOptions::default(),
        ));

        beacon.tick();
        assert!(beacon.try_synchronize(&satellite));
        clock.set(u64::MAX - 1);
        beacon.tick();
        assert_eq!(beacon.state(), BeaconState::Synchronizing);
        assert_eq!(u64::from(beacon.memory()) + satellite.data_received(), u64::from(u32::MAX));

        clock.set(u64::MAX);
        assert!(beacon.tick().completed.is_some());
        assert_eq!(satellite.data_received(), u64::from(u32::MAX));
    }
}
