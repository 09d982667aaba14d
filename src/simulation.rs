use crate::beacon::{Beacon, BeaconParams, SyncSummary, TickOutcome};
use crate::clock::{Clock, SystemClock};
use crate::config::SimulationConfig;
use crate::error::SimError;
use crate::ids::{BeaconId, SatelliteId};
use crate::movement::{Heading, Kinematics, MovementStrategy};
use crate::satellite::Satellite;
use crate::telemetry::{SimulationTelemetry, SyncLedger};
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use std::sync::Arc;
use tracing::{debug, trace};

/// What happened during one simulation tick.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TickReport {
    pub tick: u64,
    pub transitions: u32,
    pub synchronizations_started: Vec<(BeaconId, SatelliteId)>,
    pub synchronizations_completed: Vec<SyncSummary>,
}

impl TickReport {
    fn absorb(&mut self, outcome: TickOutcome) {
        if outcome.transitioned() {
            self.transitions += 1;
        }
        if let Some(summary) = outcome.completed {
            self.synchronizations_completed.push(summary);
        }
    }

    fn merge(&mut self, other: TickReport) {
        self.transitions += other.transitions;
        self.synchronizations_started.extend(other.synchronizations_started);
        self.synchronizations_completed.extend(other.synchronizations_completed);
    }
}

/// Discrete-time driver for all beacons and satellites.
///
/// Each tick moves the satellites, ticks every beacon, then pairs beacons
/// waiting at the surface with satellites. Beacons try satellites in
/// registration order and keep the first one that accepts.
#[derive(Debug)]
pub struct Simulation {
    config: SimulationConfig,
    rng: ChaCha8Rng,
    clock: Arc<dyn Clock>,
    beacons: Vec<Beacon>,
    satellites: Vec<Arc<Satellite>>,
    ledger: SyncLedger,
    tick_count: u64,
    next_beacon_seq: u64,
    next_satellite_seq: u64,
}

impl Simulation {
    pub fn new(config: SimulationConfig) -> Result<Self, SimError> {
        Self::with_clock(config, Arc::new(SystemClock::new()))
    }

    pub fn with_clock(config: SimulationConfig, clock: Arc<dyn Clock>) -> Result<Self, SimError> {
        config.validate()?;
        Ok(Self {
            rng: ChaCha8Rng::seed_from_u64(config.seed),
            config,
            clock,
            beacons: Vec::new(),
            satellites: Vec::new(),
            ledger: SyncLedger::new(),
            tick_count: 0,
            next_beacon_seq: 0,
            next_satellite_seq: 0,
        })
    }

    /// Spawn a beacon driven by the configured default strategy, with
    /// parameters drawn from the simulation's random source.
    pub fn spawn_beacon(&mut self, x: i32, y: i32, heading: Heading) -> Result<BeaconId, SimError> {
        let strategy = self.config.default_strategy.build(x, y);
        self.spawn_beacon_with(x, y, heading, Some(strategy))
    }

    /// Spawn a beacon with an explicit strategy; `None` leaves it in place
    /// while collecting.
    pub fn spawn_beacon_with(
        &mut self,
        x: i32,
        y: i32,
        heading: Heading,
        strategy: Option<Box<dyn MovementStrategy>>,
    ) -> Result<BeaconId, SimError> {
        let id = self.next_beacon_id();
        let params = BeaconParams::sample(&self.config.beacon, &mut self.rng);
        let kinematics = Kinematics::new(x, y, heading, self.config.ocean);

        let mut beacon = Beacon::new(id, kinematics, params)?
            .with_sync_options(self.config.sync)?
            .with_clock(Arc::clone(&self.clock));
        if let Some(strategy) = strategy {
            beacon = beacon.with_strategy(strategy);
        }

        debug!(beacon = %id, x, y, ?params, "spawning beacon");
        self.add_beacon(beacon)?;
        Ok(id)
    }

    /// Spawn a beacon at a random position below the surface, heading
    /// left or right.
    pub fn spawn_random_beacon(&mut self) -> Result<BeaconId, SimError> {
        let ocean = self.config.ocean;
        let x = self.rng.gen_range(0..=ocean.width);
        let y = self.rng.gen_range(ocean.surface_y + 1..=ocean.floor_y);
        let heading = self.random_heading();
        self.spawn_beacon(x, y, heading)
    }

    pub fn spawn_satellite(&mut self, x: i32, heading: Heading) -> Result<Arc<Satellite>, SimError> {
        let id = self.next_satellite_id();
        let satellite = Arc::new(Satellite::new(id, x, heading, &self.config.satellite));
        debug!(satellite = %id, x, ?heading, "spawning satellite");
        self.add_satellite(Arc::clone(&satellite))?;
        Ok(satellite)
    }

    pub fn spawn_random_satellite(&mut self) -> Result<Arc<Satellite>, SimError> {
        let x = self.rng.gen_range(0..=self.config.satellite.screen_width);
        let heading = self.random_heading();
        self.spawn_satellite(x, heading)
    }

    pub fn add_beacon(&mut self, beacon: Beacon) -> Result<(), SimError> {
        if self.beacon(beacon.id()).is_some() {
            return Err(SimError::DuplicateBeacon(beacon.id()));
        }
        self.beacons.push(beacon);
        Ok(())
    }

    pub fn add_satellite(&mut self, satellite: Arc<Satellite>) -> Result<(), SimError> {
        if self.satellite(satellite.id()).is_some() {
            return Err(SimError::DuplicateSatellite(satellite.id()));
        }
        self.satellites.push(satellite);
        Ok(())
    }

    /// Remove a beacon; a session it was running releases its satellite.
    pub fn remove_beacon(&mut self, id: BeaconId) -> Option<Beacon> {
        let index = self.beacons.iter().position(|beacon| beacon.id() == id)?;
        Some(self.beacons.remove(index))
    }

    /// Remove a satellite from pairing. Beacons already synchronizing with
    /// it finish their session.
    pub fn remove_satellite(&mut self, id: SatelliteId) -> Option<Arc<Satellite>> {
        let index = self.satellites.iter().position(|satellite| satellite.id() == id)?;
        Some(self.satellites.remove(index))
    }

    pub fn tick(&mut self) -> TickReport {
        self.tick_count += 1;
        self.move_satellites();

        let mut report = TickReport {
            tick: self.tick_count,
            ..TickReport::default()
        };
        for beacon in &mut self.beacons {
            report.absorb(beacon.tick());
        }
        for beacon in &mut self.beacons {
            if let Some(satellite) = pair(beacon, &self.satellites) {
                report.synchronizations_started.push((beacon.id(), satellite));
            }
        }

        self.finish_tick(report)
    }

    /// Same tick semantics as [`Simulation::tick`] with beacons spread over
    /// `workers` threads. Every chunk finishes ticking before any chunk
    /// starts pairing, so sessions that end this tick free their satellite
    /// for pairing in the same tick. Beacons on different threads contend
    /// for the same satellites; the satellite lock keeps sessions exclusive.
    pub fn tick_concurrent(&mut self, workers: usize) -> TickReport {
        if workers <= 1 || self.beacons.len() < 2 {
            return self.tick();
        }

        self.tick_count += 1;
        self.move_satellites();

        let chunk_size = self.beacons.len().div_ceil(workers);
        let satellites = &self.satellites;

        let ticked = std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .beacons
                .chunks_mut(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        let mut partial = TickReport::default();
                        for beacon in chunk.iter_mut() {
                            partial.absorb(beacon.tick());
                        }
                        partial
                    })
                })
                .collect();
            join_all(handles)
        });

        let paired = std::thread::scope(|scope| {
            let handles: Vec<_> = self
                .beacons
                .chunks_mut(chunk_size)
                .map(|chunk| {
                    scope.spawn(move || {
                        let mut partial = TickReport::default();
                        for beacon in chunk.iter_mut() {
                            if let Some(satellite) = pair(beacon, satellites) {
                                partial.synchronizations_started.push((beacon.id(), satellite));
                            }
                        }
                        partial
                    })
                })
                .collect();
            join_all(handles)
        });

        let mut report = TickReport {
            tick: self.tick_count,
            ..TickReport::default()
        };
        for partial in ticked.into_iter().chain(paired) {
            report.merge(partial);
        }
        self.finish_tick(report)
    }

    /// Run `ticks` sequential ticks and return how many synchronizations
    /// completed.
    pub fn run(&mut self, ticks: u64) -> usize {
        (0..ticks)
            .map(|_| self.tick().synchronizations_completed.len())
            .sum()
    }

    pub fn telemetry(&self, recent: usize) -> SimulationTelemetry {
        SimulationTelemetry::collect(self.tick_count, &self.beacons, &self.satellites, &self.ledger, recent)
    }

    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }

    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn beacons(&self) -> &[Beacon] {
        &self.beacons
    }

    pub fn satellites(&self) -> &[Arc<Satellite>] {
        &self.satellites
    }

    pub fn beacon(&self, id: BeaconId) -> Option<&Beacon> {
        self.beacons.iter().find(|beacon| beacon.id() == id)
    }

    pub fn beacon_mut(&mut self, id: BeaconId) -> Option<&mut Beacon> {
        self.beacons.iter_mut().find(|beacon| beacon.id() == id)
    }

    pub fn satellite(&self, id: SatelliteId) -> Option<&Arc<Satellite>> {
        self.satellites.iter().find(|satellite| satellite.id() == id)
    }

    pub fn ledger(&self) -> &SyncLedger {
        &self.ledger
    }

    fn move_satellites(&self) {
        let step = self.config.satellite.step;
        for satellite in &self.satellites {
            satellite.tick(step);
        }
    }

    fn finish_tick(&mut self, report: TickReport) -> TickReport {
        for summary in &report.synchronizations_completed {
            self.ledger.record(summary, report.tick);
        }
        trace!(
            tick = report.tick,
            transitions = report.transitions,
            started = report.synchronizations_started.len(),
            completed = report.synchronizations_completed.len(),
            "tick complete"
        );
        report
    }

    fn next_beacon_id(&mut self) -> BeaconId {
        loop {
            self.next_beacon_seq += 1;
            let id = BeaconId::numbered(self.next_beacon_seq);
            if self.beacon(id).is_none() {
                return id;
            }
        }
    }

    fn next_satellite_id(&mut self) -> SatelliteId {
        loop {
            self.next_satellite_seq += 1;
            let id = SatelliteId::numbered(self.next_satellite_seq);
            if self.satellite(id).is_none() {
                return id;
            }
        }
    }

    fn random_heading(&mut self) -> Heading {
        if self.rng.gen_bool(0.5) {
            Heading::Right
        } else {
            Heading::Left
        }
    }
}

fn join_all(handles: Vec<std::thread::ScopedJoinHandle<'_, TickReport>>) -> Vec<TickReport> {
    handles
        .into_iter()
        .map(|handle| handle.join().unwrap_or_else(|panic| std::panic::resume_unwind(panic)))
        .collect()
}

/// Offer `beacon` to satellites in order; at most one session per tick.
fn pair(beacon: &mut Beacon, satellites: &[Arc<Satellite>]) -> Option<SatelliteId> {
    if !beacon.is_sync_eligible() {
        return None;
    }
    satellites
        .iter()
        .find(|satellite| beacon.try_synchronize(satellite))
        .map(|satellite| satellite.id())
}
