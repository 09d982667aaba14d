use crate::announcer::{Announcer, DeliveryReport};
use crate::config::{AlignmentPolicy, SatelliteOptions};
use crate::events::{SatelliteEvent, SatelliteEventKind, SatelliteListener, SatelliteSnapshot};
use crate::ids::{BeaconId, SatelliteId};
use crate::movement::Heading;
use std::sync::atomic::{AtomicI32, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, trace};

/// Orbiting relay that accepts data from one beacon at a time.
///
/// A satellite is shared between the simulation loop and every beacon
/// synchronizing with it, so all operations take `&self`. The lock holder
/// is the only state beacons contend on.
#[derive(Debug)]
pub struct Satellite {
    id: SatelliteId,
    y: i32,
    heading: Heading,
    screen_width: i32,
    freeze_while_locked: bool,

    x: AtomicI32,
    data_received: AtomicU64,
    lock_holder: Mutex<Option<BeaconId>>,

    announcer: Arc<Announcer<SatelliteEvent>>,
}

impl Satellite {
    pub fn new(id: SatelliteId, x: i32, heading: Heading, options: &SatelliteOptions) -> Self {
        Self {
            id,
            y: options.altitude_y,
            heading,
            screen_width: options.screen_width,
            freeze_while_locked: options.freeze_while_locked,
            x: AtomicI32::new(x),
            data_received: AtomicU64::new(0),
            lock_holder: Mutex::new(None),
            announcer: Arc::new(Announcer::new()),
        }
    }

    pub fn id(&self) -> SatelliteId {
        self.id
    }

    pub fn x(&self) -> i32 {
        self.x.load(Ordering::Acquire)
    }

    pub fn y(&self) -> i32 {
        self.y
    }

    pub fn heading(&self) -> Heading {
        self.heading
    }

    pub fn screen_width(&self) -> i32 {
        self.screen_width
    }

    /// Reposition the satellite outside the tick loop.
    pub fn set_x(&self, x: i32) {
        self.x.store(x, Ordering::Release);
    }

    /// Advance along the heading by `step`, wrapping around the screen.
    /// The move event is published even when the satellite is frozen.
    pub fn move_by(&self, step: i32) -> DeliveryReport {
        let frozen = self.freeze_while_locked && !self.is_available();
        if !frozen {
            let mut x = self.x().saturating_add(self.heading.sign().saturating_mul(step));
            if x > self.screen_width {
                x = 0;
            } else if x < 0 {
                x = self.screen_width;
            }
            self.set_x(x);
        }

        trace!(satellite = %self.id, x = self.x(), frozen, "satellite moved");
        self.announcer.publish(&SatelliteEvent::Move(self.snapshot()))
    }

    pub fn tick(&self, step: i32) -> DeliveryReport {
        self.move_by(step)
    }

    /// Acquire the lock for `beacon`. Re-acquiring by the current holder
    /// succeeds without side effects; any other beacon is refused.
    pub fn try_lock(&self, beacon: &BeaconId) -> bool {
        let mut holder = self.holder();
        match *holder {
            None => {
                *holder = Some(*beacon);
                debug!(satellite = %self.id, %beacon, "satellite locked");
                true
            }
            Some(current) => current == *beacon,
        }
    }

    /// Release the lock if, and only if, `beacon` holds it. Returns whether
    /// a lock was released.
    pub fn unlock(&self, beacon: &BeaconId) -> bool {
        let mut holder = self.holder();
        if holder.as_ref() == Some(beacon) {
            *holder = None;
            debug!(satellite = %self.id, %beacon, "satellite unlocked");
            true
        } else {
            false
        }
    }

    pub fn is_available(&self) -> bool {
        self.holder().is_none()
    }

    pub fn lock_holder(&self) -> Option<BeaconId> {
        *self.holder()
    }

    /// Whether the satellite is free and horizontally over `x`.
    pub fn is_aligned_with(&self, x: i32, policy: AlignmentPolicy) -> bool {
        self.is_available() && policy.accepts(self.x(), x)
    }

    pub fn receive_data(&self, amount: u32) {
        self.data_received.fetch_add(u64::from(amount), Ordering::AcqRel);
    }

    pub fn data_received(&self) -> u64 {
        self.data_received.load(Ordering::Acquire)
    }

    pub fn snapshot(&self) -> SatelliteSnapshot {
        let lock_holder = self.lock_holder();
        SatelliteSnapshot {
            id: self.id,
            x: self.x(),
            y: self.y,
            heading: self.heading,
            available: lock_holder.is_none(),
            lock_holder,
            data_received: self.data_received(),
        }
    }

    pub fn announcer(&self) -> &Arc<Announcer<SatelliteEvent>> {
        &self.announcer
    }

    pub fn register_move_listener(&self, listener: Arc<dyn SatelliteListener>) {
        self.announcer.subscribe(SatelliteEventKind::Move, listener);
    }

    pub fn unregister_move_listener(&self, listener: &Arc<dyn SatelliteListener>) -> usize {
        self.announcer.unsubscribe(SatelliteEventKind::Move, listener)
    }

    fn holder(&self) -> MutexGuard<'_, Option<BeaconId>> {
        // The guarded value is a plain Option, always consistent.
        self.lock_holder.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

static_assertions::assert_impl_all!(Satellite: Send, Sync);
