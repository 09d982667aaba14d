//! Events emitted by beacons and satellites, and the listener
//! capabilities that receive them.
//!
//! Events carry value snapshots of their source rather than references,
//! so a listener can observe an entity but never mutate it mid-tick.

use crate::announcer::{Event, ListenerResult};
use crate::beacon::BeaconState;
use crate::ids::{BeaconId, SatelliteId};
use crate::movement::Heading;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BeaconSnapshot {
    pub id: BeaconId,
    pub x: i32,
    pub y: i32,
    pub heading: Heading,
    pub state: BeaconState,
    pub memory: u32,
    pub max_memory: u32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SatelliteSnapshot {
    pub id: SatelliteId,
    pub x: i32,
    pub y: i32,
    pub heading: Heading,
    pub available: bool,
    pub lock_holder: Option<BeaconId>,
    pub data_received: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BeaconEventKind {
    Move,
    StateChange,
    SynchronizationStart,
    SynchronizationEnd,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum BeaconEvent {
    Move(BeaconSnapshot),
    StateChange {
        beacon: BeaconSnapshot,
        previous: BeaconState,
        new_state: BeaconState,
    },
    SynchronizationStart {
        beacon: BeaconSnapshot,
        satellite: SatelliteSnapshot,
    },
    SynchronizationEnd {
        beacon: BeaconSnapshot,
        satellite: SatelliteSnapshot,
        transferred: u32,
    },
}

impl BeaconEvent {
    pub fn beacon(&self) -> &BeaconSnapshot {
        match self {
            BeaconEvent::Move(beacon)
            | BeaconEvent::StateChange { beacon, .. }
            | BeaconEvent::SynchronizationStart { beacon, .. }
            | BeaconEvent::SynchronizationEnd { beacon, .. } => beacon,
        }
    }
}

/// Receives beacon events. Implement only the methods for the kinds a
/// listener subscribes to; the rest default to no-ops.
pub trait BeaconListener: Send + Sync {
    fn on_beacon_move(&self, _beacon: &BeaconSnapshot) -> ListenerResult {
        Ok(())
    }

    fn on_state_change(
        &self,
        _beacon: &BeaconSnapshot,
        _previous: BeaconState,
        _new_state: BeaconState,
    ) -> ListenerResult {
        Ok(())
    }

    fn on_synchronization_start(
        &self,
        _beacon: &BeaconSnapshot,
        _satellite: &SatelliteSnapshot,
    ) -> ListenerResult {
        Ok(())
    }

    fn on_synchronization_end(
        &self,
        _beacon: &BeaconSnapshot,
        _satellite: &SatelliteSnapshot,
        _transferred: u32,
    ) -> ListenerResult {
        Ok(())
    }
}

impl Event for BeaconEvent {
    type Kind = BeaconEventKind;
    type Listener = dyn BeaconListener;

    fn kind(&self) -> BeaconEventKind {
        match self {
            BeaconEvent::Move(_) => BeaconEventKind::Move,
            BeaconEvent::StateChange { .. } => BeaconEventKind::StateChange,
            BeaconEvent::SynchronizationStart { .. } => BeaconEventKind::SynchronizationStart,
            BeaconEvent::SynchronizationEnd { .. } => BeaconEventKind::SynchronizationEnd,
        }
    }

    fn deliver(&self, listener: &dyn BeaconListener) -> ListenerResult {
        match self {
            BeaconEvent::Move(beacon) => listener.on_beacon_move(beacon),
            BeaconEvent::StateChange { beacon, previous, new_state } => {
                listener.on_state_change(beacon, *previous, *new_state)
            }
            BeaconEvent::SynchronizationStart { beacon, satellite } => {
                listener.on_synchronization_start(beacon, satellite)
            }
            BeaconEvent::SynchronizationEnd { beacon, satellite, transferred } => {
                listener.on_synchronization_end(beacon, satellite, *transferred)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SatelliteEventKind {
    Move,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum SatelliteEvent {
    Move(SatelliteSnapshot),
}

pub trait SatelliteListener: Send + Sync {
    fn on_satellite_move(&self, satellite: &SatelliteSnapshot) -> ListenerResult;
}

impl Event for SatelliteEvent {
    type Kind = SatelliteEventKind;
    type Listener = dyn SatelliteListener;

    fn kind(&self) -> SatelliteEventKind {
        match self {
            SatelliteEvent::Move(_) => SatelliteEventKind::Move,
        }
    }

    fn deliver(&self, listener: &dyn SatelliteListener) -> ListenerResult {
        match self {
            SatelliteEvent::Move(satellite) => listener.on_satellite_move(satellite),
        }
    }
}
