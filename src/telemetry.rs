use crate::beacon::{Beacon, BeaconState, SyncSummary};
use crate::events::SatelliteSnapshot;
use crate::ids::{BeaconId, SatelliteId};
use crate::satellite::Satellite;
use heapless::Vec;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

const MAX_SYNC_HISTORY: usize = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncRecord {
    pub beacon: BeaconId,
    pub satellite: SatelliteId,
    pub transferred: u32,
    pub duration_ticks: u32,
    pub completed_at_tick: u64,
}

/// Bounded history of completed synchronizations; the oldest record is
/// evicted when full.
#[derive(Debug, Default)]
pub struct SyncLedger {
    history: Vec<SyncRecord, MAX_SYNC_HISTORY>,
    total_completed: u64,
    total_transferred: u64,
}

impl SyncLedger {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record(&mut self, summary: &SyncSummary, completed_at_tick: u64) {
        let record = SyncRecord {
            beacon: summary.beacon,
            satellite: summary.satellite,
            transferred: summary.transferred,
            duration_ticks: summary.ticks,
            completed_at_tick,
        };

        if self.history.is_full() {
            self.history.remove(0);
        }
        // Room was made above, the push cannot fail.
        let _ = self.history.push(record);

        self.total_completed += 1;
        self.total_transferred += u64::from(summary.transferred);
    }

    pub fn history(&self) -> &[SyncRecord] {
        &self.history
    }

    pub fn total_completed(&self) -> u64 {
        self.total_completed
    }

    pub fn total_transferred(&self) -> u64 {
        self.total_transferred
    }

    /// The `count` most recent records, oldest first.
    pub fn recent(&self, count: usize) -> &[SyncRecord] {
        let start = self.history.len().saturating_sub(count);
        &self.history[start..]
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateCounts {
    pub collecting: u32,
    pub rising: u32,
    pub synchronizing: u32,
    pub descending: u32,
}

impl StateCounts {
    pub fn count(&mut self, state: BeaconState) {
        match state {
            BeaconState::Collecting => self.collecting += 1,
            BeaconState::Rising => self.rising += 1,
            BeaconState::Synchronizing => self.synchronizing += 1,
            BeaconState::Descending => self.descending += 1,
        }
    }

    pub fn get(&self, state: BeaconState) -> u32 {
        match state {
            BeaconState::Collecting => self.collecting,
            BeaconState::Rising => self.rising,
            BeaconState::Synchronizing => self.synchronizing,
            BeaconState::Descending => self.descending,
        }
    }

    pub fn total(&self) -> u32 {
        self.collecting + self.rising + self.synchronizing + self.descending
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimulationTelemetry {
    pub tick: u64,
    pub beacon_states: StateCounts,
    /// Data currently held in beacon memories.
    pub buffered: u64,
    /// Data accepted by all satellites since start.
    pub relayed: u64,
    pub completed_syncs: u64,
    pub satellites: std::vec::Vec<SatelliteSnapshot>,
    pub recent_syncs: std::vec::Vec<SyncRecord>,
}

impl SimulationTelemetry {
    pub fn collect(
        tick: u64,
        beacons: &[Beacon],
        satellites: &[Arc<Satellite>],
        ledger: &SyncLedger,
        recent: usize,
    ) -> Self {
        let mut beacon_states = StateCounts::default();
        let mut buffered = 0u64;
        for beacon in beacons {
            beacon_states.count(beacon.state());
            buffered += u64::from(beacon.memory());
        }

        let satellites: std::vec::Vec<SatelliteSnapshot> =
            satellites.iter().map(|satellite| satellite.snapshot()).collect();
        let relayed = satellites.iter().map(|snapshot| snapshot.data_received).sum();

        Self {
            tick,
            beacon_states,
            buffered,
            relayed,
            completed_syncs: ledger.total_completed(),
            satellites,
            recent_syncs: ledger.recent(recent).to_vec(),
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn summary(n: u64, transferred: u32) -> SyncSummary {
        SyncSummary {
            beacon: BeaconId::numbered(n),
            satellite: SatelliteId::numbered(1),
            transferred,
            ticks: 3,
        }
    }

    #[test]
    fn test_ledger_evicts_oldest() {
        let mut ledger = SyncLedger::new();
        for n in 0..(MAX_SYNC_HISTORY as u64 + 5) {
            ledger.record(&summary(n, 10), n);
        }

        assert_eq!(ledger.history().len(), MAX_SYNC_HISTORY);
        assert_eq!(ledger.history()[0].beacon, BeaconId::numbered(5));
        // Each record pushed while full still lands at the tail.
        let newest = ledger.history()[MAX_SYNC_HISTORY - 1];
        assert_eq!(newest.beacon, BeaconId::numbered(MAX_SYNC_HISTORY as u64 + 4));
        assert_eq!(newest.completed_at_tick, MAX_SYNC_HISTORY as u64 + 4);
        assert_eq!(ledger.total_completed(), MAX_SYNC_HISTORY as u64 + 5);
        assert_eq!(ledger.total_transferred(), 10 * (MAX_SYNC_HISTORY as u64 + 5));
    }

    #[test]
    fn test_recent_returns_tail() {
        let mut ledger = SyncLedger::new();
        for n in 0..4 {
            ledger.record(&summary(n, 1), n);
        }
        let recent = ledger.recent(2);
        assert_eq!(recent.len(), 2);
        assert_eq!(recent[1].beacon, BeaconId::numbered(3));
        assert_eq!(ledger.recent(100).len(), 4);
    }

    #[test]
    fn test_state_counts() {
        let mut counts = StateCounts::default();
        counts.count(BeaconState::Rising);
        counts.count(BeaconState::Rising);
        counts.count(BeaconState::Collecting);
        assert_eq!(counts.get(BeaconState::Rising), 2);
        assert_eq!(counts.total(), 3);
    }
}
