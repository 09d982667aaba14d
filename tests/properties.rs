use beaconsat::config::{SatelliteOptions, SyncOptions};
use beaconsat::{
    AlignmentPolicy, Beacon, BeaconId, BeaconParams, BeaconState, Heading, Kinematics, OceanBounds,
    Satellite, SatelliteId, TransferMode,
};
use proptest::prelude::*;
use std::sync::Arc;

fn params_strategy() -> impl Strategy<Value = BeaconParams> {
    (1u32..=300, 1u32..=50, 1u32..=20, 1u32..=20).prop_map(
        |(max_memory, collect_rate, rise_speed, descent_speed)| BeaconParams {
            max_memory,
            collect_rate,
            rise_speed,
            descent_speed,
        },
    )
}

#[derive(Debug, Clone, Copy)]
enum LockOp {
    Lock(u8),
    Unlock(u8),
}

fn lock_op() -> impl Strategy<Value = LockOp> {
    prop_oneof![(0u8..4).prop_map(LockOp::Lock), (0u8..4).prop_map(LockOp::Unlock)]
}

proptest! {
    #[test]
    fn prop_cycle_conserves_data(
        params in params_strategy(),
        depth in 301i32..=600,
        rate in 1u32..=60,
    ) {
        let sync = SyncOptions {
            transfer: TransferMode::RateBased { units_per_tick: rate },
            ..SyncOptions::default()
        };
        let kinematics = Kinematics::new(200, depth, Heading::Still, OceanBounds::default());
        let mut beacon = Beacon::new(BeaconId::numbered(1), kinematics, params)
            .unwrap()
            .with_sync_options(sync)
            .unwrap();
        let satellite = Arc::new(Satellite::new(
            SatelliteId::numbered(1),
            200,
            Heading::Still,
            &SatelliteOptions::default(),
        ));

        let mut cycles = 0;
        let mut ticks = 0u32;
        while cycles < 2 {
            let outcome = beacon.tick();
            beacon.try_synchronize(&satellite);
            ticks += 1;

            prop_assert!(beacon.memory() <= params.max_memory);
            prop_assert!(beacon.y() >= 300 && beacon.y() <= depth);
            prop_assert_eq!(beacon.current_satellite().is_some(), beacon.state() == BeaconState::Synchronizing);
            if let Some((transferred, total)) = beacon.sync_progress() {
                prop_assert_eq!(transferred + beacon.memory(), total);
            }
            if let Some(summary) = outcome.completed {
                prop_assert_eq!(summary.transferred, params.max_memory);
                cycles += 1;
            }
            prop_assert!(ticks < 10_000);
        }

        prop_assert_eq!(satellite.data_received(), 2 * u64::from(params.max_memory));
        prop_assert_eq!(beacon.total_offloaded(), satellite.data_received());
    }

    #[test]
    fn prop_lock_matches_single_holder_model(ops in prop::collection::vec(lock_op(), 1..64)) {
        let satellite = Satellite::new(SatelliteId::numbered(1), 0, Heading::Right, &SatelliteOptions::default());
        let mut holder: Option<u8> = None;

        for op in ops {
            match op {
                LockOp::Lock(n) => {
                    let expected = holder.map_or(true, |h| h == n);
                    prop_assert_eq!(satellite.try_lock(&BeaconId::numbered(u64::from(n))), expected);
                    if expected {
                        holder = Some(n);
                    }
                }
                LockOp::Unlock(n) => {
                    let expected = holder == Some(n);
                    prop_assert_eq!(satellite.unlock(&BeaconId::numbered(u64::from(n))), expected);
                    if expected {
                        holder = None;
                    }
                }
            }
            prop_assert_eq!(satellite.lock_holder(), holder.map(|n| BeaconId::numbered(u64::from(n))));
            prop_assert_eq!(satellite.is_available(), holder.is_none());
        }
    }

    #[test]
    fn prop_tolerance_alignment_is_symmetric(a in -1000i32..1000, b in -1000i32..1000, pixels in 0u32..50) {
        let policy = AlignmentPolicy::Tolerance { pixels };
        prop_assert_eq!(policy.accepts(a, b), policy.accepts(b, a));
        prop_assert_eq!(policy.accepts(a, b), (a - b).unsigned_abs() <= pixels);
    }
}
