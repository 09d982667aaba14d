//! # Beacon/Satellite Synchronization Simulator
//!
//! A tick-driven simulation of autonomous ocean beacons that collect data
//! while drifting, rise to the surface when their memory is full, offload
//! it to a passing relay satellite, and descend again.
//!
//! ## Features
//!
//! - **Typed event registry**: per-entity publish/subscribe with snapshot
//!   delivery, safe against (un)subscription from inside a listener
//! - **Beacon lifecycle**: collect → rise → synchronize → descend
//! - **Exclusive synchronization**: a satellite serves one beacon at a time,
//!   even when beacons are ticked on several threads
//! - **Pluggable movement**: linear, sinusoidal, vertical and static drift
//! - **Deterministic runs**: seeded parameter sampling and an injectable clock
//!
//! ## Quick Start
//!
//! ```rust
//! use beaconsat::{Heading, Simulation, SimulationConfig};
//!
//! let mut sim = Simulation::new(SimulationConfig::default()).unwrap();
//! sim.spawn_beacon(120, 420, Heading::Right).unwrap();
//! sim.spawn_satellite(0, Heading::Right).unwrap();
//!
//! let completed = sim.run(1_000);
//! println!("{} synchronizations, {}", completed, sim.telemetry(5).to_json().unwrap());
//! ```
//!
//! ## Architecture
//!
//! - [`announcer`] - Generic typed publish/subscribe registry
//! - [`events`] - Beacon and satellite events and listener capabilities
//! - [`movement`] - Beacon kinematics and movement strategies
//! - [`satellite`] - Relay satellite with its synchronization lock
//! - [`beacon`] - Beacon lifecycle state machine
//! - [`simulation`] - Tick loop and beacon/satellite pairing
//! - [`telemetry`] - Synchronization history and JSON snapshots
//! - [`config`] - Serializable configuration with validation

#![deny(clippy::all)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::cast_possible_truncation)]
#![allow(clippy::cast_sign_loss)]

pub mod announcer;
pub mod beacon;
pub mod clock;
pub mod config;
pub mod error;
pub mod events;
pub mod ids;
pub mod movement;
pub mod satellite;
pub mod simulation;
pub mod telemetry;

// Re-export main public types for convenience
pub use announcer::{Announcer, DeliveryReport, Event, ListenerError, ListenerResult};
pub use beacon::{Beacon, BeaconParams, BeaconState, SyncSummary, TickOutcome};
pub use clock::{Clock, ManualClock, SystemClock};
pub use config::{AlignmentPolicy, SimulationConfig, SyncOptions, TransferMode};
pub use error::SimError;
pub use events::{BeaconEvent, BeaconListener, SatelliteEvent, SatelliteListener};
pub use ids::{BeaconId, SatelliteId};
pub use movement::{Heading, Kinematics, MovementStrategy, OceanBounds};
pub use satellite::Satellite;
pub use simulation::{Simulation, TickReport};
