use beaconsat::events::{BeaconSnapshot, SatelliteSnapshot};
use beaconsat::telemetry::SimulationTelemetry;
use beaconsat::{BeaconListener, BeaconState, ListenerResult, Simulation, SimulationConfig};
use clap::{value_t, App, Arg};
use colored::*;
use std::sync::Arc;
use std::time::Duration;
use tokio::time;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

const DEFAULT_BEACONS: &str = "5";
const DEFAULT_SATELLITES: &str = "2";
const DEFAULT_TELEMETRY_EVERY: &str = "100";
const RECENT_SYNCS_IN_TELEMETRY: usize = 5;

/// Presentation-side observer: turns lifecycle events into log lines.
struct EventLogger;

impl BeaconListener for EventLogger {
    fn on_state_change(
        &self,
        beacon: &BeaconSnapshot,
        previous: BeaconState,
        new_state: BeaconState,
    ) -> ListenerResult {
        info!(
            "🔄 {} {:?} → {:?} at ({}, {}) memory {}/{}",
            beacon.id, previous, new_state, beacon.x, beacon.y, beacon.memory, beacon.max_memory
        );
        Ok(())
    }

    fn on_synchronization_start(
        &self,
        beacon: &BeaconSnapshot,
        satellite: &SatelliteSnapshot,
    ) -> ListenerResult {
        info!("📡 {} syncing with {} ({} units)", beacon.id, satellite.id, beacon.memory);
        Ok(())
    }

    fn on_synchronization_end(
        &self,
        beacon: &BeaconSnapshot,
        satellite: &SatelliteSnapshot,
        transferred: u32,
    ) -> ListenerResult {
        info!(
            "✅ {} offloaded {} units to {} (relay total {})",
            beacon.id, transferred, satellite.id, satellite.data_received
        );
        Ok(())
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let matches = App::new("beacon-sim")
        .version("0.1.0")
        .author("Space Systems Engineering Team")
        .about("🌊 Ocean beacon / relay satellite synchronization simulator")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .value_name("FILE")
                .help("JSON configuration file")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("seed")
                .short("s")
                .long("seed")
                .value_name("SEED")
                .help("Random seed (overrides the configuration)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("beacons")
                .short("b")
                .long("beacons")
                .value_name("COUNT")
                .help("Number of beacons to spawn")
                .takes_value(true)
                .default_value(DEFAULT_BEACONS),
        )
        .arg(
            Arg::with_name("satellites")
                .short("n")
                .long("satellites")
                .value_name("COUNT")
                .help("Number of satellites to spawn")
                .takes_value(true)
                .default_value(DEFAULT_SATELLITES),
        )
        .arg(
            Arg::with_name("ticks")
                .short("t")
                .long("ticks")
                .value_name("TICKS")
                .help("Stop after this many ticks (default: run until Ctrl-C)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("period")
                .short("p")
                .long("period")
                .value_name("MS")
                .help("Tick period in milliseconds (overrides the configuration)")
                .takes_value(true),
        )
        .arg(
            Arg::with_name("workers")
                .short("w")
                .long("workers")
                .value_name("THREADS")
                .help("Worker threads ticking beacons")
                .takes_value(true)
                .default_value("1"),
        )
        .arg(
            Arg::with_name("telemetry-every")
                .long("telemetry-every")
                .value_name("TICKS")
                .help("Emit telemetry every N ticks (0 disables)")
                .takes_value(true)
                .default_value(DEFAULT_TELEMETRY_EVERY),
        )
        .arg(
            Arg::with_name("format")
                .short("f")
                .long("format")
                .value_name("FORMAT")
                .help("Final summary format")
                .takes_value(true)
                .possible_values(&["json", "table"])
                .default_value("table"),
        )
        .get_matches();

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut config = match matches.value_of("config") {
        Some(path) => SimulationConfig::from_file(path)?,
        None => SimulationConfig::default(),
    };
    if matches.is_present("seed") {
        config.seed = value_t!(matches, "seed", u64).unwrap_or_else(|e| e.exit());
    }
    if matches.is_present("period") {
        config.tick_period_ms = value_t!(matches, "period", u64).unwrap_or_else(|e| e.exit());
    }
    let beacon_count = value_t!(matches, "beacons", usize).unwrap_or_else(|e| e.exit());
    let satellite_count = value_t!(matches, "satellites", usize).unwrap_or_else(|e| e.exit());
    let workers = value_t!(matches, "workers", usize).unwrap_or_else(|e| e.exit());
    let telemetry_every = value_t!(matches, "telemetry-every", u64).unwrap_or_else(|e| e.exit());
    let max_ticks = if matches.is_present("ticks") {
        Some(value_t!(matches, "ticks", u64).unwrap_or_else(|e| e.exit()))
    } else {
        None
    };

    println!("🌊 Beacon / Satellite Synchronization Simulator");
    println!("==============================================");

    let mut sim = Simulation::new(config)?;
    let logger: Arc<dyn BeaconListener> = Arc::new(EventLogger);
    for _ in 0..satellite_count {
        sim.spawn_random_satellite()?;
    }
    for _ in 0..beacon_count {
        let id = sim.spawn_random_beacon()?;
        if let Some(beacon) = sim.beacon(id) {
            beacon.register_state_listener(Arc::clone(&logger));
            beacon.register_synchronization_listener(Arc::clone(&logger));
        }
    }
    info!(
        "🚀 {} beacons, {} satellites, seed {}, tick {} ms",
        beacon_count,
        satellite_count,
        sim.config().seed,
        sim.config().tick_period_ms
    );

    let mut interval = time::interval(Duration::from_millis(sim.config().tick_period_ms));
    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);

    loop {
        tokio::select! {
            result = &mut shutdown => {
                if let Err(e) = result {
                    error!("Failed to listen for shutdown signal: {}", e);
                }
                info!("🛑 Shutdown requested");
                break;
            }
            _ = interval.tick() => {
                let report = sim.tick_concurrent(workers);

                if telemetry_every > 0 && report.tick % telemetry_every == 0 {
                    match sim.telemetry(RECENT_SYNCS_IN_TELEMETRY).to_json() {
                        Ok(json) => info!("📊 TELEMETRY: {}", json),
                        Err(e) => error!("Failed to serialize telemetry: {}", e),
                    }
                }

                if max_ticks.is_some_and(|limit| report.tick >= limit) {
                    break;
                }
            }
        }
    }

    let telemetry = sim.telemetry(RECENT_SYNCS_IN_TELEMETRY);
    match matches.value_of("format") {
        Some("json") => println!("{}", serde_json::to_string_pretty(&telemetry)?),
        _ => print_summary(&telemetry),
    }

    Ok(())
}

fn print_summary(telemetry: &SimulationTelemetry) {
    println!();
    println!("{}", "Simulation summary".bold().cyan());
    println!("  Ticks run:            {}", telemetry.tick.to_string().bold());
    println!("  Completed syncs:      {}", telemetry.completed_syncs.to_string().green());
    println!("  Data relayed:         {}", telemetry.relayed.to_string().green());
    println!("  Data still buffered:  {}", telemetry.buffered.to_string().yellow());

    println!();
    println!("{}", "Beacons by state".bold().cyan());
    for state in BeaconState::ALL {
        println!("  {:<28} {}", state.description(), telemetry.beacon_states.get(state));
    }

    println!();
    println!("{}", "Satellites".bold().cyan());
    for satellite in &telemetry.satellites {
        let status = match satellite.lock_holder {
            Some(beacon) => format!("locked by {}", beacon).yellow(),
            None => "available".green(),
        };
        println!(
            "  {:<14} x={:<5} received={:<8} {}",
            satellite.id.to_string(),
            satellite.x,
            satellite.data_received,
            status
        );
    }
}
