//! Valley ground demo
//!
//! Runs one session against a file slot: restore or generate the map, poke a
//! cell, then save on the way out.

use std::time::{Duration, Instant};

use ground::{
    ActorWorld, CellType, FileSlot, Season, SessionConfig, TimeSource, TimeState, Weather,
    WeatherSource, WeatherState, WorldSession,
};
use tracing::{info, warn, Level};
use tracing_subscriber::FmtSubscriber;

/// Stand-ins for the game's time and weather systems.
struct Clock(TimeState);
struct Sky(WeatherState);

impl TimeSource for Clock {
    fn time_state(&self) -> TimeState {
        self.0
    }

    fn set_time_state(&mut self, state: TimeState) {
        self.0 = state;
    }
}

impl WeatherSource for Sky {
    fn weather_state(&self) -> WeatherState {
        self.0
    }

    fn set_weather_state(&mut self, state: WeatherState) {
        self.0 = state;
    }
}

fn main() -> anyhow::Result<()> {
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "ground.json".to_string());
    let config = SessionConfig::load(&config_path)?;

    let level = config.log_level.parse::<Level>().unwrap_or(Level::INFO);
    let subscriber = FmtSubscriber::builder().with_max_level(level).finish();
    tracing::subscriber::set_global_default(subscriber)?;

    info!("Valley ground starting, save slot {}", config.slot_path().display());

    let slot = FileSlot::new(config.slot_path());
    let on_generated = || info!("Ground generation complete");
    let mut session = WorldSession::initialize(&config, slot, ActorWorld::default(), on_generated);

    let mut clock = Clock(TimeState {
        minute: 0,
        hour: 6,
        day_in_season: 1,
        season: Season::Spring,
        real_time: 0.0,
    });
    let mut sky = Sky(WeatherState {
        weather: Weather::Sunny,
        base_temperature: 20,
    });
    if session.store().is_initialized() {
        session.sync_into(&mut clock, &mut sky);
        info!("Restored {:?} day {}, {:?}", clock.0.season, clock.0.day_in_season, sky.0.weather);
    } else {
        session.sync_from(&clock, &sky);
    }

    session.signal_ready(Instant::now());
    let report = loop {
        if let Some(report) = session.tick(Instant::now())? {
            break report;
        }
        std::thread::sleep(Duration::from_millis(50));
    };

    let counts = session.store().type_counts();
    info!(
        "Grid {}x{}: {} occupants spawned, {} solid cells",
        session.store().x_length(),
        session.store().y_length(),
        report.spawned,
        counts.solid()
    );
    for cell_type in CellType::ALL {
        info!("  {:?}: {}", cell_type, counts.get(cell_type));
    }

    match session.get_temperature_by_location(800.0, 520.0) {
        Ok(t) => info!("Temperature at (800, 520): {}", t),
        Err(e) => warn!("Temperature query failed: {}", e),
    }
    let outcome = session.destroy_by_location(800.0, 520.0);
    info!(
        "Destroy at (800, 520): {:?}, cell is now {:?}",
        outcome,
        session.get_type_by_location(800.0, 520.0)
    );

    clock.0.minute += 30;
    session.sync_from(&clock, &sky);

    let stats = session.deinitialize()?;
    info!(
        "Saved {} cells, {} item blocks, {} bytes",
        stats.cells, stats.item_blocks, stats.file_bytes
    );
    Ok(())
}
