//! World session - owns the ground grid for one run of the game.
//!
//! Loads the save slot on initialize, generates and populates the map once
//! the host is ready, answers location queries, and saves on deinitialize.

use std::time::Instant;

use tracing::{error, info, warn};

use crate::components::{CellType, OccupantHandle, WorldPosition};
use crate::config::SessionConfig;
use crate::error::Result;
use crate::generator::WorldGenerator;
use crate::grid::GridStore;
use crate::lifecycle::{CellLifecycleManager, DestroyOutcome, EventSink, PopulateReport, Spawner};
use crate::persistence::{PersistenceCodec, SaveStats};
use crate::resolver::CoordinateResolver;
use crate::scalars::{TimeSource, WeatherSource, WorldScalars};
use crate::storage::SaveSlot;
use crate::trigger::GenerationTrigger;

/// Result of [`WorldSession::change_type_by_location`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TypeChange {
    /// The cell is `Empty`; only generation populates it.
    Skipped,
    /// The cell already had the requested type.
    Unchanged,
    /// Type written and any occupant replaced by one of the new type.
    Changed,
    /// Type written and the new occupant attached, but the spawner refused
    /// to destroy the previous one, which is no longer tracked by the grid.
    StaleOccupant(OccupantHandle),
    /// The target was `Empty`, so the cell was destroyed.
    Destroyed(DestroyOutcome),
}

pub struct WorldSession<S, E, P> {
    store: GridStore,
    scalars: WorldScalars,
    spawner: S,
    events: E,
    slot: P,
    trigger: GenerationTrigger,
    generator: WorldGenerator,
    lifecycle: CellLifecycleManager,
    codec: PersistenceCodec,
}

impl<S, E, P> WorldSession<S, E, P>
where
    S: Spawner,
    E: EventSink,
    P: SaveSlot,
{
    /// Start a session and restore whatever the slot holds.
    pub fn initialize(config: &SessionConfig, slot: P, spawner: S, events: E) -> Self {
        let mut session = Self {
            store: GridStore::new(),
            scalars: WorldScalars::default(),
            spawner,
            events,
            slot,
            trigger: GenerationTrigger::new(config.generation_delay()),
            generator: WorldGenerator::new(),
            lifecycle: CellLifecycleManager::new(),
            codec: PersistenceCodec::new(),
        };
        session.load_game();
        session
    }

    fn load_game(&mut self) -> bool {
        match self.codec.read_slot(&self.slot) {
            Ok(Some((store, scalars))) => {
                self.store = store;
                self.scalars = scalars;
                true
            }
            Ok(None) => false,
            Err(e) => {
                error!("Load failed, starting from an empty world: {}", e);
                false
            }
        }
    }

    /// The host world is ready; schedule map generation.
    pub fn signal_ready(&mut self, now: Instant) {
        self.trigger.arm(now);
    }

    /// Main-loop hook. Runs map generation when the deferred trigger fires.
    pub fn tick(&mut self, now: Instant) -> Result<Option<PopulateReport>> {
        if self.trigger.poll(now) {
            return self.generate_map().map(Some);
        }
        Ok(None)
    }

    /// Lay out the default map if nothing was restored, then spawn occupants.
    pub fn generate_map(&mut self) -> Result<PopulateReport> {
        self.generator.generate_if_empty(&mut self.store)?;
        self.lifecycle
            .populate(&mut self.store, &mut self.spawner, &mut self.events)
    }

    /// Write the current state to the slot. On failure the in-memory state
    /// is untouched and the session carries on.
    pub fn save_game(&mut self) -> Result<SaveStats> {
        self.codec
            .write_slot(&mut self.slot, &self.store, &self.scalars)
            .map_err(|e| {
                error!("Save failed: {}", e);
                e
            })
    }

    /// Teardown: drop any pending generation, then save.
    pub fn deinitialize(&mut self) -> Result<SaveStats> {
        self.trigger.cancel();
        self.save_game()
    }

    // ------------------------------------------------------------------
    // Location queries
    // ------------------------------------------------------------------

    pub fn resolver(&self) -> CoordinateResolver {
        CoordinateResolver::for_store(&self.store)
    }

    /// Cell type at a world location; `Empty` when the location is off-grid.
    pub fn get_type_by_location(&self, x: f32, y: f32) -> CellType {
        match self
            .resolver()
            .resolve_index(&self.store, x, y)
            .and_then(|i| self.store.get_type(i))
        {
            Ok(cell_type) => cell_type,
            Err(e) => {
                error!("get_type_by_location: {}", e);
                CellType::Empty
            }
        }
    }

    /// Absolute temperature at a world location: base temperature plus the
    /// cell's delta, saturating at the `i32` range. Off-grid locations are
    /// returned to the caller as `OutOfBounds`.
    pub fn get_temperature_by_location(&self, x: f32, y: f32) -> Result<i32> {
        let index = self
            .resolver()
            .resolve_index(&self.store, x, y)
            .map_err(|e| {
                error!("get_temperature_by_location: {}", e);
                e
            })?;
        let delta = self.store.get_delta_temperature(index)?;
        Ok(self.scalars.base_temperature().saturating_add(delta))
    }

    /// Clear the cell at a world location and destroy its occupant.
    /// Off-grid locations are logged and ignored.
    pub fn destroy_by_location(&mut self, x: f32, y: f32) -> Option<DestroyOutcome> {
        let resolver = self.resolver();
        self.lifecycle
            .destroy_at(&mut self.store, &resolver, &mut self.spawner, x, y)
    }

    /// Change the ground type of a populated cell, replacing its occupant
    /// with one of the new type. Changing to `Empty` is a destroy; empty
    /// cells are left alone.
    ///
    /// The replacement is spawned before anything is written, so a failed
    /// spawn returns the error and leaves the cell as it was.
    pub fn change_type_by_location(
        &mut self,
        x: f32,
        y: f32,
        cell_type: CellType,
    ) -> Result<TypeChange> {
        let (cx, cy) = self.resolver().resolve(x, y)?;
        let index = self.store.index_of(cx, cy)?;

        if cell_type.is_empty() {
            let outcome = self
                .lifecycle
                .destroy_cell(&mut self.store, &mut self.spawner, index)?;
            return Ok(TypeChange::Destroyed(outcome));
        }
        let current = self.store.get_type(index)?;
        if current.is_empty() {
            warn!("Cell ({}, {}) is empty, not converting to {:?}", cx, cy, cell_type);
            return Ok(TypeChange::Skipped);
        }
        if current == cell_type {
            return Ok(TypeChange::Unchanged);
        }

        let mut change = TypeChange::Changed;
        if let Some(old) = self.store.get_occupant(index)? {
            let position = WorldPosition::of_cell(cx, cy, self.store.cell_size());
            let replacement = self.spawner.spawn(cell_type, position).map_err(|e| {
                error!("Respawn at ({}, {}) failed, cell unchanged: {}", cx, cy, e);
                e
            })?;
            self.store.set_occupant(index, Some(replacement))?;
            if !self.spawner.destroy(old) {
                warn!("Old occupant of ({}, {}) could not be destroyed", cx, cy);
                change = TypeChange::StaleOccupant(old);
            }
        }
        self.store.set_type(index, cell_type)?;
        info!("Cell ({}, {}) changed {:?} -> {:?}", cx, cy, current, cell_type);
        Ok(change)
    }

    /// Set the temperature offset of the cell at a world location.
    pub fn set_delta_temperature_by_location(&mut self, x: f32, y: f32, delta: i32) -> Result<()> {
        let index = self.resolver().resolve_index(&self.store, x, y)?;
        self.store.set_delta_temperature(index, delta)
    }

    // ------------------------------------------------------------------
    // Time / weather hand-off
    // ------------------------------------------------------------------

    /// Pull the latest values from the time and weather systems.
    pub fn sync_from(&mut self, time: &dyn TimeSource, weather: &dyn WeatherSource) {
        self.scalars = WorldScalars::capture(time, weather);
    }

    /// Push the restored values into the time and weather systems.
    pub fn sync_into(&self, time: &mut dyn TimeSource, weather: &mut dyn WeatherSource) {
        self.scalars.apply(time, weather);
    }

    // ------------------------------------------------------------------
    // Accessors
    // ------------------------------------------------------------------

    pub fn store(&self) -> &GridStore {
        &self.store
    }

    pub fn scalars(&self) -> &WorldScalars {
        &self.scalars
    }

    pub fn scalars_mut(&mut self) -> &mut WorldScalars {
        &mut self.scalars
    }

    pub fn spawner(&self) -> &S {
        &self.spawner
    }

    pub fn events(&self) -> &E {
        &self.events
    }

    pub fn slot(&self) -> &P {
        &self.slot
    }

    pub fn trigger(&self) -> &GenerationTrigger {
        &self.trigger
    }
}
