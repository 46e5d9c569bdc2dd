//! Occupant lifecycle: spawning actors for populated cells and tearing them
//! down again when a cell is destroyed.

use std::collections::{BTreeSet, HashMap};

use once_cell::sync::Lazy;
use tracing::{error, info, warn};

use crate::components::{CellType, OccupantHandle, WorldPosition};
use crate::error::{GridError, Result};
use crate::grid::GridStore;
use crate::resolver::CoordinateResolver;

// ============================================================================
// Collaborators
// ============================================================================

/// The actor-spawning side of the engine. It owns every occupant; the grid
/// only keeps the handles it returns.
pub trait Spawner {
    /// Whether a prototype for `cell_type` is registered.
    fn has_class(&self, cell_type: CellType) -> bool;

    fn spawn(&mut self, cell_type: CellType, position: WorldPosition) -> Result<OccupantHandle>;

    /// Returns whether the occupant was actually destroyed.
    fn destroy(&mut self, handle: OccupantHandle) -> bool;
}

/// Fire-and-forget notifications.
pub trait EventSink {
    fn notify_generation_complete(&mut self);
}

impl<F: FnMut()> EventSink for F {
    fn notify_generation_complete(&mut self) {
        self()
    }
}

/// Discards every notification.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoEvents;

impl EventSink for NoEvents {
    fn notify_generation_complete(&mut self) {}
}

// ============================================================================
// Class Registry
// ============================================================================

static STANDARD_CLASSES: Lazy<HashMap<CellType, &'static str>> = Lazy::new(|| {
    HashMap::from([
        (CellType::Grass, "/Game/GroundBlock/BP_GrassGround.BP_GrassGround_C"),
        (CellType::Earth, "/Game/GroundBlock/BP_EarthGround.BP_EarthGround_C"),
        (CellType::Field, "/Game/GroundBlock/BP_FieldGround.BP_FieldGround_C"),
        (CellType::Snow, "/Game/GroundBlock/BP_SnowGround.BP_SnowGround_C"),
        (CellType::Water, "/Game/GroundBlock/BP_WaterGround.BP_WaterGround_C"),
    ])
});

/// Prototype path for each spawnable cell type.
#[derive(Debug, Clone, Default)]
pub struct ClassRegistry {
    classes: HashMap<CellType, String>,
}

impl ClassRegistry {
    /// The five ground-block prototypes.
    pub fn standard() -> Self {
        Self {
            classes: STANDARD_CLASSES
                .iter()
                .map(|(ty, path)| (*ty, (*path).to_string()))
                .collect(),
        }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn register(&mut self, cell_type: CellType, path: impl Into<String>) {
        if !cell_type.is_empty() {
            self.classes.insert(cell_type, path.into());
        }
    }

    pub fn unregister(&mut self, cell_type: CellType) -> Option<String> {
        self.classes.remove(&cell_type)
    }

    pub fn contains(&self, cell_type: CellType) -> bool {
        self.classes.contains_key(&cell_type)
    }

    pub fn class_for(&self, cell_type: CellType) -> Result<&str> {
        self.classes
            .get(&cell_type)
            .map(String::as_str)
            .ok_or(GridError::SpawnClassMissing(cell_type))
    }

    /// Spawnable types with no registered prototype.
    pub fn missing(&self) -> Vec<CellType> {
        CellType::SOLID
            .into_iter()
            .filter(|ty| !self.contains(*ty))
            .collect()
    }
}

// ============================================================================
// Lifecycle Manager
// ============================================================================

/// Summary of one [`CellLifecycleManager::populate`] pass.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PopulateReport {
    pub spawned: usize,
    /// Cells that already had an occupant and were left as is.
    pub already_occupied: usize,
    /// Cells skipped because their type has no registered class.
    pub skipped: usize,
    pub failed: usize,
    pub missing_classes: Vec<CellType>,
}

/// What a destroy call did to the cell's occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DestroyOutcome {
    /// Type and temperature cleared; there was no occupant.
    Cleared,
    Destroyed(OccupantHandle),
    /// The spawner refused; the handle was dropped from the grid anyway.
    DestroyFailed(OccupantHandle),
}

#[derive(Debug, Clone, Copy, Default)]
pub struct CellLifecycleManager;

impl CellLifecycleManager {
    pub fn new() -> Self {
        Self
    }

    /// Spawn an occupant for every non-empty cell without one and record the
    /// returned handles. Emits a single generation-complete notification if
    /// anything was spawned and no spawn class was missing.
    pub fn populate<S, E>(
        &self,
        store: &mut GridStore,
        spawner: &mut S,
        events: &mut E,
    ) -> Result<PopulateReport>
    where
        S: Spawner + ?Sized,
        E: EventSink + ?Sized,
    {
        let mut report = PopulateReport::default();
        let mut missing = BTreeSet::new();
        let cell_size = store.cell_size();

        for index in 0..store.len() {
            let cell_type = store.get_type(index)?;
            if cell_type.is_empty() {
                continue;
            }
            if store.get_occupant(index)?.is_some() {
                report.already_occupied += 1;
                continue;
            }
            if !spawner.has_class(cell_type) {
                missing.insert(cell_type.ordinal());
                report.skipped += 1;
                continue;
            }

            let (x, y) = store.coords_of(index)?;
            match spawner.spawn(cell_type, WorldPosition::of_cell(x, y, cell_size)) {
                Ok(handle) => {
                    store.set_occupant(index, Some(handle))?;
                    report.spawned += 1;
                }
                Err(e) => {
                    warn!("Spawn failed for cell ({}, {}): {}", x, y, e);
                    report.failed += 1;
                }
            }
        }

        report.missing_classes = missing.into_iter().map(|o| CellType::ALL[o]).collect();
        for cell_type in &report.missing_classes {
            error!("{}", GridError::SpawnClassMissing(*cell_type));
        }

        if !report.missing_classes.is_empty() {
            error!(
                "Ground generation incomplete: {} spawned, {} skipped for missing classes",
                report.spawned, report.skipped
            );
        } else if report.spawned > 0 {
            events.notify_generation_complete();
            info!(
                "Ground instances created: {} spawned, {} failed",
                report.spawned, report.failed
            );
        } else if report.already_occupied == 0 {
            error!("Failed to create any ground instance");
        }

        Ok(report)
    }

    /// Clear one cell: type becomes `Empty`, delta temperature 0, and any
    /// occupant is destroyed and detached.
    pub fn destroy_cell<S>(
        &self,
        store: &mut GridStore,
        spawner: &mut S,
        index: usize,
    ) -> Result<DestroyOutcome>
    where
        S: Spawner + ?Sized,
    {
        store.set_type(index, CellType::Empty)?;
        store.set_delta_temperature(index, 0)?;

        let Some(handle) = store.take_occupant(index)? else {
            return Ok(DestroyOutcome::Cleared);
        };
        if spawner.destroy(handle) {
            info!("Destroyed ground block at index {}", index);
            Ok(DestroyOutcome::Destroyed(handle))
        } else {
            warn!("Failed to destroy ground block at index {}", index);
            Ok(DestroyOutcome::DestroyFailed(handle))
        }
    }

    /// Location-based destroy. An out-of-grid location is logged and the call
    /// becomes a no-op returning `None`.
    pub fn destroy_at<S>(
        &self,
        store: &mut GridStore,
        resolver: &CoordinateResolver,
        spawner: &mut S,
        world_x: f32,
        world_y: f32,
    ) -> Option<DestroyOutcome>
    where
        S: Spawner + ?Sized,
    {
        let result = resolver
            .resolve_index(store, world_x, world_y)
            .and_then(|index| self.destroy_cell(store, spawner, index));
        match result {
            Ok(outcome) => Some(outcome),
            Err(e) => {
                error!("destroy_at: {}", e);
                None
            }
        }
    }
}
