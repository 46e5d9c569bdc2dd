//! Reference spawner backed by a `hecs` world.
//!
//! Stands in for the engine's actor system in the binary and in tests: each
//! occupant is one entity carrying a [`GroundActor`] and its position.

use hecs::{Entity, World};
use tracing::debug;

use crate::components::{CellType, GroundActor, OccupantHandle, WorldPosition};
use crate::error::{GridError, Result};
use crate::lifecycle::{ClassRegistry, Spawner};

pub struct ActorWorld {
    world: World,
    registry: ClassRegistry,
}

impl ActorWorld {
    pub fn new(registry: ClassRegistry) -> Self {
        Self {
            world: World::new(),
            registry,
        }
    }

    pub fn registry(&self) -> &ClassRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut ClassRegistry {
        &mut self.registry
    }

    /// Number of live ground actors.
    pub fn actor_count(&self) -> usize {
        self.world.query::<&GroundActor>().iter().count()
    }

    /// Kind and position of the actor behind `handle`, if it is still alive.
    pub fn actor(&self, handle: OccupantHandle) -> Option<(CellType, WorldPosition)> {
        let entity = Entity::from_bits(handle.0)?;
        let actor = self.world.get::<&GroundActor>(entity).ok()?;
        let position = self.world.get::<&WorldPosition>(entity).ok()?;
        Some((actor.kind, *position))
    }
}

impl Default for ActorWorld {
    fn default() -> Self {
        Self::new(ClassRegistry::standard())
    }
}

impl Spawner for ActorWorld {
    fn has_class(&self, cell_type: CellType) -> bool {
        self.registry.contains(cell_type)
    }

    fn spawn(&mut self, cell_type: CellType, position: WorldPosition) -> Result<OccupantHandle> {
        if cell_type.is_empty() {
            return Err(GridError::SpawnFailed(cell_type));
        }
        self.registry.class_for(cell_type)?;
        let entity = self.world.spawn((GroundActor { kind: cell_type }, position));
        Ok(OccupantHandle(entity.to_bits().get()))
    }

    fn destroy(&mut self, handle: OccupantHandle) -> bool {
        let Some(entity) = Entity::from_bits(handle.0) else {
            return false;
        };
        match self.world.despawn(entity) {
            Ok(()) => true,
            Err(_) => {
                debug!("Occupant {:?} was already gone", handle);
                false
            }
        }
    }
}
