//! Cell-level types shared by the grid, the spawner and the save record.

use serde::{Deserialize, Serialize};

// ============================================================================
// Cell Types
// ============================================================================

/// Ground type of one grid cell.
///
/// `Empty` marks a destroyed (or never generated) cell and has no occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum CellType {
    Grass,
    Earth,
    Field,
    Snow,
    Water,
    #[default]
    Empty,
}

impl CellType {
    /// Every type that can hold an occupant, in prototype-table order.
    pub const SOLID: [CellType; 5] = [
        CellType::Grass,
        CellType::Earth,
        CellType::Field,
        CellType::Snow,
        CellType::Water,
    ];

    /// All variants, `Empty` last.
    pub const ALL: [CellType; 6] = [
        CellType::Grass,
        CellType::Earth,
        CellType::Field,
        CellType::Snow,
        CellType::Water,
        CellType::Empty,
    ];

    pub fn is_empty(self) -> bool {
        matches!(self, CellType::Empty)
    }

    /// Textual name used by the prototype table and the UI layer.
    /// `Empty` maps to the empty string.
    pub fn name(self) -> &'static str {
        match self {
            CellType::Grass => "GrassGround",
            CellType::Earth => "EarthGround",
            CellType::Field => "FieldGround",
            CellType::Snow => "SnowGround",
            CellType::Water => "WaterGround",
            CellType::Empty => "",
        }
    }

    /// Inverse of [`CellType::name`]. Unknown names read as `Empty`.
    pub fn from_name(name: &str) -> Self {
        match name {
            "GrassGround" => CellType::Grass,
            "EarthGround" => CellType::Earth,
            "FieldGround" => CellType::Field,
            "SnowGround" => CellType::Snow,
            "WaterGround" => CellType::Water,
            _ => CellType::Empty,
        }
    }

    /// Dense position in [`CellType::ALL`], used for census buckets.
    pub fn ordinal(self) -> usize {
        match self {
            CellType::Grass => 0,
            CellType::Earth => 1,
            CellType::Field => 2,
            CellType::Snow => 3,
            CellType::Water => 4,
            CellType::Empty => 5,
        }
    }
}

// ============================================================================
// Occupants
// ============================================================================

/// Non-owning reference to an actor owned by the spawn collaborator.
///
/// The grid only stores and hands it back; destruction always goes through
/// [`crate::lifecycle::Spawner::destroy`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct OccupantHandle(pub u64);

/// World-space placement of a spawned occupant.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct WorldPosition {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl WorldPosition {
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    /// Origin corner of cell `(x, y)` on the ground plane.
    pub fn of_cell(x: usize, y: usize, cell_size: u32) -> Self {
        Self {
            x: (x as u64 * cell_size as u64) as f32,
            y: (y as u64 * cell_size as u64) as f32,
            z: 0.0,
        }
    }
}

/// ECS component attached to every actor the reference spawner creates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GroundActor {
    pub kind: CellType,
}
