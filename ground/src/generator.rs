//! Default world layout for a first run.

use tracing::{debug, info};

use crate::components::CellType;
use crate::error::Result;
use crate::grid::GridStore;

pub const DEFAULT_X_LENGTH: usize = 128;
pub const DEFAULT_Y_LENGTH: usize = 128;
pub const DEFAULT_CELL_SIZE: u32 = 40;

/// Lake on the east side: x in [100, x_length), y in [29, y_length).
const WATER_X_START: usize = 100;
const WATER_Y_START: usize = 29;

/// Earth patch: x in [0, 28), y in [30, 70), mirrored to
/// (x + 50, y_length - 1 - y).
const EARTH_X_END: usize = 28;
const EARTH_Y: std::ops::Range<usize> = 30..70;
const EARTH_MIRROR_SHIFT: usize = 50;

#[derive(Debug, Clone, Copy, Default)]
pub struct WorldGenerator;

impl WorldGenerator {
    pub fn new() -> Self {
        Self
    }

    /// Lay out the default map if the store has no dimensions yet.
    ///
    /// Returns `true` when a layout was written; a store restored from a save
    /// is left untouched.
    pub fn generate_if_empty(&self, store: &mut GridStore) -> Result<bool> {
        if store.is_initialized() {
            debug!(
                "Ground grid already present ({}x{}), skipping generation",
                store.x_length(),
                store.y_length()
            );
            return Ok(false);
        }

        store.initialize(DEFAULT_X_LENGTH, DEFAULT_Y_LENGTH, DEFAULT_CELL_SIZE)?;
        let x_length = store.x_length();
        let y_length = store.y_length();

        // Rules run in order; later writes win where regions overlap.
        for i in 0..store.len() {
            store.set_type(i, CellType::Grass)?;
            store.set_delta_temperature(i, 0)?;
        }

        for x in WATER_X_START..x_length {
            for y in WATER_Y_START..y_length {
                store.set_type_at(x, y, CellType::Water)?;
            }
        }

        for x in 0..EARTH_X_END {
            for y in EARTH_Y {
                store.set_type_at(x, y, CellType::Earth)?;
                store.set_type_at(x + EARTH_MIRROR_SHIFT, y_length - 1 - y, CellType::Earth)?;
            }
        }

        info!(
            "Generated default ground layout {}x{} (cell size {})",
            x_length,
            y_length,
            store.cell_size()
        );
        Ok(true)
    }
}
