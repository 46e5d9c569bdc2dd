//! World-space to grid-index resolution.
//!
//! Every location-based query goes through [`CoordinateResolver::resolve`] so
//! out-of-grid handling is decided in one place.

use crate::error::{GridError, Result};
use crate::grid::GridStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CoordinateResolver {
    x_length: usize,
    y_length: usize,
    cell_size: u32,
}

impl CoordinateResolver {
    pub fn new(x_length: usize, y_length: usize, cell_size: u32) -> Self {
        Self {
            x_length,
            y_length,
            cell_size,
        }
    }

    pub fn for_store(store: &GridStore) -> Self {
        Self::new(store.x_length(), store.y_length(), store.cell_size())
    }

    /// Map a world location to `(index_x, index_y)` using
    /// `floor(coord / cell_size)` on each axis.
    pub fn resolve(&self, world_x: f32, world_y: f32) -> Result<(usize, usize)> {
        let out_of_bounds = GridError::OutOfBounds {
            x: world_x,
            y: world_y,
        };
        // NaN fails both comparisons and is rejected here as well.
        if !(world_x >= 0.0 && world_y >= 0.0) || self.cell_size == 0 {
            return Err(out_of_bounds);
        }
        let size = self.cell_size as f64;
        let index_x = (world_x as f64 / size).floor();
        let index_y = (world_y as f64 / size).floor();
        if index_x >= self.x_length as f64 || index_y >= self.y_length as f64 {
            return Err(out_of_bounds);
        }
        Ok((index_x as usize, index_y as usize))
    }

    /// Resolve straight to the store's linear index.
    pub fn resolve_index(&self, store: &GridStore, world_x: f32, world_y: f32) -> Result<usize> {
        let (x, y) = self.resolve(world_x, world_y)?;
        store.index_of(x, y)
    }

    /// World-space extent of the grid on each axis.
    pub fn extent(&self) -> (f64, f64) {
        let size = self.cell_size as f64;
        (self.x_length as f64 * size, self.y_length as f64 * size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn resolver() -> CoordinateResolver {
        CoordinateResolver::new(128, 128, 40)
    }

    #[test]
    fn test_resolve_floors_to_cell() {
        let r = resolver();
        assert_eq!(r.resolve(0.0, 0.0).unwrap(), (0, 0));
        assert_eq!(r.resolve(39.9, 40.0).unwrap(), (0, 1));
        assert_eq!(r.resolve(20.0 * 40.0, 13.0 * 40.0).unwrap(), (20, 13));
        assert_eq!(r.resolve(5119.0, 5119.0).unwrap(), (127, 127));
    }

    #[test]
    fn test_resolve_rejects_outside() {
        let r = resolver();
        for (x, y) in [
            (-1.0, 5.0),
            (5.0, -0.5),
            (5120.0, 0.0),
            (0.0, 5120.0),
            (f32::NAN, 0.0),
            (f32::INFINITY, 0.0),
        ] {
            let err = r.resolve(x, y).unwrap_err();
            assert!(err.is_out_of_bounds(), "({x}, {y}) should be out of bounds");
        }
    }

    #[test]
    fn test_unset_grid_resolves_nothing() {
        let r = CoordinateResolver::for_store(&GridStore::new());
        assert!(r.resolve(0.0, 0.0).is_err());
    }

    #[test]
    fn test_every_valid_cell_is_readable() {
        let store = GridStore::with_dimensions(6, 9, 25).unwrap();
        let r = CoordinateResolver::for_store(&store);
        let (w, h) = r.extent();
        assert_eq!((w, h), (150.0, 225.0));
        for x in 0..6 {
            for y in 0..9 {
                let wx = (x * 25) as f32 + 12.5;
                let wy = (y * 25) as f32 + 24.0;
                let index = r.resolve_index(&store, wx, wy).unwrap();
                assert!(store.get_type(index).is_ok());
                assert!(store.get_delta_temperature(index).is_ok());
            }
        }
    }
}
