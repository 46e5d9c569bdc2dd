//! Error taxonomy for the ground grid.

use std::path::PathBuf;

use thiserror::Error;

use crate::components::CellType;

#[derive(Debug, Error)]
pub enum GridError {
    /// A raw linear or 2D index fell outside the grid arrays. Only reachable
    /// when a caller skips the coordinate resolver.
    #[error("cell index {index} out of range for grid of {len} cells")]
    IndexOutOfRange { index: usize, len: usize },

    /// A world coordinate resolved outside the grid extent.
    #[error("world location ({x}, {y}) is outside the ground grid")]
    OutOfBounds { x: f32, y: f32 },

    #[error("no spawn class registered for {0:?}")]
    SpawnClassMissing(CellType),

    #[error("spawner failed to instantiate {0:?}")]
    SpawnFailed(CellType),

    #[error("save slot unavailable at {path}: {source}")]
    PersistenceUnavailable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("corrupt save record: {0}")]
    CorruptRecord(String),

    #[error("grid of {x_length}x{y_length} cells is too large")]
    GridTooLarge { x_length: usize, y_length: usize },

    #[error("grid dimensions are already set for this session")]
    AlreadyInitialized,
}

impl GridError {
    pub fn is_out_of_bounds(&self) -> bool {
        matches!(self, GridError::OutOfBounds { .. })
    }
}

pub type Result<T> = std::result::Result<T, GridError>;
