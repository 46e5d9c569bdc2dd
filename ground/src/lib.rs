//! Valley ground grid
//!
//! Persistent grid of ground blocks for a farm world: default map layout,
//! world-coordinate queries, occupant lifecycle, and save/load through a
//! versioned save slot.

pub mod actors;
pub mod components;
pub mod config;
pub mod error;
pub mod generator;
pub mod grid;
pub mod lifecycle;
pub mod persistence;
pub mod resolver;
pub mod scalars;
pub mod session;
pub mod storage;
pub mod trigger;

pub use actors::ActorWorld;
pub use components::*;
pub use config::SessionConfig;
pub use error::{GridError, Result};
pub use grid::{GridStore, ItemBlock, ItemBlocks, TypeCounts};
pub use lifecycle::{ClassRegistry, DestroyOutcome, EventSink, NoEvents, PopulateReport, Spawner};
pub use persistence::{PersistenceCodec, SaveRecord, SaveStats};
pub use resolver::CoordinateResolver;
pub use scalars::{Season, TimeSource, TimeState, Weather, WeatherSource, WeatherState, WorldScalars};
pub use session::{TypeChange, WorldSession};
pub use storage::{FileSlot, MemorySlot, SaveSlot};
