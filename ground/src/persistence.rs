//! Save record codec.
//!
//! Turns the ground grid plus the time/weather scalars into one flat record
//! and back. Occupant handles are never written; they are rebuilt by the
//! lifecycle manager after a load.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::components::CellType;
use crate::error::{GridError, Result};
use crate::grid::GridStore;
use crate::scalars::{Season, TimeState, Weather, WeatherState, WorldScalars};
use crate::storage::SaveSlot;

/// Envelope format version.
pub const SAVE_VERSION: u8 = 1;

// ============================================================================
// Record Structures
// ============================================================================

/// Flat save record. Field order is the on-disk order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct SaveRecord {
    pub minute: i32,
    pub hour: i32,
    pub day_in_season: i32,
    pub season: Season,
    pub real_time: f32,
    pub weather: Weather,
    pub base_temperature: i32,
    pub x_length: u32,
    pub y_length: u32,
    pub cell_size: u32,
    /// `x_length * y_length` entries.
    pub cell_types: Vec<CellType>,
    /// `x_length * y_length` entries.
    pub delta_temperatures: Vec<i32>,
    pub is_items_initialized: bool,
    pub item_lived_time: Vec<f32>,
    pub item_durability: Vec<i32>,
    pub item_is_watered: Vec<bool>,
    pub item_id: Vec<i32>,
}

/// What actually lands in the slot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SaveFile {
    pub version: u8,
    pub saved_at: DateTime<Utc>,
    pub record: SaveRecord,
}

/// Result of a successful slot write.
#[derive(Debug, Clone)]
pub struct SaveStats {
    pub cells: usize,
    pub item_blocks: usize,
    pub file_bytes: usize,
}

// ============================================================================
// Codec
// ============================================================================

#[derive(Debug, Clone, Copy, Default)]
pub struct PersistenceCodec;

impl PersistenceCodec {
    pub fn new() -> Self {
        Self
    }

    /// Snapshot the store and scalars into a record.
    pub fn save(&self, store: &GridStore, scalars: &WorldScalars) -> SaveRecord {
        let items = store.raw_items();
        SaveRecord {
            minute: scalars.time.minute,
            hour: scalars.time.hour,
            day_in_season: scalars.time.day_in_season,
            season: scalars.time.season,
            real_time: scalars.time.real_time,
            weather: scalars.weather.weather,
            base_temperature: scalars.weather.base_temperature,
            // Axis lengths are capped at `MAX_AXIS_LENGTH` when allocated.
            x_length: store.x_length() as u32,
            y_length: store.y_length() as u32,
            cell_size: store.cell_size(),
            cell_types: store.types().to_vec(),
            delta_temperatures: store.delta_temperatures().to_vec(),
            is_items_initialized: store.is_items_initialized(),
            item_lived_time: items.lived_times().to_vec(),
            item_durability: items.durabilities().to_vec(),
            item_is_watered: items.watered_flags().to_vec(),
            item_id: items.ids().to_vec(),
        }
    }

    /// Rebuild a store and scalars from a record.
    ///
    /// The array lengths are checked against the dimensions before anything
    /// is allocated; dimensions are then applied first so every indexed write
    /// that follows is in bounds. A record with zero dimensions yields an
    /// unset store.
    pub fn load(&self, record: &SaveRecord) -> Result<(GridStore, WorldScalars)> {
        let x_length = record.x_length as usize;
        let y_length = record.y_length as usize;
        let cells = x_length.checked_mul(y_length).ok_or_else(|| {
            GridError::CorruptRecord(format!(
                "grid of {}x{} cells does not fit in memory",
                record.x_length, record.y_length
            ))
        })?;
        if record.cell_types.len() != cells || record.delta_temperatures.len() != cells {
            return Err(GridError::CorruptRecord(format!(
                "grid is {}x{} ({} cells) but record holds {} types and {} temperatures",
                record.x_length,
                record.y_length,
                cells,
                record.cell_types.len(),
                record.delta_temperatures.len()
            )));
        }

        let mut store = GridStore::with_dimensions(x_length, y_length, record.cell_size)
            .map_err(|e| GridError::CorruptRecord(e.to_string()))?;

        for (i, (cell_type, delta)) in record
            .cell_types
            .iter()
            .zip(&record.delta_temperatures)
            .enumerate()
        {
            store.set_type(i, *cell_type)?;
            store.set_delta_temperature(i, *delta)?;
        }

        store.set_items_initialized(record.is_items_initialized);
        let items = store.items_mut();
        for (i, value) in record.item_lived_time.iter().enumerate() {
            items.set_lived_time(i, *value)?;
        }
        for (i, value) in record.item_durability.iter().enumerate() {
            items.set_durability(i, *value)?;
        }
        for (i, value) in record.item_is_watered.iter().enumerate() {
            items.set_is_watered(i, *value)?;
        }
        for (i, value) in record.item_id.iter().enumerate() {
            items.set_id(i, *value)?;
        }

        let scalars = WorldScalars {
            time: TimeState {
                minute: record.minute,
                hour: record.hour,
                day_in_season: record.day_in_season,
                season: record.season,
                real_time: record.real_time,
            },
            weather: WeatherState {
                weather: record.weather,
                base_temperature: record.base_temperature,
            },
        };

        Ok((store, scalars))
    }

    pub fn encode(&self, record: SaveRecord, saved_at: DateTime<Utc>) -> Result<Vec<u8>> {
        let file = SaveFile {
            version: SAVE_VERSION,
            saved_at,
            record,
        };
        bincode::serialize(&file)
            .map_err(|e| GridError::CorruptRecord(format!("encode failed: {e}")))
    }

    pub fn decode(&self, bytes: &[u8]) -> Result<SaveFile> {
        let file: SaveFile = bincode::deserialize(bytes)
            .map_err(|e| GridError::CorruptRecord(format!("decode failed: {e}")))?;
        if file.version != SAVE_VERSION {
            return Err(GridError::CorruptRecord(format!(
                "unsupported save version {}",
                file.version
            )));
        }
        Ok(file)
    }

    /// Encode the current state and write it to the slot.
    pub fn write_slot(
        &self,
        slot: &mut dyn SaveSlot,
        store: &GridStore,
        scalars: &WorldScalars,
    ) -> Result<SaveStats> {
        let record = self.save(store, scalars);
        let item_blocks = record.item_id.len();
        let bytes = self.encode(record, Utc::now())?;
        slot.write(&bytes)?;
        info!("Save success: {} bytes to {}", bytes.len(), slot.describe());
        Ok(SaveStats {
            cells: store.len(),
            item_blocks,
            file_bytes: bytes.len(),
        })
    }

    /// Read and restore the slot. `Ok(None)` means nothing was saved yet.
    pub fn read_slot(&self, slot: &dyn SaveSlot) -> Result<Option<(GridStore, WorldScalars)>> {
        let Some(bytes) = slot.read()? else {
            info!("No saved game in {}, starting fresh", slot.describe());
            return Ok(None);
        };
        let file = self.decode(&bytes)?;
        let restored = self.load(&file.record)?;
        if !restored.0.is_initialized() {
            warn!("Saved game in {} has no ground grid", slot.describe());
        }
        info!(
            "Loaded save from {} written at {}",
            slot.describe(),
            file.saved_at
        );
        Ok(Some(restored))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::generator::WorldGenerator;
    use crate::grid::ItemBlock;
    use crate::storage::{MemorySlot, SaveSlot};
    use rand::Rng;

    fn sample_scalars() -> WorldScalars {
        WorldScalars {
            time: TimeState {
                minute: 45,
                hour: 19,
                day_in_season: 27,
                season: Season::Winter,
                real_time: 9876.25,
            },
            weather: WeatherState {
                weather: Weather::Snowy,
                base_temperature: -3,
            },
        }
    }

    fn random_store(rng: &mut impl Rng) -> GridStore {
        let x = rng.gen_range(1..20);
        let y = rng.gen_range(1..20);
        let mut store = GridStore::with_dimensions(x, y, rng.gen_range(1..64)).unwrap();
        for i in 0..store.len() {
            let ty = CellType::ALL[rng.gen_range(0..CellType::ALL.len())];
            store.set_type(i, ty).unwrap();
            store.set_delta_temperature(i, rng.gen_range(-20..20)).unwrap();
        }
        for _ in 0..rng.gen_range(0..8) {
            store.items_mut().push(ItemBlock {
                lived_time: rng.gen_range(0.0..100.0),
                durability: rng.gen_range(0..10),
                is_watered: rng.gen(),
                id: rng.gen_range(0..500),
            });
        }
        store.set_items_initialized(rng.gen());
        store
    }

    #[test]
    fn test_record_matches_grid() {
        let mut store = GridStore::new();
        WorldGenerator::new().generate_if_empty(&mut store).unwrap();
        let record = PersistenceCodec::new().save(&store, &sample_scalars());
        assert_eq!((record.x_length, record.y_length, record.cell_size), (128, 128, 40));
        assert_eq!(record.cell_types.len(), 128 * 128);
        assert_eq!(record.delta_temperatures.len(), 128 * 128);
        assert_eq!(record.base_temperature, -3);
        assert!(record.item_id.is_empty());
    }

    #[test]
    fn test_round_trip_random_stores() {
        let codec = PersistenceCodec::new();
        let mut rng = rand::thread_rng();
        for _ in 0..25 {
            let store = random_store(&mut rng);
            let scalars = sample_scalars();
            let bytes = codec.encode(codec.save(&store, &scalars), Utc::now()).unwrap();
            let file = codec.decode(&bytes).unwrap();
            let (restored, restored_scalars) = codec.load(&file.record).unwrap();
            assert_eq!(restored, store);
            assert_eq!(restored_scalars, scalars);
        }
    }

    #[test]
    fn test_occupants_not_persisted() {
        let codec = PersistenceCodec::new();
        let mut store = GridStore::with_dimensions(2, 2, 10).unwrap();
        store.set_type(0, CellType::Grass).unwrap();
        store
            .set_occupant(0, Some(crate::components::OccupantHandle(7)))
            .unwrap();

        let (restored, _) = codec
            .load(&codec.save(&store, &WorldScalars::default()))
            .unwrap();
        assert!(!restored.has_occupant_array());
        assert_eq!(restored.get_type(0).unwrap(), CellType::Grass);
    }

    #[test]
    fn test_item_arrays_keep_own_lengths() {
        let codec = PersistenceCodec::new();
        let record = SaveRecord {
            item_lived_time: vec![1.0, 2.0, 3.0],
            item_durability: vec![5],
            is_items_initialized: true,
            ..SaveRecord::default()
        };
        let (store, _) = codec.load(&record).unwrap();
        let items = store.items().unwrap();
        assert_eq!(items.lived_times(), &[1.0, 2.0, 3.0]);
        assert_eq!(items.durabilities(), &[5]);
        assert_eq!(codec.save(&store, &WorldScalars::default()), record);
    }

    #[test]
    fn test_zero_dimension_record_leaves_store_unset() {
        let (store, scalars) = PersistenceCodec::new().load(&SaveRecord::default()).unwrap();
        assert!(!store.is_initialized());
        assert_eq!(scalars, WorldScalars::default());
    }

    #[test]
    fn test_length_mismatch_is_corrupt() {
        let record = SaveRecord {
            x_length: 2,
            y_length: 2,
            cell_size: 10,
            cell_types: vec![CellType::Grass; 3],
            delta_temperatures: vec![0; 4],
            ..SaveRecord::default()
        };
        assert!(matches!(
            PersistenceCodec::new().load(&record),
            Err(GridError::CorruptRecord(_))
        ));
    }

    #[test]
    fn test_huge_dimensions_are_corrupt_not_allocated() {
        let codec = PersistenceCodec::new();
        let record = SaveRecord {
            x_length: u32::MAX,
            y_length: u32::MAX,
            cell_size: 40,
            ..SaveRecord::default()
        };
        let mut slot = MemorySlot::new();
        slot.write(&codec.encode(record, Utc::now()).unwrap()).unwrap();

        assert!(matches!(
            codec.read_slot(&slot),
            Err(GridError::CorruptRecord(_))
        ));
    }

    #[test]
    fn test_rejects_garbage_and_unknown_version() {
        let codec = PersistenceCodec::new();
        assert!(codec.decode(&[0xff, 0x00, 0x13]).is_err());

        let mut file = SaveFile {
            version: SAVE_VERSION + 1,
            saved_at: Utc::now(),
            record: SaveRecord::default(),
        };
        let bytes = bincode::serialize(&file).unwrap();
        assert!(matches!(codec.decode(&bytes), Err(GridError::CorruptRecord(_))));

        file.version = SAVE_VERSION;
        let bytes = bincode::serialize(&file).unwrap();
        assert_eq!(codec.decode(&bytes).unwrap(), file);
    }

    #[test]
    fn test_slot_round_trip() {
        let codec = PersistenceCodec::new();
        let mut slot = MemorySlot::new();
        assert!(codec.read_slot(&slot).unwrap().is_none());

        let mut store = GridStore::new();
        WorldGenerator::new().generate_if_empty(&mut store).unwrap();
        store.set_delta_temperature_at(3, 4, 6).unwrap();
        let stats = codec.write_slot(&mut slot, &store, &sample_scalars()).unwrap();
        assert_eq!(stats.cells, 128 * 128);
        assert_eq!(stats.file_bytes, slot.bytes().unwrap().len());

        let (restored, scalars) = codec.read_slot(&slot).unwrap().unwrap();
        assert_eq!(restored, store);
        assert_eq!(scalars, sample_scalars());
    }

    #[test]
    fn test_offline_slot_reports_unavailable() {
        let codec = PersistenceCodec::new();
        let mut slot = MemorySlot::offline();
        let store = GridStore::with_dimensions(2, 2, 10).unwrap();
        assert!(matches!(
            codec.write_slot(&mut slot, &store, &WorldScalars::default()),
            Err(GridError::PersistenceUnavailable { .. })
        ));
        assert!(codec.read_slot(&slot).is_err());
    }
}
