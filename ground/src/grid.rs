//! Ground grid storage.
//!
//! Every per-cell field lives in its own array, addressed by one shared
//! linear index. The arrays are sized together when the dimensions are set
//! and never resized afterwards.

use rayon::prelude::*;

use crate::components::{CellType, OccupantHandle};
use crate::error::{GridError, Result};

/// Largest length of one grid axis.
pub const MAX_AXIS_LENGTH: usize = u32::MAX as usize;

// ============================================================================
// Grid Store
// ============================================================================

#[derive(Debug, Clone, PartialEq, Default)]
pub struct GridStore {
    x_length: usize,
    y_length: usize,
    cell_size: u32,
    types: Vec<CellType>,
    delta_temperatures: Vec<i32>,
    /// Absent until the lifecycle manager attaches the first occupant.
    occupants: Option<Vec<Option<OccupantHandle>>>,
    items: ItemBlocks,
    is_items_initialized: bool,
}

impl GridStore {
    /// An empty store with zero dimensions, as on a first run.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store with its dimensions set and every cell `Empty` at delta 0.
    pub fn with_dimensions(x_length: usize, y_length: usize, cell_size: u32) -> Result<Self> {
        let mut store = Self::new();
        store.allocate(x_length, y_length, cell_size)?;
        Ok(store)
    }

    /// Set the dimensions of a store that has none yet.
    pub fn initialize(&mut self, x_length: usize, y_length: usize, cell_size: u32) -> Result<()> {
        if self.is_initialized() {
            return Err(GridError::AlreadyInitialized);
        }
        self.allocate(x_length, y_length, cell_size)
    }

    fn allocate(&mut self, x_length: usize, y_length: usize, cell_size: u32) -> Result<()> {
        let len = checked_cell_count(x_length, y_length)?;
        self.x_length = x_length;
        self.y_length = y_length;
        self.cell_size = cell_size;
        self.types = vec![CellType::Empty; len];
        self.delta_temperatures = vec![0; len];
        self.occupants = None;
        Ok(())
    }

    /// True once all three dimensions are non-zero.
    pub fn is_initialized(&self) -> bool {
        self.x_length != 0 && self.y_length != 0 && self.cell_size != 0
    }

    pub fn x_length(&self) -> usize {
        self.x_length
    }

    pub fn y_length(&self) -> usize {
        self.y_length
    }

    pub fn cell_size(&self) -> u32 {
        self.cell_size
    }

    /// Number of cells, `x_length * y_length`.
    pub fn len(&self) -> usize {
        self.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    // --- indexing ---

    /// Linear index of cell `(x, y)`: `x * y_length + y`, which is
    /// `x * x_length + y` on square grids.
    pub fn index_of(&self, x: usize, y: usize) -> Result<usize> {
        let index = x
            .checked_mul(self.y_length)
            .and_then(|row| row.checked_add(y))
            .unwrap_or(usize::MAX);
        if x >= self.x_length || y >= self.y_length {
            return Err(GridError::IndexOutOfRange {
                index,
                len: self.len(),
            });
        }
        Ok(index)
    }

    /// Inverse of [`GridStore::index_of`].
    pub fn coords_of(&self, index: usize) -> Result<(usize, usize)> {
        let index = self.check(index)?;
        Ok((index / self.y_length, index % self.y_length))
    }

    fn check(&self, index: usize) -> Result<usize> {
        if index < self.len() {
            Ok(index)
        } else {
            Err(GridError::IndexOutOfRange {
                index,
                len: self.len(),
            })
        }
    }

    // --- type ---

    pub fn get_type(&self, index: usize) -> Result<CellType> {
        self.check(index).map(|i| self.types[i])
    }

    pub fn set_type(&mut self, index: usize, cell_type: CellType) -> Result<()> {
        let i = self.check(index)?;
        self.types[i] = cell_type;
        Ok(())
    }

    pub fn get_type_at(&self, x: usize, y: usize) -> Result<CellType> {
        self.get_type(self.index_of(x, y)?)
    }

    pub fn set_type_at(&mut self, x: usize, y: usize, cell_type: CellType) -> Result<()> {
        let index = self.index_of(x, y)?;
        self.set_type(index, cell_type)
    }

    // --- delta temperature ---

    pub fn get_delta_temperature(&self, index: usize) -> Result<i32> {
        self.check(index).map(|i| self.delta_temperatures[i])
    }

    pub fn set_delta_temperature(&mut self, index: usize, delta: i32) -> Result<()> {
        let i = self.check(index)?;
        self.delta_temperatures[i] = delta;
        Ok(())
    }

    pub fn get_delta_temperature_at(&self, x: usize, y: usize) -> Result<i32> {
        self.get_delta_temperature(self.index_of(x, y)?)
    }

    pub fn set_delta_temperature_at(&mut self, x: usize, y: usize, delta: i32) -> Result<()> {
        let index = self.index_of(x, y)?;
        self.set_delta_temperature(index, delta)
    }

    // --- occupants ---

    pub fn get_occupant(&self, index: usize) -> Result<Option<OccupantHandle>> {
        let i = self.check(index)?;
        Ok(self.occupants.as_ref().and_then(|slots| slots[i]))
    }

    /// Attach or clear the occupant of a cell. The occupant array is created
    /// on the first attach, at full grid length.
    pub fn set_occupant(&mut self, index: usize, handle: Option<OccupantHandle>) -> Result<()> {
        let i = self.check(index)?;
        match (&mut self.occupants, handle) {
            (Some(slots), _) => slots[i] = handle,
            (None, None) => {}
            (None, Some(_)) => {
                let mut slots = vec![None; self.len()];
                slots[i] = handle;
                self.occupants = Some(slots);
            }
        }
        Ok(())
    }

    pub fn get_occupant_at(&self, x: usize, y: usize) -> Result<Option<OccupantHandle>> {
        self.get_occupant(self.index_of(x, y)?)
    }

    pub fn set_occupant_at(
        &mut self,
        x: usize,
        y: usize,
        handle: Option<OccupantHandle>,
    ) -> Result<()> {
        let index = self.index_of(x, y)?;
        self.set_occupant(index, handle)
    }

    /// Detach and return the occupant of a cell, leaving "none" behind.
    pub fn take_occupant(&mut self, index: usize) -> Result<Option<OccupantHandle>> {
        let i = self.check(index)?;
        Ok(self.occupants.as_mut().and_then(|slots| slots[i].take()))
    }

    pub fn has_occupant_array(&self) -> bool {
        self.occupants.is_some()
    }

    pub fn occupied_count(&self) -> usize {
        self.occupants
            .as_ref()
            .map(|slots| slots.iter().filter(|s| s.is_some()).count())
            .unwrap_or(0)
    }

    // --- bulk views ---

    pub fn types(&self) -> &[CellType] {
        &self.types
    }

    pub fn delta_temperatures(&self) -> &[i32] {
        &self.delta_temperatures
    }

    /// Non-empty cells as `(x, y, type)`, in linear-index order.
    pub fn cells(&self) -> impl Iterator<Item = (usize, usize, CellType)> + '_ {
        let y_length = self.y_length;
        self.types
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.is_empty())
            .map(move |(i, t)| (i / y_length, i % y_length, *t))
    }

    /// Number of cells of each type.
    pub fn type_counts(&self) -> TypeCounts {
        let buckets = self
            .types
            .par_iter()
            .fold(
                || [0usize; 6],
                |mut acc, t| {
                    acc[t.ordinal()] += 1;
                    acc
                },
            )
            .reduce(
                || [0usize; 6],
                |mut a, b| {
                    for (slot, n) in a.iter_mut().zip(b) {
                        *slot += n;
                    }
                    a
                },
            );
        TypeCounts { buckets }
    }

    // --- item blocks ---

    /// Item-block arrays, once they have been marked initialized.
    pub fn items(&self) -> Option<&ItemBlocks> {
        self.is_items_initialized.then_some(&self.items)
    }

    /// Mutable access for populating or restoring the item blocks.
    pub fn items_mut(&mut self) -> &mut ItemBlocks {
        &mut self.items
    }

    pub fn is_items_initialized(&self) -> bool {
        self.is_items_initialized
    }

    pub fn set_items_initialized(&mut self, initialized: bool) {
        self.is_items_initialized = initialized;
    }

    /// Item arrays regardless of the initialized flag, for persistence.
    pub(crate) fn raw_items(&self) -> &ItemBlocks {
        &self.items
    }
}

/// Cell count for the given dimensions. Each axis must fit the `u32` used by
/// the save record, and the product must fit `usize`.
pub fn checked_cell_count(x_length: usize, y_length: usize) -> Result<usize> {
    let too_large = GridError::GridTooLarge { x_length, y_length };
    if x_length > MAX_AXIS_LENGTH || y_length > MAX_AXIS_LENGTH {
        return Err(too_large);
    }
    x_length.checked_mul(y_length).ok_or(too_large)
}

/// Per-type census produced by [`GridStore::type_counts`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct TypeCounts {
    buckets: [usize; 6],
}

impl TypeCounts {
    pub fn get(&self, cell_type: CellType) -> usize {
        self.buckets[cell_type.ordinal()]
    }

    pub fn total(&self) -> usize {
        self.buckets.iter().sum()
    }

    /// Cells that carry an occupant when populated.
    pub fn solid(&self) -> usize {
        self.total() - self.get(CellType::Empty)
    }
}

// ============================================================================
// Item Blocks
// ============================================================================

/// One placed item, assembled from the four item arrays.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ItemBlock {
    pub lived_time: f32,
    pub durability: i32,
    pub is_watered: bool,
    pub id: i32,
}

/// Item-block arrays. Their length is independent of the grid and each array
/// keeps its own length, as restored from the save record.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ItemBlocks {
    lived_time: Vec<f32>,
    durability: Vec<i32>,
    is_watered: Vec<bool>,
    id: Vec<i32>,
}

/// Overwrite in range, append at the end, reject anything past it.
fn put<T>(values: &mut Vec<T>, index: usize, value: T) -> Result<()> {
    match index.cmp(&values.len()) {
        std::cmp::Ordering::Less => values[index] = value,
        std::cmp::Ordering::Equal => values.push(value),
        std::cmp::Ordering::Greater => {
            return Err(GridError::IndexOutOfRange {
                index,
                len: values.len(),
            })
        }
    }
    Ok(())
}

fn fetch<T: Copy>(values: &[T], index: usize) -> Result<T> {
    values.get(index).copied().ok_or(GridError::IndexOutOfRange {
        index,
        len: values.len(),
    })
}

impl ItemBlocks {
    /// Append one item to all four arrays.
    pub fn push(&mut self, item: ItemBlock) -> usize {
        self.lived_time.push(item.lived_time);
        self.durability.push(item.durability);
        self.is_watered.push(item.is_watered);
        self.id.push(item.id);
        self.id.len() - 1
    }

    /// Number of complete items (the shortest array).
    pub fn len(&self) -> usize {
        self.lived_time
            .len()
            .min(self.durability.len())
            .min(self.is_watered.len())
            .min(self.id.len())
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn get(&self, index: usize) -> Option<ItemBlock> {
        Some(ItemBlock {
            lived_time: *self.lived_time.get(index)?,
            durability: *self.durability.get(index)?,
            is_watered: *self.is_watered.get(index)?,
            id: *self.id.get(index)?,
        })
    }

    pub fn lived_time(&self, index: usize) -> Result<f32> {
        fetch(&self.lived_time, index)
    }

    pub fn set_lived_time(&mut self, index: usize, value: f32) -> Result<()> {
        put(&mut self.lived_time, index, value)
    }

    pub fn durability(&self, index: usize) -> Result<i32> {
        fetch(&self.durability, index)
    }

    pub fn set_durability(&mut self, index: usize, value: i32) -> Result<()> {
        put(&mut self.durability, index, value)
    }

    pub fn is_watered(&self, index: usize) -> Result<bool> {
        fetch(&self.is_watered, index)
    }

    pub fn set_is_watered(&mut self, index: usize, value: bool) -> Result<()> {
        put(&mut self.is_watered, index, value)
    }

    pub fn id(&self, index: usize) -> Result<i32> {
        fetch(&self.id, index)
    }

    pub fn set_id(&mut self, index: usize, value: i32) -> Result<()> {
        put(&mut self.id, index, value)
    }

    pub fn lived_times(&self) -> &[f32] {
        &self.lived_time
    }

    pub fn durabilities(&self) -> &[i32] {
        &self.durability
    }

    pub fn watered_flags(&self) -> &[bool] {
        &self.is_watered
    }

    pub fn ids(&self) -> &[i32] {
        &self.id
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_dimensions_size_all_arrays() {
        let store = GridStore::with_dimensions(4, 3, 40).unwrap();
        assert!(store.is_initialized());
        assert_eq!(store.len(), 12);
        assert_eq!(store.types().len(), store.delta_temperatures().len());
        assert!(!store.has_occupant_array());
    }

    #[test]
    fn test_initialize_only_once() {
        let mut store = GridStore::new();
        assert!(!store.is_initialized());
        store.initialize(2, 2, 10).unwrap();
        assert!(matches!(
            store.initialize(8, 8, 10),
            Err(GridError::AlreadyInitialized)
        ));
        assert_eq!(store.len(), 4);
    }

    #[test]
    fn test_oversized_dimensions_rejected() {
        assert!(matches!(
            GridStore::with_dimensions(usize::MAX, 2, 10),
            Err(GridError::GridTooLarge { .. })
        ));
        assert!(checked_cell_count(usize::MAX / 2, 3).is_err());
        assert_eq!(checked_cell_count(128, 128).unwrap(), 128 * 128);

        let mut store = GridStore::new();
        assert!(store.initialize(usize::MAX, usize::MAX, 40).is_err());
        assert!(!store.is_initialized());
    }

    #[test]
    fn test_linear_index_scheme() {
        let store = GridStore::with_dimensions(128, 128, 40).unwrap();
        assert_eq!(store.index_of(2, 5).unwrap(), 2 * 128 + 5);
        assert_eq!(store.coords_of(2 * 128 + 5).unwrap(), (2, 5));
    }

    #[test]
    fn test_non_square_indices_are_unique() {
        let store = GridStore::with_dimensions(3, 5, 10).unwrap();
        let mut seen = vec![false; store.len()];
        for x in 0..3 {
            for y in 0..5 {
                let i = store.index_of(x, y).unwrap();
                assert!(!seen[i]);
                seen[i] = true;
            }
        }
        assert!(seen.iter().all(|s| *s));
    }

    #[test]
    fn test_out_of_range_access() {
        let mut store = GridStore::with_dimensions(4, 4, 10).unwrap();
        assert!(matches!(
            store.get_type(16),
            Err(GridError::IndexOutOfRange { index: 16, len: 16 })
        ));
        assert!(store.set_delta_temperature(99, 1).is_err());
        assert!(store.get_type_at(4, 0).is_err());
        assert!(store.get_type_at(0, 4).is_err());
        assert!(store.get_occupant(16).is_err());
        assert!(GridStore::new().get_type(0).is_err());
    }

    #[test]
    fn test_typed_accessors() {
        let mut store = GridStore::with_dimensions(4, 4, 10).unwrap();
        store.set_type_at(1, 2, CellType::Snow).unwrap();
        store.set_delta_temperature_at(1, 2, -7).unwrap();
        assert_eq!(store.get_type(6).unwrap(), CellType::Snow);
        assert_eq!(store.get_delta_temperature(6).unwrap(), -7);
        assert_eq!(store.get_type_at(2, 1).unwrap(), CellType::Empty);
    }

    #[test]
    fn test_occupant_array_created_lazily() {
        let mut store = GridStore::with_dimensions(4, 4, 10).unwrap();
        store.set_occupant(3, None).unwrap();
        assert!(!store.has_occupant_array());

        store.set_occupant_at(0, 3, Some(OccupantHandle(9))).unwrap();
        assert!(store.has_occupant_array());
        assert_eq!(store.get_occupant(3).unwrap(), Some(OccupantHandle(9)));
        assert_eq!(store.occupied_count(), 1);

        assert_eq!(store.take_occupant(3).unwrap(), Some(OccupantHandle(9)));
        assert_eq!(store.get_occupant(3).unwrap(), None);
        assert_eq!(store.occupied_count(), 0);
    }

    #[test]
    fn test_cells_and_counts() {
        let mut store = GridStore::with_dimensions(3, 3, 10).unwrap();
        store.set_type_at(0, 1, CellType::Grass).unwrap();
        store.set_type_at(2, 2, CellType::Water).unwrap();

        let cells: Vec<_> = store.cells().collect();
        assert_eq!(cells, vec![(0, 1, CellType::Grass), (2, 2, CellType::Water)]);

        let counts = store.type_counts();
        assert_eq!(counts.get(CellType::Empty), 7);
        assert_eq!(counts.get(CellType::Water), 1);
        assert_eq!(counts.total(), 9);
        assert_eq!(counts.solid(), 2);
    }

    #[test]
    fn test_items_gated_by_flag() {
        let mut store = GridStore::new();
        store.items_mut().push(ItemBlock {
            lived_time: 1.5,
            durability: 3,
            is_watered: true,
            id: 42,
        });
        assert!(store.items().is_none());

        store.set_items_initialized(true);
        let items = store.items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items.id(0).unwrap(), 42);
        assert!(items.is_watered(0).unwrap());
    }

    #[test]
    fn test_item_setters_append_but_reject_gaps() {
        let mut items = ItemBlocks::default();
        items.set_durability(0, 5).unwrap();
        items.set_durability(1, 6).unwrap();
        items.set_durability(0, 4).unwrap();
        assert_eq!(items.durabilities(), &[4, 6]);
        assert!(items.set_durability(5, 1).is_err());
        assert!(items.lived_time(0).is_err());
        // Arrays are sized independently; only complete rows count as items.
        assert_eq!(items.len(), 0);
        assert!(items.get(0).is_none());
    }
}
