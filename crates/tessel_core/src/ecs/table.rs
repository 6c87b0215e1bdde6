// table.rs - Dense per-entity component table
//
// Rows live packed in `[0, len)` of a single owned buffer. A side map
// translates entity index -> slot. Deleting swaps the tail row into the
// hole, so iteration never meets tombstones but row order is not stable.

use super::Entity;
use std::collections::HashMap;
use thiserror::Error;

/// Rows added each time the table runs out of capacity.
pub const DEFAULT_GROWTH_STEP: usize = 64;

/// A row type that can live in a [`ComponentTable`].
///
/// `Default` must produce a vacant row whose [`entity`](TableRow::entity)
/// is [`Entity::NULL`]; it is written into every cleared slot.
pub trait TableRow: Default {
    /// The owning entity, or `Entity::NULL` for a vacant slot.
    fn entity(&self) -> Entity;

    /// Row for an entity registered for the first time, with defaults applied.
    fn with_entity(entity: Entity) -> Self;
}

/// Structural problems reported by bounds-checked access and
/// [`ComponentTable::check_invariants`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TableError {
    #[error("slot {slot} is out of bounds (live count {len})")]
    SlotOutOfBounds { slot: usize, len: usize },

    #[error("index map holds {mapped} entries but {live} slots are live")]
    MapSizeMismatch { mapped: usize, live: usize },

    #[error("entity index {index} maps to slot {slot}, which holds entity index {found}")]
    EntityMismatch { index: u32, slot: usize, found: u32 },
}

/// Dense storage of one component kind, addressed by entity.
///
/// References returned by the accessors are only valid until the next
/// structural mutation (insert, delete, destroy); the borrow checker
/// enforces this.
pub struct ComponentTable<T> {
    rows: Vec<T>,
    map: HashMap<u32, usize>,
    len: usize,
    step: usize,
}

impl<T: TableRow> ComponentTable<T> {
    pub fn new() -> Self {
        Self::with_step(DEFAULT_GROWTH_STEP)
    }

    /// Create a table that grows `step` rows at a time. `step` must be non-zero.
    pub fn with_step(step: usize) -> Self {
        assert!(step > 0, "component table growth step must be non-zero");
        Self {
            rows: Vec::new(),
            map: HashMap::new(),
            len: 0,
            step,
        }
    }

    /// Return the row for `entity`, creating it with defaults if absent.
    ///
    /// A row left behind by an older generation of the same index is
    /// reinitialized in place.
    pub fn new_comp(&mut self, entity: Entity) -> &mut T {
        debug_assert!(!entity.is_null(), "cannot register the null entity");

        if let Some(&slot) = self.map.get(&entity.index()) {
            if self.rows[slot].entity() != entity {
                tracing::trace!(
                    index = entity.index(),
                    generation = entity.generation(),
                    slot,
                    "reinitializing row held by a stale generation"
                );
                self.rows[slot] = T::with_entity(entity);
            }
            return &mut self.rows[slot];
        }

        if self.len >= self.rows.len() {
            self.grow();
        }
        let slot = self.len;
        self.rows[slot] = T::with_entity(entity);
        self.map.insert(entity.index(), slot);
        self.len += 1;
        &mut self.rows[slot]
    }

    /// Look up without creating.
    pub fn comp(&self, entity: Entity) -> Option<&T> {
        let slot = self.slot_of(entity)?;
        Some(&self.rows[slot])
    }

    pub fn comp_mut(&mut self, entity: Entity) -> Option<&mut T> {
        let slot = self.slot_of(entity)?;
        Some(&mut self.rows[slot])
    }

    /// Slot currently holding `entity`'s row.
    pub fn slot_of(&self, entity: Entity) -> Option<usize> {
        let slot = *self.map.get(&entity.index())?;
        (self.rows[slot].entity() == entity).then_some(slot)
    }

    /// Whether `entity` currently owns a non-vacant row.
    pub fn alive(&self, entity: Entity) -> bool {
        !entity.is_null() && self.slot_of(entity).is_some()
    }

    /// Remove `entity`'s row. Returns false if there was nothing to remove.
    pub fn delete(&mut self, entity: Entity) -> bool {
        let Some(slot) = self.slot_of(entity) else {
            return false;
        };

        self.map.remove(&entity.index());
        if let Some((from, to)) = swap_remove_row(&mut self.rows, self.len, slot) {
            let moved = self.rows[to].entity();
            debug_assert_eq!(self.map.get(&moved.index()), Some(&from));
            self.map.insert(moved.index(), to);
        }
        self.len -= 1;

        debug_assert_eq!(self.map.len(), self.len);
        tracing::trace!(index = entity.index(), slot, live = self.len, "deleted row");
        true
    }

    /// Drop every row and release the storage.
    pub fn destroy(&mut self) {
        self.rows = Vec::new();
        self.map.clear();
        self.len = 0;
    }

    /// Bounds-checked access by slot.
    pub fn row(&self, slot: usize) -> Result<&T, TableError> {
        if slot >= self.len {
            return Err(TableError::SlotOutOfBounds {
                slot,
                len: self.len,
            });
        }
        Ok(&self.rows[slot])
    }

    pub fn row_mut(&mut self, slot: usize) -> Result<&mut T, TableError> {
        if slot >= self.len {
            return Err(TableError::SlotOutOfBounds {
                slot,
                len: self.len,
            });
        }
        Ok(&mut self.rows[slot])
    }

    /// Live rows, densely packed.
    pub fn as_slice(&self) -> &[T] {
        &self.rows[..self.len]
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.as_slice().iter()
    }

    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, T> {
        self.rows[..self.len].iter_mut()
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn capacity(&self) -> usize {
        self.rows.len()
    }

    /// (live rows, allocated rows)
    pub fn size(&self) -> (usize, usize) {
        (self.len, self.rows.len())
    }

    /// Verify that the index map and the dense rows agree.
    pub fn check_invariants(&self) -> Result<(), TableError> {
        if self.map.len() != self.len {
            return Err(TableError::MapSizeMismatch {
                mapped: self.map.len(),
                live: self.len,
            });
        }
        for (&index, &slot) in &self.map {
            if slot >= self.len {
                return Err(TableError::SlotOutOfBounds {
                    slot,
                    len: self.len,
                });
            }
            let found = self.rows[slot].entity().index();
            if found != index {
                return Err(TableError::EntityMismatch { index, slot, found });
            }
        }
        Ok(())
    }

    fn grow(&mut self) {
        let target = self.rows.len() + self.step;
        self.rows.resize_with(target, T::default);
        tracing::trace!(capacity = target, "component table grew");
    }
}

impl<T: TableRow> Default for ComponentTable<T> {
    fn default() -> Self {
        Self::new()
    }
}

/// Remove `slot` from the live prefix `[0, len)`, moving the tail row into
/// it and clearing the vacated tail. Returns `(from, to)` if a row moved.
fn swap_remove_row<T: Default>(rows: &mut [T], len: usize, slot: usize) -> Option<(usize, usize)> {
    debug_assert!(slot < len && len <= rows.len());
    let last = len - 1;
    let moved = if slot != last {
        rows.swap(slot, last);
        Some((last, slot))
    } else {
        None
    };
    rows[last] = T::default();
    moved
}
