//! Fixed-capacity generational arena for live items.

use gridsnake_core::{CellCoord, ItemId, ItemKind, ItemSnapshot};

/// Item stored inside the arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct Item {
    pub(crate) kind: ItemKind,
    pub(crate) cell: CellCoord,
}

#[derive(Clone, Debug)]
struct Slot {
    generation: u32,
    item: Option<Item>,
}

/// Slot array whose capacity is fixed when the session is built.
///
/// Freed slots are reused; each reuse bumps the slot generation so stale
/// [`ItemId`]s never resolve to a newer item.
#[derive(Clone, Debug)]
pub(crate) struct ItemArena {
    slots: Vec<Slot>,
}

impl ItemArena {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: (0..capacity)
                .map(|_| Slot {
                    generation: 0,
                    item: None,
                })
                .collect(),
        }
    }

    /// Stores the item in the first free slot, or returns `None` when full.
    pub(crate) fn insert(&mut self, item: Item) -> Option<ItemId> {
        let (index, slot) = self
            .slots
            .iter_mut()
            .enumerate()
            .find(|(_, slot)| slot.item.is_none())?;
        let index = u32::try_from(index).ok()?;
        slot.item = Some(item);
        Some(ItemId::new(index, slot.generation))
    }

    pub(crate) fn get(&self, id: ItemId) -> Option<&Item> {
        let slot = self.slots.get(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        slot.item.as_ref()
    }

    pub(crate) fn remove(&mut self, id: ItemId) -> Option<Item> {
        let slot = self.slots.get_mut(id.index() as usize)?;
        if slot.generation != id.generation() {
            return None;
        }
        let item = slot.item.take()?;
        slot.generation = slot.generation.wrapping_add(1);
        Some(item)
    }

    pub(crate) fn count(&self, kind: ItemKind) -> usize {
        self.iter().filter(|(_, item)| item.kind == kind).count()
    }

    pub(crate) fn iter(&self) -> impl Iterator<Item = (ItemId, &Item)> {
        self.slots.iter().enumerate().filter_map(|(index, slot)| {
            let index = u32::try_from(index).ok()?;
            slot.item
                .as_ref()
                .map(|item| (ItemId::new(index, slot.generation), item))
        })
    }

    pub(crate) fn snapshots(&self, points: impl Fn(ItemKind) -> u32) -> Vec<ItemSnapshot> {
        self.iter()
            .map(|(id, item)| ItemSnapshot {
                id,
                kind: item.kind,
                cell: item.cell,
                points: points(item.kind),
            })
            .collect()
    }
}
