//! ProbeTable: open-addressing storage shared by every hash collection.
//!
//! Slots are tri-state (`Empty`, `Deleted`, `Filled`). A filled slot keeps
//! the precomputed hash of its item and its probe distance, so that
//! `slot == (hash % capacity + dist) % capacity` always holds and rehashing
//! never calls back into user `Hash` code.
//!
//! Placement is Robin Hood: walking forward from the home slot, an incoming
//! item that has travelled further than a resident takes the resident's
//! slot, and the resident continues the walk. Removal leaves a tombstone;
//! tombstones do not stop a lookup but are reused by the next placement.
//!
//! The table knows nothing about keys. Callers hash, pass an equality
//! predicate to `find`, and check for duplicates before `insert_unique`.
//! Every time an item lands in a slot, including residents displaced by
//! Robin Hood swaps and items moved by a resize, the caller's `on_place`
//! callback is told the new index; the bidirectional map uses this to keep
//! its back-references exact.

pub(crate) mod capacity;

use crate::config::TableConfig;
use crate::error::{Error, Result};
use crate::reentrancy::DebugReentrancy;
use core::mem;
use std::alloc::{handle_alloc_error, Layout};
use tracing::{debug, warn};

#[derive(Clone, Debug)]
enum Slot<T> {
    Empty,
    Deleted,
    Filled { hash: u64, dist: usize, item: T },
}

/// Resize computed by `ProbeTable::plan_resize`: the new layout, as source
/// slot indexes, and the reserved buffer it will be moved into.
pub(crate) struct ResizePlan<T> {
    layout: Vec<Slot<usize>>,
    slots: Vec<Slot<T>>,
}

#[derive(Clone, Debug)]
pub struct ProbeTable<T> {
    slots: Vec<Slot<T>>,
    count: usize,
    load: f64,
    reentrancy: DebugReentrancy,
}

fn empty_slots<T>(n: usize) -> Result<Vec<Slot<T>>> {
    let mut slots = Vec::new();
    slots.try_reserve_exact(n)?;
    slots.resize_with(n, || Slot::Empty);
    Ok(slots)
}

#[inline]
fn next_pos(pos: usize, cap: usize) -> usize {
    if pos + 1 == cap {
        0
    } else {
        pos + 1
    }
}

// Robin Hood placement. The caller guarantees at least one non-filled slot.
// Returns the slot where `item` itself ended up.
fn place<T>(
    slots: &mut [Slot<T>],
    mut hash: u64,
    mut item: T,
    on_place: &mut impl FnMut(&T, usize),
) -> usize {
    let cap = slots.len();
    let mut pos = (hash % cap as u64) as usize;
    let mut dist = 0usize;
    let mut landed = None;
    loop {
        let slot = &mut slots[pos];
        match slot {
            Slot::Filled {
                hash: h,
                dist: d,
                item: resident,
            } => {
                if *d < dist {
                    mem::swap(h, &mut hash);
                    mem::swap(d, &mut dist);
                    mem::swap(resident, &mut item);
                    on_place(&*resident, pos);
                    landed.get_or_insert(pos);
                }
            }
            Slot::Empty | Slot::Deleted => {
                on_place(&item, pos);
                *slot = Slot::Filled { hash, dist, item };
                return landed.unwrap_or(pos);
            }
        }
        pos = next_pos(pos, cap);
        dist += 1;
    }
}

impl<T> ProbeTable<T> {
    /// Table with exactly `slots` slots (at least one) and the given load factor.
    pub fn new(slots: usize, load: f64) -> Result<Self> {
        if slots == 0 || !(load > 0.0 && load < 1.0) {
            return Err(Error::Invalid);
        }
        Ok(Self {
            slots: empty_slots(slots)?,
            count: 0,
            load,
            reentrancy: DebugReentrancy::new("ProbeTable"),
        })
    }

    pub fn with_config(config: &TableConfig) -> Result<Self> {
        Self::new(config.slot_count()?, config.load)
    }

    /// Table sized by `TableConfig::default()`. Allocation failure goes to
    /// `handle_alloc_error`, as it does for `Vec`.
    pub fn with_default_config() -> Self {
        let config = TableConfig::default();
        let n = capacity::slots_for(config.capacity, config.load);
        let slots = match empty_slots(n) {
            Ok(slots) => slots,
            Err(_) => handle_alloc_error(
                Layout::array::<Slot<T>>(n).unwrap_or_else(|_| Layout::new::<Slot<T>>()),
            ),
        };
        Self {
            slots,
            count: 0,
            load: config.load,
            reentrancy: DebugReentrancy::new("ProbeTable"),
        }
    }

    pub fn len(&self) -> usize {
        self.count
    }

    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    /// Number of slots.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }

    pub fn load(&self) -> f64 {
        self.load
    }

    /// True once the live count reaches `capacity * load`; the next insert
    /// must grow the table first.
    pub fn is_full(&self) -> bool {
        self.slots.len() as f64 * self.load <= self.count as f64
    }

    /// Index of the first filled slot with `hash` whose item satisfies `eq`.
    ///
    /// The scan starts at the home slot and stops at the first empty slot;
    /// tombstones are stepped over.
    pub fn find(&self, hash: u64, mut eq: impl FnMut(&T) -> bool) -> Option<usize> {
        let _g = self.reentrancy.enter();
        let cap = self.slots.len();
        if cap == 0 {
            return None;
        }
        let mut pos = (hash % cap as u64) as usize;
        for _ in 0..cap {
            match &self.slots[pos] {
                Slot::Empty => return None,
                Slot::Deleted => {}
                Slot::Filled { hash: h, item, .. } => {
                    if *h == hash && eq(item) {
                        return Some(pos);
                    }
                }
            }
            pos = next_pos(pos, cap);
        }
        None
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        match self.slots.get(index) {
            Some(Slot::Filled { item, .. }) => Some(item),
            _ => None,
        }
    }

    /// Mutable access to an item. Callers must not change anything that
    /// contributes to its stored hash.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        match self.slots.get_mut(index) {
            Some(Slot::Filled { item, .. }) => Some(item),
            _ => None,
        }
    }

    #[cfg(test)]
    pub(crate) fn probe_distance(&self, index: usize) -> Option<usize> {
        match self.slots.get(index) {
            Some(Slot::Filled { dist, .. }) => Some(*dist),
            _ => None,
        }
    }

    /// Places an item the caller knows to be absent and returns its slot.
    ///
    /// The table must not be full (see `is_full`).
    pub fn insert_unique(
        &mut self,
        hash: u64,
        item: T,
        mut on_place: impl FnMut(&T, usize),
    ) -> usize {
        let _g = self.reentrancy.enter();
        debug_assert!(self.count < self.slots.len(), "no free slot left");
        let pos = place(&mut self.slots, hash, item, &mut on_place);
        self.count += 1;
        pos
    }

    /// Removes the item at `index`, leaving a tombstone behind.
    pub fn take(&mut self, index: usize) -> Option<T> {
        let _g = self.reentrancy.enter();
        let slot = self.slots.get_mut(index)?;
        if !matches!(slot, Slot::Filled { .. }) {
            return None;
        }
        match mem::replace(slot, Slot::Deleted) {
            Slot::Filled { item, .. } => {
                self.count -= 1;
                Some(item)
            }
            _ => None,
        }
    }

    /// Rebuilds the table so that it can hold `capacity` items under its
    /// load factor.
    ///
    /// Returns `Ok(false)` without touching anything when the current slot
    /// count already covers the request. See `plan_resize` for the failure
    /// cases; on failure the table is unchanged.
    pub fn resize(&mut self, capacity: usize, on_place: impl FnMut(&T, usize)) -> Result<bool> {
        match self.plan_resize(capacity)? {
            Some(plan) => {
                self.commit_resize(plan, on_place);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Grows by the smallest step that lifts the table out of `is_full`.
    pub fn grow(&mut self, on_place: impl FnMut(&T, usize)) -> Result<bool> {
        self.resize(self.grow_target(), on_place)
    }

    fn grow_target(&self) -> usize {
        self.slots.len().saturating_add(1)
    }

    /// Computes the layout of a resize without moving any item.
    ///
    /// `Ok(None)` means the current slot count already covers `capacity`.
    /// Every buffer the resize needs is allocated here, so a returned plan
    /// always commits. If the layout does not account for every live item
    /// the resize is abandoned with `Error::Internal`.
    pub(crate) fn plan_resize(&self, capacity: usize) -> Result<Option<ResizePlan<T>>> {
        let _g = self.reentrancy.enter();
        let current = self.slots.len();
        if current == capacity || current as f64 > capacity as f64 / self.load {
            return Ok(None);
        }
        let target = capacity::slots_for(capacity, self.load);
        if (target as f64) < self.count as f64 / self.load {
            return Err(Error::Invalid);
        }

        let mut layout: Vec<Slot<usize>> = empty_slots(target)?;
        let mut placed = 0usize;
        for (index, slot) in self.slots.iter().enumerate() {
            if let Slot::Filled { hash, .. } = slot {
                place(&mut layout, *hash, index, &mut |_: &usize, _: usize| {});
                placed += 1;
            }
        }
        if placed != self.count {
            warn!(
                target: "probing_collections",
                live = self.count,
                placed,
                "probe table rehash did not account for every entry; resize abandoned"
            );
            return Err(Error::Internal("rehash count mismatch"));
        }

        let mut slots: Vec<Slot<T>> = Vec::new();
        slots.try_reserve_exact(target)?;
        Ok(Some(ResizePlan { layout, slots }))
    }

    /// `plan_resize` for the step `grow` would take.
    pub(crate) fn plan_grow(&self) -> Result<Option<ResizePlan<T>>> {
        self.plan_resize(self.grow_target())
    }

    /// Moves every item into the layout of `plan`, reporting each move.
    pub(crate) fn commit_resize(&mut self, plan: ResizePlan<T>, mut on_place: impl FnMut(&T, usize)) {
        let _g = self.reentrancy.enter();
        let ResizePlan { layout, mut slots } = plan;
        let current = self.slots.len();
        let mut old = mem::take(&mut self.slots);
        for (pos, planned) in layout.into_iter().enumerate() {
            match planned {
                Slot::Filled {
                    hash,
                    dist,
                    item: from,
                } => {
                    let item = match mem::replace(&mut old[from], Slot::Empty) {
                        Slot::Filled { item, .. } => item,
                        _ => unreachable!("planned slot {} holds no item", from),
                    };
                    on_place(&item, pos);
                    slots.push(Slot::Filled { hash, dist, item });
                }
                _ => slots.push(Slot::Empty),
            }
        }
        debug!(
            target: "probing_collections",
            from = current,
            to = slots.len(),
            live = self.count,
            "probe table resized"
        );
        self.slots = slots;
    }

    /// Drops every item; the slot buffer is kept and reset in place.
    pub fn clear(&mut self) {
        let mut slots = {
            let _g = self.reentrancy.enter();
            self.count = 0;
            mem::take(&mut self.slots)
        };
        // Item destructors run while the table is detached and empty.
        for slot in slots.iter_mut() {
            *slot = Slot::Empty;
        }
        self.slots = slots;
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            it: self.slots.iter().enumerate(),
            remaining: self.count,
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, T> {
        IterMut {
            it: self.slots.iter_mut().enumerate(),
            remaining: self.count,
        }
    }

    pub fn into_items(self) -> IntoIter<T> {
        IntoIter {
            remaining: self.count,
            it: self.slots.into_iter(),
        }
    }

    #[cfg(test)]
    pub(crate) fn corrupt_count(&mut self, count: usize) {
        self.count = count;
    }

    /// Every filled slot sits `dist` steps after its home slot, scanning
    /// from home reaches it before any empty slot, and the live count
    /// matches the filled slots.
    #[cfg(test)]
    pub(crate) fn assert_probe_invariant(&self) {
        let cap = self.slots.len();
        let mut filled = 0;
        for (idx, slot) in self.slots.iter().enumerate() {
            let Slot::Filled { hash, dist, .. } = slot else {
                continue;
            };
            filled += 1;
            let home = (*hash % cap as u64) as usize;
            assert_eq!((home + dist) % cap, idx, "slot {} misplaced", idx);
            let mut pos = home;
            while pos != idx {
                assert!(!matches!(self.slots[pos], Slot::Empty), "gap before slot {}", idx);
                pos = next_pos(pos, cap);
            }
        }
        assert_eq!(filled, self.count, "live count drifted");
    }
}

/// Iterator over `(slot index, &item)` in slot order.
pub struct Iter<'a, T> {
    it: core::iter::Enumerate<core::slice::Iter<'a, Slot<T>>>,
    remaining: usize,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (usize, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        for (i, slot) in self.it.by_ref() {
            if let Slot::Filled { item, .. } = slot {
                self.remaining -= 1;
                return Some((i, item));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Iter {
            it: self.it.clone(),
            remaining: self.remaining,
        }
    }
}

/// Iterator over `(slot index, &mut item)` in slot order.
pub struct IterMut<'a, T> {
    it: core::iter::Enumerate<core::slice::IterMut<'a, Slot<T>>>,
    remaining: usize,
}

impl<'a, T> Iterator for IterMut<'a, T> {
    type Item = (usize, &'a mut T);

    fn next(&mut self) -> Option<Self::Item> {
        for (i, slot) in self.it.by_ref() {
            if let Slot::Filled { item, .. } = slot {
                self.remaining -= 1;
                return Some((i, item));
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IterMut<'_, T> {}

/// Owning iterator over the live items in slot order.
pub struct IntoIter<T> {
    it: std::vec::IntoIter<Slot<T>>,
    remaining: usize,
}

impl<T> Iterator for IntoIter<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        for slot in self.it.by_ref() {
            if let Slot::Filled { item, .. } = slot {
                self.remaining -= 1;
                return Some(item);
            }
        }
        None
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for IntoIter<T> {}
