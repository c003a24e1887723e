//! HashBidiMap: a key <-> value bijection over two probe tables.
//!
//! Entries live once in a slotmap arena. Table 0 indexes entry ids by key
//! hash and table 1 by value hash. Every entry remembers the slot it holds
//! in each table; the tables report every placement (including residents
//! displaced by Robin Hood swaps and moves during a resize), so those
//! back-references are always exact and removing through one side never
//! needs a second probe on the other.

use crate::config::TableConfig;
use crate::error::{Error, Result};
use crate::hooks::{Callbacks, Event, Hooks};
use crate::raw::{ProbeTable, ResizePlan};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use core::mem;
use hashbrown::hash_map::DefaultHashBuilder;
use slotmap::{DefaultKey, SlotMap};
use tracing::warn;

const KEYS: usize = 0;
const VALS: usize = 1;

#[derive(Clone, Debug)]
struct Entry<K, V> {
    key: K,
    value: V,
    slot: [usize; 2],
}

#[derive(Clone)]
pub struct HashBidiMap<K, V, S = DefaultHashBuilder> {
    entries: SlotMap<DefaultKey, Entry<K, V>>,
    index: [ProbeTable<DefaultKey>; 2],
    hasher: S,
    hooks: Hooks,
}

// Placement callback keeping `slot[side]` in step with the table.
fn track<K, V>(
    entries: &mut SlotMap<DefaultKey, Entry<K, V>>,
    side: usize,
) -> impl FnMut(&DefaultKey, usize) + '_ {
    move |id, pos| {
        if let Some(e) = entries.get_mut(*id) {
            e.slot[side] = pos;
        }
    }
}

impl<K, V> HashBidiMap<K, V>
where
    K: Eq + Hash,
    V: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_config(config: TableConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, Default::default())
    }
}

impl<K, V> Default for HashBidiMap<K, V>
where
    K: Eq + Hash,
    V: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> HashBidiMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            entries: SlotMap::with_key(),
            index: [
                ProbeTable::with_default_config(),
                ProbeTable::with_default_config(),
            ],
            hasher,
            hooks: Hooks::default(),
        }
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self> {
        Ok(Self {
            entries: SlotMap::with_key(),
            index: [ProbeTable::with_config(&config)?, ProbeTable::with_config(&config)?],
            hasher,
            hooks: Hooks::default(),
        })
    }

    fn make_hash<Q>(&self, q: &Q) -> u64
    where
        Q: ?Sized + Hash,
    {
        self.hasher.hash_one(q)
    }

    // (slot in the key table, entry id)
    fn locate_key<Q>(&self, key: &Q) -> Option<(usize, DefaultKey)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(key);
        let entries = &self.entries;
        let idx = self.index[KEYS].find(hash, |id| {
            entries.get(*id).map_or(false, |e| e.key.borrow() == key)
        })?;
        self.index[KEYS].get(idx).map(|id| (idx, *id))
    }

    // (slot in the value table, entry id)
    fn locate_val<Q>(&self, value: &Q) -> Option<(usize, DefaultKey)>
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(value);
        let entries = &self.entries;
        let idx = self.index[VALS].find(hash, |id| {
            entries.get(*id).map_or(false, |e| e.value.borrow() == value)
        })?;
        self.index[VALS].get(idx).map(|id| (idx, *id))
    }

    // Slot that entry `id` claims in table `side`, verified against the table.
    fn back_ref(&self, side: usize, id: DefaultKey) -> Result<usize> {
        let slot = self
            .entries
            .get(id)
            .map(|e| e.slot[side])
            .ok_or(Error::Internal("indexed entry is missing"))?;
        if self.index[side].get(slot) != Some(&id) {
            warn!(
                target: "probing_collections",
                side,
                slot,
                "bidirectional map back-reference does not point at its entry"
            );
            return Err(Error::Internal("back-reference mismatch"));
        }
        Ok(slot)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.index[KEYS].is_full() || self.index[VALS].is_full()
    }

    /// Slot count of each of the two tables.
    pub fn capacity(&self) -> usize {
        self.index[KEYS].capacity()
    }

    pub fn load(&self) -> f64 {
        self.index[KEYS].load()
    }

    pub fn set_callbacks<C: Callbacks + 'static>(&mut self, callbacks: C) {
        self.hooks.set(callbacks);
    }

    pub fn clear_callbacks(&mut self) {
        self.hooks.clear();
    }

    /// Grows both tables so that `capacity` pairs fit under the load factor.
    /// Both layouts are planned before either table changes, so a failure
    /// leaves the two tables at their previous, equal size.
    pub fn resize(&mut self, capacity: usize) -> Result<()> {
        let plans = [
            self.index[KEYS].plan_resize(capacity)?,
            self.index[VALS].plan_resize(capacity)?,
        ];
        self.commit_resizes(plans);
        Ok(())
    }

    fn grow_if_full(&mut self) -> Result<()> {
        let mut plans = [None, None];
        for side in [KEYS, VALS] {
            if self.index[side].is_full() {
                plans[side] = self.index[side].plan_grow()?;
            }
        }
        self.commit_resizes(plans);
        Ok(())
    }

    fn commit_resizes(&mut self, plans: [Option<ResizePlan<DefaultKey>>; 2]) {
        let mut resized = false;
        for (side, plan) in plans.into_iter().enumerate() {
            if let Some(plan) = plan {
                self.index[side].commit_resize(plan, track(&mut self.entries, side));
                resized = true;
            }
        }
        if resized {
            self.hooks.fire(Event::Resize);
        }
    }

    /// Adds a pair. Fails with `Duplicate` when either the key or the value
    /// is already mapped.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        self.grow_if_full()?;
        if self.locate_key(&key).is_some() || self.locate_val(&value).is_some() {
            return Err(Error::Duplicate);
        }
        let hash = [self.make_hash(&key), self.make_hash(&value)];
        let id = self.entries.insert(Entry {
            key,
            value,
            slot: [0; 2],
        });
        for side in [KEYS, VALS] {
            self.index[side].insert_unique(hash[side], id, track(&mut self.entries, side));
        }
        self.hooks.fire(Event::Create);
        Ok(())
    }

    /// Re-keys the pair holding `value` and returns the key it had before.
    /// When `new_key` already is its key nothing changes and `new_key` is
    /// handed back.
    pub fn update_key<Q>(&mut self, value: &Q, new_key: K) -> Result<K>
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let (_, id) = self.locate_val(value).ok_or(Error::NotFound)?;
        if self.entries.get(id).map_or(false, |e| e.key == new_key) {
            self.hooks.fire(Event::Update);
            return Ok(new_key);
        }
        if self.locate_key(&new_key).is_some() {
            return Err(Error::Duplicate);
        }
        self.back_ref(VALS, id)?;
        let slot = self.back_ref(KEYS, id)?;

        let hash = self.make_hash(&new_key);
        self.index[KEYS].take(slot);
        let entry = self
            .entries
            .get_mut(id)
            .ok_or(Error::Internal("indexed entry is missing"))?;
        let old = mem::replace(&mut entry.key, new_key);
        self.index[KEYS].insert_unique(hash, id, track(&mut self.entries, KEYS));
        self.hooks.fire(Event::Update);
        Ok(old)
    }

    /// Replaces the value paired with `key` and returns the previous value.
    /// When `new_value` already is its value nothing changes and
    /// `new_value` is handed back.
    pub fn update_val<Q>(&mut self, key: &Q, new_value: V) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let (_, id) = self.locate_key(key).ok_or(Error::NotFound)?;
        if self.entries.get(id).map_or(false, |e| e.value == new_value) {
            self.hooks.fire(Event::Update);
            return Ok(new_value);
        }
        if self.locate_val(&new_value).is_some() {
            return Err(Error::Duplicate);
        }
        self.back_ref(KEYS, id)?;
        let slot = self.back_ref(VALS, id)?;

        let hash = self.make_hash(&new_value);
        self.index[VALS].take(slot);
        let entry = self
            .entries
            .get_mut(id)
            .ok_or(Error::Internal("indexed entry is missing"))?;
        let old = mem::replace(&mut entry.value, new_value);
        self.index[VALS].insert_unique(hash, id, track(&mut self.entries, VALS));
        self.hooks.fire(Event::Update);
        Ok(old)
    }

    // Unlinks entry `id` from both tables and the arena.
    fn unlink(&mut self, id: DefaultKey) -> Result<(K, V)> {
        let slots = [self.back_ref(KEYS, id)?, self.back_ref(VALS, id)?];
        for side in [KEYS, VALS] {
            self.index[side].take(slots[side]);
        }
        let entry = self
            .entries
            .remove(id)
            .ok_or(Error::Internal("indexed entry is missing"))?;
        self.hooks.fire(Event::Delete);
        Ok((entry.key, entry.value))
    }

    pub fn remove_by_key<Q>(&mut self, key: &Q) -> Result<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let (_, id) = self.locate_key(key).ok_or(Error::NotFound)?;
        self.unlink(id)
    }

    pub fn remove_by_val<Q>(&mut self, value: &Q) -> Result<(K, V)>
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let (_, id) = self.locate_val(value).ok_or(Error::NotFound)?;
        self.unlink(id)
    }

    /// Key paired with `value`.
    pub fn get_key<Q>(&self, value: &Q) -> Result<&K>
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (_, id) = self.locate_val(value).ok_or(Error::NotFound)?;
        let entry = self
            .entries
            .get(id)
            .ok_or(Error::Internal("indexed entry is missing"))?;
        self.hooks.fire(Event::Read);
        Ok(&entry.key)
    }

    /// Value paired with `key`.
    pub fn get_val<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let (_, id) = self.locate_key(key).ok_or(Error::NotFound)?;
        let entry = self
            .entries
            .get(id)
            .ok_or(Error::Internal("indexed entry is missing"))?;
        self.hooks.fire(Event::Read);
        Ok(&entry.value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let found = self.locate_key(key).is_some();
        self.hooks.fire(Event::Read);
        found
    }

    pub fn contains_val<Q>(&self, value: &Q) -> bool
    where
        V: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let found = self.locate_val(value).is_some();
        self.hooks.fire(Event::Read);
        found
    }

    pub fn clear(&mut self) {
        for table in &mut self.index {
            table.clear();
        }
        self.entries.clear();
    }

    /// Iterator over `(&K, &V)` pairs in arena order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.entries.values(),
        }
    }
}

pub struct Iter<'a, K, V> {
    it: slotmap::basic::Values<'a, DefaultKey, Entry<K, V>>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|e| (&e.key, &e.value))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashBidiMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> PartialEq for HashBidiMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq + Hash,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(k, v)| {
                other
                    .locate_key(k)
                    .and_then(|(_, id)| other.entries.get(id))
                    .map_or(false, |e| e.value == *v)
            })
    }
}

impl<K, V, S> Eq for HashBidiMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq + Hash,
    S: BuildHasher,
{
}

impl<K, V, S> fmt::Debug for HashBidiMap<K, V, S>
where
    K: Eq + Hash + fmt::Debug,
    V: Eq + Hash + fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash_map::tests::ConstBuildHasher;
    use crate::hooks::tests::Recorder;
    use core::hash::Hasher;

    /// Hashes a `u64` to itself so tests can choose home slots.
    #[derive(Clone, Default)]
    struct IdentityBuildHasher;
    #[derive(Default)]
    struct IdentityHasher(u64);
    impl BuildHasher for IdentityBuildHasher {
        type Hasher = IdentityHasher;
        fn build_hasher(&self) -> Self::Hasher {
            IdentityHasher::default()
        }
    }
    impl Hasher for IdentityHasher {
        fn write(&mut self, bytes: &[u8]) {
            for b in bytes {
                self.0 = self.0.wrapping_mul(31).wrapping_add(*b as u64);
            }
        }
        fn write_u64(&mut self, n: u64) {
            self.0 = n;
        }
        fn finish(&self) -> u64 {
            self.0
        }
    }

    /// Invariant: every live entry is referenced from exactly the slots it
    /// records, and both tables hold one slot per entry.
    fn assert_back_refs<K, V, S>(m: &HashBidiMap<K, V, S>)
    where
        K: Eq + Hash,
        V: Eq + Hash,
        S: BuildHasher,
    {
        for side in [KEYS, VALS] {
            assert_eq!(m.index[side].len(), m.entries.len());
            for (id, e) in m.entries.iter() {
                assert_eq!(m.index[side].get(e.slot[side]), Some(&id), "side {}", side);
            }
        }
    }

    #[test]
    fn insert_and_lookup_both_ways() {
        let mut m: HashBidiMap<i32, String> = HashBidiMap::new();
        m.insert(1, "a".to_string()).unwrap();
        m.insert(2, "b".to_string()).unwrap();
        assert_eq!(m.get_val(&1).map(String::as_str), Ok("a"));
        assert_eq!(m.get_key("b"), Ok(&2));
        assert_eq!(m.get_key("zz"), Err(Error::NotFound));
        assert!(m.contains_key(&2));
        assert!(m.contains_val("a"));
        assert_back_refs(&m);
    }

    /// Invariant: a pair is rejected when either side is already mapped.
    #[test]
    fn duplicate_key_or_value_rejected() {
        let mut m: HashBidiMap<i32, char> = HashBidiMap::new();
        m.insert(1, 'a').unwrap();
        assert_eq!(m.insert(1, 'b'), Err(Error::Duplicate));
        assert_eq!(m.insert(2, 'a'), Err(Error::Duplicate));
        assert_eq!(m.len(), 1);
        assert_eq!(m.get_val(&1), Ok(&'a'));
    }

    /// Invariant: back-references follow residents displaced by Robin Hood
    /// placement, so removal through either side unlinks the right slots.
    #[test]
    fn back_refs_follow_displacement() {
        let mut m: HashBidiMap<u64, u64, IdentityBuildHasher> =
            HashBidiMap::with_hasher(IdentityBuildHasher);
        // Homes 3, 4, 3 in the key table: the third key displaces the second.
        m.insert(3, 100).unwrap();
        m.insert(4, 200).unwrap();
        m.insert(56, 300).unwrap();
        let (_, displaced) = m.locate_key(&4u64).unwrap();
        assert_eq!(m.entries[displaced].slot[KEYS], 5);
        assert_back_refs(&m);
        assert_eq!(m.remove_by_val(&200u64), Ok((4, 200)));
        assert_back_refs(&m);
        assert_eq!(m.get_key(&300u64), Ok(&56));
        assert_eq!(m.remove_by_key(&3u64), Ok((3, 100)));
        assert_eq!(m.get_val(&56u64), Ok(&300));
        assert_back_refs(&m);
    }

    /// Invariant: moves during growth keep back-references exact.
    #[test]
    fn back_refs_survive_growth() {
        let mut m: HashBidiMap<u32, u32> = HashBidiMap::new();
        let cap = m.capacity();
        for i in 0..500 {
            m.insert(i, 1_000 + i).unwrap();
        }
        assert!(m.capacity() > cap);
        assert_back_refs(&m);
        for i in (0..500).step_by(3) {
            m.remove_by_key(&i).unwrap();
        }
        assert_back_refs(&m);
        for i in 0..500 {
            assert_eq!(m.contains_val(&(1_000 + i)), i % 3 != 0);
        }
    }

    #[test]
    fn update_key_moves_only_the_key_side() {
        let mut m: HashBidiMap<i32, &str> = HashBidiMap::new();
        m.insert(1, "a").unwrap();
        m.insert(5, "e").unwrap();
        assert_eq!(m.update_key("a", 2), Ok(1));
        assert_eq!(m.get_key("a"), Ok(&2));
        assert_eq!(m.get_val(&1), Err(Error::NotFound));
        assert_eq!(m.get_val(&2), Ok(&"a"));
        // Same key: success, nothing moves.
        assert_eq!(m.update_key("a", 2), Ok(2));
        // Key held by another pair.
        assert_eq!(m.update_key("a", 5), Err(Error::Duplicate));
        assert_eq!(m.update_key("q", 9), Err(Error::NotFound));
        assert_back_refs(&m);
    }

    #[test]
    fn update_val_moves_only_the_value_side() {
        let mut m: HashBidiMap<i32, String> = HashBidiMap::new();
        m.insert(1, "a".to_string()).unwrap();
        m.insert(2, "b".to_string()).unwrap();
        assert_eq!(m.update_val(&1, "z".to_string()), Ok("a".to_string()));
        assert_eq!(m.get_key("z"), Ok(&1));
        assert_eq!(m.get_key("a"), Err(Error::NotFound));
        assert_eq!(m.update_val(&1, "b".to_string()), Err(Error::Duplicate));
        assert_back_refs(&m);
    }

    #[test]
    fn empty_map_errors() {
        let mut m: HashBidiMap<i32, i32> = HashBidiMap::new();
        assert_eq!(m.remove_by_key(&1), Err(Error::Empty));
        assert_eq!(m.remove_by_val(&1), Err(Error::Empty));
        assert_eq!(m.update_key(&1, 2), Err(Error::Empty));
        assert_eq!(m.update_val(&1, 2), Err(Error::Empty));
        assert_eq!(m.get_val(&1), Err(Error::NotFound));
    }

    /// Invariant: a corrupted back-reference is reported as an internal
    /// fault and the map is left untouched.
    #[test]
    fn corrupted_back_ref_is_internal_error() {
        let mut m: HashBidiMap<i32, i32> = HashBidiMap::new();
        m.insert(1, 10).unwrap();
        m.insert(2, 20).unwrap();
        let (_, id) = m.locate_key(&1).unwrap();
        let (_, id2) = m.locate_key(&2).unwrap();
        let stolen = m.entries[id2].slot[VALS];
        m.entries[id].slot[VALS] = stolen;
        assert_eq!(
            m.remove_by_key(&1),
            Err(Error::Internal("back-reference mismatch"))
        );
        assert_eq!(m.len(), 2);
        assert!(m.contains_key(&1));
    }

    #[test]
    fn collisions_on_both_sides() {
        let mut m: HashBidiMap<u8, u16, ConstBuildHasher> = HashBidiMap::with_hasher(ConstBuildHasher);
        for i in 0..20u8 {
            m.insert(i, i as u16 * 7).unwrap();
        }
        assert_eq!(m.get_key(&91u16), Ok(&13));
        m.remove_by_val(&0u16).unwrap();
        assert_eq!(m.get_val(&19u8), Ok(&133));
        assert_back_refs(&m);
    }

    #[test]
    fn clone_eq_clear_debug() {
        let mut a: HashBidiMap<i32, char> = HashBidiMap::new();
        a.insert(1, 'x').unwrap();
        let mut b = a.clone();
        assert_eq!(a, b);
        b.update_val(&1, 'y').unwrap();
        assert_ne!(a, b);
        assert_eq!(format!("{:?}", a), "{1: 'x'}");
        a.clear();
        assert!(a.is_empty());
        assert!(!a.contains_val(&'x'));
    }

    #[test]
    fn callbacks_report_operations() {
        let rec = Recorder::default();
        let mut m: HashBidiMap<i32, i32> = HashBidiMap::new();
        m.set_callbacks(rec.clone());
        m.insert(1, 1).unwrap();
        m.update_key(&1, 3).unwrap();
        m.get_val(&3).unwrap();
        m.remove_by_val(&1).unwrap();
        assert_eq!(
            rec.events(),
            vec![Event::Create, Event::Update, Event::Read, Event::Delete]
        );
    }

    /// Invariant: when one table cannot be rebuilt, neither is, so both
    /// keep the same slot count and no resize is reported.
    #[test]
    fn failed_resize_leaves_both_tables_in_step() {
        let rec = Recorder::default();
        let mut m: HashBidiMap<i32, i32> = HashBidiMap::new();
        for i in 0..10 {
            m.insert(i, -i).unwrap();
        }
        m.set_callbacks(rec.clone());
        let before = m.capacity();

        m.index[VALS].corrupt_count(11);
        assert_eq!(m.resize(1_000), Err(Error::Internal("rehash count mismatch")));
        assert_eq!(m.index[KEYS].capacity(), before);
        assert_eq!(m.index[VALS].capacity(), before);
        assert!(rec.events().is_empty());

        m.index[VALS].corrupt_count(10);
        m.resize(1_000).unwrap();
        assert!(m.capacity() > before);
        assert_eq!(m.index[KEYS].capacity(), m.index[VALS].capacity());
        assert_eq!(rec.events(), vec![Event::Resize]);
        assert_back_refs(&m);
        assert_eq!(m.get_key(&-7), Ok(&7));
    }
}
