//! HashMap: unique keys mapped to values over the Robin Hood probe table.

use crate::config::TableConfig;
use crate::error::{Error, Result};
use crate::hooks::{Callbacks, Event, Hooks};
use crate::raw::{self, ProbeTable};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

/// Hash map with open addressing, Robin Hood placement and tombstone
/// deletion. Duplicate inserts are rejected rather than overwriting.
#[derive(Clone)]
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    table: ProbeTable<(K, V)>,
    hasher: S,
    hooks: Hooks,
}

impl<K, V> HashMap<K, V>
where
    K: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_config(config: TableConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, Default::default())
    }
}

impl<K, V> Default for HashMap<K, V>
where
    K: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: ProbeTable::with_default_config(),
            hasher,
            hooks: Hooks::default(),
        }
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self> {
        Ok(Self {
            table: ProbeTable::with_config(&config)?,
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

    fn locate<Q>(&self, key: &Q) -> Option<usize>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.make_hash(key);
        self.table.find(hash, |(k, _)| k.borrow() == key)
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// True when the next insert will resize the table first.
    pub fn is_full(&self) -> bool {
        self.table.is_full()
    }

    /// Number of slots in the underlying table.
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    pub fn load(&self) -> f64 {
        self.table.load()
    }

    pub fn set_callbacks<C: Callbacks + 'static>(&mut self, callbacks: C) {
        self.hooks.set(callbacks);
    }

    pub fn clear_callbacks(&mut self) {
        self.hooks.clear();
    }

    fn grow_if_full(&mut self) -> Result<()> {
        if self.table.is_full() && self.table.grow(|_, _| {})? {
            self.hooks.fire(Event::Resize);
        }
        Ok(())
    }

    /// Inserts a new key. Fails with `Duplicate` if the key is present; the
    /// stored value is left untouched.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        self.grow_if_full()?;
        if self.locate(&key).is_some() {
            return Err(Error::Duplicate);
        }
        let hash = self.make_hash(&key);
        self.table.insert_unique(hash, (key, value), |_, _| {});
        self.hooks.fire(Event::Create);
        Ok(())
    }

    /// Replaces the value of an existing key and returns the old one.
    pub fn update<Q>(&mut self, key: &Q, value: V) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let idx = self.locate(key).ok_or(Error::NotFound)?;
        let (_, slot) = self
            .table
            .get_mut(idx)
            .ok_or(Error::Internal("located slot is not filled"))?;
        let old = core::mem::replace(slot, value);
        self.hooks.fire(Event::Update);
        Ok(old)
    }

    /// Removes a key, handing the owned pair back to the caller.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let idx = self.locate(key).ok_or(Error::NotFound)?;
        let pair = self
            .table
            .take(idx)
            .ok_or(Error::Internal("located slot is not filled"))?;
        self.hooks.fire(Event::Delete);
        Ok(pair)
    }

    pub fn get<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let idx = self.locate(key).ok_or(Error::NotFound)?;
        let (_, v) = self
            .table
            .get(idx)
            .ok_or(Error::Internal("located slot is not filled"))?;
        self.hooks.fire(Event::Read);
        Ok(v)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let idx = self.locate(key).ok_or(Error::NotFound)?;
        self.hooks.fire(Event::Read);
        self.table
            .get_mut(idx)
            .map(|(_, v)| v)
            .ok_or(Error::Internal("located slot is not filled"))
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let found = self.locate(key).is_some();
        self.hooks.fire(Event::Read);
        found
    }

    /// Grows the table so it can hold `capacity` entries under its load
    /// factor. Requests the table already covers succeed without change.
    pub fn resize(&mut self, capacity: usize) -> Result<()> {
        if self.table.resize(capacity, |_, _| {})? {
            self.hooks.fire(Event::Resize);
        }
        Ok(())
    }

    /// Drops every entry, keeping the current capacity.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            it: self.table.iter(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            it: self.table.iter_mut(),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl Iterator<Item = &V> + '_ {
        self.iter().map(|(_, v)| v)
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Eq + Hash + Ord,
    S: BuildHasher,
{
    /// Entry with the greatest key. Linear in the capacity.
    pub fn max(&self) -> Result<(&K, &V)> {
        let best = self.iter().max_by(|a, b| a.0.cmp(b.0)).ok_or(Error::Empty)?;
        self.hooks.fire(Event::Read);
        Ok(best)
    }

    /// Entry with the smallest key. Linear in the capacity.
    pub fn min(&self) -> Result<(&K, &V)> {
        let best = self.iter().min_by(|a, b| a.0.cmp(b.0)).ok_or(Error::Empty)?;
        self.hooks.fire(Event::Read);
        Ok(best)
    }
}

/// Iterator over `(&K, &V)` in slot order.
pub struct Iter<'a, K, V> {
    it: raw::Iter<'a, (K, V)>,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, (k, v))| (k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

/// Iterator over `(&K, &mut V)` in slot order.
pub struct IterMut<'a, K, V> {
    it: raw::IterMut<'a, (K, V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, (k, v))| (&*k, v))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K, V, S> IntoIterator for HashMap<K, V, S> {
    type Item = (K, V);
    type IntoIter = IntoIter<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        IntoIter {
            it: self.table.into_items(),
        }
    }
}

/// Owning iterator over `(K, V)` in slot order.
pub struct IntoIter<K, V> {
    it: raw::IntoIter<(K, V)>,
}

impl<K, V> Iterator for IntoIter<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> ExactSizeIterator for IntoIter<K, V> {}

impl<K, V, S> PartialEq for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: PartialEq,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.iter().all(|(k, v)| {
                other
                    .locate(k)
                    .and_then(|idx| other.table.get(idx))
                    .map_or(false, |(_, ov)| ov == v)
            })
    }
}

impl<K, V, S> Eq for HashMap<K, V, S>
where
    K: Eq + Hash,
    V: Eq,
    S: BuildHasher,
{
}

impl<K, V, S> fmt::Debug for HashMap<K, V, S>
where
    K: Eq + Hash + fmt::Debug,
    V: fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::hooks::tests::Recorder;
    use std::collections::BTreeSet;

    #[derive(Clone, Default)]
    pub(crate) struct ConstBuildHasher;
    pub(crate) struct ConstHasher;
    impl BuildHasher for ConstBuildHasher {
        type Hasher = ConstHasher;
        fn build_hasher(&self) -> Self::Hasher {
            ConstHasher
        }
    }
    impl core::hash::Hasher for ConstHasher {
        fn write(&mut self, _bytes: &[u8]) {}
        // Force all keys into the same home slot.
        fn finish(&self) -> u64 {
            0
        }
    }

    /// Invariant: Duplicate keys are rejected and the stored value is kept.
    #[test]
    fn duplicate_insert_rejected() {
        let mut m: HashMap<i32, &str> = HashMap::new();
        m.insert(1, "a").unwrap();
        m.insert(2, "b").unwrap();
        assert_eq!(m.insert(1, "x"), Err(Error::Duplicate));
        assert_eq!(m.get(&1), Ok(&"a"));
        assert_eq!(m.len(), 2);
    }

    /// Invariant: Borrowed lookup works (store `String`, query with `&str`).
    #[test]
    fn borrowed_lookup_with_str() {
        let mut m: HashMap<String, i32> = HashMap::new();
        m.insert("hello".to_string(), 1).unwrap();
        assert!(m.contains_key("hello"));
        assert!(!m.contains_key("world"));
        assert_eq!(m.get("hello"), Ok(&1));
        assert_eq!(m.get("world"), Err(Error::NotFound));
    }

    /// Invariant: Operations on an empty map report `Empty` rather than `NotFound`.
    #[test]
    fn empty_map_errors() {
        let mut m: HashMap<i32, i32> = HashMap::new();
        assert_eq!(m.get(&1), Err(Error::Empty));
        assert_eq!(m.remove(&1), Err(Error::Empty));
        assert_eq!(m.update(&1, 3), Err(Error::Empty));
        assert_eq!(m.max(), Err(Error::Empty));
        assert!(!m.contains_key(&1));
    }

    /// Invariant: `update` swaps the value in place and returns the previous one.
    #[test]
    fn update_and_get_mut() {
        let mut m: HashMap<&str, i32> = HashMap::new();
        m.insert("k", 10).unwrap();
        assert_eq!(m.update("k", 11), Ok(10));
        *m.get_mut("k").unwrap() += 4;
        assert_eq!(m.get("k"), Ok(&15));
        assert_eq!(m.update("zz", 0), Err(Error::NotFound));
    }

    /// Invariant: `remove` returns the owned pair and the key becomes absent;
    /// reinsertion afterwards is allowed.
    #[test]
    fn remove_then_reinsert_same_key() {
        let mut m: HashMap<String, i32> = HashMap::new();
        m.insert("k".to_string(), 1).unwrap();
        m.insert("j".to_string(), 2).unwrap();
        assert_eq!(m.remove("k"), Ok(("k".to_string(), 1)));
        assert!(!m.contains_key("k"));
        assert_eq!(m.remove("k"), Err(Error::NotFound));
        m.insert("k".to_string(), 3).unwrap();
        assert_eq!(m.get("k"), Ok(&3));
    }

    /// Invariant: Lookups work under total hash collision; equality resolves
    /// to the right entry, also across tombstones.
    #[test]
    fn collision_handling_with_const_hasher() {
        let mut m: HashMap<String, i32, ConstBuildHasher> = HashMap::with_hasher(ConstBuildHasher);
        for (i, k) in ["a", "b", "c", "d"].iter().enumerate() {
            m.insert((*k).to_string(), i as i32).unwrap();
        }
        m.remove("b").unwrap();
        assert_eq!(m.get("d"), Ok(&3));
        assert_eq!(m.get("a"), Ok(&0));
        assert_eq!(m.get("b"), Err(Error::NotFound));
        m.insert("e".to_string(), 4).unwrap();
        assert_eq!(m.len(), 4);
    }

    /// Invariant: Growth happens before the load factor is exceeded and keeps
    /// every entry reachable.
    #[test]
    fn grows_past_load_factor() {
        let mut m: HashMap<u32, u32> = HashMap::with_config(TableConfig::new(10, 0.5)).unwrap();
        let initial = m.capacity();
        for i in 0..1_000 {
            m.insert(i, i * 2).unwrap();
            assert!((m.len() as f64) <= (m.capacity() as f64 * m.load()).ceil());
        }
        assert!(m.capacity() > initial);
        for i in 0..1_000 {
            assert_eq!(m.get(&i), Ok(&(i * 2)));
        }
    }

    /// Invariant: Inserting and removing the same keys repeatedly never
    /// requires the table to grow.
    #[test]
    fn churn_does_not_grow() {
        let mut m: HashMap<u32, ()> = HashMap::new();
        let cap = m.capacity();
        for _ in 0..50 {
            for i in 0..20 {
                m.insert(i, ()).unwrap();
            }
            for i in 0..20 {
                m.remove(&i).unwrap();
            }
            assert!(m.is_empty());
        }
        assert_eq!(m.capacity(), cap);
    }

    #[test]
    fn resize_explicit_and_noop() {
        let mut m: HashMap<u32, u32> = HashMap::new();
        m.insert(1, 1).unwrap();
        let cap = m.capacity();
        m.resize(5).unwrap();
        assert_eq!(m.capacity(), cap);
        m.resize(1_000).unwrap();
        assert!(m.capacity() >= 1_000);
        assert_eq!(m.get(&1), Ok(&1));
    }

    /// Invariant: Iteration yields each live entry exactly once; `iter_mut`
    /// updates values as seen by subsequent lookups.
    #[test]
    fn iteration_and_mutation() {
        let mut m: HashMap<String, i32> = HashMap::new();
        let keys = ["k1", "k2", "k3"];
        for (i, k) in keys.iter().enumerate() {
            m.insert((*k).to_string(), i as i32).unwrap();
        }
        let seen: BTreeSet<String> = m.keys().cloned().collect();
        let expected: BTreeSet<String> = keys.iter().map(|s| (*s).to_string()).collect();
        assert_eq!(seen, expected);
        assert_eq!(m.iter().len(), 3);

        for (_k, v) in m.iter_mut() {
            *v += 10;
        }
        assert_eq!(m.values().sum::<i32>(), 33);
    }

    #[test]
    fn min_and_max_by_key() {
        let mut m: HashMap<i32, char> = HashMap::new();
        for (k, v) in [(5, 'e'), (-2, 'x'), (9, 'n')] {
            m.insert(k, v).unwrap();
        }
        assert_eq!(m.min(), Ok((&-2, &'x')));
        assert_eq!(m.max(), Ok((&9, &'n')));
    }

    /// Invariant: Equality ignores layout; clones are equal and independent.
    #[test]
    fn clone_and_equality() {
        let mut a: HashMap<i32, i32> = HashMap::new();
        let mut b: HashMap<i32, i32> = HashMap::with_config(TableConfig::new(500, 0.4)).unwrap();
        for i in 0..30 {
            a.insert(i, i).unwrap();
            b.insert(29 - i, 29 - i).unwrap();
        }
        assert_eq!(a, b);
        let mut c = a.clone();
        assert_eq!(a, c);
        c.update(&3, 300).unwrap();
        assert_ne!(a, c);
        assert_eq!(a.get(&3), Ok(&3));
    }

    #[test]
    fn debug_lists_entries() {
        let mut m: HashMap<i32, &str> = HashMap::new();
        m.insert(7, "seven").unwrap();
        assert_eq!(format!("{:?}", m), "{7: \"seven\"}");
    }

    #[test]
    fn into_iter_yields_owned_pairs() {
        let mut m: HashMap<i32, String> = HashMap::new();
        m.insert(1, "one".to_string()).unwrap();
        m.insert(2, "two".to_string()).unwrap();
        let mut pairs: Vec<(i32, String)> = m.into_iter().collect();
        pairs.sort();
        assert_eq!(pairs, vec![(1, "one".to_string()), (2, "two".to_string())]);
    }

    /// Invariant: Hooks fire once per successful operation, never on failure.
    #[test]
    fn callbacks_fire_after_success() {
        let rec = Recorder::default();
        let mut m: HashMap<i32, i32> = HashMap::new();
        m.set_callbacks(rec.clone());
        m.insert(1, 1).unwrap();
        let _ = m.insert(1, 2);
        m.get(&1).unwrap();
        m.update(&1, 5).unwrap();
        m.remove(&1).unwrap();
        let _ = m.remove(&1);
        m.resize(10_000).unwrap();
        assert_eq!(
            rec.events(),
            vec![Event::Create, Event::Read, Event::Update, Event::Delete, Event::Resize]
        );
        m.clear_callbacks();
        m.insert(2, 2).unwrap();
        assert_eq!(rec.events().len(), 5);
    }

    #[test]
    fn invalid_config_rejected() {
        assert!(matches!(
            HashMap::<i32, i32>::with_config(TableConfig::new(0, 0.5)),
            Err(Error::Invalid)
        ));
    }

    /// Invariant (debug-only): Re-entering the map from within `K: Eq` during a
    /// probe panics due to the reentrancy guard.
    #[cfg(debug_assertions)]
    #[test]
    fn reentrancy_panics_from_eq_during_lookup() {
        use std::hash::Hasher;

        struct ReentryKey {
            id: &'static str,
            map: *const HashMap<ReentryKey, i32, ConstBuildHasher>,
        }
        impl PartialEq for ReentryKey {
            fn eq(&self, other: &Self) -> bool {
                if !other.map.is_null() {
                    // Attempt to re-enter the same map during probing.
                    unsafe {
                        let m = &*other.map;
                        let _ = m.contains_key(self);
                    }
                }
                self.id == other.id
            }
        }
        impl Eq for ReentryKey {}
        impl Hash for ReentryKey {
            fn hash<H: Hasher>(&self, state: &mut H) {
                self.id.hash(state);
            }
        }

        let mut m: HashMap<ReentryKey, i32, ConstBuildHasher> = HashMap::with_hasher(ConstBuildHasher);
        m.insert(
            ReentryKey {
                id: "a",
                map: core::ptr::null(),
            },
            1,
        )
        .unwrap();
        let query = ReentryKey {
            id: "b",
            map: &m as *const _,
        };
        let res = std::panic::catch_unwind(std::panic::AssertUnwindSafe(|| {
            let _ = m.contains_key(&query);
        }));
        assert!(res.is_err(), "expected reentrancy to panic in debug builds");
    }
}
