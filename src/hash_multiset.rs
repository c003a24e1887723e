//! HashMultiset: values with multiplicities over the Robin Hood probe table.
//!
//! Each distinct value occupies one slot together with its multiplicity.
//! `len` counts distinct values and `cardinality` counts occurrences.

use crate::config::TableConfig;
use crate::error::{Error, Result};
use crate::hooks::{Callbacks, Event, Hooks};
use crate::raw::{self, ProbeTable};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

#[derive(Clone)]
pub struct HashMultiset<T, S = DefaultHashBuilder> {
    table: ProbeTable<(T, usize)>,
    cardinality: usize,
    hasher: S,
    hooks: Hooks,
}

impl<T> HashMultiset<T>
where
    T: Eq + Hash,
{
    pub fn new() -> Self {
        Self::with_hasher(Default::default())
    }

    pub fn with_config(config: TableConfig) -> Result<Self> {
        Self::with_config_and_hasher(config, Default::default())
    }
}

impl<T> Default for HashMultiset<T>
where
    T: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> HashMultiset<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    pub fn with_hasher(hasher: S) -> Self {
        Self {
            table: ProbeTable::with_default_config(),
            cardinality: 0,
            hasher,
            hooks: Hooks::default(),
        }
    }

    pub fn with_config_and_hasher(config: TableConfig, hasher: S) -> Result<Self> {
        Ok(Self {
            table: ProbeTable::with_config(&config)?,
            cardinality: 0,
            hasher,
            hooks: Hooks::default(),
        })
    }

    fn locate<Q>(&self, value: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hasher.hash_one(value);
        self.table.find(hash, |(v, _)| v.borrow() == value)
    }

    /// Number of distinct values.
    pub fn len(&self) -> usize {
        self.table.len()
    }

    /// Total number of occurrences across all values.
    pub fn cardinality(&self) -> usize {
        self.cardinality
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.table.is_full()
    }

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

    // Sets the multiplicity of `value` (> 0), inserting it when absent.
    // Returns the previous multiplicity.
    fn store(&mut self, value: T, multiplicity: usize) -> Result<usize> {
        debug_assert!(multiplicity > 0);
        if let Some(idx) = self.locate(&value) {
            let (_, m) = self
                .table
                .get_mut(idx)
                .ok_or(Error::Internal("located slot is not filled"))?;
            let old = core::mem::replace(m, multiplicity);
            self.cardinality = self.cardinality - old + multiplicity;
            return Ok(old);
        }
        if self.table.is_full() && self.table.grow(|_, _| {})? {
            self.hooks.fire(Event::Resize);
        }
        let hash = self.hasher.hash_one(&value);
        self.table.insert_unique(hash, (value, multiplicity), |_, _| {});
        self.cardinality += multiplicity;
        Ok(0)
    }

    /// Adds one occurrence of `value`.
    pub fn insert(&mut self, value: T) -> Result<()> {
        self.insert_many(value, 1)
    }

    /// Adds `count` occurrences of `value`. A count of zero does nothing.
    pub fn insert_many(&mut self, value: T, count: usize) -> Result<()> {
        if count == 0 {
            return Ok(());
        }
        let current = self.count_in(&value);
        let total = current.checked_add(count).ok_or(Error::Invalid)?;
        if self.cardinality.checked_add(count).is_none() {
            return Err(Error::Invalid);
        }
        self.store(value, total)?;
        self.hooks.fire(Event::Create);
        Ok(())
    }

    /// Sets the multiplicity of `value`, returning the previous one. Zero
    /// removes the value.
    pub fn update(&mut self, value: T, multiplicity: usize) -> Result<usize> {
        let old = if multiplicity == 0 {
            match self.locate(&value) {
                Some(idx) => {
                    let (_, m) = self
                        .table
                        .take(idx)
                        .ok_or(Error::Internal("located slot is not filled"))?;
                    self.cardinality -= m;
                    m
                }
                None => 0,
            }
        } else {
            let current = self.count_in(&value);
            if (self.cardinality - current).checked_add(multiplicity).is_none() {
                return Err(Error::Invalid);
            }
            self.store(value, multiplicity)?
        };
        self.hooks.fire(Event::Update);
        Ok(old)
    }

    /// Removes one occurrence; the value disappears with its last one.
    pub fn remove<Q>(&mut self, value: &Q) -> Result<()>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let idx = self.locate(value).ok_or(Error::NotFound)?;
        let (_, m) = self
            .table
            .get_mut(idx)
            .ok_or(Error::Internal("located slot is not filled"))?;
        if *m > 1 {
            *m -= 1;
        } else {
            self.table.take(idx);
        }
        self.cardinality -= 1;
        self.hooks.fire(Event::Delete);
        Ok(())
    }

    /// Removes every occurrence of `value` and returns how many there were.
    pub fn remove_all<Q>(&mut self, value: &Q) -> Result<usize>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let idx = self.locate(value).ok_or(Error::NotFound)?;
        let (_, m) = self
            .table
            .take(idx)
            .ok_or(Error::Internal("located slot is not filled"))?;
        self.cardinality -= m;
        self.hooks.fire(Event::Delete);
        Ok(m)
    }

    /// Occurrences of `value`, zero when absent.
    pub fn multiplicity_of<Q>(&self, value: &Q) -> usize
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let m = self
            .locate(value)
            .and_then(|idx| self.table.get(idx))
            .map_or(0, |(_, m)| *m);
        self.hooks.fire(Event::Read);
        m
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let found = self.locate(value).is_some();
        self.hooks.fire(Event::Read);
        found
    }

    pub fn resize(&mut self, capacity: usize) -> Result<()> {
        if self.table.resize(capacity, |_, _| {})? {
            self.hooks.fire(Event::Resize);
        }
        Ok(())
    }

    pub fn clear(&mut self) {
        self.table.clear();
        self.cardinality = 0;
    }

    /// Iterator over `(value, multiplicity)` in slot order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            it: self.table.iter(),
        }
    }

    fn count_in(&self, value: &T) -> usize {
        self.locate(value)
            .and_then(|idx| self.table.get(idx))
            .map_or(0, |(_, m)| *m)
    }

    /// Every value occurs in `other` at least as often as in `self`.
    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|(v, m)| m <= other.count_in(v))
    }

    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    pub fn is_proper_subset(&self, other: &Self) -> bool {
        self.cardinality < other.cardinality && self.is_subset(other)
    }

    pub fn is_proper_superset(&self, other: &Self) -> bool {
        other.is_proper_subset(self)
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.iter().all(|(v, _)| other.locate(v).is_none())
    }
}

impl<T, S> HashMultiset<T, S>
where
    T: Eq + Hash + Clone,
    S: BuildHasher + Clone,
{
    // Builds a multiset where every value of either operand gets
    // `combine(count in self, count in other)` occurrences.
    fn merge(&self, other: &Self, combine: impl Fn(usize, usize) -> usize) -> Result<Self> {
        let config = TableConfig::new((self.len() + other.len()).max(1), self.load());
        let mut out = Self::with_config_and_hasher(config, self.hasher.clone())?;
        for (v, m) in self.iter() {
            let n = combine(m, other.count_in(v));
            if n > 0 {
                out.store(v.clone(), n)?;
            }
        }
        for (v, m) in other.iter() {
            if self.locate(v).is_none() {
                let n = combine(0, m);
                if n > 0 {
                    out.store(v.clone(), n)?;
                }
            }
        }
        Ok(out)
    }

    /// Maximum of the two multiplicities per value.
    pub fn union(&self, other: &Self) -> Result<Self> {
        self.merge(other, usize::max)
    }

    /// Minimum of the two multiplicities per value.
    pub fn intersection(&self, other: &Self) -> Result<Self> {
        self.merge(other, usize::min)
    }

    /// Multiplicity in `self` minus that in `other`, floored at zero.
    pub fn difference(&self, other: &Self) -> Result<Self> {
        self.merge(other, usize::saturating_sub)
    }

    /// Sum of the two multiplicities per value.
    pub fn summation(&self, other: &Self) -> Result<Self> {
        if self.cardinality.checked_add(other.cardinality).is_none() {
            return Err(Error::Invalid);
        }
        self.merge(other, |a, b| a + b)
    }

    /// Absolute difference of the two multiplicities per value.
    pub fn symmetric_difference(&self, other: &Self) -> Result<Self> {
        self.merge(other, |a, b| a.abs_diff(b))
    }
}

impl<T, S> HashMultiset<T, S>
where
    T: Eq + Hash + Ord,
    S: BuildHasher,
{
    pub fn max(&self) -> Result<(&T, usize)> {
        let best = self.iter().max_by(|a, b| a.0.cmp(b.0)).ok_or(Error::Empty)?;
        self.hooks.fire(Event::Read);
        Ok(best)
    }

    pub fn min(&self) -> Result<(&T, usize)> {
        let best = self.iter().min_by(|a, b| a.0.cmp(b.0)).ok_or(Error::Empty)?;
        self.hooks.fire(Event::Read);
        Ok(best)
    }
}

pub struct Iter<'a, T> {
    it: raw::Iter<'a, (T, usize)>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (&'a T, usize);

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, (v, m))| (v, *m))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<T, S> PartialEq for HashMultiset<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len()
            && self.cardinality == other.cardinality
            && self.iter().all(|(v, m)| other.count_in(v) == m)
    }
}

impl<T, S> Eq for HashMultiset<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
}

impl<T, S> fmt::Debug for HashMultiset<T, S>
where
    T: Eq + Hash + fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
