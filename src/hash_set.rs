//! HashSet: unique values over the Robin Hood probe table.

use crate::config::TableConfig;
use crate::error::{Error, Result};
use crate::hooks::{Callbacks, Event, Hooks};
use crate::raw::{self, ProbeTable};
use core::borrow::Borrow;
use core::fmt;
use core::hash::{BuildHasher, Hash};
use hashbrown::hash_map::DefaultHashBuilder;

#[derive(Clone)]
pub struct HashSet<T, S = DefaultHashBuilder> {
    table: ProbeTable<T>,
    hasher: S,
    hooks: Hooks,
}

impl<T> HashSet<T>
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

impl<T> Default for HashSet<T>
where
    T: Eq + Hash,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T, S> HashSet<T, S>
where
    T: Eq + Hash,
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

    fn locate<Q>(&self, value: &Q) -> Option<usize>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        let hash = self.hasher.hash_one(value);
        self.table.find(hash, |v| v.borrow() == value)
    }

    pub fn len(&self) -> usize {
        self.table.len()
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

    /// Adds a value; `Duplicate` if an equal value is already present.
    pub fn insert(&mut self, value: T) -> Result<()> {
        if self.table.is_full() && self.table.grow(|_, _| {})? {
            self.hooks.fire(Event::Resize);
        }
        if self.locate(&value).is_some() {
            return Err(Error::Duplicate);
        }
        let hash = self.hasher.hash_one(&value);
        self.table.insert_unique(hash, value, |_, _| {});
        self.hooks.fire(Event::Create);
        Ok(())
    }

    pub fn remove<Q>(&mut self, value: &Q) -> Result<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let idx = self.locate(value).ok_or(Error::NotFound)?;
        let removed = self
            .table
            .take(idx)
            .ok_or(Error::Internal("located slot is not filled"))?;
        self.hooks.fire(Event::Delete);
        Ok(removed)
    }

    /// The stored value equal to `value`.
    pub fn get<Q>(&self, value: &Q) -> Result<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Hash + Eq,
    {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let idx = self.locate(value).ok_or(Error::NotFound)?;
        let stored = self
            .table
            .get(idx)
            .ok_or(Error::Internal("located slot is not filled"))?;
        self.hooks.fire(Event::Read);
        Ok(stored)
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
    }

    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            it: self.table.iter(),
        }
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|v| other.locate(v).is_some())
    }

    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }

    pub fn is_proper_subset(&self, other: &Self) -> bool {
        self.len() < other.len() && self.is_subset(other)
    }

    pub fn is_proper_superset(&self, other: &Self) -> bool {
        other.is_proper_subset(self)
    }

    pub fn is_disjoint(&self, other: &Self) -> bool {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        small.iter().all(|v| large.locate(v).is_none())
    }
}

impl<T, S> HashSet<T, S>
where
    T: Eq + Hash + Clone,
    S: BuildHasher + Clone,
{
    // Empty set sharing this set's hasher and load factor, sized for `elements`.
    fn empty_for(&self, elements: usize) -> Result<Self> {
        let config = TableConfig::new(elements.max(1), self.load());
        Self::with_config_and_hasher(config, self.hasher.clone())
    }

    fn collect_from<'a>(mut self, values: impl Iterator<Item = &'a T>) -> Result<Self>
    where
        T: 'a,
    {
        for v in values {
            self.insert(v.clone())?;
        }
        Ok(self)
    }

    /// Values present in either set.
    pub fn union(&self, other: &Self) -> Result<Self> {
        let out = self.empty_for(self.len() + other.len())?;
        let out = out.collect_from(self.iter())?;
        out.collect_from(other.iter().filter(|v| self.locate(*v).is_none()))
    }

    /// Values present in both sets.
    pub fn intersection(&self, other: &Self) -> Result<Self> {
        let out = self.empty_for(self.len().min(other.len()))?;
        out.collect_from(self.iter().filter(|v| other.locate(*v).is_some()))
    }

    /// Values of `self` absent from `other`.
    pub fn difference(&self, other: &Self) -> Result<Self> {
        let out = self.empty_for(self.len())?;
        out.collect_from(self.iter().filter(|v| other.locate(*v).is_none()))
    }

    /// Values present in exactly one of the sets.
    pub fn symmetric_difference(&self, other: &Self) -> Result<Self> {
        let out = self.empty_for(self.len() + other.len())?;
        let out = out.collect_from(self.iter().filter(|v| other.locate(*v).is_none()))?;
        out.collect_from(other.iter().filter(|v| self.locate(*v).is_none()))
    }
}

impl<T, S> HashSet<T, S>
where
    T: Eq + Hash + Ord,
    S: BuildHasher,
{
    pub fn max(&self) -> Result<&T> {
        let best = self.iter().max().ok_or(Error::Empty)?;
        self.hooks.fire(Event::Read);
        Ok(best)
    }

    pub fn min(&self) -> Result<&T> {
        let best = self.iter().min().ok_or(Error::Empty)?;
        self.hooks.fire(Event::Read);
        Ok(best)
    }
}

/// Iterator over the values in slot order.
pub struct Iter<'a, T> {
    it: raw::Iter<'a, T>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(_, v)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T, S> IntoIterator for &'a HashSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T, S> PartialEq for HashSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.is_subset(other)
    }
}

impl<T, S> Eq for HashSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
}

impl<T, S> fmt::Debug for HashSet<T, S>
where
    T: Eq + Hash + fmt::Debug,
    S: BuildHasher,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
