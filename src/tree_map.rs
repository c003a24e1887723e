//! TreeMap: ordered map over the AVL tree.

use crate::avl::{AvlTree, Cursor};
pub use crate::avl::{Iter, IterMut};
use crate::error::{Error, Result};
use crate::hooks::{Callbacks, Event, Hooks};
use core::borrow::Borrow;
use core::fmt;

#[derive(Clone)]
pub struct TreeMap<K, V> {
    tree: AvlTree<K, V>,
    hooks: Hooks,
}

impl<K: Ord, V> Default for TreeMap<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Ord, V> TreeMap<K, V> {
    pub fn new() -> Self {
        Self {
            tree: AvlTree::new(),
            hooks: Hooks::default(),
        }
    }

    pub fn len(&self) -> usize {
        self.tree.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn set_callbacks<C: Callbacks + 'static>(&mut self, callbacks: C) {
        self.hooks.set(callbacks);
    }

    pub fn clear_callbacks(&mut self) {
        self.hooks.clear();
    }

    /// Inserts a new key; `Duplicate` leaves the stored value untouched.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        self.tree.insert(key, value)?;
        self.hooks.fire(Event::Create);
        Ok(())
    }

    /// Replaces the value of an existing key and returns the old one.
    pub fn update<Q>(&mut self, key: &Q, value: V) -> Result<V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let slot = self.tree.get_mut(key).ok_or(Error::NotFound)?;
        let old = core::mem::replace(slot, value);
        self.hooks.fire(Event::Update);
        Ok(old)
    }

    pub fn remove<Q>(&mut self, key: &Q) -> Result<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let pair = self.tree.remove(key)?;
        self.hooks.fire(Event::Delete);
        Ok(pair)
    }

    pub fn get<Q>(&self, key: &Q) -> Result<&V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let (_, v) = self.tree.get(key).ok_or(Error::NotFound)?;
        self.hooks.fire(Event::Read);
        Ok(v)
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Result<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let value = self.tree.get_mut(key).ok_or(Error::NotFound)?;
        self.hooks.fire(Event::Read);
        Ok(value)
    }

    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let found = self.tree.contains(key);
        self.hooks.fire(Event::Read);
        found
    }

    pub fn min(&self) -> Result<(&K, &V)> {
        let entry = self.tree.min().ok_or(Error::Empty)?;
        self.hooks.fire(Event::Read);
        Ok(entry)
    }

    pub fn max(&self) -> Result<(&K, &V)> {
        let entry = self.tree.max().ok_or(Error::Empty)?;
        self.hooks.fire(Event::Read);
        Ok(entry)
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Entries in ascending key order.
    pub fn iter(&self) -> Iter<'_, K, V> {
        self.tree.iter()
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        self.tree.iter_mut()
    }

    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator + '_ {
        self.iter().map(|(k, _)| k)
    }

    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator + '_ {
        self.iter().map(|(_, v)| v)
    }

    /// Cursor resting on the smallest key.
    pub fn cursor_front(&self) -> Cursor<'_, K, V> {
        self.tree.cursor_front()
    }

    /// Cursor resting on the greatest key.
    pub fn cursor_back(&self) -> Cursor<'_, K, V> {
        self.tree.cursor_back()
    }
}

impl<'a, K: Ord, V> IntoIterator for &'a TreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: Ord, V: PartialEq> PartialEq for TreeMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<K: Ord, V: Eq> Eq for TreeMap<K, V> {}

impl<K: Ord + fmt::Debug, V: fmt::Debug> fmt::Debug for TreeMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
