//! SortedList: a growable array kept in ascending order.
//!
//! Inserts binary-search their position and land after any equal
//! elements, so equal elements keep their insertion order.

use crate::error::{Error, Result};
use crate::hooks::{Callbacks, Event, Hooks};
use core::fmt;
use tracing::debug;

#[derive(Clone)]
pub struct SortedList<T> {
    buffer: Vec<T>,
    capacity: usize,
    hooks: Hooks,
}

impl<T: Ord> Default for SortedList<T> {
    fn default() -> Self {
        Self {
            buffer: Vec::new(),
            capacity: 0,
            hooks: Hooks::default(),
        }
    }
}

impl<T: Ord> SortedList<T> {
    pub fn new(capacity: usize) -> Result<Self> {
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(capacity)?;
        Ok(Self {
            buffer,
            capacity,
            hooks: Hooks::default(),
        })
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn set_callbacks<C: Callbacks + 'static>(&mut self, callbacks: C) {
        self.hooks.set(callbacks);
    }

    pub fn clear_callbacks(&mut self) {
        self.hooks.clear();
    }

    /// Sets the capacity; `Invalid` below the current length.
    pub fn resize(&mut self, capacity: usize) -> Result<()> {
        if capacity == self.capacity {
            return Ok(());
        }
        if capacity < self.buffer.len() {
            return Err(Error::Invalid);
        }
        if capacity > self.buffer.capacity() {
            self.buffer.try_reserve_exact(capacity - self.buffer.len())?;
        } else {
            self.buffer.shrink_to(capacity);
        }
        debug!(
            target: "probing_collections",
            from = self.capacity,
            to = capacity,
            live = self.buffer.len(),
            "sorted list resized"
        );
        self.capacity = capacity;
        self.hooks.fire(Event::Resize);
        Ok(())
    }

    pub fn insert(&mut self, value: T) -> Result<()> {
        if self.buffer.len() >= self.capacity {
            let grown = self.capacity.saturating_mul(2).max(self.buffer.len() + 1);
            self.resize(grown)?;
        }
        let at = self.buffer.partition_point(|x| *x <= value);
        self.buffer.insert(at, value);
        self.hooks.fire(Event::Create);
        Ok(())
    }

    /// Removes the element at `index`.
    pub fn remove(&mut self, index: usize) -> Result<T> {
        if self.buffer.is_empty() {
            return Err(Error::Empty);
        }
        if index >= self.buffer.len() {
            return Err(Error::Range);
        }
        let value = self.buffer.remove(index);
        self.hooks.fire(Event::Delete);
        Ok(value)
    }

    pub fn get(&self, index: usize) -> Result<&T> {
        if self.buffer.is_empty() {
            return Err(Error::Empty);
        }
        let value = self.buffer.get(index).ok_or(Error::Range)?;
        self.hooks.fire(Event::Read);
        Ok(value)
    }

    /// Index of the first (`from_start`) or last element equal to `value`.
    pub fn index_of(&self, value: &T, from_start: bool) -> Result<usize> {
        let lo = self.buffer.partition_point(|x| x < value);
        let hi = self.buffer.partition_point(|x| x <= value);
        if lo == hi {
            return Err(Error::NotFound);
        }
        self.hooks.fire(Event::Read);
        Ok(if from_start { lo } else { hi - 1 })
    }

    pub fn contains(&self, value: &T) -> bool {
        let found = self.buffer.binary_search(value).is_ok();
        self.hooks.fire(Event::Read);
        found
    }

    pub fn min(&self) -> Result<&T> {
        let v = self.buffer.first().ok_or(Error::Empty)?;
        self.hooks.fire(Event::Read);
        Ok(v)
    }

    pub fn max(&self) -> Result<&T> {
        let v = self.buffer.last().ok_or(Error::Empty)?;
        self.hooks.fire(Event::Read);
        Ok(v)
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.buffer.iter()
    }

    pub fn as_slice(&self) -> &[T] {
        &self.buffer
    }
}

impl<'a, T: Ord> IntoIterator for &'a SortedList<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for SortedList<T> {
    fn eq(&self, other: &Self) -> bool {
        self.buffer == other.buffer
    }
}

impl<T: Eq> Eq for SortedList<T> {}

impl<T: fmt::Debug> fmt::Debug for SortedList<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.buffer.iter()).finish()
    }
}
