//! Heap: array-backed binary heap ordered as a max-heap or a min-heap.
//!
//! The tree is implicit: the parent of slot `i` is `(i - 1) / 2` and its
//! children are `2i + 1` and `2i + 2`. The heap tracks its own logical
//! capacity and doubles it when an insert finds the buffer full.

use crate::error::{Error, Result};
use crate::hooks::{Callbacks, Event, Hooks};
use core::cmp::Ordering;
use core::fmt;
use tracing::debug;

/// Which end of the order sits at the top of the heap.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum HeapOrder {
    /// Greatest element on top.
    Max,
    /// Smallest element on top.
    Min,
}

impl HeapOrder {
    // True when `a` belongs above `b`.
    #[inline]
    fn above<T: Ord>(self, a: &T, b: &T) -> bool {
        let ord = a.cmp(b);
        match self {
            HeapOrder::Max => ord == Ordering::Greater,
            HeapOrder::Min => ord == Ordering::Less,
        }
    }
}

#[derive(Clone)]
pub struct Heap<T> {
    buffer: Vec<T>,
    capacity: usize,
    order: HeapOrder,
    hooks: Hooks,
}

impl<T: Ord> Heap<T> {
    /// Empty heap with room for `capacity` elements. A zero capacity is
    /// rejected with `Invalid`.
    pub fn new(capacity: usize, order: HeapOrder) -> Result<Self> {
        if capacity == 0 {
            return Err(Error::Invalid);
        }
        let mut buffer = Vec::new();
        buffer.try_reserve_exact(capacity)?;
        Ok(Self {
            buffer,
            capacity,
            order,
            hooks: Hooks::default(),
        })
    }

    pub fn order(&self) -> HeapOrder {
        self.order
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn is_full(&self) -> bool {
        self.buffer.len() >= self.capacity
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

    /// Sets the logical capacity. Shrinking below the current length is
    /// `Invalid`; asking for the current capacity changes nothing.
    pub fn resize(&mut self, capacity: usize) -> Result<()> {
        if capacity == self.capacity {
            return Ok(());
        }
        if capacity < self.buffer.len() || capacity == 0 {
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
            "heap resized"
        );
        self.capacity = capacity;
        self.hooks.fire(Event::Resize);
        Ok(())
    }

    pub fn insert(&mut self, value: T) -> Result<()> {
        if self.is_full() {
            self.resize(self.buffer.len().saturating_mul(2))?;
        }
        self.buffer.push(value);
        self.sift_up(self.buffer.len() - 1);
        self.hooks.fire(Event::Create);
        Ok(())
    }

    /// Removes and returns the top element.
    pub fn remove(&mut self) -> Result<T> {
        if self.buffer.is_empty() {
            return Err(Error::Empty);
        }
        // The last element takes the root's place before sifting down.
        let top = self.buffer.swap_remove(0);
        self.sift_down(0);
        self.hooks.fire(Event::Delete);
        Ok(top)
    }

    /// The top element.
    pub fn peek(&self) -> Result<&T> {
        let top = self.buffer.first().ok_or(Error::Empty)?;
        self.hooks.fire(Event::Read);
        Ok(top)
    }

    /// Linear scan for an element equal to `value`.
    pub fn contains(&self, value: &T) -> bool {
        let found = self.buffer.iter().any(|v| v == value);
        self.hooks.fire(Event::Read);
        found
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
    }

    /// Elements in buffer (level) order.
    pub fn iter(&self) -> core::slice::Iter<'_, T> {
        self.buffer.iter()
    }

    /// Drains the heap top first.
    pub fn into_sorted_vec(mut self) -> Vec<T> {
        let mut out = Vec::with_capacity(self.buffer.len());
        while let Ok(top) = self.remove() {
            out.push(top);
        }
        out
    }

    fn sift_up(&mut self, mut child: usize) {
        while child > 0 {
            let parent = (child - 1) / 2;
            if !self.order.above(&self.buffer[child], &self.buffer[parent]) {
                break;
            }
            self.buffer.swap(child, parent);
            child = parent;
        }
    }

    fn sift_down(&mut self, mut node: usize) {
        let len = self.buffer.len();
        loop {
            let mut pick = node;
            for child in [2 * node + 1, 2 * node + 2] {
                if child < len && self.order.above(&self.buffer[child], &self.buffer[pick]) {
                    pick = child;
                }
            }
            if pick == node {
                break;
            }
            self.buffer.swap(node, pick);
            node = pick;
        }
    }
}

impl<'a, T: Ord> IntoIterator for &'a Heap<T> {
    type Item = &'a T;
    type IntoIter = core::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Heaps are equal when their buffers hold equal elements in the same order.
impl<T: PartialEq> PartialEq for Heap<T> {
    fn eq(&self, other: &Self) -> bool {
        self.buffer == other.buffer
    }
}

impl<T: Eq> Eq for Heap<T> {}

impl<T: fmt::Debug> fmt::Debug for Heap<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.buffer.iter()).finish()
    }
}
