//! TreeSet: ordered set over the AVL tree.

use crate::avl::{self, AvlTree, Cursor};
use crate::error::{Error, Result};
use crate::hooks::{Callbacks, Event, Hooks};
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::fmt;

#[derive(Clone)]
pub struct TreeSet<T> {
    tree: AvlTree<T, ()>,
    hooks: Hooks,
}

impl<T: Ord> Default for TreeSet<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Ord> TreeSet<T> {
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

    pub fn insert(&mut self, value: T) -> Result<()> {
        self.tree.insert(value, ())?;
        self.hooks.fire(Event::Create);
        Ok(())
    }

    pub fn remove<Q>(&mut self, value: &Q) -> Result<T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let (v, ()) = self.tree.remove(value)?;
        self.hooks.fire(Event::Delete);
        Ok(v)
    }

    /// The stored value equal to `value`.
    pub fn get<Q>(&self, value: &Q) -> Result<&T>
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let (v, _) = self.tree.get(value).ok_or(Error::NotFound)?;
        self.hooks.fire(Event::Read);
        Ok(v)
    }

    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let found = self.tree.contains(value);
        self.hooks.fire(Event::Read);
        found
    }

    pub fn min(&self) -> Result<&T> {
        let (v, _) = self.tree.min().ok_or(Error::Empty)?;
        self.hooks.fire(Event::Read);
        Ok(v)
    }

    pub fn max(&self) -> Result<&T> {
        let (v, _) = self.tree.max().ok_or(Error::Empty)?;
        self.hooks.fire(Event::Read);
        Ok(v)
    }

    pub fn clear(&mut self) {
        self.tree.clear();
    }

    /// Values in ascending order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            it: self.tree.iter(),
        }
    }

    /// Cursor resting on the smallest value; its `value()` is always `()`.
    pub fn cursor_front(&self) -> Cursor<'_, T, ()> {
        self.tree.cursor_front()
    }

    pub fn cursor_back(&self) -> Cursor<'_, T, ()> {
        self.tree.cursor_back()
    }

    pub fn is_subset(&self, other: &Self) -> bool {
        self.len() <= other.len() && self.iter().all(|v| other.tree.contains(v))
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
        merge(self.iter(), other.iter()).all(|side| !matches!(side, Side::Both(_)))
    }
}

impl<T: Ord + Clone> TreeSet<T> {
    // Values of the sorted merge whose side passes `keep`.
    fn select(&self, other: &Self, keep: impl Fn(&Side<'_, T>) -> bool) -> Self {
        let mut out = Self::new();
        for side in merge(self.iter(), other.iter()).filter(|s| keep(s)) {
            // Merge output is strictly increasing, so inserts cannot collide.
            let _ = out.tree.insert(side.value().clone(), ());
        }
        out
    }

    pub fn union(&self, other: &Self) -> Self {
        self.select(other, |_| true)
    }

    pub fn intersection(&self, other: &Self) -> Self {
        self.select(other, |s| matches!(s, Side::Both(_)))
    }

    pub fn difference(&self, other: &Self) -> Self {
        self.select(other, |s| matches!(s, Side::Left(_)))
    }

    pub fn symmetric_difference(&self, other: &Self) -> Self {
        self.select(other, |s| !matches!(s, Side::Both(_)))
    }
}

// Where a value of a sorted merge came from.
enum Side<'a, T> {
    Left(&'a T),
    Right(&'a T),
    Both(&'a T),
}

impl<'a, T> Side<'a, T> {
    fn value(&self) -> &'a T {
        match *self {
            Side::Left(v) | Side::Right(v) | Side::Both(v) => v,
        }
    }
}

fn merge<'a, T: Ord>(
    left: Iter<'a, T>,
    right: Iter<'a, T>,
) -> impl Iterator<Item = Side<'a, T>> {
    let mut left = left.peekable();
    let mut right = right.peekable();
    core::iter::from_fn(move || match (left.peek(), right.peek()) {
        (Some(a), Some(b)) => match a.cmp(b) {
            Ordering::Less => left.next().map(Side::Left),
            Ordering::Greater => right.next().map(Side::Right),
            Ordering::Equal => {
                right.next();
                left.next().map(Side::Both)
            }
        },
        (Some(_), None) => left.next().map(Side::Left),
        (None, Some(_)) => right.next().map(Side::Right),
        (None, None) => None,
    })
}

/// In-order iterator over the values; double-ended.
pub struct Iter<'a, T> {
    it: avl::Iter<'a, T, ()>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next().map(|(v, _)| v)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<T> DoubleEndedIterator for Iter<'_, T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back().map(|(v, _)| v)
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}

impl<'a, T: Ord> IntoIterator for &'a TreeSet<T> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: Ord> PartialEq for TreeSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().eq(other.iter())
    }
}

impl<T: Ord> Eq for TreeSet<T> {}

impl<T: Ord + fmt::Debug> fmt::Debug for TreeSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}
