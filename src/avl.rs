//! AvlTree: structural layer behind `TreeMap` and `TreeSet`.
//!
//! Nodes live in a slotmap arena and link to each other by key: `left`,
//! `right` and a non-owning `parent`. Heights follow the convention
//! `height(leaf) = 1`, `height(None) = 0`, and every completed insert or
//! remove leaves `|height(left) - height(right)| <= 1` at every node.
//!
//! Traversal walks parent links, so iterators and cursors need no stack.
//! Both borrow the tree, which rules out mutation between steps.

use crate::error::{Error, Result};
use crate::reentrancy::DebugReentrancy;
use core::borrow::Borrow;
use core::cmp::Ordering;
use core::mem;
use slotmap::{DefaultKey, SlotMap};

type NodeId = DefaultKey;

#[derive(Clone, Debug)]
struct Node<K, V> {
    key: K,
    value: V,
    height: usize,
    left: Option<NodeId>,
    right: Option<NodeId>,
    parent: Option<NodeId>,
}

#[derive(Clone, Debug)]
pub struct AvlTree<K, V> {
    nodes: SlotMap<NodeId, Node<K, V>>,
    root: Option<NodeId>,
    reentrancy: DebugReentrancy,
}

impl<K, V> Default for AvlTree<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> AvlTree<K, V> {
    pub fn new() -> Self {
        Self {
            nodes: SlotMap::with_key(),
            root: None,
            reentrancy: DebugReentrancy::new("AvlTree"),
        }
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn clear(&mut self) {
        let old = {
            let _g = self.reentrancy.enter();
            self.root = None;
            mem::take(&mut self.nodes)
        };
        drop(old);
    }

    fn height(&self, id: Option<NodeId>) -> usize {
        id.map_or(0, |id| self.nodes[id].height)
    }

    fn update_height(&mut self, id: NodeId) {
        let node = &self.nodes[id];
        let h = 1 + self.height(node.left).max(self.height(node.right));
        self.nodes[id].height = h;
    }

    // height(right) - height(left)
    fn balance(&self, id: NodeId) -> isize {
        let node = &self.nodes[id];
        self.height(node.right) as isize - self.height(node.left) as isize
    }

    // Points whatever referenced `old` as a child (or the root) at `new`.
    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            None => self.root = new,
            Some(p) => {
                let p = &mut self.nodes[p];
                if p.left == Some(old) {
                    p.left = new;
                } else {
                    p.right = new;
                }
            }
        }
    }

    // Returns the new subtree root.
    fn rotate_left(&mut self, x: NodeId) -> NodeId {
        let y = match self.nodes[x].right {
            Some(y) => y,
            None => return x,
        };
        let inner = self.nodes[y].left;
        let parent = self.nodes[x].parent;

        self.nodes[x].right = inner;
        if let Some(c) = inner {
            self.nodes[c].parent = Some(x);
        }
        self.nodes[y].parent = parent;
        self.replace_child(parent, x, Some(y));
        self.nodes[y].left = Some(x);
        self.nodes[x].parent = Some(y);

        self.update_height(x);
        self.update_height(y);
        y
    }

    fn rotate_right(&mut self, x: NodeId) -> NodeId {
        let y = match self.nodes[x].left {
            Some(y) => y,
            None => return x,
        };
        let inner = self.nodes[y].right;
        let parent = self.nodes[x].parent;

        self.nodes[x].left = inner;
        if let Some(c) = inner {
            self.nodes[c].parent = Some(x);
        }
        self.nodes[y].parent = parent;
        self.replace_child(parent, x, Some(y));
        self.nodes[y].right = Some(x);
        self.nodes[x].parent = Some(y);

        self.update_height(x);
        self.update_height(y);
        y
    }

    // Walks from `start` to the root fixing heights and rotating wherever a
    // node leans by two or more.
    fn rebalance(&mut self, start: Option<NodeId>) {
        let mut cursor = start;
        while let Some(id) = cursor {
            self.update_height(id);
            let balance = self.balance(id);
            let top = if balance >= 2 {
                if let Some(r) = self.nodes[id].right {
                    let child = &self.nodes[r];
                    if self.height(child.right) < self.height(child.left) {
                        self.rotate_right(r);
                    }
                }
                self.rotate_left(id)
            } else if balance <= -2 {
                if let Some(l) = self.nodes[id].left {
                    let child = &self.nodes[l];
                    if self.height(child.left) < self.height(child.right) {
                        self.rotate_left(l);
                    }
                }
                self.rotate_right(id)
            } else {
                id
            };
            cursor = self.nodes[top].parent;
        }
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(l) = self.nodes[id].left {
            id = l;
        }
        id
    }

    fn rightmost(&self, mut id: NodeId) -> NodeId {
        while let Some(r) = self.nodes[id].right {
            id = r;
        }
        id
    }

    fn first(&self) -> Option<NodeId> {
        self.root.map(|r| self.leftmost(r))
    }

    fn last(&self) -> Option<NodeId> {
        self.root.map(|r| self.rightmost(r))
    }

    // In-order successor through parent links.
    fn successor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(r) = self.nodes[id].right {
            return Some(self.leftmost(r));
        }
        let mut node = id;
        while let Some(p) = self.nodes[node].parent {
            if self.nodes[p].left == Some(node) {
                return Some(p);
            }
            node = p;
        }
        None
    }

    fn predecessor(&self, id: NodeId) -> Option<NodeId> {
        if let Some(l) = self.nodes[id].left {
            return Some(self.rightmost(l));
        }
        let mut node = id;
        while let Some(p) = self.nodes[node].parent {
            if self.nodes[p].right == Some(node) {
                return Some(p);
            }
            node = p;
        }
        None
    }

    fn entry(&self, id: NodeId) -> (&K, &V) {
        let n = &self.nodes[id];
        (&n.key, &n.value)
    }

    /// Smallest entry.
    pub fn min(&self) -> Option<(&K, &V)> {
        self.first().map(|id| self.entry(id))
    }

    /// Greatest entry.
    pub fn max(&self) -> Option<(&K, &V)> {
        self.last().map(|id| self.entry(id))
    }

    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            tree: self,
            front: self.first(),
            back: self.last(),
            remaining: self.len(),
        }
    }

    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        let mut order = Vec::with_capacity(self.len());
        let mut next = self.first();
        while let Some(id) = next {
            order.push(id);
            next = self.successor(id);
        }
        IterMut {
            it: ordered_mut(&mut self.nodes, order).into_iter(),
        }
    }

    /// Cursor on the smallest entry.
    pub fn cursor_front(&self) -> Cursor<'_, K, V> {
        let first = self.first();
        Cursor {
            tree: self,
            node: first,
            first,
            last: self.last(),
            index: 0,
            start: true,
            end: self.is_empty(),
        }
    }

    /// Cursor on the greatest entry.
    pub fn cursor_back(&self) -> Cursor<'_, K, V> {
        let last = self.last();
        Cursor {
            tree: self,
            node: last,
            first: self.first(),
            last,
            index: self.len().saturating_sub(1),
            start: self.is_empty(),
            end: true,
        }
    }
}

// Pairs each node's key with a mutable value, in the given order.
fn ordered_mut<K, V>(
    nodes: &mut SlotMap<NodeId, Node<K, V>>,
    order: Vec<NodeId>,
) -> Vec<(&K, &mut V)> {
    let mut rank: slotmap::SecondaryMap<NodeId, usize> = slotmap::SecondaryMap::new();
    for (i, id) in order.iter().enumerate() {
        rank.insert(*id, i);
    }
    let mut slots: Vec<Option<(&K, &mut V)>> = (0..order.len()).map(|_| None).collect();
    for (id, node) in nodes.iter_mut() {
        if let Some(&i) = rank.get(id) {
            slots[i] = Some((&node.key, &mut node.value));
        }
    }
    slots.into_iter().flatten().collect()
}

impl<K: Ord, V> AvlTree<K, V> {
    fn find<Q>(&self, key: &Q) -> Option<NodeId>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let _g = self.reentrancy.enter();
        let mut cursor = self.root;
        while let Some(id) = cursor {
            let node = &self.nodes[id];
            cursor = match key.cmp(node.key.borrow()) {
                Ordering::Less => node.left,
                Ordering::Greater => node.right,
                Ordering::Equal => return Some(id),
            };
        }
        None
    }

    /// Attaches a new leaf and rebalances up to the root. `Duplicate` if an
    /// equal key is present.
    pub fn insert(&mut self, key: K, value: V) -> Result<()> {
        let (parent, go_left) = {
            let _g = self.reentrancy.enter();
            let mut parent = None;
            let mut go_left = false;
            let mut cursor = self.root;
            while let Some(id) = cursor {
                let node = &self.nodes[id];
                parent = Some(id);
                cursor = match key.cmp(&node.key) {
                    Ordering::Less => {
                        go_left = true;
                        node.left
                    }
                    Ordering::Greater => {
                        go_left = false;
                        node.right
                    }
                    Ordering::Equal => return Err(Error::Duplicate),
                };
            }
            (parent, go_left)
        };
        let id = self.nodes.insert(Node {
            key,
            value,
            height: 1,
            left: None,
            right: None,
            parent,
        });
        match parent {
            None => self.root = Some(id),
            Some(p) if go_left => self.nodes[p].left = Some(id),
            Some(p) => self.nodes[p].right = Some(id),
        }
        self.rebalance(Some(id));
        Ok(())
    }

    /// Unlinks the entry for `key` and hands it back.
    ///
    /// A node with two children trades its entry with its in-order
    /// successor, which is the node that physically leaves the tree;
    /// rebalancing starts at that node's parent.
    pub fn remove<Q>(&mut self, key: &Q) -> Result<(K, V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        if self.is_empty() {
            return Err(Error::Empty);
        }
        let id = self.find(key).ok_or(Error::NotFound)?;

        let target = match (self.nodes[id].left, self.nodes[id].right) {
            (Some(_), Some(r)) => self.leftmost(r),
            _ => id,
        };
        let (child, parent) = {
            let t = &self.nodes[target];
            (t.left.or(t.right), t.parent)
        };
        if let Some(c) = child {
            self.nodes[c].parent = parent;
        }
        self.replace_child(parent, target, child);
        let unlinked = self
            .nodes
            .remove(target)
            .ok_or(Error::Internal("tree node missing from arena"))?;
        self.rebalance(parent);

        if target == id {
            return Ok((unlinked.key, unlinked.value));
        }
        let node = &mut self.nodes[id];
        let key = mem::replace(&mut node.key, unlinked.key);
        let value = mem::replace(&mut node.value, unlinked.value);
        Ok((key, value))
    }

    pub fn get<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(key).map(|id| self.entry(id))
    }

    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        let id = self.find(key)?;
        Some(&mut self.nodes[id].value)
    }

    pub fn contains<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: ?Sized + Ord,
    {
        self.find(key).is_some()
    }
}

/// In-order iterator; double-ended.
pub struct Iter<'a, K, V> {
    tree: &'a AvlTree<K, V>,
    front: Option<NodeId>,
    back: Option<NodeId>,
    remaining: usize,
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.front?;
        self.remaining -= 1;
        self.front = self.tree.successor(id);
        Some(self.tree.entry(id))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for Iter<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let id = self.back?;
        self.remaining -= 1;
        self.back = self.tree.predecessor(id);
        Some(self.tree.entry(id))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Iter {
            tree: self.tree,
            front: self.front,
            back: self.back,
            remaining: self.remaining,
        }
    }
}

/// In-order iterator over keys and mutable values.
pub struct IterMut<'a, K, V> {
    it: std::vec::IntoIter<(&'a K, &'a mut V)>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        self.it.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.it.size_hint()
    }
}

impl<K, V> DoubleEndedIterator for IterMut<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.it.next_back()
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}

/// Bidirectional cursor over the tree in key order.
///
/// The cursor always rests on an entry of a non-empty tree. `move_next`
/// from the last entry does not move but raises `at_end`; `move_prev` from
/// the first entry raises `at_start`. The first and last entries are
/// cached when the cursor is created so that `to_start`/`to_end` are O(1).
pub struct Cursor<'a, K, V> {
    tree: &'a AvlTree<K, V>,
    node: Option<NodeId>,
    first: Option<NodeId>,
    last: Option<NodeId>,
    index: usize,
    start: bool,
    end: bool,
}

impl<'a, K, V> Cursor<'a, K, V> {
    pub fn at_start(&self) -> bool {
        self.tree.is_empty() || self.start
    }

    pub fn at_end(&self) -> bool {
        self.tree.is_empty() || self.end
    }

    /// Moves to the first entry; false on an empty tree.
    pub fn to_start(&mut self) -> bool {
        if self.tree.is_empty() {
            return false;
        }
        self.node = self.first;
        self.index = 0;
        self.start = true;
        self.end = false;
        true
    }

    /// Moves to the last entry; false on an empty tree.
    pub fn to_end(&mut self) -> bool {
        if self.tree.is_empty() {
            return false;
        }
        self.node = self.last;
        self.index = self.tree.len() - 1;
        self.start = false;
        self.end = true;
        true
    }

    /// Steps to the next entry; false if the cursor did not move.
    pub fn move_next(&mut self) -> bool {
        let Some(id) = self.node else {
            return false;
        };
        if self.end {
            return false;
        }
        if self.node == self.last {
            self.end = true;
            return false;
        }
        self.start = false;
        self.node = self.tree.successor(id);
        self.index += 1;
        true
    }

    /// Steps to the previous entry; false if the cursor did not move.
    pub fn move_prev(&mut self) -> bool {
        let Some(id) = self.node else {
            return false;
        };
        if self.start {
            return false;
        }
        if self.node == self.first {
            self.start = true;
            return false;
        }
        self.end = false;
        self.node = self.tree.predecessor(id);
        self.index -= 1;
        true
    }

    /// Moves `steps` entries forward. Nothing moves unless the whole jump
    /// stays inside the tree.
    pub fn advance(&mut self, steps: usize) -> bool {
        if self.end || self.node.is_none() {
            return false;
        }
        if self.node == self.last {
            self.end = true;
            return false;
        }
        if steps == 0 || self.index.saturating_add(steps) >= self.tree.len() {
            return false;
        }
        for _ in 0..steps {
            self.move_next();
        }
        true
    }

    /// Moves `steps` entries back. Nothing moves unless the whole jump
    /// stays inside the tree.
    pub fn rewind(&mut self, steps: usize) -> bool {
        if self.start || self.node.is_none() {
            return false;
        }
        if self.node == self.first {
            self.start = true;
            return false;
        }
        if steps == 0 || self.index < steps {
            return false;
        }
        for _ in 0..steps {
            self.move_prev();
        }
        true
    }

    /// Positions the cursor on the entry of rank `index`.
    pub fn go_to(&mut self, index: usize) -> bool {
        if index >= self.tree.len() {
            return false;
        }
        match index.cmp(&self.index) {
            Ordering::Equal => true,
            Ordering::Greater => {
                self.end = false;
                self.advance(index - self.index)
            }
            Ordering::Less => {
                self.start = false;
                self.rewind(self.index - index)
            }
        }
    }

    pub fn key(&self) -> Option<&'a K> {
        self.node.map(|id| self.tree.entry(id).0)
    }

    pub fn value(&self) -> Option<&'a V> {
        self.node.map(|id| self.tree.entry(id).1)
    }

    /// Rank of the current entry in key order.
    pub fn index(&self) -> usize {
        self.index
    }
}

#[cfg(test)]
impl<K: Ord, V> AvlTree<K, V> {
    /// Checks parent links, stored heights, balance and key order; returns
    /// the number of reachable nodes.
    pub(crate) fn validate(&self) -> usize {
        fn walk<K: Ord, V>(t: &AvlTree<K, V>, id: NodeId, parent: Option<NodeId>) -> (usize, usize) {
            let n = &t.nodes[id];
            assert_eq!(n.parent, parent, "broken parent link");
            let (lh, lc) = n.left.map_or((0, 0), |l| {
                assert!(t.nodes[l].key < n.key, "left child out of order");
                walk(t, l, Some(id))
            });
            let (rh, rc) = n.right.map_or((0, 0), |r| {
                assert!(t.nodes[r].key > n.key, "right child out of order");
                walk(t, r, Some(id))
            });
            assert_eq!(n.height, 1 + lh.max(rh), "stale height");
            assert!(lh.abs_diff(rh) <= 1, "unbalanced node");
            (n.height, 1 + lc + rc)
        }
        let count = self.root.map_or(0, |r| walk(self, r, None).1);
        assert_eq!(count, self.len(), "unreachable nodes in arena");
        let keys: Vec<&K> = self.iter().map(|(k, _)| k).collect();
        assert!(keys.windows(2).all(|w| w[0] < w[1]), "in-order walk not increasing");
        count
    }

    pub(crate) fn root_height(&self) -> usize {
        self.height(self.root)
    }
}
