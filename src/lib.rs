//! probing-collections: single-threaded hash and ordered collections built
//! on a Robin Hood open-addressing table and an arena-backed AVL tree.
//!
//! Internal Design:
//!
//! Summary
//! - Goal: keep the structural work in two small layers and build every
//!   public collection as a thin wrapper that adds its own semantics.
//! - Layers:
//!   - `ProbeTable<T>` (in `raw`): open-addressing slots with tombstones,
//!     Robin Hood placement, prime capacities and a load-factor trigger.
//!     Knows nothing about keys; callers hash and compare.
//!   - `AvlTree<K, V>` (in `avl`): height-balanced tree stored in a
//!     slotmap arena with parent links, so in-order stepping and cursors
//!     need no auxiliary stack.
//!   - Collections: `HashMap`, `HashSet`, `HashMultiset` and `HashBidiMap`
//!     over `ProbeTable`; `TreeMap` and `TreeSet` over `AvlTree`; `Heap`
//!     and `SortedList` over a plain `Vec`.
//!
//! Constraints
//! - Single-threaded: no locking and no atomics.
//! - Every fallible operation returns `Result<_, Error>`; a failed call
//!   leaves the collection unchanged.
//! - Keys are immutable once stored; the bidirectional map changes them
//!   only through `update_key`/`update_val`, which re-index both sides.
//! - Callbacks fire after the operation has completed.
//!
//! Reentrancy policy
//! - `ProbeTable::find` and the ordered descent of `AvlTree` run user
//!   `Eq`/`Ord` code while the structure is being walked. A debug-only
//!   guard panics if that code reaches back into the same structure.
//!   The wrapper layers do not need their own guard: they call into the
//!   structural layer only once it is consistent again.
//!
//! Hasher and rehashing invariants
//! - Each filled slot stores the precomputed `u64` hash of its item and
//!   its probe distance; resizing reuses the stored hash, so `K: Hash` is
//!   never invoked after insertion.
//! - A filled slot at index `i` always satisfies
//!   `i == (hash % capacity + dist) % capacity`.
//! - The bidirectional map keeps, per entry, the slot index it occupies in
//!   each of its two tables. `ProbeTable` reports every placement through
//!   an `on_place` callback so those indices stay exact across Robin Hood
//!   displacement and resizes.
//!
//! Notes and non-goals
//! - No thread-safe variants and no custom allocators; allocation failure
//!   surfaces as `Error::Alloc`.
//! - The raw table is public only with the `bench_internal` feature.

pub mod error;
pub mod config;
pub mod hooks;
mod reentrancy;

#[cfg(feature = "bench_internal")]
pub mod raw;
#[cfg(not(feature = "bench_internal"))]
mod raw;
mod raw_proptest;

pub mod hash_map;
pub mod hash_set;
pub mod hash_multiset;
pub mod hash_bidimap;

pub mod heap;
mod avl;
mod avl_proptest;
pub mod tree_map;
pub mod tree_set;
pub mod sorted_list;

// Public surface
pub use avl::Cursor;
pub use config::TableConfig;
pub use error::{Error, Result};
pub use hash_bidimap::HashBidiMap;
pub use hash_map::HashMap;
pub use hash_multiset::HashMultiset;
pub use hash_set::HashSet;
pub use heap::{Heap, HeapOrder};
pub use hooks::{Callbacks, Event};
pub use sorted_list::SortedList;
pub use tree_map::TreeMap;
pub use tree_set::TreeSet;
