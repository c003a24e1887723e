//! Sizing configuration for the hash-based collections.

use crate::error::{Error, Result};
use crate::raw::capacity;

/// Initial capacity and load factor of a hash table.
///
/// `capacity` is the number of elements the table should hold before its
/// first resize; the real slot count is the smallest table prime at or above
/// `capacity / load`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TableConfig {
    pub capacity: usize,
    pub load: f64,
}

impl TableConfig {
    pub const DEFAULT_CAPACITY: usize = 32;
    pub const DEFAULT_LOAD: f64 = 0.75;

    pub const fn new(capacity: usize, load: f64) -> Self {
        Self { capacity, load }
    }

    /// Rejects a zero capacity, a load outside of `(0, 1)` and sizes whose
    /// slot count would overflow `usize`.
    pub fn validate(&self) -> Result<()> {
        if self.capacity == 0 || !(self.load > 0.0 && self.load < 1.0) {
            return Err(Error::Invalid);
        }
        if self.capacity as f64 >= usize::MAX as f64 * self.load {
            return Err(Error::Invalid);
        }
        Ok(())
    }

    /// Number of slots a table built from this config starts with.
    pub fn slot_count(&self) -> Result<usize> {
        self.validate()?;
        Ok(capacity::slots_for(self.capacity, self.load))
    }
}

impl Default for TableConfig {
    fn default() -> Self {
        Self::new(Self::DEFAULT_CAPACITY, Self::DEFAULT_LOAD)
    }
}
