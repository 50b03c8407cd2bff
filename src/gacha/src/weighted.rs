//! Cumulative-weight sampling tables
//!
//! Every entry remembers the running sum of the weights pushed before it
//! (`base`). Sampling draws a scalar `r` in `[0, total)` and binary-searches
//! the single entry with `base <= r < base + weight`.
//!
//! For entries pushed as `(10, A), (20, B), (30, C), (40, D)` the bases are
//! `[0, 10, 30, 60]`, the total is 100, and the draw probabilities are
//! A: 10%, B: 20%, C: 30%, D: 40%.
//!
//! ```
//! use gacha::WeightedTable;
//!
//! let mut table = WeightedTable::new();
//! table.push(10, 'A');
//! table.push(20, 'B');
//! table.push(30, 'C');
//! table.push(40, 'D');
//!
//! assert_eq!(table.total(), 100);
//! assert_eq!(table.locate(35).map(|i| table.get(i)), Some(Some(&'C')));
//! ```

use rand::Rng;

use crate::error::{GachaError, GachaResult};

#[derive(Debug, Clone, PartialEq)]
struct Entry<T> {
    base: i64,
    weight: i64,
    value: T,
}

/// Read-only view of one table entry, as yielded by [`WeightedTable::iter`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EntryView<'a, T> {
    pub base: i64,
    pub weight: i64,
    pub value: &'a T,
}

/// Cursor movement for [`WeightedTable::advance`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Advance {
    /// Jump to a uniformly random position, ignoring weights
    Jump,
    /// Move one position forward, wrapping to the start
    Step,
}

/// Weighted table sampled with replacement
#[derive(Debug, Clone)]
pub struct WeightedTable<T> {
    entries: Vec<Entry<T>>,
    total: i64,
    cursor: usize,
}

impl<T> Default for WeightedTable<T> {
    fn default() -> Self {
        Self {
            entries: Vec::new(),
            total: 0,
            cursor: 0,
        }
    }
}

impl<T> WeightedTable<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an entry. Non-positive weights are skipped without error, as
    /// are weights that would overflow the running total.
    pub fn push(&mut self, weight: i64, value: T) {
        if weight <= 0 {
            return;
        }
        let Some(total) = self.total.checked_add(weight) else {
            tracing::warn!(weight, total = self.total, "Weight overflows table total, skipped");
            return;
        };
        self.entries.push(Entry {
            base: self.total,
            weight,
            value,
        });
        self.total = total;
    }

    /// Sum of all stored weights
    pub fn total(&self) -> i64 {
        self.total
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        self.entries.get(index).map(|e| &e.value)
    }

    /// Resolve a draw value in `[0, total)` to the index of the entry covering it
    pub fn locate(&self, r: i64) -> Option<usize> {
        if r < 0 || r >= self.total {
            return None;
        }
        // Bases are strictly increasing and the first one is 0, so the
        // partition point is at least 1.
        Some(self.entries.partition_point(|e| e.base <= r) - 1)
    }

    /// Draw an index with probability proportional to its weight
    pub fn sample_index<R: Rng + ?Sized>(&self, rng: &mut R) -> GachaResult<usize> {
        if self.total <= 0 {
            return Err(GachaError::EmptyTable);
        }
        let r = rng.gen_range(0..self.total);
        self.locate(r).ok_or(GachaError::EmptyTable)
    }

    /// Draw a value with replacement
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> GachaResult<&T> {
        let index = self.sample_index(rng)?;
        Ok(&self.entries[index].value)
    }

    /// Traverse entries in insertion order
    pub fn iter(&self) -> impl Iterator<Item = EntryView<'_, T>> + '_ {
        self.entries.iter().map(|e| EntryView {
            base: e.base,
            weight: e.weight,
            value: &e.value,
        })
    }

    /// Move the unweighted cursor and return the value under it
    pub fn advance<R: Rng + ?Sized>(&mut self, mode: Advance, rng: &mut R) -> GachaResult<&T> {
        if self.entries.is_empty() {
            return Err(GachaError::EmptyTable);
        }
        match mode {
            Advance::Jump => self.cursor = rng.gen_range(0..self.entries.len()),
            Advance::Step => self.cursor += 1,
        }
        if self.cursor >= self.entries.len() {
            self.cursor = 0;
        }
        Ok(&self.entries[self.cursor].value)
    }

    /// Remove the entry at `index`, re-basing everything after it.
    fn remove(&mut self, index: usize) -> Entry<T> {
        let removed = self.entries.remove(index);
        let mut base = removed.base;
        for entry in &mut self.entries[index..] {
            entry.base = base;
            base += entry.weight;
        }
        self.total -= removed.weight;
        removed
    }

    /// Independent copy for sampling without replacement
    pub fn extractor(&self) -> Extractor<T>
    where
        T: Clone,
    {
        Extractor {
            table: self.clone(),
        }
    }
}

impl<T> Extend<(i64, T)> for WeightedTable<T> {
    fn extend<I: IntoIterator<Item = (i64, T)>>(&mut self, iter: I) {
        for (weight, value) in iter {
            self.push(weight, value);
        }
    }
}

impl<T> FromIterator<(i64, T)> for WeightedTable<T> {
    fn from_iter<I: IntoIterator<Item = (i64, T)>>(iter: I) -> Self {
        let mut table = Self::new();
        table.extend(iter);
        table
    }
}

/// Draws without replacement from a private copy of a [`WeightedTable`]
#[derive(Debug, Clone)]
pub struct Extractor<T> {
    table: WeightedTable<T>,
}

impl<T> Extractor<T> {
    /// Remaining entries
    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Remaining weight
    pub fn total(&self) -> i64 {
        self.table.total()
    }

    /// Remove the first entry matching each value. Returns how many were removed.
    ///
    /// A value matches at most one entry; later duplicates stay in the table.
    pub fn exclude<U, I, F>(&mut self, values: I, mut equals: F) -> usize
    where
        I: IntoIterator<Item = U>,
        F: FnMut(&T, &U) -> bool,
    {
        let mut removed = 0;
        for value in values {
            if let Some(index) = self.table.entries.iter().position(|e| equals(&e.value, &value)) {
                self.table.remove(index);
                removed += 1;
            }
        }
        removed
    }

    /// [`exclude`](Self::exclude) using `PartialEq`
    pub fn exclude_values<'a, I>(&mut self, values: I) -> usize
    where
        T: PartialEq + 'a,
        I: IntoIterator<Item = &'a T>,
    {
        self.exclude(values, |entry, value| entry == *value)
    }

    /// Draw a value and remove it from this extractor
    pub fn sample<R: Rng + ?Sized>(&mut self, rng: &mut R) -> GachaResult<T> {
        let index = self.table.sample_index(rng)?;
        Ok(self.table.remove(index).value)
    }
}
