use std::collections::{btree_map::Entry, BTreeMap};

use ordered_float::OrderedFloat;

use crate::error::{Error, Result};

type Key = OrderedFloat<f64>;

// -0.0 is stored as 0.0 so the sign of a zero median does not depend on
// insertion order
fn key(x: f64) -> Key {
    OrderedFloat(if x == 0.0 { 0.0 } else { x })
}

/// Sorted multiset of f64 values stored as value -> count
///
/// Values are ordered using OrderedFloat, so NaN sorts above +Inf and all
/// NaNs compare equal.
#[derive(Debug, Clone, Default)]
struct Multiset {
    counts: BTreeMap<Key, usize>,
    len: usize,
}

impl Multiset {
    fn len(&self) -> usize {
        self.len
    }

    fn is_empty(&self) -> bool {
        self.len == 0
    }

    fn insert(&mut self, x: Key) {
        *self.counts.entry(x).or_insert(0) += 1;
        self.len += 1;
    }

    /// Remove one occurrence of x.  Returns false if x is not present.
    fn remove(&mut self, x: Key) -> bool {
        match self.counts.entry(x) {
            Entry::Occupied(mut e) => {
                if *e.get() > 1 {
                    *e.get_mut() -= 1
                } else {
                    e.remove();
                }
                self.len -= 1;
                true
            }
            Entry::Vacant(_) => false,
        }
    }

    fn first(&self) -> Option<Key> {
        self.counts.first_key_value().map(|(k, _)| *k)
    }

    fn last(&self) -> Option<Key> {
        self.counts.last_key_value().map(|(k, _)| *k)
    }

    fn pop_first(&mut self) -> Option<Key> {
        let x = self.first()?;
        self.remove(x);
        Some(x)
    }

    fn pop_last(&mut self) -> Option<Key> {
        let x = self.last()?;
        self.remove(x);
        Some(x)
    }

    fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.counts
            .iter()
            .flat_map(|(k, n)| std::iter::repeat(k.into_inner()).take(*n))
    }
}

/// Running median of a multiset of values
///
/// The values are split into two sorted halves: `low` holds the smaller
/// ceil(n/2) values and `high` the larger floor(n/2), so that every value in
/// `low` is <= every value in `high`.  The median is then the largest value
/// of `low` (n odd) or the mean of the largest value in `low` and the smallest
/// value in `high` (n even).  Insertion, removal of an arbitrary value and the
/// median query are all O(log n).
///
/// Values are matched exactly on removal (no tolerance), and removing a value
/// that is not present is an error ([`Error::NotFound`]) rather than a no-op.
/// NaN sorts above +Inf and all NaNs match each other.  -0.0 is treated as
/// 0.0, so a zero median is always +0.0.
#[derive(Debug, Clone, Default)]
pub struct MedianTracker {
    low: Multiset,
    high: Multiset,
}

impl MedianTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn size(&self) -> usize {
        self.low.len() + self.high.len()
    }

    pub fn is_empty(&self) -> bool {
        self.low.is_empty()
    }

    pub fn add(&mut self, x: f64) {
        let x = key(x);
        match self.low.last() {
            Some(m) if x > m => self.high.insert(x),
            _ => self.low.insert(x),
        }
        self.rebalance()
    }

    pub fn remove(&mut self, x: f64) -> Result<()> {
        let k = key(x);
        // Anything <= max(low) can only be in low, as min(high) >= max(low)
        let found = match self.low.last() {
            Some(m) if k <= m => self.low.remove(k),
            _ => self.high.remove(k),
        };
        if found {
            self.rebalance();
            Ok(())
        } else {
            Err(Error::NotFound(x))
        }
    }

    pub fn median(&self) -> Result<f64> {
        let a = self.low.last().ok_or(Error::EmptyState)?.into_inner();
        if self.low.len() > self.high.len() {
            Ok(a)
        } else {
            // Balanced and non-empty, so high can not be empty here
            let b = self.high.first().ok_or(Error::EmptyState)?.into_inner();
            Ok((a + b) / 2.0)
        }
    }

    /// Iterate over all values in ascending order
    pub fn iter(&self) -> impl Iterator<Item = f64> + '_ {
        self.low.iter().chain(self.high.iter())
    }

    // Restore low.len() == high.len() or low.len() == high.len() + 1
    fn rebalance(&mut self) {
        while self.low.len() > self.high.len() + 1 {
            if let Some(x) = self.low.pop_last() {
                self.high.insert(x)
            }
        }
        while self.high.len() > self.low.len() {
            if let Some(x) = self.high.pop_first() {
                self.low.insert(x)
            }
        }
    }
}

impl Extend<f64> for MedianTracker {
    fn extend<I: IntoIterator<Item = f64>>(&mut self, iter: I) {
        for x in iter {
            self.add(x)
        }
    }
}

impl FromIterator<f64> for MedianTracker {
    fn from_iter<I: IntoIterator<Item = f64>>(iter: I) -> Self {
        let mut t = Self::new();
        t.extend(iter);
        t
    }
}
