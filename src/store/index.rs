use std::collections::HashMap;

use crate::store::fact::{Fact, Pattern};

/// An in-memory set of ternary facts with an eight-way inverted index.
///
/// Every fact `(a, b, c)` is stored under all eight keys obtained by
/// independently replacing each position with the wildcard `0`, so a
/// [`lookup`] with any combination of pinned and wild positions dispatches to
/// exactly one bucket. The all-wild bucket enumerates every fact.
///
/// Mutating the index invalidates any outstanding [`lookup`] views; a
/// [`Solver`] holds a shared borrow for its whole lifetime, which makes that
/// impossible to get wrong from safe code.
///
/// [`lookup`]: FactIndex::lookup
/// [`Solver`]: crate::solver::Solver
#[derive(Debug, Clone, Default)]
pub struct FactIndex {
    buckets: HashMap<Fact, Vec<Fact>>,
}

impl FactIndex {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts `fact` into all eight buckets.
    ///
    /// # Panics
    ///
    /// Panics if any position of `fact` is `0`, or if `fact` is already
    /// present.
    pub fn add(&mut self, fact: Fact) {
        assert!(
            fact.iter().all(|&node| node > 0),
            "fact {fact:?} contains the reserved node id 0"
        );
        assert!(!self.is_true(fact), "fact {fact:?} is already present");
        for key in keys_of(fact) {
            self.buckets.entry(key).or_default().push(fact);
        }
    }

    /// Removes `fact` from all eight buckets.
    ///
    /// # Panics
    ///
    /// Panics if `fact` is not present.
    pub fn remove(&mut self, fact: Fact) {
        assert!(self.is_true(fact), "fact {fact:?} is not present");
        for key in keys_of(fact) {
            let bucket = self
                .buckets
                .get_mut(&key)
                .expect("a present fact appears in all eight buckets");
            let position = bucket
                .iter()
                .position(|stored| *stored == fact)
                .expect("a present fact appears in all eight buckets");
            bucket.remove(position);
            if bucket.is_empty() {
                self.buckets.remove(&key);
            }
        }
    }

    /// Whether `fact` is present.
    pub fn is_true(&self, fact: Fact) -> bool {
        self.buckets
            .get(&fact)
            .is_some_and(|bucket| !bucket.is_empty())
    }

    /// Whether every fact in `facts` is present.
    pub fn all_true(&self, facts: &[Fact]) -> bool {
        facts.iter().all(|&fact| self.is_true(fact))
    }

    /// Every stored fact agreeing with `pattern` on its pinned positions, in
    /// insertion order.
    ///
    /// The returned view borrows the index and costs a single bucket probe.
    /// A pattern with no matches yields the shared empty slice.
    pub fn lookup(&self, pattern: Pattern) -> &[Fact] {
        match self.buckets.get(&pattern.key()) {
            Some(bucket) => bucket,
            None => &[],
        }
    }

    /// The number of stored facts.
    pub fn len(&self) -> usize {
        // The all-wild bucket holds every fact exactly once.
        self.buckets.get(&[0, 0, 0]).map_or(0, Vec::len)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// The eight bucket keys of a fact, one per subset of pinned positions.
fn keys_of(fact: Fact) -> impl Iterator<Item = Fact> {
    (0u8..8).map(move |mask| {
        let mut key = [0; 3];
        for (j, out) in key.iter_mut().enumerate() {
            if (mask >> j) & 1 == 1 {
                *out = fact[j];
            }
        }
        key
    })
}
