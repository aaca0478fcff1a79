//! Ordered triple indexes.
//!
//! Each set of triples (a layer's additions or removals) is kept in three
//! orderings so that subject-, predicate- and object-keyed scans are all
//! prefix range scans:
//!
//! - [`IndexOrder::Spo`] -- `(subject, predicate, object)`
//! - [`IndexOrder::Pso`] -- `(predicate, subject, object)`
//! - [`IndexOrder::Osp`] -- `(object, subject, predicate)`

use std::collections::BTreeSet;
use std::ops::Bound;

use terrace_types::IdTriple;

/// A permuted triple key.
pub type IndexKey = [u64; 3];

/// Component ordering of an index.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum IndexOrder {
    Spo,
    Pso,
    Osp,
}

impl IndexOrder {
    /// Permute a triple into this ordering's key.
    pub fn key(self, t: IdTriple) -> IndexKey {
        match self {
            Self::Spo => [t.subject, t.predicate, t.object],
            Self::Pso => [t.predicate, t.subject, t.object],
            Self::Osp => [t.object, t.subject, t.predicate],
        }
    }

    /// Undo the permutation of [`IndexOrder::key`].
    pub fn triple(self, key: IndexKey) -> IdTriple {
        match self {
            Self::Spo => IdTriple::new(key[0], key[1], key[2]),
            Self::Pso => IdTriple::new(key[1], key[0], key[2]),
            Self::Osp => IdTriple::new(key[1], key[2], key[0]),
        }
    }
}

/// Inclusive key range covering every key that starts with `prefix`.
pub fn prefix_range(prefix: &[u64]) -> (IndexKey, IndexKey) {
    let mut low = [0u64; 3];
    let mut high = [u64::MAX; 3];
    for (i, component) in prefix.iter().take(3).enumerate() {
        low[i] = *component;
        high[i] = *component;
    }
    (low, high)
}

/// A set of triples indexed in all three orderings.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TripleIndex {
    spo: BTreeSet<IndexKey>,
    pso: BTreeSet<IndexKey>,
    osp: BTreeSet<IndexKey>,
}

impl TripleIndex {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_triples<I>(triples: I) -> Self
    where
        I: IntoIterator<Item = IdTriple>,
    {
        let mut index = Self::new();
        for t in triples {
            index.insert(t);
        }
        index
    }

    /// Insert a triple. Returns `true` if it was not already present.
    pub fn insert(&mut self, t: IdTriple) -> bool {
        if !self.spo.insert(IndexOrder::Spo.key(t)) {
            return false;
        }
        self.pso.insert(IndexOrder::Pso.key(t));
        self.osp.insert(IndexOrder::Osp.key(t));
        true
    }

    pub fn contains(&self, t: IdTriple) -> bool {
        self.spo.contains(&IndexOrder::Spo.key(t))
    }

    pub fn len(&self) -> usize {
        self.spo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.spo.is_empty()
    }

    /// All triples in `(subject, predicate, object)` order.
    pub fn iter(&self) -> impl Iterator<Item = IdTriple> + '_ {
        self.spo.iter().map(|k| IndexOrder::Spo.triple(*k))
    }

    /// First key in `order` strictly after `after` (or from `low` when
    /// `after` is `None`) and no greater than `high`.
    pub fn next_key(
        &self,
        order: IndexOrder,
        low: IndexKey,
        after: Option<IndexKey>,
        high: IndexKey,
    ) -> Option<IndexKey> {
        let start = match after {
            Some(key) if key >= high => return None,
            Some(key) => Bound::Excluded(key),
            None if low > high => return None,
            None => Bound::Included(low),
        };
        self.set(order)
            .range((start, Bound::Included(high)))
            .next()
            .copied()
    }

    fn set(&self, order: IndexOrder) -> &BTreeSet<IndexKey> {
        match order {
            IndexOrder::Spo => &self.spo,
            IndexOrder::Pso => &self.pso,
            IndexOrder::Osp => &self.osp,
        }
    }
}
