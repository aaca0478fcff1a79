//! Per-layer string dictionaries.
//!
//! A [`Dictionary`] is a sorted, duplicate-free list of strings that owns a
//! contiguous id range `offset + 1 ..= offset + len`. The offset is the number
//! of ids already handed out by the ancestor chain, so ids are global across
//! the chain and a layer never rebinds an id its parent assigned.
//!
//! A [`LayerDictionary`] groups the three dictionaries of one layer. Nodes and
//! values share one id space (nodes first, then values); predicates have
//! their own.

use crate::error::{LayerError, LayerResult};
use terrace_types::LayerId;

/// A sorted string table owning a contiguous range of ids.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dictionary {
    offset: u64,
    entries: Vec<String>,
}

impl Dictionary {
    /// Create a dictionary from entries that must already be sorted and unique.
    pub fn new(offset: u64, entries: Vec<String>) -> Result<Self, String> {
        if let Some(pos) = entries.windows(2).position(|w| w[0] >= w[1]) {
            return Err(format!(
                "dictionary entries not strictly sorted at position {}",
                pos + 1
            ));
        }
        Ok(Self { offset, entries })
    }

    /// Build a dictionary from arbitrary strings, sorting and deduplicating.
    pub fn from_unsorted<I>(offset: u64, strings: I) -> Self
    where
        I: IntoIterator<Item = String>,
    {
        let mut entries: Vec<String> = strings.into_iter().collect();
        entries.sort();
        entries.dedup();
        Self { offset, entries }
    }

    /// Number of ids assigned before this dictionary's range.
    pub fn offset(&self) -> u64 {
        self.offset
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// The last id covered by this dictionary (equal to the offset when empty).
    pub fn end(&self) -> u64 {
        self.offset + self.entries.len() as u64
    }

    /// Look up the id of a string.
    pub fn id(&self, s: &str) -> Option<u64> {
        self.entries
            .binary_search_by(|entry| entry.as_str().cmp(s))
            .ok()
            .map(|idx| self.offset + idx as u64 + 1)
    }

    /// Look up the string behind an id.
    pub fn get(&self, id: u64) -> Option<&str> {
        if !self.contains_id(id) {
            return None;
        }
        let idx = (id - self.offset - 1) as usize;
        self.entries.get(idx).map(String::as_str)
    }

    /// Returns `true` if the id falls inside this dictionary's range.
    pub fn contains_id(&self, id: u64) -> bool {
        id > self.offset && id <= self.end()
    }

    /// Iterate over `(id, string)` pairs in ascending id order.
    pub fn iter(&self) -> impl Iterator<Item = (u64, &str)> + '_ {
        self.entries
            .iter()
            .enumerate()
            .map(move |(idx, s)| (self.offset + idx as u64 + 1, s.as_str()))
    }

    pub fn entries(&self) -> &[String] {
        &self.entries
    }
}

/// The node, value and predicate dictionaries of a single layer.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct LayerDictionary {
    nodes: Dictionary,
    values: Dictionary,
    predicates: Dictionary,
}

impl LayerDictionary {
    /// Assemble a layer dictionary on top of the parent's id counts.
    ///
    /// `node_value_offset` and `predicate_offset` are the parent's
    /// `node_and_value_count` and `predicate_count` (0 for a base layer).
    pub fn new(
        layer: LayerId,
        node_value_offset: u64,
        predicate_offset: u64,
        nodes: Vec<String>,
        values: Vec<String>,
        predicates: Vec<String>,
    ) -> LayerResult<Self> {
        let invalid = |reason: String| LayerError::InvalidRecord { id: layer, reason };
        let nodes = Dictionary::new(node_value_offset, nodes)
            .map_err(|e| invalid(format!("nodes: {e}")))?;
        let values = Dictionary::new(nodes.end(), values)
            .map_err(|e| invalid(format!("values: {e}")))?;
        let predicates = Dictionary::new(predicate_offset, predicates)
            .map_err(|e| invalid(format!("predicates: {e}")))?;
        Ok(Self {
            nodes,
            values,
            predicates,
        })
    }

    pub fn nodes(&self) -> &Dictionary {
        &self.nodes
    }

    pub fn values(&self) -> &Dictionary {
        &self.values
    }

    pub fn predicates(&self) -> &Dictionary {
        &self.predicates
    }

    /// Total node and value ids known up to and including this layer.
    pub fn node_and_value_count(&self) -> u64 {
        self.values.end()
    }

    /// Total predicate ids known up to and including this layer.
    pub fn predicate_count(&self) -> u64 {
        self.predicates.end()
    }

    /// Number of strings this layer itself contributes.
    pub fn own_entry_count(&self) -> usize {
        self.nodes.len() + self.values.len() + self.predicates.len()
    }
}
