//! Immutable, delta-encoded triple layers.
//!
//! A [`Layer`] is a reference-counted handle to one committed layer. Each
//! layer stores only what changed relative to its parent: the dictionary
//! entries it introduced and the triples it added or removed. Everything
//! else is answered by walking the parent chain.
//!
//! # Invariants
//!
//! - A layer never changes after it is committed.
//! - A triple is present in a layer iff, walking from the layer towards the
//!   base, the first layer that mentions the triple lists it as an addition.
//! - Additions only contain triples absent from the parent and removals only
//!   contain triples present in the parent, so chain totals are plain sums.

use std::fmt;
use std::sync::Arc;

use terrace_types::{IdTriple, LayerId, ObjectType, StringTriple};

use crate::builder::LayerBuilder;
use crate::cursor::{TripleCursor, ViewMode};
use crate::dictionary::LayerDictionary;
use crate::error::{LayerError, LayerResult};
use crate::handles::{HandleGuard, HandleKind};
use crate::index::{IndexOrder, TripleIndex};
use crate::record::LayerRecord;

/// Handle to an immutable committed layer.
///
/// Cloning is cheap and shares the underlying layer. A layer keeps its whole
/// ancestor chain alive, independently of the store that produced it.
#[derive(Clone)]
pub struct Layer {
    inner: Arc<LayerInner>,
}

struct LayerInner {
    id: LayerId,
    parent: Option<Layer>,
    dictionary: LayerDictionary,
    additions: TripleIndex,
    removals: TripleIndex,
    total_additions: u64,
    total_removals: u64,
    depth: usize,
    _handle: HandleGuard,
}

impl Drop for LayerInner {
    // Unlink the parent chain iteratively so long chains don't recurse.
    fn drop(&mut self) {
        let mut next = self.parent.take();
        while let Some(layer) = next {
            match Arc::try_unwrap(layer.inner) {
                Ok(mut inner) => next = inner.parent.take(),
                Err(_) => break,
            }
        }
    }
}

/// Which dictionary an id resolved in.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum IdClass {
    Node,
    Value,
}

impl Layer {
    /// Materialize a layer from its record on top of `parent`.
    ///
    /// Verifies the parent linkage, the id offsets and the content hash, then
    /// checks every triple against the dictionary and the parent's contents.
    pub fn from_record(record: LayerRecord, parent: Option<Layer>) -> LayerResult<Self> {
        let parent_id = parent.as_ref().map(Layer::id);
        if record.parent != parent_id {
            return Err(LayerError::ParentMismatch {
                expected: record.parent,
                actual: parent_id,
            });
        }
        let (nv_offset, pred_offset) = parent
            .as_ref()
            .map(|p| (p.node_and_value_count(), p.predicate_count()))
            .unwrap_or((0, 0));
        if record.node_value_offset != nv_offset || record.predicate_offset != pred_offset {
            return Err(LayerError::InvalidRecord {
                id: record.id,
                reason: format!(
                    "id offsets ({}, {}) do not match parent counts ({nv_offset}, {pred_offset})",
                    record.node_value_offset, record.predicate_offset
                ),
            });
        }
        record.verify()?;

        let nv_count = record.node_and_value_count();
        let pred_count = record.predicate_count();
        if parent.is_none() && !record.removals.is_empty() {
            return Err(LayerError::InvalidRecord {
                id: record.id,
                reason: "base layer cannot carry removals".into(),
            });
        }
        let own_nodes_end = nv_offset + record.nodes.len() as u64;
        let subject_is_node = |id: u64| {
            if id > nv_offset {
                id <= own_nodes_end
            } else {
                parent
                    .as_ref()
                    .and_then(|p| p.locate_node_value(id))
                    .is_some_and(|(_, class)| class == IdClass::Node)
            }
        };
        for t in record.additions.iter().chain(record.removals.iter()) {
            let in_range = (1..=nv_count).contains(&t.subject)
                && (1..=pred_count).contains(&t.predicate)
                && (1..=nv_count).contains(&t.object);
            if !in_range {
                return Err(LayerError::InvalidRecord {
                    id: record.id,
                    reason: format!("triple {t} references ids outside the dictionary"),
                });
            }
            if !subject_is_node(t.subject) {
                return Err(LayerError::InvalidRecord {
                    id: record.id,
                    reason: format!("triple {t} has a value as its subject"),
                });
            }
        }
        if let Some(p) = &parent {
            if let Some(t) = record.additions.iter().find(|t| p.triple_exists(**t)) {
                return Err(LayerError::InvalidRecord {
                    id: record.id,
                    reason: format!("adds {t}, which the parent already holds"),
                });
            }
            if let Some(t) = record.removals.iter().find(|t| !p.triple_exists(**t)) {
                return Err(LayerError::InvalidRecord {
                    id: record.id,
                    reason: format!("removes {t}, which the parent does not hold"),
                });
            }
        }

        let LayerRecord {
            id,
            nodes,
            values,
            predicates,
            additions,
            removals,
            ..
        } = record;
        let dictionary =
            LayerDictionary::new(id, nv_offset, pred_offset, nodes, values, predicates)?;
        let additions = TripleIndex::from_triples(additions);
        let removals = TripleIndex::from_triples(removals);

        let (parent_additions, parent_removals, depth) = parent
            .as_ref()
            .map(|p| {
                (
                    p.total_triple_addition_count(),
                    p.total_triple_removal_count(),
                    p.depth() + 1,
                )
            })
            .unwrap_or((0, 0, 0));

        Ok(Self {
            inner: Arc::new(LayerInner {
                id,
                total_additions: parent_additions + additions.len() as u64,
                total_removals: parent_removals + removals.len() as u64,
                parent,
                dictionary,
                additions,
                removals,
                depth,
                _handle: HandleGuard::new(HandleKind::Layer),
            }),
        })
    }

    /// Flatten this layer (without its ancestors) back into a record.
    pub fn to_record(&self) -> LayerRecord {
        let dict = &self.inner.dictionary;
        LayerRecord {
            id: self.inner.id,
            parent: self.parent_id(),
            node_value_offset: dict.nodes().offset(),
            predicate_offset: dict.predicates().offset(),
            nodes: dict.nodes().entries().to_vec(),
            values: dict.values().entries().to_vec(),
            predicates: dict.predicates().entries().to_vec(),
            additions: self.inner.additions.iter().collect(),
            removals: self.inner.removals.iter().collect(),
        }
    }

    pub fn id(&self) -> LayerId {
        self.inner.id
    }

    pub fn parent(&self) -> Option<Layer> {
        self.inner.parent.clone()
    }

    pub fn parent_id(&self) -> Option<LayerId> {
        self.inner.parent.as_ref().map(Layer::id)
    }

    /// Number of ancestors (0 for a base layer).
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    /// Iterate over this layer and then each ancestor down to the base.
    pub fn chain(&self) -> Ancestors<'_> {
        Ancestors { next: Some(self) }
    }

    /// Ids of the whole stack, base layer first, this layer last.
    pub fn layer_stack_ids(&self) -> Vec<LayerId> {
        let mut ids: Vec<LayerId> = self.chain().map(Layer::id).collect();
        ids.reverse();
        ids
    }

    /// Ids of the strict ancestors, parent first.
    pub fn ancestor_ids(&self) -> Vec<LayerId> {
        self.chain().skip(1).map(Layer::id).collect()
    }

    /// Returns `true` if this layer is a strict ancestor of `other`.
    pub fn is_ancestor_of(&self, other: &Layer) -> bool {
        other
            .chain()
            .skip(1)
            .take_while(|l| l.depth() >= self.depth())
            .any(|l| l.id() == self.id())
    }

    /// Open a builder for a child of this layer.
    pub fn open_write(&self) -> LayerBuilder {
        LayerBuilder::child(self.clone())
    }

    // ---------------------------------------------------------------
    // Counts
    // ---------------------------------------------------------------

    /// Nodes and values known to this layer and its ancestors.
    pub fn node_and_value_count(&self) -> u64 {
        self.inner.dictionary.node_and_value_count()
    }

    /// Predicates known to this layer and its ancestors.
    pub fn predicate_count(&self) -> u64 {
        self.inner.dictionary.predicate_count()
    }

    /// Additions made by this layer alone.
    pub fn triple_addition_count(&self) -> usize {
        self.inner.additions.len()
    }

    /// Removals made by this layer alone.
    pub fn triple_removal_count(&self) -> usize {
        self.inner.removals.len()
    }

    /// Additions summed over the whole chain.
    pub fn total_triple_addition_count(&self) -> u64 {
        self.inner.total_additions
    }

    /// Removals summed over the whole chain.
    pub fn total_triple_removal_count(&self) -> u64 {
        self.inner.total_removals
    }

    /// Triples present in this layer after delta resolution.
    pub fn total_triple_count(&self) -> u64 {
        self.inner.total_additions - self.inner.total_removals
    }

    // ---------------------------------------------------------------
    // Dictionary resolution
    // ---------------------------------------------------------------

    pub fn subject_id(&self, subject: &str) -> Option<u64> {
        self.node_id(subject)
    }

    pub fn object_node_id(&self, object: &str) -> Option<u64> {
        self.node_id(object)
    }

    pub fn object_value_id(&self, object: &str) -> Option<u64> {
        self.chain()
            .find_map(|l| l.inner.dictionary.values().id(object))
    }

    pub fn predicate_id(&self, predicate: &str) -> Option<u64> {
        self.chain()
            .find_map(|l| l.inner.dictionary.predicates().id(predicate))
    }

    fn node_id(&self, node: &str) -> Option<u64> {
        self.chain().find_map(|l| l.inner.dictionary.nodes().id(node))
    }

    pub fn id_subject(&self, id: u64) -> Option<String> {
        match self.id_object(id)? {
            ObjectType::Node(s) => Some(s),
            ObjectType::Value(_) => None,
        }
    }

    pub fn id_predicate(&self, id: u64) -> Option<String> {
        if id == 0 || id > self.predicate_count() {
            return None;
        }
        self.chain()
            .find(|l| id > l.inner.dictionary.predicates().offset())
            .and_then(|l| l.inner.dictionary.predicates().get(id))
            .map(str::to_string)
    }

    pub fn id_object(&self, id: u64) -> Option<ObjectType> {
        let (layer, class) = self.locate_node_value(id)?;
        let dict = &layer.inner.dictionary;
        match class {
            IdClass::Node => dict.nodes().get(id).map(|s| ObjectType::Node(s.to_string())),
            IdClass::Value => dict.values().get(id).map(|s| ObjectType::Value(s.to_string())),
        }
    }

    /// Find the layer that assigned a node or value id, and which kind it is.
    pub(crate) fn locate_node_value(&self, id: u64) -> Option<(&Layer, IdClass)> {
        if id == 0 || id > self.node_and_value_count() {
            return None;
        }
        let layer = self
            .chain()
            .find(|l| id > l.inner.dictionary.nodes().offset())?;
        let dict = &layer.inner.dictionary;
        if dict.nodes().contains_id(id) {
            Some((layer, IdClass::Node))
        } else if dict.values().contains_id(id) {
            Some((layer, IdClass::Value))
        } else {
            None
        }
    }

    /// Resolve an id triple to strings. `None` if any id is unknown or the
    /// subject is a value.
    pub fn id_triple_to_string(&self, t: IdTriple) -> Option<StringTriple> {
        Some(StringTriple {
            subject: self.id_subject(t.subject)?,
            predicate: self.id_predicate(t.predicate)?,
            object: self.id_object(t.object)?,
        })
    }

    /// Resolve a string triple to ids. `None` if any string is unknown.
    pub fn string_triple_to_id(&self, t: &StringTriple) -> Option<IdTriple> {
        let subject = self.subject_id(&t.subject)?;
        let predicate = self.predicate_id(&t.predicate)?;
        let object = match &t.object {
            ObjectType::Node(o) => self.object_node_id(o)?,
            ObjectType::Value(o) => self.object_value_id(o)?,
        };
        Some(IdTriple::new(subject, predicate, object))
    }

    // ---------------------------------------------------------------
    // Triple queries
    // ---------------------------------------------------------------

    /// Delta-resolved membership test.
    pub fn triple_exists(&self, t: IdTriple) -> bool {
        if t.has_null_component() {
            return false;
        }
        for layer in self.chain() {
            if layer.inner.removals.contains(t) {
                return false;
            }
            if layer.inner.additions.contains(t) {
                return true;
            }
        }
        false
    }

    /// Returns `true` if this layer itself added the triple.
    pub fn triple_addition_exists(&self, t: IdTriple) -> bool {
        self.inner.additions.contains(t)
    }

    /// Returns `true` if this layer itself removed the triple.
    pub fn triple_removal_exists(&self, t: IdTriple) -> bool {
        self.inner.removals.contains(t)
    }

    pub fn string_triple_exists(&self, t: &StringTriple) -> bool {
        self.string_triple_to_id(t)
            .map(|id| self.triple_exists(id))
            .unwrap_or(false)
    }

    /// All present triples in subject order.
    pub fn triples(&self) -> TripleCursor {
        self.cursor(ViewMode::Effective, IndexOrder::Spo, &[])
    }

    pub fn triples_s(&self, subject: u64) -> TripleCursor {
        self.cursor(ViewMode::Effective, IndexOrder::Spo, &[subject])
    }

    pub fn triples_sp(&self, subject: u64, predicate: u64) -> TripleCursor {
        self.cursor(ViewMode::Effective, IndexOrder::Spo, &[subject, predicate])
    }

    /// Present triples with the given predicate, in (subject, object) order.
    pub fn triples_p(&self, predicate: u64) -> TripleCursor {
        self.cursor(ViewMode::Effective, IndexOrder::Pso, &[predicate])
    }

    /// Present triples with the given object, in (subject, predicate) order.
    pub fn triples_o(&self, object: u64) -> TripleCursor {
        self.cursor(ViewMode::Effective, IndexOrder::Osp, &[object])
    }

    /// Triples added by this layer alone.
    pub fn triple_additions(&self) -> TripleCursor {
        self.cursor(ViewMode::Additions, IndexOrder::Spo, &[])
    }

    /// Triples removed by this layer alone.
    pub fn triple_removals(&self) -> TripleCursor {
        self.cursor(ViewMode::Removals, IndexOrder::Spo, &[])
    }

    /// General cursor over one view of this layer, restricted to a key prefix
    /// in the given ordering.
    pub fn cursor(&self, mode: ViewMode, order: IndexOrder, prefix: &[u64]) -> TripleCursor {
        TripleCursor::new(self.clone(), mode, order, prefix)
    }

    /// Present triples as strings, in subject-id order.
    pub fn string_triples(&self) -> impl Iterator<Item = StringTriple> {
        let layer = self.clone();
        self.triples()
            .filter_map(move |t| layer.id_triple_to_string(t))
    }

    pub(crate) fn additions(&self) -> &TripleIndex {
        &self.inner.additions
    }

    pub(crate) fn removals(&self) -> &TripleIndex {
        &self.inner.removals
    }
}

impl PartialEq for Layer {
    fn eq(&self, other: &Self) -> bool {
        self.id() == other.id()
    }
}

impl Eq for Layer {}

impl fmt::Debug for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Layer")
            .field("id", &self.inner.id)
            .field("parent", &self.parent_id())
            .field("additions", &self.inner.additions.len())
            .field("removals", &self.inner.removals.len())
            .finish()
    }
}

/// Iterator over a layer and its ancestors, nearest first.
pub struct Ancestors<'a> {
    next: Option<&'a Layer>,
}

impl<'a> Iterator for Ancestors<'a> {
    type Item = &'a Layer;

    fn next(&mut self) -> Option<&'a Layer> {
        let current = self.next?;
        self.next = current.inner.parent.as_ref();
        Some(current)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// base: (a b c), (a b d), (a e value 42)
    fn base() -> Layer {
        let mut builder = LayerBuilder::base();
        builder.add_string_node_triple("a", "b", "c").unwrap();
        builder.add_string_node_triple("a", "b", "d").unwrap();
        builder.add_string_value_triple("a", "e", "42").unwrap();
        builder.commit().unwrap()
    }

    #[test]
    fn base_layer_counts() {
        let layer = base();
        // nodes a, c, d; value 42
        assert_eq!(layer.node_and_value_count(), 4);
        assert_eq!(layer.predicate_count(), 2);
        assert_eq!(layer.triple_addition_count(), 3);
        assert_eq!(layer.triple_removal_count(), 0);
        assert_eq!(layer.total_triple_count(), 3);
        assert!(layer.parent().is_none());
        assert_eq!(layer.depth(), 0);
    }

    #[test]
    fn nodes_sort_before_values() {
        let layer = base();
        assert_eq!(layer.subject_id("a"), Some(1));
        assert_eq!(layer.object_node_id("c"), Some(2));
        assert_eq!(layer.object_node_id("d"), Some(3));
        assert_eq!(layer.object_value_id("42"), Some(4));
        assert_eq!(layer.predicate_id("b"), Some(1));
        assert_eq!(layer.predicate_id("e"), Some(2));
    }

    #[test]
    fn reverse_lookup_distinguishes_nodes_and_values() {
        let layer = base();
        assert_eq!(layer.id_object(2), Some(ObjectType::Node("c".into())));
        assert_eq!(layer.id_object(4), Some(ObjectType::Value("42".into())));
        assert_eq!(layer.id_subject(4), None);
        assert_eq!(layer.id_subject(1), Some("a".into()));
        assert_eq!(layer.id_predicate(2), Some("e".into()));
    }

    #[test]
    fn unknown_ids_are_not_found() {
        let layer = base();
        assert_eq!(layer.id_object(0), None);
        assert_eq!(layer.id_object(99), None);
        assert_eq!(layer.id_predicate(0), None);
        assert_eq!(layer.id_predicate(3), None);
        assert_eq!(layer.subject_id("zzz"), None);
        assert!(!layer.triple_exists(IdTriple::new(0, 1, 2)));
    }

    #[test]
    fn child_ids_continue_after_parent() {
        let parent = base();
        let mut builder = parent.open_write();
        builder.add_string_node_triple("x", "y", "a").unwrap();
        let child = builder.commit().unwrap();

        assert_eq!(child.subject_id("a"), Some(1));
        assert_eq!(child.subject_id("x"), Some(5));
        assert_eq!(child.predicate_id("y"), Some(3));
        assert_eq!(child.id_subject(5), Some("x".into()));
        assert_eq!(child.id_subject(1), Some("a".into()));
        assert_eq!(child.node_and_value_count(), 5);
        assert_eq!(child.total_triple_count(), 4);
        assert_eq!(child.parent_id(), Some(parent.id()));
    }

    #[test]
    fn removal_hides_parent_triple() {
        let parent = base();
        let mut builder = parent.open_write();
        assert!(builder.remove_string_node_triple("a", "b", "c").unwrap());
        let child = builder.commit().unwrap();

        let t = IdTriple::new(1, 1, 2);
        assert!(parent.triple_exists(t));
        assert!(!child.triple_exists(t));
        assert!(child.triple_removal_exists(t));
        assert_eq!(child.total_triple_count(), 2);
        assert_eq!(child.total_triple_addition_count(), 3);
        assert_eq!(child.total_triple_removal_count(), 1);
    }

    #[test]
    fn readding_after_removal_is_present_again() {
        let l0 = base();
        let mut b1 = l0.open_write();
        b1.remove_string_node_triple("a", "b", "c").unwrap();
        let l1 = b1.commit().unwrap();
        let mut b2 = l1.open_write();
        assert!(b2.add_string_node_triple("a", "b", "c").unwrap());
        let l2 = b2.commit().unwrap();

        let t = IdTriple::new(1, 1, 2);
        assert!(l2.triple_exists(t));
        assert_eq!(l2.total_triple_count(), 3);
        assert_eq!(l2.triples().count(), 3);
    }

    #[test]
    fn string_conversions() {
        let layer = base();
        let st = StringTriple::new_value("a", "e", "42");
        let id = layer.string_triple_to_id(&st).unwrap();
        assert_eq!(id, IdTriple::new(1, 2, 4));
        assert_eq!(layer.id_triple_to_string(id), Some(st.clone()));
        assert!(layer.string_triple_exists(&st));
        assert!(!layer.string_triple_exists(&StringTriple::new_node("a", "e", "42")));
    }

    #[test]
    fn record_reloads_to_same_layer() {
        let parent = base();
        let mut builder = parent.open_write();
        builder.add_string_node_triple("x", "y", "z").unwrap();
        builder.remove_string_node_triple("a", "b", "d").unwrap();
        let child = builder.commit().unwrap();

        let reloaded = Layer::from_record(child.to_record(), Some(parent.clone())).unwrap();
        assert_eq!(reloaded.id(), child.id());
        assert_eq!(reloaded.total_triple_count(), child.total_triple_count());
        assert_eq!(
            reloaded.triples().collect::<Vec<_>>(),
            child.triples().collect::<Vec<_>>()
        );
    }

    #[test]
    fn record_with_wrong_parent_is_rejected() {
        let parent = base();
        let child = parent.open_write().commit().unwrap();
        let err = Layer::from_record(child.to_record(), None).unwrap_err();
        assert!(matches!(err, LayerError::ParentMismatch { .. }));
    }

    #[test]
    fn tampered_record_is_rejected() {
        let mut record = base().to_record();
        record.additions.pop();
        assert!(matches!(
            Layer::from_record(record, None),
            Err(LayerError::ContentMismatch { .. })
        ));
    }

    #[test]
    fn record_with_out_of_range_ids_is_rejected() {
        let record = LayerRecord::seal(
            None,
            0,
            0,
            vec!["a".into()],
            vec![],
            vec!["p".into()],
            vec![IdTriple::new(1, 1, 7)],
            vec![],
        )
        .unwrap();
        assert!(matches!(
            Layer::from_record(record, None),
            Err(LayerError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn record_with_value_subject_is_rejected() {
        // Node "a" is id 1, value "v" is id 2.
        let record = LayerRecord::seal(
            None,
            0,
            0,
            vec!["a".into()],
            vec!["v".into()],
            vec!["p".into()],
            vec![IdTriple::new(2, 1, 1)],
            vec![],
        )
        .unwrap();
        assert!(matches!(
            Layer::from_record(record, None),
            Err(LayerError::InvalidRecord { .. })
        ));

        // Value 42 (id 4) inherited from the parent.
        let parent = base();
        let child = LayerRecord::seal(
            Some(parent.id()),
            parent.node_and_value_count(),
            parent.predicate_count(),
            vec![],
            vec![],
            vec![],
            vec![IdTriple::new(4, 1, 2)],
            vec![],
        )
        .unwrap();
        assert!(matches!(
            Layer::from_record(child, Some(parent.clone())),
            Err(LayerError::InvalidRecord { .. })
        ));

        // The builder refuses the same triple.
        let mut builder = parent.open_write();
        assert!(builder.add_id_triple(IdTriple::new(4, 1, 2)).is_err());
    }

    #[test]
    fn record_inconsistent_with_parent_is_rejected() {
        let parent = base();
        let reseal = |additions: Vec<IdTriple>, removals: Vec<IdTriple>| {
            LayerRecord::seal(
                Some(parent.id()),
                parent.node_and_value_count(),
                parent.predicate_count(),
                vec![],
                vec![],
                vec![],
                additions,
                removals,
            )
            .unwrap()
        };

        // (a b c) is already present below
        let readd = reseal(vec![IdTriple::new(1, 1, 2)], vec![]);
        assert!(matches!(
            Layer::from_record(readd, Some(parent.clone())),
            Err(LayerError::InvalidRecord { .. })
        ));

        // (a b a) never existed
        let phantom = reseal(vec![], vec![IdTriple::new(1, 1, 1)]);
        assert!(matches!(
            Layer::from_record(phantom, Some(parent.clone())),
            Err(LayerError::InvalidRecord { .. })
        ));
    }

    #[test]
    fn ancestry() {
        let l0 = base();
        let l1 = l0.open_write().commit().unwrap();
        let mut b2 = l1.open_write();
        b2.add_string_node_triple("q", "r", "s").unwrap();
        let l2 = b2.commit().unwrap();

        assert!(l0.is_ancestor_of(&l2));
        assert!(l1.is_ancestor_of(&l2));
        assert!(!l2.is_ancestor_of(&l0));
        assert!(!l2.is_ancestor_of(&l2));
        assert_eq!(l2.layer_stack_ids(), vec![l0.id(), l1.id(), l2.id()]);
        assert_eq!(l2.ancestor_ids(), vec![l1.id(), l0.id()]);
        assert_eq!(l2.depth(), 2);
    }

    #[test]
    fn long_chain_drops_without_recursion() {
        let mut layer = base();
        for i in 0..2_000 {
            let mut builder = layer.open_write();
            builder
                .add_string_node_triple(&format!("s{i}"), "p", "o")
                .unwrap();
            layer = builder.commit().unwrap();
        }
        assert_eq!(layer.depth(), 2_000);
        drop(layer);
    }
}
