//! Staging area for new layers.
//!
//! A [`LayerBuilder`] collects additions and removals against an optional
//! parent and produces exactly one [`Layer`] on [`LayerBuilder::commit`].
//! String triples whose strings are all known to the parent chain are
//! resolved to ids immediately. Others are held as strings until commit,
//! where new strings are sorted and assigned ids in one batch so the
//! resulting dictionary is independent of insertion order.

use std::collections::BTreeSet;

use terrace_types::{IdTriple, LayerId, ObjectType, StringTriple};
use tracing::debug;

use crate::error::{LayerError, LayerResult};
use crate::handles::{HandleGuard, HandleKind};
use crate::layer::{IdClass, Layer};
use crate::record::LayerRecord;

/// Builder for a single new layer.
pub struct LayerBuilder {
    state: BuilderState,
    _handle: HandleGuard,
}

enum BuilderState {
    Open(PendingChanges),
    Committed(Layer),
}

#[derive(Default)]
struct PendingChanges {
    parent: Option<Layer>,
    id_additions: BTreeSet<IdTriple>,
    string_additions: BTreeSet<StringTriple>,
    removals: BTreeSet<IdTriple>,
}

impl PendingChanges {
    fn present_in_parent(&self, t: IdTriple) -> bool {
        self.parent
            .as_ref()
            .map(|p| p.triple_exists(t))
            .unwrap_or(false)
    }

    fn resolve(&self, t: &StringTriple) -> Option<IdTriple> {
        self.parent.as_ref()?.string_triple_to_id(t)
    }

    fn check_ids(&self, t: IdTriple) -> LayerResult<()> {
        let parent = self.parent.as_ref();
        let class = |id| parent.and_then(|p| p.locate_node_value(id)).map(|(_, c)| c);
        if class(t.subject) != Some(IdClass::Node) {
            return Err(LayerError::UnknownId {
                kind: "subject",
                id: t.subject,
            });
        }
        let predicate_count = parent.map(Layer::predicate_count).unwrap_or(0);
        if t.predicate == 0 || t.predicate > predicate_count {
            return Err(LayerError::UnknownId {
                kind: "predicate",
                id: t.predicate,
            });
        }
        if class(t.object).is_none() {
            return Err(LayerError::UnknownId {
                kind: "object",
                id: t.object,
            });
        }
        Ok(())
    }

    /// Every triple the committed layer would contain, as strings.
    fn effective_string_triples(&self) -> Vec<StringTriple> {
        let mut triples: Vec<StringTriple> = Vec::new();
        if let Some(parent) = &self.parent {
            triples.extend(
                parent
                    .triples()
                    .filter(|t| !self.removals.contains(t))
                    .chain(self.id_additions.iter().copied())
                    .filter_map(|t| parent.id_triple_to_string(t)),
            );
        }
        triples.extend(self.string_additions.iter().cloned());
        triples
    }

    fn build(&self) -> LayerResult<Layer> {
        let parent = self.parent.as_ref();
        let parent_id = parent.map(Layer::id);
        let nv_offset = parent.map(Layer::node_and_value_count).unwrap_or(0);
        let pred_offset = parent.map(Layer::predicate_count).unwrap_or(0);

        let mut nodes: BTreeSet<&str> = BTreeSet::new();
        let mut values: BTreeSet<&str> = BTreeSet::new();
        let mut predicates: BTreeSet<&str> = BTreeSet::new();
        let known_node = |s: &str| parent.and_then(|p| p.subject_id(s)).is_some();
        for t in &self.string_additions {
            if !known_node(t.subject.as_str()) {
                nodes.insert(t.subject.as_str());
            }
            if parent.and_then(|p| p.predicate_id(&t.predicate)).is_none() {
                predicates.insert(t.predicate.as_str());
            }
            match &t.object {
                ObjectType::Node(o) if !known_node(o.as_str()) => {
                    nodes.insert(o.as_str());
                }
                ObjectType::Value(o)
                    if parent.and_then(|p| p.object_value_id(o)).is_none() =>
                {
                    values.insert(o.as_str());
                }
                _ => {}
            }
        }
        let nodes: Vec<String> = nodes.into_iter().map(str::to_string).collect();
        let values: Vec<String> = values.into_iter().map(str::to_string).collect();
        let predicates: Vec<String> = predicates.into_iter().map(str::to_string).collect();

        let fresh = |table: &[String], offset: u64, s: &str| {
            table
                .binary_search_by(|entry| entry.as_str().cmp(s))
                .ok()
                .map(|idx| offset + idx as u64 + 1)
        };
        let values_offset = nv_offset + nodes.len() as u64;
        let node_id = |s: &str| {
            parent
                .and_then(|p| p.subject_id(s))
                .or_else(|| fresh(nodes.as_slice(), nv_offset, s))
        };

        let mut additions = self.id_additions.clone();
        for t in &self.string_additions {
            let subject = node_id(t.subject.as_str());
            let predicate = parent
                .and_then(|p| p.predicate_id(&t.predicate))
                .or_else(|| fresh(predicates.as_slice(), pred_offset, t.predicate.as_str()));
            let object = match &t.object {
                ObjectType::Node(o) => node_id(o.as_str()),
                ObjectType::Value(o) => parent
                    .and_then(|p| p.object_value_id(o))
                    .or_else(|| fresh(values.as_slice(), values_offset, o.as_str())),
            };
            match (subject, predicate, object) {
                (Some(s), Some(p), Some(o)) => {
                    additions.insert(IdTriple::new(s, p, o));
                }
                _ => {
                    return Err(LayerError::Serialization(format!(
                        "failed to assign ids for {t}"
                    )))
                }
            }
        }

        let record = LayerRecord::seal(
            parent_id,
            nv_offset,
            pred_offset,
            nodes,
            values,
            predicates,
            additions.into_iter().collect(),
            self.removals.iter().copied().collect(),
        )?;
        Layer::from_record(record, self.parent.clone())
    }
}

impl LayerBuilder {
    /// Builder for a base layer with no parent.
    pub fn base() -> Self {
        Self::with_parent(None)
    }

    /// Builder for a child of `parent`.
    pub fn child(parent: Layer) -> Self {
        Self::with_parent(Some(parent))
    }

    fn with_parent(parent: Option<Layer>) -> Self {
        Self {
            state: BuilderState::Open(PendingChanges {
                parent,
                ..PendingChanges::default()
            }),
            _handle: HandleGuard::new(HandleKind::Builder),
        }
    }

    /// The layer this builder is based on.
    pub fn parent(&self) -> Option<&Layer> {
        match &self.state {
            BuilderState::Open(pending) => pending.parent.as_ref(),
            BuilderState::Committed(layer) => layer.chain().nth(1),
        }
    }

    pub fn parent_id(&self) -> Option<LayerId> {
        self.parent().map(Layer::id)
    }

    pub fn committed(&self) -> bool {
        matches!(self.state, BuilderState::Committed(_))
    }

    /// The committed layer, once [`LayerBuilder::commit`] has succeeded.
    pub fn committed_layer(&self) -> Option<&Layer> {
        match &self.state {
            BuilderState::Committed(layer) => Some(layer),
            BuilderState::Open(_) => None,
        }
    }

    fn pending(&mut self) -> LayerResult<&mut PendingChanges> {
        match &mut self.state {
            BuilderState::Open(pending) => Ok(pending),
            BuilderState::Committed(_) => Err(LayerError::AlreadyCommitted),
        }
    }

    /// Add a triple by id.
    ///
    /// Fails with [`LayerError::UnknownId`] if a component is unknown to the
    /// parent chain. Returns `false` if the triple is already present.
    pub fn add_id_triple(&mut self, t: IdTriple) -> LayerResult<bool> {
        let pending = self.pending()?;
        pending.check_ids(t)?;
        if pending.removals.remove(&t) {
            return Ok(true);
        }
        if pending.present_in_parent(t) {
            return Ok(false);
        }
        Ok(pending.id_additions.insert(t))
    }

    /// Remove a triple by id. Returns `false` if it is not present.
    pub fn remove_id_triple(&mut self, t: IdTriple) -> LayerResult<bool> {
        let pending = self.pending()?;
        if pending.id_additions.remove(&t) {
            return Ok(true);
        }
        if !pending.present_in_parent(t) {
            return Ok(false);
        }
        Ok(pending.removals.insert(t))
    }

    /// Add a string triple. Returns `false` if it is already present.
    pub fn add_string_triple(&mut self, t: StringTriple) -> LayerResult<bool> {
        let pending = self.pending()?;
        match pending.resolve(&t) {
            Some(id) => self.add_id_triple(id),
            None => Ok(pending.string_additions.insert(t)),
        }
    }

    /// Remove a string triple. Returns `false` if it is not present.
    pub fn remove_string_triple(&mut self, t: &StringTriple) -> LayerResult<bool> {
        let pending = self.pending()?;
        if pending.string_additions.remove(t) {
            return Ok(true);
        }
        match pending.resolve(t) {
            Some(id) => self.remove_id_triple(id),
            None => Ok(false),
        }
    }

    pub fn add_string_node_triple(
        &mut self,
        subject: &str,
        predicate: &str,
        object: &str,
    ) -> LayerResult<bool> {
        self.add_string_triple(StringTriple::new_node(subject, predicate, object))
    }

    pub fn add_string_value_triple(
        &mut self,
        subject: &str,
        predicate: &str,
        object: &str,
    ) -> LayerResult<bool> {
        self.add_string_triple(StringTriple::new_value(subject, predicate, object))
    }

    pub fn remove_string_node_triple(
        &mut self,
        subject: &str,
        predicate: &str,
        object: &str,
    ) -> LayerResult<bool> {
        self.remove_string_triple(&StringTriple::new_node(subject, predicate, object))
    }

    pub fn remove_string_value_triple(
        &mut self,
        subject: &str,
        predicate: &str,
        object: &str,
    ) -> LayerResult<bool> {
        self.remove_string_triple(&StringTriple::new_value(subject, predicate, object))
    }

    /// Replay another layer's own additions and removals into this builder.
    pub fn apply_delta(&mut self, delta: &Layer) -> LayerResult<()> {
        self.pending()?;
        let unresolvable = |t: IdTriple| LayerError::InvalidRecord {
            id: delta.id(),
            reason: format!("triple {t} does not resolve to strings"),
        };
        for t in delta.triple_additions() {
            let st = delta.id_triple_to_string(t).ok_or_else(|| unresolvable(t))?;
            self.add_string_triple(st)?;
        }
        for t in delta.triple_removals() {
            let st = delta.id_triple_to_string(t).ok_or_else(|| unresolvable(t))?;
            self.remove_string_triple(&st)?;
        }
        Ok(())
    }

    /// Make the result contain exactly the triples present in `target`.
    pub fn apply_diff(&mut self, target: &Layer) -> LayerResult<()> {
        let current = self.pending()?.effective_string_triples();
        for t in current {
            if !target.string_triple_exists(&t) {
                self.remove_string_triple(&t)?;
            }
        }
        for t in target.string_triples() {
            self.add_string_triple(t)?;
        }
        Ok(())
    }

    /// Seal the pending changes into a new layer.
    ///
    /// Can only succeed once; later calls fail with
    /// [`LayerError::AlreadyCommitted`]. A failed commit leaves the builder
    /// open.
    pub fn commit(&mut self) -> LayerResult<Layer> {
        let pending = self.pending()?;
        let layer = pending.build()?;
        debug!(
            layer = %layer.id(),
            parent = ?layer.parent_id(),
            additions = layer.triple_addition_count(),
            removals = layer.triple_removal_count(),
            "committed layer"
        );
        self.state = BuilderState::Committed(layer.clone());
        Ok(layer)
    }
}

impl std::fmt::Debug for LayerBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.state {
            BuilderState::Open(pending) => f
                .debug_struct("LayerBuilder")
                .field("parent", &pending.parent.as_ref().map(Layer::id))
                .field("additions", &(pending.id_additions.len() + pending.string_additions.len()))
                .field("removals", &pending.removals.len())
                .finish(),
            BuilderState::Committed(layer) => f
                .debug_struct("LayerBuilder")
                .field("committed", &layer.id())
                .finish(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base() -> Layer {
        let mut b = LayerBuilder::base();
        b.add_string_node_triple("alice", "knows", "bob").unwrap();
        b.add_string_value_triple("alice", "age", "42").unwrap();
        b.commit().unwrap()
    }

    #[test]
    fn second_commit_fails() {
        let mut b = LayerBuilder::base();
        assert!(!b.committed());
        b.commit().unwrap();
        assert!(b.committed());
        assert!(matches!(b.commit(), Err(LayerError::AlreadyCommitted)));
        assert!(matches!(
            b.add_string_node_triple("a", "b", "c"),
            Err(LayerError::AlreadyCommitted)
        ));
    }

    #[test]
    fn base_builder_rejects_id_triples() {
        let mut b = LayerBuilder::base();
        assert!(matches!(
            b.add_id_triple(IdTriple::new(1, 1, 1)),
            Err(LayerError::UnknownId { kind: "subject", .. })
        ));
    }

    #[test]
    fn unknown_ids_are_rejected_on_add() {
        let mut b = base().open_write();
        // alice=1 bob=2 "42"=3; age=1 knows=2
        assert!(matches!(
            b.add_id_triple(IdTriple::new(3, 1, 2)),
            Err(LayerError::UnknownId { kind: "subject", id: 3 })
        ));
        assert!(matches!(
            b.add_id_triple(IdTriple::new(1, 9, 2)),
            Err(LayerError::UnknownId { kind: "predicate", id: 9 })
        ));
        assert!(matches!(
            b.add_id_triple(IdTriple::new(1, 1, 0)),
            Err(LayerError::UnknownId { kind: "object", id: 0 })
        ));
        assert!(b.add_id_triple(IdTriple::new(2, 2, 1)).unwrap());
    }

    #[test]
    fn adding_present_triple_returns_false() {
        let mut b = base().open_write();
        assert!(!b.add_string_node_triple("alice", "knows", "bob").unwrap());
        assert!(!b.add_id_triple(IdTriple::new(1, 2, 2)).unwrap());
        let layer = b.commit().unwrap();
        assert_eq!(layer.triple_addition_count(), 0);
    }

    #[test]
    fn removing_absent_triple_returns_false() {
        let mut b = base().open_write();
        assert!(!b.remove_string_node_triple("alice", "knows", "carol").unwrap());
        assert!(!b.remove_string_value_triple("alice", "knows", "bob").unwrap());
        assert!(!b.remove_id_triple(IdTriple::new(2, 2, 1)).unwrap());
        assert!(!b.remove_id_triple(IdTriple::new(99, 99, 99)).unwrap());
        assert_eq!(b.commit().unwrap().triple_removal_count(), 0);
    }

    #[test]
    fn remove_then_add_cancels() {
        let mut b = base().open_write();
        assert!(b.remove_string_node_triple("alice", "knows", "bob").unwrap());
        assert!(!b.remove_string_node_triple("alice", "knows", "bob").unwrap());
        assert!(b.add_string_node_triple("alice", "knows", "bob").unwrap());
        let layer = b.commit().unwrap();
        assert_eq!(layer.triple_removal_count(), 0);
        assert_eq!(layer.triple_addition_count(), 0);
        assert_eq!(layer.total_triple_count(), 2);
    }

    #[test]
    fn add_then_remove_cancels() {
        let mut b = base().open_write();
        assert!(b.add_string_node_triple("carol", "knows", "alice").unwrap());
        assert!(b.remove_string_node_triple("carol", "knows", "alice").unwrap());
        assert!(b.add_id_triple(IdTriple::new(2, 2, 1)).unwrap());
        assert!(b.remove_id_triple(IdTriple::new(2, 2, 1)).unwrap());
        let layer = b.commit().unwrap();
        assert_eq!(layer.triple_addition_count(), 0);
        assert_eq!(layer.subject_id("carol"), None);
    }

    #[test]
    fn node_and_value_with_same_text_are_distinct() {
        let mut b = LayerBuilder::base();
        b.add_string_node_triple("s", "p", "x").unwrap();
        b.add_string_value_triple("s", "p", "x").unwrap();
        let layer = b.commit().unwrap();
        assert_eq!(layer.triple_addition_count(), 2);
        assert_eq!(layer.object_node_id("x"), Some(2));
        assert_eq!(layer.object_value_id("x"), Some(3));
    }

    #[test]
    fn insertion_order_does_not_change_the_result() {
        let triples = [("c", "p", "a"), ("a", "q", "b"), ("b", "p", "c")];
        let build = |order: &[usize]| {
            let mut b = LayerBuilder::base();
            for &i in order {
                let (s, p, o) = triples[i];
                b.add_string_node_triple(s, p, o).unwrap();
            }
            b.commit().unwrap()
        };
        let first = build(&[0, 1, 2]);
        let second = build(&[2, 0, 1]);
        assert_eq!(first.id(), second.id());
        assert_eq!(first.to_record(), second.to_record());
    }

    #[test]
    fn noop_commit_is_deterministic_but_distinct_from_base() {
        let parent = base();
        let a = parent.open_write().commit().unwrap();
        let b = parent.open_write().commit().unwrap();
        assert_eq!(a.id(), b.id());
        assert_ne!(a.id(), parent.id());
        assert_eq!(a.total_triple_count(), parent.total_triple_count());
    }

    #[test]
    fn apply_delta_replays_changes() {
        let l0 = base();
        let mut b1 = l0.open_write();
        b1.add_string_node_triple("bob", "knows", "carol").unwrap();
        b1.remove_string_value_triple("alice", "age", "42").unwrap();
        let l1 = b1.commit().unwrap();

        let mut replay = l0.open_write();
        replay.apply_delta(&l1).unwrap();
        let l1b = replay.commit().unwrap();
        assert_eq!(l1b.id(), l1.id());
    }

    #[test]
    fn apply_diff_reaches_target_contents() {
        let l0 = base();
        let mut other = LayerBuilder::base();
        other.add_string_node_triple("alice", "knows", "bob").unwrap();
        other.add_string_node_triple("dave", "likes", "erin").unwrap();
        let target = other.commit().unwrap();

        let mut b = l0.open_write();
        b.apply_diff(&target).unwrap();
        let result = b.commit().unwrap();
        let mut got: Vec<StringTriple> = result.string_triples().collect();
        let mut want: Vec<StringTriple> = target.string_triples().collect();
        got.sort();
        want.sort();
        assert_eq!(got, want);
        assert_eq!(result.triple_removal_count(), 1);
    }

    #[test]
    fn parent_survives_commit() {
        let parent = base();
        let mut b = parent.open_write();
        assert_eq!(b.parent_id(), Some(parent.id()));
        b.commit().unwrap();
        assert_eq!(b.parent_id(), Some(parent.id()));
        assert_eq!(b.committed_layer().map(|l| l.parent_id()), Some(Some(parent.id())));
    }
}
