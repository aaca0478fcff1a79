//! Entity-keyed lookup views over a layer.
//!
//! Lookups narrow a layer's triples by subject, subject and predicate,
//! predicate, or object. Every lookup carries a [`ViewMode`], so the same
//! types serve effective queries as well as the addition-only and
//! removal-only views of a single layer. Enumerators yield entities in
//! ascending id order and are cursors: they can be reset and closed, and
//! stay exhausted once they return `None`.

use std::iter::FusedIterator;

use terrace_types::IdTriple;

use crate::cursor::{TripleCursor, ViewMode};
use crate::index::IndexOrder;
use crate::layer::Layer;

/// Enumerator producing one item per distinct key prefix of a cursor.
pub struct Lookups<T> {
    cursor: TripleCursor,
    distinct: usize,
    make: fn(&TripleCursor, IdTriple) -> T,
}

/// Subjects of a layer view.
pub type SubjectIter = Lookups<SubjectLookup>;
/// `(subject, predicate)` pairs of a subject or predicate lookup.
pub type SubjectPredicateIter = Lookups<SubjectPredicateLookup>;
/// Predicates of a layer view.
pub type PredicateIter = Lookups<PredicateLookup>;
/// Objects of a layer view.
pub type ObjectIter = Lookups<ObjectLookup>;
/// Object ids of a subject-predicate lookup.
pub type ObjectIdIter = Lookups<u64>;
/// `(subject, predicate)` id pairs of an object lookup.
pub type PairIter = Lookups<(u64, u64)>;

impl<T> Lookups<T> {
    fn new(cursor: TripleCursor, distinct: usize, make: fn(&TripleCursor, IdTriple) -> T) -> Self {
        Self {
            cursor,
            distinct,
            make,
        }
    }

    pub fn reset(&mut self) {
        self.cursor.reset();
    }

    /// Release the enumerator. Equivalent to dropping it.
    pub fn close(self) {}
}

impl<T> Iterator for Lookups<T> {
    type Item = T;

    fn next(&mut self) -> Option<T> {
        let key = self.cursor.next_key()?;
        if self.distinct < 3 {
            self.cursor.skip_prefix(self.distinct);
        }
        let triple = self.cursor.order().triple(key);
        Some((self.make)(&self.cursor, triple))
    }
}

impl<T> FusedIterator for Lookups<T> {}

fn contains(layer: &Layer, mode: ViewMode, t: IdTriple) -> bool {
    match mode {
        ViewMode::Effective => layer.triple_exists(t),
        ViewMode::Additions => layer.triple_addition_exists(t),
        ViewMode::Removals => layer.triple_removal_exists(t),
    }
}

/// Triples of one subject.
#[derive(Clone, Debug)]
pub struct SubjectLookup {
    layer: Layer,
    subject: u64,
    mode: ViewMode,
}

impl SubjectLookup {
    pub fn subject(&self) -> u64 {
        self.subject
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// The predicates used with this subject.
    pub fn predicates(&self) -> SubjectPredicateIter {
        let cursor = self.layer.cursor(self.mode, IndexOrder::Spo, &[self.subject]);
        Lookups::new(cursor, 2, |c, t| SubjectPredicateLookup {
            layer: c.layer().clone(),
            subject: t.subject,
            predicate: t.predicate,
            mode: c.mode(),
        })
    }

    /// Narrow to one predicate, if this subject uses it.
    pub fn lookup_predicate(&self, predicate: u64) -> Option<SubjectPredicateLookup> {
        let mut cursor = self
            .layer
            .cursor(self.mode, IndexOrder::Spo, &[self.subject, predicate]);
        cursor.next()?;
        Some(SubjectPredicateLookup {
            layer: self.layer.clone(),
            subject: self.subject,
            predicate,
            mode: self.mode,
        })
    }

    pub fn triples(&self) -> TripleCursor {
        self.layer.cursor(self.mode, IndexOrder::Spo, &[self.subject])
    }
}

/// Triples of one subject and predicate.
#[derive(Clone, Debug)]
pub struct SubjectPredicateLookup {
    layer: Layer,
    subject: u64,
    predicate: u64,
    mode: ViewMode,
}

impl SubjectPredicateLookup {
    pub fn subject(&self) -> u64 {
        self.subject
    }

    pub fn predicate(&self) -> u64 {
        self.predicate
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn objects(&self) -> ObjectIdIter {
        let cursor = self.triples();
        Lookups::new(cursor, 3, |_, t| t.object)
    }

    pub fn has_object(&self, object: u64) -> bool {
        contains(
            &self.layer,
            self.mode,
            IdTriple::new(self.subject, self.predicate, object),
        )
    }

    pub fn triples(&self) -> TripleCursor {
        self.layer
            .cursor(self.mode, IndexOrder::Spo, &[self.subject, self.predicate])
    }
}

/// Triples using one predicate.
#[derive(Clone, Debug)]
pub struct PredicateLookup {
    layer: Layer,
    predicate: u64,
    mode: ViewMode,
}

impl PredicateLookup {
    pub fn predicate(&self) -> u64 {
        self.predicate
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    /// The subjects using this predicate, each as a subject-predicate lookup.
    pub fn subject_predicate_pairs(&self) -> SubjectPredicateIter {
        let cursor = self.triples();
        Lookups::new(cursor, 2, |c, t| SubjectPredicateLookup {
            layer: c.layer().clone(),
            subject: t.subject,
            predicate: t.predicate,
            mode: c.mode(),
        })
    }

    pub fn triples(&self) -> TripleCursor {
        self.layer.cursor(self.mode, IndexOrder::Pso, &[self.predicate])
    }
}

/// Triples pointing at one object.
#[derive(Clone, Debug)]
pub struct ObjectLookup {
    layer: Layer,
    object: u64,
    mode: ViewMode,
}

impl ObjectLookup {
    pub fn object(&self) -> u64 {
        self.object
    }

    pub fn mode(&self) -> ViewMode {
        self.mode
    }

    pub fn subject_predicate_pairs(&self) -> PairIter {
        let cursor = self.triples();
        Lookups::new(cursor, 3, |_, t| (t.subject, t.predicate))
    }

    pub fn has_subject_predicate_pair(&self, subject: u64, predicate: u64) -> bool {
        contains(
            &self.layer,
            self.mode,
            IdTriple::new(subject, predicate, self.object),
        )
    }

    pub fn triples(&self) -> TripleCursor {
        self.layer.cursor(self.mode, IndexOrder::Osp, &[self.object])
    }
}

/// Lookup factories.
impl Layer {
    pub fn subject_lookups(&self, mode: ViewMode) -> SubjectIter {
        let cursor = self.cursor(mode, IndexOrder::Spo, &[]);
        Lookups::new(cursor, 1, |c, t| SubjectLookup {
            layer: c.layer().clone(),
            subject: t.subject,
            mode: c.mode(),
        })
    }

    pub fn subjects(&self) -> SubjectIter {
        self.subject_lookups(ViewMode::Effective)
    }

    pub fn subject_additions(&self) -> SubjectIter {
        self.subject_lookups(ViewMode::Additions)
    }

    pub fn subject_removals(&self) -> SubjectIter {
        self.subject_lookups(ViewMode::Removals)
    }

    pub fn lookup_subject_in(&self, mode: ViewMode, subject: u64) -> Option<SubjectLookup> {
        self.cursor(mode, IndexOrder::Spo, &[subject]).next()?;
        Some(SubjectLookup {
            layer: self.clone(),
            subject,
            mode,
        })
    }

    pub fn lookup_subject(&self, subject: u64) -> Option<SubjectLookup> {
        self.lookup_subject_in(ViewMode::Effective, subject)
    }

    pub fn lookup_subject_addition(&self, subject: u64) -> Option<SubjectLookup> {
        self.lookup_subject_in(ViewMode::Additions, subject)
    }

    pub fn lookup_subject_removal(&self, subject: u64) -> Option<SubjectLookup> {
        self.lookup_subject_in(ViewMode::Removals, subject)
    }

    pub fn predicate_lookups(&self, mode: ViewMode) -> PredicateIter {
        let cursor = self.cursor(mode, IndexOrder::Pso, &[]);
        Lookups::new(cursor, 1, |c, t| PredicateLookup {
            layer: c.layer().clone(),
            predicate: t.predicate,
            mode: c.mode(),
        })
    }

    pub fn predicates(&self) -> PredicateIter {
        self.predicate_lookups(ViewMode::Effective)
    }

    pub fn predicate_additions(&self) -> PredicateIter {
        self.predicate_lookups(ViewMode::Additions)
    }

    pub fn predicate_removals(&self) -> PredicateIter {
        self.predicate_lookups(ViewMode::Removals)
    }

    pub fn lookup_predicate_in(&self, mode: ViewMode, predicate: u64) -> Option<PredicateLookup> {
        self.cursor(mode, IndexOrder::Pso, &[predicate]).next()?;
        Some(PredicateLookup {
            layer: self.clone(),
            predicate,
            mode,
        })
    }

    pub fn lookup_predicate(&self, predicate: u64) -> Option<PredicateLookup> {
        self.lookup_predicate_in(ViewMode::Effective, predicate)
    }

    pub fn lookup_predicate_addition(&self, predicate: u64) -> Option<PredicateLookup> {
        self.lookup_predicate_in(ViewMode::Additions, predicate)
    }

    pub fn lookup_predicate_removal(&self, predicate: u64) -> Option<PredicateLookup> {
        self.lookup_predicate_in(ViewMode::Removals, predicate)
    }

    pub fn object_lookups(&self, mode: ViewMode) -> ObjectIter {
        let cursor = self.cursor(mode, IndexOrder::Osp, &[]);
        Lookups::new(cursor, 1, |c, t| ObjectLookup {
            layer: c.layer().clone(),
            object: t.object,
            mode: c.mode(),
        })
    }

    pub fn objects(&self) -> ObjectIter {
        self.object_lookups(ViewMode::Effective)
    }

    pub fn object_additions(&self) -> ObjectIter {
        self.object_lookups(ViewMode::Additions)
    }

    pub fn object_removals(&self) -> ObjectIter {
        self.object_lookups(ViewMode::Removals)
    }

    pub fn lookup_object_in(&self, mode: ViewMode, object: u64) -> Option<ObjectLookup> {
        self.cursor(mode, IndexOrder::Osp, &[object]).next()?;
        Some(ObjectLookup {
            layer: self.clone(),
            object,
            mode,
        })
    }

    pub fn lookup_object(&self, object: u64) -> Option<ObjectLookup> {
        self.lookup_object_in(ViewMode::Effective, object)
    }

    pub fn lookup_object_addition(&self, object: u64) -> Option<ObjectLookup> {
        self.lookup_object_in(ViewMode::Additions, object)
    }

    pub fn lookup_object_removal(&self, object: u64) -> Option<ObjectLookup> {
        self.lookup_object_in(ViewMode::Removals, object)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::LayerBuilder;

    fn t(s: u64, p: u64, o: u64) -> IdTriple {
        IdTriple::new(s, p, o)
    }

    /// nodes a=1 b=2 c=3 d=4; predicates p=1 q=2.
    /// base: a p b, a q c, b p c, c p d
    /// child: -a p b, +d q a, +a p d
    fn layers() -> (Layer, Layer) {
        let mut b0 = LayerBuilder::base();
        b0.add_string_node_triple("a", "p", "b").unwrap();
        b0.add_string_node_triple("a", "q", "c").unwrap();
        b0.add_string_node_triple("b", "p", "c").unwrap();
        b0.add_string_node_triple("c", "p", "d").unwrap();
        let base = b0.commit().unwrap();

        let mut b1 = base.open_write();
        b1.remove_id_triple(t(1, 1, 2)).unwrap();
        b1.add_id_triple(t(4, 2, 1)).unwrap();
        b1.add_id_triple(t(1, 1, 4)).unwrap();
        (base, b1.commit().unwrap())
    }

    #[test]
    fn subjects_in_each_view() {
        let (_, child) = layers();
        let ids = |it: SubjectIter| it.map(|l| l.subject()).collect::<Vec<_>>();
        assert_eq!(ids(child.subjects()), vec![1, 2, 3, 4]);
        assert_eq!(ids(child.subject_additions()), vec![1, 4]);
        assert_eq!(ids(child.subject_removals()), vec![1]);
    }

    #[test]
    fn subject_lookup_enumerates_predicates_and_objects() {
        let (_, child) = layers();
        let a = child.lookup_subject(1).unwrap();
        let preds: Vec<u64> = a.predicates().map(|sp| sp.predicate()).collect();
        assert_eq!(preds, vec![1, 2]);

        let ap = a.lookup_predicate(1).unwrap();
        assert_eq!(ap.objects().collect::<Vec<_>>(), vec![4]);
        assert!(ap.has_object(4));
        assert!(!ap.has_object(2));
        assert!(a.lookup_predicate(3).is_none());
    }

    #[test]
    fn removal_lookup_sees_only_removed_triples() {
        let (_, child) = layers();
        let removed = child.lookup_subject_removal(1).unwrap();
        assert_eq!(removed.mode(), ViewMode::Removals);
        let ap = removed.lookup_predicate(1).unwrap();
        assert!(ap.has_object(2));
        assert!(!ap.has_object(4));
        assert!(removed.lookup_predicate(2).is_none());
        assert!(child.lookup_subject_removal(2).is_none());
    }

    #[test]
    fn predicate_lookup_lists_subject_pairs() {
        let (base, child) = layers();
        let p = child.lookup_predicate(1).unwrap();
        let subjects: Vec<u64> = p.subject_predicate_pairs().map(|sp| sp.subject()).collect();
        assert_eq!(subjects, vec![1, 2, 3]);
        assert_eq!(p.triples().count(), 3);

        let preds: Vec<u64> = base.predicates().map(|l| l.predicate()).collect();
        assert_eq!(preds, vec![1, 2]);
        let added: Vec<u64> = child.predicate_additions().map(|l| l.predicate()).collect();
        assert_eq!(added, vec![1, 2]);
        let removed: Vec<u64> = child.predicate_removals().map(|l| l.predicate()).collect();
        assert_eq!(removed, vec![1]);
    }

    #[test]
    fn object_lookup_point_queries() {
        let (base, child) = layers();
        let objects: Vec<u64> = child.objects().map(|l| l.object()).collect();
        assert_eq!(objects, vec![1, 3, 4]);

        let d = child.lookup_object(4).unwrap();
        assert_eq!(d.subject_predicate_pairs().collect::<Vec<_>>(), vec![(1, 1), (3, 1)]);
        assert!(d.has_subject_predicate_pair(3, 1));
        assert!(!d.has_subject_predicate_pair(2, 1));

        assert!(base.lookup_object(2).is_some());
        assert!(child.lookup_object(2).is_none());
        assert!(child.lookup_object_removal(2).is_some());
        assert!(child.lookup_object_addition(1).is_some());
    }

    #[test]
    fn enumerators_reset_and_fuse() {
        let (_, child) = layers();
        let mut subjects = child.subjects();
        assert_eq!(subjects.by_ref().count(), 4);
        assert!(subjects.next().is_none());
        subjects.reset();
        assert_eq!(subjects.next().map(|l| l.subject()), Some(1));
        subjects.close();
    }

    #[test]
    fn unknown_ids_have_no_lookup() {
        let (_, child) = layers();
        assert!(child.lookup_subject(0).is_none());
        assert!(child.lookup_subject(99).is_none());
        assert!(child.lookup_predicate(99).is_none());
        assert!(child.lookup_object(99).is_none());
    }
}
