//! Serializable layer records.
//!
//! A [`LayerRecord`] is the flat, self-contained form of one layer: its parent
//! linkage, the dictionary entries it introduces, and its own additions and
//! removals. Records are what backends persist and packs transfer. The
//! layer id is the BLAKE3 digest of the bincode encoding of every field
//! except the id itself.

use serde::{Deserialize, Serialize};
use terrace_crypto::ContentHasher;
use terrace_types::{IdTriple, LayerId};

use crate::error::{LayerError, LayerResult};

/// Flat representation of a single layer.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct LayerRecord {
    /// Content-derived id of this layer.
    pub id: LayerId,
    /// Id of the parent layer, `None` for a base layer.
    pub parent: Option<LayerId>,
    /// Parent's node-and-value count (0 for a base layer).
    pub node_value_offset: u64,
    /// Parent's predicate count (0 for a base layer).
    pub predicate_offset: u64,
    /// Node strings introduced by this layer, sorted.
    pub nodes: Vec<String>,
    /// Value strings introduced by this layer, sorted.
    pub values: Vec<String>,
    /// Predicate strings introduced by this layer, sorted.
    pub predicates: Vec<String>,
    /// Triples added relative to the parent, sorted.
    pub additions: Vec<IdTriple>,
    /// Triples removed relative to the parent, sorted.
    pub removals: Vec<IdTriple>,
}

/// Borrowed view of everything that contributes to a layer's id.
#[derive(Serialize)]
struct HashedContent<'a> {
    parent: &'a Option<LayerId>,
    node_value_offset: u64,
    predicate_offset: u64,
    nodes: &'a [String],
    values: &'a [String],
    predicates: &'a [String],
    additions: &'a [IdTriple],
    removals: &'a [IdTriple],
}

impl LayerRecord {
    /// Build a record and stamp it with its content-derived id.
    #[allow(clippy::too_many_arguments)]
    pub fn seal(
        parent: Option<LayerId>,
        node_value_offset: u64,
        predicate_offset: u64,
        nodes: Vec<String>,
        values: Vec<String>,
        predicates: Vec<String>,
        additions: Vec<IdTriple>,
        removals: Vec<IdTriple>,
    ) -> LayerResult<Self> {
        let mut record = Self {
            id: LayerId::from_hash([0; 20]),
            parent,
            node_value_offset,
            predicate_offset,
            nodes,
            values,
            predicates,
            additions,
            removals,
        };
        record.id = record.content_id()?;
        Ok(record)
    }

    /// Compute the id implied by this record's content.
    pub fn content_id(&self) -> LayerResult<LayerId> {
        let content = HashedContent {
            parent: &self.parent,
            node_value_offset: self.node_value_offset,
            predicate_offset: self.predicate_offset,
            nodes: &self.nodes,
            values: &self.values,
            predicates: &self.predicates,
            additions: &self.additions,
            removals: &self.removals,
        };
        let bytes =
            bincode::serialize(&content).map_err(|e| LayerError::Serialization(e.to_string()))?;
        Ok(ContentHasher::LAYER.hash(&bytes))
    }

    /// Check that the stated id matches the content.
    pub fn verify(&self) -> LayerResult<()> {
        let computed = self.content_id()?;
        if computed != self.id {
            return Err(LayerError::ContentMismatch {
                id: self.id,
                computed,
            });
        }
        Ok(())
    }

    /// Encode with bincode.
    pub fn to_bytes(&self) -> LayerResult<Vec<u8>> {
        bincode::serialize(self).map_err(|e| LayerError::Serialization(e.to_string()))
    }

    /// Decode from bincode. The content hash is not checked; call
    /// [`LayerRecord::verify`] for that.
    pub fn from_bytes(data: &[u8]) -> LayerResult<Self> {
        bincode::deserialize(data).map_err(|e| LayerError::Serialization(e.to_string()))
    }

    /// Number of node and value ids known after this layer.
    pub fn node_and_value_count(&self) -> u64 {
        self.node_value_offset + self.nodes.len() as u64 + self.values.len() as u64
    }

    /// Number of predicate ids known after this layer.
    pub fn predicate_count(&self) -> u64 {
        self.predicate_offset + self.predicates.len() as u64
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(parent: Option<LayerId>) -> LayerRecord {
        LayerRecord::seal(
            parent,
            0,
            0,
            vec!["a".into(), "c".into()],
            vec!["42".into()],
            vec!["b".into()],
            vec![IdTriple::new(1, 1, 2), IdTriple::new(1, 1, 3)],
            vec![],
        )
        .unwrap()
    }

    #[test]
    fn seal_is_deterministic() {
        assert_eq!(record(None).id, record(None).id);
    }

    #[test]
    fn parent_is_part_of_the_id() {
        let parent = LayerId::from_hash([9; 20]);
        assert_ne!(record(None).id, record(Some(parent)).id);
    }

    #[test]
    fn verify_detects_tampering() {
        let mut rec = record(None);
        rec.verify().unwrap();
        rec.additions.push(IdTriple::new(2, 1, 3));
        assert!(matches!(rec.verify(), Err(LayerError::ContentMismatch { .. })));
    }

    #[test]
    fn bytes_decode_to_same_record() {
        let rec = record(None);
        let decoded = LayerRecord::from_bytes(&rec.to_bytes().unwrap()).unwrap();
        assert_eq!(decoded, rec);
        decoded.verify().unwrap();
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        assert!(matches!(
            LayerRecord::from_bytes(&[0xff, 0x01]),
            Err(LayerError::Serialization(_))
        ));
    }

    #[test]
    fn counts_include_offsets() {
        let mut rec = record(None);
        rec.node_value_offset = 10;
        rec.predicate_offset = 4;
        assert_eq!(rec.node_and_value_count(), 13);
        assert_eq!(rec.predicate_count(), 5);
    }
}
