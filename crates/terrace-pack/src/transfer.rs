//! Moving layer stacks between stores.

use std::collections::{HashMap, HashSet};

use terrace_layer::{Layer, LayerRecord};
use terrace_store::LayerStore;
use terrace_types::LayerId;
use tracing::{debug, info};

use crate::config::PackConfig;
use crate::error::{PackError, PackResult};
use crate::reader::PackReader;
use crate::writer::PackWriter;

/// Summary of an import.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ImportReport {
    /// Layers written to the store, parents first.
    pub imported: Vec<LayerId>,
    /// Layers that were already present and left untouched.
    pub skipped: usize,
}

/// Pack the given layers and all of their ancestors, parents first.
pub fn export(store: &dyn LayerStore, ids: &[LayerId], config: &PackConfig) -> PackResult<Vec<u8>> {
    let mut included: HashSet<LayerId> = HashSet::new();
    let mut ordered: Vec<LayerRecord> = Vec::new();

    for id in ids {
        let mut chain: Vec<LayerRecord> = Vec::new();
        let mut next = Some(*id);
        while let Some(current) = next {
            if included.contains(&current) {
                break;
            }
            let record = store
                .read(&current)?
                .ok_or(PackError::MissingLayer(current))?;
            next = record.parent;
            included.insert(current);
            chain.push(record);
        }
        ordered.extend(chain.into_iter().rev());
    }

    let mut writer = PackWriter::new(config.clone());
    for record in ordered {
        writer.add_record(record);
    }
    let layers = writer.len();
    let pack = writer.finish()?;
    info!(requested = ids.len(), layers, bytes = pack.len(), "exported pack");
    Ok(pack)
}

/// Import the given layers (and whatever ancestors they need) from a pack.
///
/// Layers already in the store are skipped, so importing twice is harmless.
/// Ancestors missing from the store are taken from the pack; an ancestor
/// found in neither fails the import before anything is written. Every
/// imported layer is checked on top of its parent first, and nothing is
/// written unless the whole import passes.
pub fn import(store: &dyn LayerStore, pack: &[u8], ids: &[LayerId]) -> PackResult<ImportReport> {
    let reader = PackReader::from_bytes(pack)?;

    let mut needed: HashSet<LayerId> = HashSet::new();
    let mut skipped: HashSet<LayerId> = HashSet::new();
    for id in ids {
        if !reader.contains(id) {
            if store.exists(id)? {
                skipped.insert(*id);
                continue;
            }
            return Err(PackError::NotInPack(*id));
        }
        let mut current = *id;
        loop {
            if needed.contains(&current) || skipped.contains(&current) {
                break;
            }
            if store.exists(&current)? {
                skipped.insert(current);
                break;
            }
            let entry = reader.entry(&current).ok_or(PackError::MissingAncestor {
                layer: *id,
                ancestor: current,
            })?;
            needed.insert(current);
            match entry.parent {
                Some(parent) => current = parent,
                None => break,
            }
        }
    }

    // Materialize every needed layer on its real parent before writing any
    // of them, so a pack that fails validation leaves the store untouched.
    let mut resolved: HashMap<LayerId, Layer> = HashMap::new();
    let mut validated: Vec<LayerRecord> = Vec::new();
    for entry in reader.entries() {
        if !needed.contains(&entry.id) {
            continue;
        }
        let record = reader
            .read_record(&entry.id)?
            .ok_or(PackError::NotInPack(entry.id))?;
        let parent = record
            .parent
            .map(|p| resolve(store, p, &mut resolved))
            .transpose()?;
        let layer = Layer::from_record(record.clone(), parent)?;
        resolved.insert(layer.id(), layer);
        validated.push(record);
    }

    let mut report = ImportReport {
        skipped: skipped.len(),
        ..ImportReport::default()
    };
    for record in &validated {
        if store.write(record)? {
            debug!(layer = %record.id, "imported layer");
            report.imported.push(record.id);
        } else {
            report.skipped += 1;
        }
    }
    info!(
        imported = report.imported.len(),
        skipped = report.skipped,
        "imported pack"
    );
    Ok(report)
}

/// A layer already validated during this import, or else a stored layer
/// materialized with its ancestor chain.
fn resolve(
    store: &dyn LayerStore,
    id: LayerId,
    resolved: &mut HashMap<LayerId, Layer>,
) -> PackResult<Layer> {
    let mut pending: Vec<LayerRecord> = Vec::new();
    let mut parent = None;
    let mut next = Some(id);
    while let Some(current) = next {
        if let Some(layer) = resolved.get(&current) {
            parent = Some(layer.clone());
            break;
        }
        let record = store
            .read(&current)?
            .ok_or(PackError::MissingLayer(current))?;
        next = record.parent;
        pending.push(record);
    }
    while let Some(record) = pending.pop() {
        let layer = Layer::from_record(record, parent.take())?;
        resolved.insert(layer.id(), layer.clone());
        parent = Some(layer);
    }
    parent.ok_or(PackError::MissingLayer(id))
}

/// Import every layer in a pack.
pub fn import_all(store: &dyn LayerStore, pack: &[u8]) -> PackResult<ImportReport> {
    let ids: Vec<LayerId> = PackReader::from_bytes(pack)?
        .entries()
        .iter()
        .map(|e| e.id)
        .collect();
    import(store, pack, &ids)
}

#[cfg(test)]
mod tests {
    use super::*;
    use terrace_layer::{Layer, LayerBuilder};
    use terrace_store::InMemoryLayerStore;
    use terrace_types::IdTriple;

    /// Commit a three-layer stack and store every record.
    fn stack(store: &InMemoryLayerStore) -> Vec<Layer> {
        let mut b0 = LayerBuilder::base();
        b0.add_string_node_triple("a", "p", "b").unwrap();
        let l0 = b0.commit().unwrap();
        let mut b1 = l0.open_write();
        b1.add_string_value_triple("a", "q", "1").unwrap();
        let l1 = b1.commit().unwrap();
        let mut b2 = l1.open_write();
        b2.remove_string_node_triple("a", "p", "b").unwrap();
        let l2 = b2.commit().unwrap();
        for layer in [&l0, &l1, &l2] {
            store.write(&layer.to_record()).unwrap();
        }
        vec![l0, l1, l2]
    }

    #[test]
    fn export_includes_ancestors_parents_first() {
        let store = InMemoryLayerStore::new();
        let layers = stack(&store);
        let pack = export(&store, &[layers[2].id()], &PackConfig::default()).unwrap();
        let manifest = crate::layerids_and_parents(&pack).unwrap();
        assert_eq!(
            manifest,
            vec![
                (layers[0].id(), None),
                (layers[1].id(), Some(layers[0].id())),
                (layers[2].id(), Some(layers[1].id())),
            ]
        );
    }

    #[test]
    fn export_of_shared_ancestry_lists_each_layer_once() {
        let store = InMemoryLayerStore::new();
        let layers = stack(&store);
        let pack = export(
            &store,
            &[layers[1].id(), layers[2].id(), layers[0].id()],
            &PackConfig::default(),
        )
        .unwrap();
        assert_eq!(crate::layerids_and_parents(&pack).unwrap().len(), 3);
    }

    #[test]
    fn export_of_unknown_layer_fails() {
        let store = InMemoryLayerStore::new();
        let missing = LayerId::from_hash([4; 20]);
        assert!(matches!(
            export(&store, &[missing], &PackConfig::default()),
            Err(PackError::MissingLayer(id)) if id == missing
        ));
    }

    #[test]
    fn import_into_fresh_store() {
        let source = InMemoryLayerStore::new();
        let layers = stack(&source);
        let pack = export(&source, &[layers[2].id()], &PackConfig::default()).unwrap();

        let target = InMemoryLayerStore::new();
        let report = import(&target, &pack, &[layers[2].id()]).unwrap();
        assert_eq!(report.imported.len(), 3);
        assert_eq!(report.skipped, 0);
        for layer in &layers {
            assert_eq!(
                target.read(&layer.id()).unwrap(),
                Some(layer.to_record())
            );
        }
    }

    #[test]
    fn import_is_idempotent() {
        let source = InMemoryLayerStore::new();
        let layers = stack(&source);
        let pack = export(&source, &[layers[2].id()], &PackConfig::default()).unwrap();

        let target = InMemoryLayerStore::new();
        import_all(&target, &pack).unwrap();
        let again = import_all(&target, &pack).unwrap();
        assert!(again.imported.is_empty());
        assert_eq!(again.skipped, 3);
        assert_eq!(target.len(), 3);
    }

    #[test]
    fn import_fills_in_only_missing_ancestors() {
        let source = InMemoryLayerStore::new();
        let layers = stack(&source);
        let pack = export(&source, &[layers[2].id()], &PackConfig::default()).unwrap();

        let target = InMemoryLayerStore::new();
        target.write(&layers[0].to_record()).unwrap();
        let report = import(&target, &pack, &[layers[2].id()]).unwrap();
        assert_eq!(report.imported, vec![layers[1].id(), layers[2].id()]);
        assert_eq!(report.skipped, 1);
    }

    #[test]
    fn import_without_ancestor_fails_and_writes_nothing() {
        let source = InMemoryLayerStore::new();
        let layers = stack(&source);

        // Pack only the top layer, without its parents.
        let mut writer = PackWriter::default();
        writer.add_record(layers[2].to_record());
        let pack = writer.finish().unwrap();

        let target = InMemoryLayerStore::new();
        let err = import(&target, &pack, &[layers[2].id()]).unwrap_err();
        assert!(matches!(err, PackError::MissingAncestor { ancestor, .. } if ancestor == layers[1].id()));
        assert!(target.is_empty());
    }

    fn pack_of(records: Vec<LayerRecord>) -> Vec<u8> {
        let mut writer = PackWriter::default();
        for record in records {
            writer.add_record(record);
        }
        writer.finish().unwrap()
    }

    #[test]
    fn invalid_base_record_is_not_imported() {
        // Hashes correctly, but a base layer cannot remove anything.
        let bad = LayerRecord::seal(
            None,
            0,
            0,
            vec!["a".into(), "b".into()],
            vec![],
            vec!["p".into()],
            vec![],
            vec![IdTriple::new(1, 1, 2)],
        )
        .unwrap();
        let pack = pack_of(vec![bad]);

        let target = InMemoryLayerStore::new();
        assert!(matches!(import_all(&target, &pack), Err(PackError::Layer(_))));
        assert!(target.is_empty());
        assert!(target.layer_ids().unwrap().is_empty());
    }

    #[test]
    fn invalid_child_leaves_valid_parent_unwritten() {
        let source = InMemoryLayerStore::new();
        let layers = stack(&source);
        // Child of the base that re-adds a triple the base already holds.
        let bad = LayerRecord::seal(
            Some(layers[0].id()),
            layers[0].node_and_value_count(),
            layers[0].predicate_count(),
            vec![],
            vec![],
            vec![],
            vec![IdTriple::new(1, 1, 2)],
            vec![],
        )
        .unwrap();
        let pack = pack_of(vec![layers[0].to_record(), bad]);

        let target = InMemoryLayerStore::new();
        assert!(import_all(&target, &pack).is_err());
        assert!(target.is_empty());
    }

    #[test]
    fn child_is_checked_against_stored_parent() {
        let source = InMemoryLayerStore::new();
        let layers = stack(&source);
        let bad = LayerRecord::seal(
            Some(layers[0].id()),
            layers[0].node_and_value_count(),
            layers[0].predicate_count(),
            vec![],
            vec![],
            vec![],
            vec![IdTriple::new(1, 1, 2)],
            vec![],
        )
        .unwrap();
        let bad_id = bad.id;
        let pack = pack_of(vec![bad]);

        let target = InMemoryLayerStore::new();
        target.write(&layers[0].to_record()).unwrap();
        assert!(import(&target, &pack, &[bad_id]).is_err());
        assert_eq!(target.layer_ids().unwrap(), vec![layers[0].id()]);
    }

    #[test]
    fn import_of_id_absent_everywhere_fails() {
        let source = InMemoryLayerStore::new();
        let layers = stack(&source);
        let pack = export(&source, &[layers[0].id()], &PackConfig::default()).unwrap();
        let target = InMemoryLayerStore::new();
        assert!(matches!(
            import(&target, &pack, &[layers[2].id()]),
            Err(PackError::NotInPack(_))
        ));
    }
}
