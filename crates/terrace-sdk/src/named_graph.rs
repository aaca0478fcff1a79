use std::sync::{Mutex, PoisonError};

use terrace_labels::Label;
use terrace_layer::{HandleGuard, HandleKind, Layer};
use terrace_store::StoreError;
use tracing::{debug, info};

use crate::builder::StoreLayerBuilder;
use crate::error::{Error, Result};
use crate::store::Store;

/// A named, versioned pointer to a head layer.
///
/// The handle remembers the label version it last observed. Reading the head
/// refreshes it; [`NamedGraph::set_head`] succeeds only if nobody moved the
/// graph since. Callers that lose the race re-read, rebuild and retry.
///
/// A handle is bound to one creation of its graph. Once the graph is
/// deleted every operation fails with [`Error::GraphDeleted`], even if a new
/// graph of the same name has been created since.
#[derive(Debug)]
pub struct NamedGraph {
    store: Store,
    observed: Mutex<Label>,
    _handle: HandleGuard,
}

impl NamedGraph {
    pub(crate) fn new(store: Store, label: Label) -> Self {
        Self {
            store,
            observed: Mutex::new(label),
            _handle: HandleGuard::new(HandleKind::NamedGraph),
        }
    }

    pub fn name(&self) -> String {
        self.observed.lock().unwrap_or_else(PoisonError::into_inner).name.clone()
    }

    /// The current head layer, or `None` before the first update.
    pub fn head(&self) -> Result<Option<Layer>> {
        Ok(self.head_version()?.0)
    }

    /// The current head together with the graph's version.
    pub fn head_version(&self) -> Result<(Option<Layer>, u64)> {
        let name = self.name();
        let generation = self.observed.lock().unwrap_or_else(PoisonError::into_inner).generation;
        let label = self
            .store
            .labels()
            .get_label(&name)?
            .filter(|label| label.generation == generation)
            .ok_or(Error::GraphDeleted(name))?;
        let head = match label.layer {
            Some(id) => Some(self.store.get_layer_by_id(&id)?.ok_or_else(|| {
                StoreError::CorruptLayer {
                    id,
                    reason: format!("head of graph {} is missing from the store", label.name),
                }
            })?),
            None => None,
        };
        let version = label.version;
        *self.observed.lock().unwrap_or_else(PoisonError::into_inner) = label;
        Ok((head, version))
    }

    /// Point the graph at `layer` if it has not moved since this handle last
    /// observed it. Returns `false` when another update got there first, and
    /// fails with [`Error::GraphDeleted`] once the graph is gone.
    pub fn set_head(&self, layer: &Layer) -> Result<bool> {
        let expected = self.observed.lock().unwrap_or_else(PoisonError::into_inner).clone();
        self.swap(&expected, layer)
    }

    /// Point the graph at `layer` if its version is still `version`.
    pub fn set_head_version(&self, layer: &Layer, version: u64) -> Result<bool> {
        let mut expected = self.observed.lock().unwrap_or_else(PoisonError::into_inner).clone();
        expected.version = version;
        self.swap(&expected, layer)
    }

    /// Point the graph at `layer` unconditionally.
    pub fn force_set_head(&self, layer: &Layer) -> Result<()> {
        self.store.write_layer(layer)?;
        let expected = self.observed.lock().unwrap_or_else(PoisonError::into_inner).clone();
        let label = self
            .store
            .labels()
            .force_set_label(&expected, Some(layer.id()))?
            .ok_or(Error::GraphDeleted(expected.name))?;
        info!(graph = %label.name, layer = %layer.id(), version = label.version, "forced graph head");
        *self.observed.lock().unwrap_or_else(PoisonError::into_inner) = label;
        Ok(())
    }

    /// A builder on top of the current head, or a base builder for a graph
    /// with no head yet.
    pub fn open_write(&self) -> Result<StoreLayerBuilder> {
        Ok(match self.head()? {
            Some(head) => self.store.open_write(&head),
            None => self.store.create_base_layer(),
        })
    }

    fn swap(&self, expected: &Label, layer: &Layer) -> Result<bool> {
        self.store.write_layer(layer)?;
        match self.store.labels().set_label(expected, Some(layer.id()))? {
            Some(label) => {
                info!(graph = %label.name, layer = %layer.id(), version = label.version, "moved graph head");
                *self.observed.lock().unwrap_or_else(PoisonError::into_inner) = label;
                Ok(true)
            }
            None => {
                let current = self.store.labels().get_label(&expected.name)?;
                if !current.is_some_and(|label| label.generation == expected.generation) {
                    return Err(Error::GraphDeleted(expected.name.clone()));
                }
                debug!(
                    graph = %expected.name,
                    expected = expected.version,
                    "graph head moved concurrently"
                );
                Ok(false)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    fn layer_with(store: &Store, parent: Option<&Layer>, s: &str) -> Layer {
        let mut b = match parent {
            Some(p) => store.open_write(p),
            None => store.create_base_layer(),
        };
        b.add_string_node_triple(s, "p", "o").unwrap();
        b.commit().unwrap()
    }

    #[test]
    fn fresh_graph_has_no_head() {
        let store = Store::open_memory();
        let graph = store.create_named_graph("g").unwrap();
        assert_eq!(graph.name(), "g");
        assert!(graph.head().unwrap().is_none());
        assert_eq!(graph.head_version().unwrap().1, 0);
        let b = graph.open_write().unwrap();
        assert!(b.parent().is_none());
    }

    #[test]
    fn set_head_bumps_version() {
        let store = Store::open_memory();
        let graph = store.create_named_graph("g").unwrap();
        let layer = layer_with(&store, None, "a");
        assert!(graph.set_head(&layer).unwrap());
        let (head, version) = graph.head_version().unwrap();
        assert_eq!(head, Some(layer));
        assert_eq!(version, 1);
    }

    #[test]
    fn stale_handle_loses_the_race() {
        let store = Store::open_memory();
        store.create_named_graph("g").unwrap();
        let first = store.open_named_graph("g").unwrap().unwrap();
        let second = store.open_named_graph("g").unwrap().unwrap();

        let a = layer_with(&store, None, "a");
        let b = layer_with(&store, None, "b");
        assert!(first.set_head(&a).unwrap());
        assert!(!second.set_head(&b).unwrap());
        assert_eq!(second.head().unwrap(), Some(a.clone()));

        // After re-reading, the second handle can move the graph.
        assert!(second.set_head(&b).unwrap());
        assert_eq!(first.head().unwrap(), Some(b));
    }

    #[test]
    fn set_head_version_checks_the_given_version() {
        let store = Store::open_memory();
        let graph = store.create_named_graph("g").unwrap();
        let a = layer_with(&store, None, "a");
        let b = layer_with(&store, Some(&a), "b");
        assert!(!graph.set_head_version(&a, 5).unwrap());
        assert!(graph.set_head_version(&a, 0).unwrap());
        assert!(!graph.set_head_version(&b, 0).unwrap());
        assert!(graph.set_head_version(&b, 1).unwrap());
        assert_eq!(graph.head_version().unwrap().1, 2);
    }

    #[test]
    fn force_set_head_ignores_versions() {
        let store = Store::open_memory();
        store.create_named_graph("g").unwrap();
        let stale = store.open_named_graph("g").unwrap().unwrap();
        let fresh = store.open_named_graph("g").unwrap().unwrap();
        let a = layer_with(&store, None, "a");
        let b = layer_with(&store, None, "b");
        assert!(fresh.set_head(&a).unwrap());
        stale.force_set_head(&b).unwrap();
        assert_eq!(fresh.head().unwrap(), Some(b));
    }

    #[test]
    fn deleted_graph_is_invalid_state() {
        let store = Store::open_memory();
        let graph = store.create_named_graph("g").unwrap();
        store.delete_named_graph("g").unwrap();
        assert_eq!(graph.head().unwrap_err().kind(), ErrorKind::InvalidState);
        let layer = layer_with(&store, None, "a");
        assert!(matches!(graph.set_head(&layer), Err(Error::GraphDeleted(_))));
        assert!(matches!(
            graph.set_head_version(&layer, 0),
            Err(Error::GraphDeleted(_))
        ));
        assert_eq!(
            graph.force_set_head(&layer).unwrap_err().kind(),
            ErrorKind::InvalidState
        );
    }

    #[test]
    fn conflict_and_deletion_are_distinguishable() {
        let store = Store::open_memory();
        store.create_named_graph("g").unwrap();
        let stale = store.open_named_graph("g").unwrap().unwrap();
        let fresh = store.open_named_graph("g").unwrap().unwrap();
        let a = layer_with(&store, None, "a");
        assert!(fresh.set_head(&a).unwrap());

        // The graph still exists, so this is an ordinary conflict.
        assert!(!stale.set_head(&a).unwrap());

        store.delete_named_graph("g").unwrap();
        assert!(matches!(stale.set_head(&a), Err(Error::GraphDeleted(_))));
    }

    #[test]
    fn handle_does_not_follow_a_recreated_graph() {
        let store = Store::open_memory();
        let old = store.create_named_graph("g").unwrap();
        store.delete_named_graph("g").unwrap();
        let new = store.create_named_graph("g").unwrap();

        // Both graphs sit at version 0, yet the old handle must not move the
        // new one.
        let a = layer_with(&store, None, "a");
        assert!(matches!(old.set_head(&a), Err(Error::GraphDeleted(_))));
        assert!(matches!(old.force_set_head(&a), Err(Error::GraphDeleted(_))));
        assert!(matches!(old.head(), Err(Error::GraphDeleted(_))));
        assert!(new.head().unwrap().is_none());
        assert!(new.set_head(&a).unwrap());
    }

    #[test]
    fn two_directory_stores_do_not_lose_updates() {
        use std::sync::Barrier;

        let dir = tempfile::tempdir().unwrap();
        let stores = [
            Store::open_directory(dir.path()).unwrap(),
            Store::open_directory(dir.path()).unwrap(),
        ];
        let layers: Vec<Layer> = ["a", "b"]
            .iter()
            .map(|s| layer_with(&stores[0], None, s))
            .collect();
        for round in 0..20 {
            let name = format!("g{round}");
            stores[0].create_named_graph(&name).unwrap();
            let graphs: Vec<NamedGraph> = stores
                .iter()
                .map(|s| s.open_named_graph(&name).unwrap().unwrap())
                .collect();
            let barrier = Barrier::new(graphs.len());
            let wins = std::thread::scope(|scope| {
                let handles: Vec<_> = graphs
                    .iter()
                    .zip(&layers)
                    .map(|(graph, layer)| {
                        let barrier = &barrier;
                        scope.spawn(move || {
                            barrier.wait();
                            graph.set_head(layer).unwrap()
                        })
                    })
                    .collect();
                handles
                    .into_iter()
                    .map(|h| h.join().unwrap())
                    .filter(|won| *won)
                    .count()
            });
            assert_eq!(wins, 1, "round {round}");
            assert_eq!(graphs[0].head_version().unwrap().1, 1);
        }
    }

    #[test]
    fn head_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let id = {
            let store = Store::open_directory(dir.path()).unwrap();
            let graph = store.create_named_graph("main").unwrap();
            let layer = layer_with(&store, None, "a");
            assert!(graph.set_head(&layer).unwrap());
            layer.id()
        };
        let store = Store::open_directory(dir.path()).unwrap();
        let graph = store.open_named_graph("main").unwrap().unwrap();
        let (head, version) = graph.head_version().unwrap();
        assert_eq!(head.map(|l| l.id()), Some(id));
        assert_eq!(version, 1);
    }
}
