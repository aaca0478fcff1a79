//! In-memory label store for testing and ephemeral use.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use terrace_types::LayerId;
use tracing::debug;

use crate::error::{LabelError, Result};
use crate::names::validate_label_name;
use crate::traits::LabelStore;
use crate::types::Label;

/// An in-memory implementation of [`LabelStore`].
///
/// All data lives in a `HashMap` behind a `RwLock`. Data is lost when the
/// store is dropped.
#[derive(Debug, Default)]
pub struct InMemoryLabelStore {
    state: RwLock<State>,
}

#[derive(Debug, Default)]
struct State {
    labels: HashMap<String, Label>,
    next_generation: u64,
}

impl InMemoryLabelStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl LabelStore for InMemoryLabelStore {
    fn create_label(&self, name: &str) -> Result<Label> {
        validate_label_name(name)?;
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        if state.labels.contains_key(name) {
            return Err(LabelError::AlreadyExists {
                name: name.to_string(),
            });
        }
        let label = Label::created(name, state.next_generation);
        state.next_generation += 1;
        state.labels.insert(name.to_string(), label.clone());
        debug!(label = name, generation = label.generation, "created label");
        Ok(label)
    }

    fn get_label(&self, name: &str) -> Result<Option<Label>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        Ok(state.labels.get(name).cloned())
    }

    fn set_label(&self, expected: &Label, layer: Option<LayerId>) -> Result<Option<Label>> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        let Some(current) = state.labels.get_mut(&expected.name) else {
            return Ok(None);
        };
        if !current.matches(expected) {
            debug!(
                label = %expected.name,
                expected = expected.version,
                actual = current.version,
                "label moved; update refused"
            );
            return Ok(None);
        }
        *current = current.with_layer(layer);
        Ok(Some(current.clone()))
    }

    fn force_set_label(&self, expected: &Label, layer: Option<LayerId>) -> Result<Option<Label>> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        match state.labels.get_mut(&expected.name) {
            Some(current) if current.generation == expected.generation => {
                *current = current.with_layer(layer);
                Ok(Some(current.clone()))
            }
            _ => Ok(None),
        }
    }

    fn delete_label(&self, name: &str) -> Result<bool> {
        let mut state = self.state.write().unwrap_or_else(PoisonError::into_inner);
        Ok(state.labels.remove(name).is_some())
    }

    fn labels(&self) -> Result<Vec<String>> {
        let state = self.state.read().unwrap_or_else(PoisonError::into_inner);
        let mut names: Vec<String> = state.labels.keys().cloned().collect();
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn layer(n: u8) -> LayerId {
        LayerId::from_hash([n; 20])
    }

    #[test]
    fn create_and_get() {
        let store = InMemoryLabelStore::new();
        let label = store.create_label("main").unwrap();
        assert_eq!(label, Label::new("main"));
        assert_eq!(store.get_label("main").unwrap(), Some(label));
        assert_eq!(store.get_label("other").unwrap(), None);
    }

    #[test]
    fn duplicate_create_fails() {
        let store = InMemoryLabelStore::new();
        store.create_label("main").unwrap();
        assert!(matches!(
            store.create_label("main"),
            Err(LabelError::AlreadyExists { .. })
        ));
    }

    #[test]
    fn invalid_name_is_rejected() {
        let store = InMemoryLabelStore::new();
        assert!(matches!(
            store.create_label("a/b"),
            Err(LabelError::InvalidName { .. })
        ));
    }

    #[test]
    fn guarded_update_checks_version() {
        let store = InMemoryLabelStore::new();
        let v0 = store.create_label("main").unwrap();
        let v1 = store.set_label(&v0, Some(layer(1))).unwrap().unwrap();
        assert_eq!(v1.version, 1);

        // Stale observation loses.
        assert_eq!(store.set_label(&v0, Some(layer(2))).unwrap(), None);
        assert_eq!(store.get_label("main").unwrap(), Some(v1.clone()));

        let v2 = store.set_label(&v1, Some(layer(2))).unwrap().unwrap();
        assert_eq!(v2.layer, Some(layer(2)));
        assert_eq!(v2.version, 2);
    }

    #[test]
    fn force_update_ignores_version() {
        let store = InMemoryLabelStore::new();
        let v0 = store.create_label("main").unwrap();
        store.set_label(&v0, Some(layer(1))).unwrap();
        let forced = store.force_set_label(&v0, Some(layer(9))).unwrap().unwrap();
        assert_eq!(forced.version, 2);
        assert_eq!(forced.layer, Some(layer(9)));
        assert_eq!(store.force_set_label(&Label::new("missing"), None).unwrap(), None);
    }

    #[test]
    fn delete_and_list() {
        let store = InMemoryLabelStore::new();
        store.create_label("b").unwrap();
        store.create_label("a").unwrap();
        assert_eq!(store.labels().unwrap(), vec!["a".to_string(), "b".to_string()]);
        assert!(store.delete_label("a").unwrap());
        assert!(!store.delete_label("a").unwrap());
        assert_eq!(store.labels().unwrap(), vec!["b".to_string()]);
    }

    #[test]
    fn update_after_delete_is_refused() {
        let store = InMemoryLabelStore::new();
        let v0 = store.create_label("main").unwrap();
        store.delete_label("main").unwrap();
        assert_eq!(store.set_label(&v0, Some(layer(1))).unwrap(), None);
    }

    #[test]
    fn recreated_label_is_a_new_generation() {
        let store = InMemoryLabelStore::new();
        let old = store.create_label("main").unwrap();
        store.delete_label("main").unwrap();
        let new = store.create_label("main").unwrap();
        assert_eq!(new.version, 0);
        assert!(new.generation > old.generation);

        // Observations of the deleted label do not carry over.
        assert_eq!(store.set_label(&old, Some(layer(1))).unwrap(), None);
        assert_eq!(store.force_set_label(&old, Some(layer(1))).unwrap(), None);
        assert_eq!(store.get_label("main").unwrap(), Some(new.clone()));
        assert!(store.set_label(&new, Some(layer(1))).unwrap().is_some());
    }
}
