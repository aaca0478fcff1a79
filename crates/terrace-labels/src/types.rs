//! The persisted record behind a named graph.

use serde::{Deserialize, Serialize};
use terrace_types::LayerId;

/// A named, versioned pointer to a head layer.
///
/// The version starts at 0 for a fresh label and increases by one on every
/// successful update. The generation is assigned at creation from a
/// store-wide counter, so a label that is deleted and created again under the
/// same name never matches an observation of its predecessor. Guarded
/// updates compare both.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Label {
    /// Label name.
    pub name: String,
    /// Current head layer, `None` until the first update.
    pub layer: Option<LayerId>,
    /// Number of updates applied since creation.
    pub version: u64,
    /// Which creation of this name the label belongs to.
    #[serde(default)]
    pub generation: u64,
}

impl Label {
    /// A fresh label with no head, in generation 0.
    pub fn new(name: impl Into<String>) -> Self {
        Self::created(name, 0)
    }

    /// A fresh label with no head, in the given generation.
    pub fn created(name: impl Into<String>, generation: u64) -> Self {
        Self {
            name: name.into(),
            layer: None,
            version: 0,
            generation,
        }
    }

    /// The label that results from pointing this one at `layer`.
    pub fn with_layer(&self, layer: Option<LayerId>) -> Self {
        Self {
            name: self.name.clone(),
            layer,
            version: self.version + 1,
            generation: self.generation,
        }
    }

    /// Whether `observed` still describes this label: same creation and no
    /// update since.
    pub fn matches(&self, observed: &Label) -> bool {
        self.generation == observed.generation && self.version == observed.version
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_label_has_no_head() {
        let label = Label::new("main");
        assert_eq!(label.layer, None);
        assert_eq!(label.version, 0);
    }

    #[test]
    fn with_layer_bumps_version() {
        let id = LayerId::from_hash([7; 20]);
        let next = Label::new("main").with_layer(Some(id));
        assert_eq!(next.layer, Some(id));
        assert_eq!(next.version, 1);
        assert_eq!(next.with_layer(None).version, 2);
    }

    #[test]
    fn with_layer_keeps_generation() {
        let label = Label::created("main", 4).with_layer(None);
        assert_eq!(label.generation, 4);
        assert!(label.matches(&label.clone()));
        assert!(!label.matches(&Label::created("main", 4)));
        assert!(!label.matches(&Label::created("main", 3).with_layer(None)));
    }

    #[test]
    fn generation_defaults_when_absent() {
        let back: Label =
            serde_json::from_str(r#"{"name":"main","layer":null,"version":2}"#).unwrap();
        assert_eq!(back.generation, 0);
        assert_eq!(back.version, 2);
    }

    #[test]
    fn json_form_is_readable() {
        let label = Label::new("main").with_layer(Some(LayerId::from_hash([1; 20])));
        let json = serde_json::to_string(&label).unwrap();
        assert!(json.contains("\"name\":\"main\""));
        let back: Label = serde_json::from_str(&json).unwrap();
        assert_eq!(back, label);
    }
}
