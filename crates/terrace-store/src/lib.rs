//! Layer storage backends for the Terrace triple store.
//!
//! A store persists [`LayerRecord`](terrace_layer::LayerRecord)s keyed by
//! their content-derived [`LayerId`](terrace_types::LayerId). It never
//! interprets the triples inside a record; materializing layers and their
//! parent chains is the job of the layers that read them.
//!
//! # Storage Backends
//!
//! All backends implement the [`LayerStore`] trait:
//!
//! - [`InMemoryLayerStore`] -- `HashMap`-based store for tests and embedding
//! - [`DirectoryLayerStore`] -- one framed, checksummed file per layer
//!
//! # Design Rules
//!
//! 1. Records are immutable once written (content-addressing guarantees this).
//! 2. Writes are atomic: a reader sees a complete file or no file.
//! 3. Every read is checked against the file checksum and the layer id.
//! 4. All I/O errors are propagated, never silently ignored.

pub mod config;
pub mod directory;
pub mod error;
pub mod frame;
pub mod memory;
pub mod traits;

pub use config::{StoreConfig, SyncMode};
pub use directory::DirectoryLayerStore;
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryLayerStore;
pub use traits::LayerStore;
