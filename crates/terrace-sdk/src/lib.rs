//! High-level SDK for the Terrace triple store.
//!
//! Ties layers, layer storage, labels and packs together behind a single
//! [`Store`] handle. This is the main entry point for applications embedding
//! Terrace.
//!
//! ```no_run
//! use terrace_sdk::Store;
//!
//! # fn main() -> terrace_sdk::Result<()> {
//! let store = Store::open_memory();
//! let graph = store.create_named_graph("g")?;
//! let mut builder = graph.open_write()?;
//! builder.add_string_node_triple("a", "b", "c")?;
//! let layer = builder.commit()?;
//! assert!(graph.set_head(&layer)?);
//! # Ok(())
//! # }
//! ```

pub mod builder;
pub mod csv_import;
pub mod error;
pub mod named_graph;
pub mod store;

pub use builder::StoreLayerBuilder;
pub use csv_import::{csv_value, CsvOptions, XSD_STRING};
pub use error::{Error, ErrorKind, Result};
pub use named_graph::NamedGraph;
pub use store::Store;

// Re-export key types
pub use terrace_layer::{
    live_handles, HandleKind, IndexOrder, Layer, LayerBuilder, ObjectLookup, PredicateLookup,
    SubjectLookup, SubjectPredicateLookup, TripleCursor, ViewMode,
};
pub use terrace_pack::{layerids_and_parents, ImportReport, PackConfig};
pub use terrace_store::{StoreConfig, SyncMode};
pub use terrace_types::{IdTriple, LayerId, ObjectType, StringTriple};
