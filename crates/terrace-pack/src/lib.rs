//! Pack format for Terrace.
//!
//! A pack is a self-contained, compressed bundle of layer records used to
//! move layer stacks between stores.
//!
//! # Architecture
//!
//! - **PackWriter**: encodes layer records, parents first, into pack bytes
//! - **PackReader**: validates a pack and decompresses records on demand
//! - **export / import**: walk ancestry against a [`terrace_store::LayerStore`]
//! - **layerids_and_parents**: read the manifest without decompressing

pub mod config;
pub mod entry;
pub mod error;
pub mod reader;
pub mod transfer;
pub mod writer;

pub use config::{PackConfig, DEFAULT_COMPRESSION_LEVEL};
pub use entry::{ManifestEntry, PACK_MAGIC, PACK_VERSION};
pub use error::{PackError, PackResult};
pub use reader::{layerids_and_parents, PackReader};
pub use transfer::{export, import, import_all, ImportReport};
pub use writer::PackWriter;
