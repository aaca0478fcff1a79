//! Immutable, delta-encoded triple layers for the Terrace triple store.
//!
//! A [`Layer`] is a snapshot of a triple set expressed as additions and
//! removals against an optional parent. Strings are dictionary-encoded into
//! ids that are global across a layer's ancestor chain. Layers are built with
//! a [`LayerBuilder`] and queried through ordered [`TripleCursor`]s and the
//! entity lookups in [`lookup`].
//!
//! # Key Types
//!
//! - [`Layer`] -- shared handle to a committed layer
//! - [`LayerBuilder`] -- single-use staging area producing one layer
//! - [`LayerRecord`] -- flat, serializable form of a layer
//! - [`TripleCursor`] -- restartable cursor over a layer view
//! - [`SubjectLookup`], [`PredicateLookup`], [`ObjectLookup`] -- entity views
//!
//! # Design Rules
//!
//! 1. Layers never change after commit.
//! 2. An id is never rebound to a different string within a chain.
//! 3. A layer id is derived from its content, parent linkage included.
//! 4. "Not found" is `None` or `false`, never an error.

pub mod builder;
pub mod cursor;
pub mod dictionary;
pub mod error;
pub mod handles;
pub mod index;
pub mod layer;
pub mod lookup;
pub mod record;

pub use builder::LayerBuilder;
pub use cursor::{TripleCursor, ViewMode};
pub use dictionary::{Dictionary, LayerDictionary};
pub use error::{LayerError, LayerResult};
pub use handles::{live_handles, HandleGuard, HandleKind, HandleRegistry};
pub use index::{IndexOrder, TripleIndex};
pub use layer::{Ancestors, Layer};
pub use lookup::{
    Lookups, ObjectIdIter, ObjectIter, ObjectLookup, PairIter, PredicateIter, PredicateLookup,
    SubjectIter, SubjectLookup, SubjectPredicateIter, SubjectPredicateLookup,
};
pub use record::LayerRecord;
