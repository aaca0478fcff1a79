//! Named-graph labels for the Terrace triple store.
//!
//! A label is the persisted record behind a named graph: a name, the id of
//! the current head layer and a version counter. Labels are the only mutable
//! state in a store; every update bumps the version, and guarded updates
//! succeed only against the version the caller last observed.
//!
//! # Modules
//!
//! - [`error`] -- Error types for label operations
//! - [`types`] -- The [`Label`] record
//! - [`traits`] -- The [`LabelStore`] trait defining the storage interface
//! - [`names`] -- Label name validation
//! - [`memory`] -- In-memory [`InMemoryLabelStore`] for tests
//! - [`directory`] -- File-backed [`DirectoryLabelStore`]

pub mod directory;
pub mod error;
pub mod memory;
pub mod names;
pub mod traits;
pub mod types;

pub use directory::DirectoryLabelStore;
pub use error::{LabelError, Result};
pub use memory::InMemoryLabelStore;
pub use names::validate_label_name;
pub use traits::LabelStore;
pub use types::Label;
