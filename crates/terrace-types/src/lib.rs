//! Foundation types for the Terrace triple store.
//!
//! Every other Terrace crate depends on `terrace-types`.
//!
//! # Key Types
//!
//! - [`LayerId`] -- 160-bit content-derived layer identifier (40 hex characters)
//! - [`IdTriple`] -- a triple of dictionary-encoded ids
//! - [`StringTriple`] -- a triple of raw strings, with the object forced to a node or a value
//! - [`ObjectType`] -- a decoded object: either a node or a value

pub mod error;
pub mod layer_id;
pub mod triple;

pub use error::TypeError;
pub use layer_id::LayerId;
pub use triple::{IdTriple, ObjectType, StringTriple};
