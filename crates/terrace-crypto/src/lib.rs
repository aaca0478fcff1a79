//! Cryptographic primitives for the Terrace triple store.
//!
//! Provides domain-separated BLAKE3 hashing used to derive content-addressed
//! [`LayerId`](terrace_types::LayerId)s and pack checksums.
//!
//! All crypto operations wrap established libraries; there is no custom cryptography.

pub mod hasher;

pub use hasher::ContentHasher;
