use terrace_types::layer_id::LAYER_ID_BYTES;
use terrace_types::LayerId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag (e.g., `"terrace-layer-v1"`) that is
/// prepended to every hash computation, so a layer and a pack with identical
/// bytes never share a digest. Layer ids keep the first 160 bits of the
/// BLAKE3 output.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for layer content.
    pub const LAYER: Self = Self {
        domain: "terrace-layer-v1",
    };
    /// Hasher for pack payloads.
    pub const PACK: Self = Self {
        domain: "terrace-pack-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation, truncated to a [`LayerId`].
    pub fn hash(&self, data: &[u8]) -> LayerId {
        let full = self.hash_full(data);
        let mut truncated = [0u8; LAYER_ID_BYTES];
        truncated.copy_from_slice(&full[..LAYER_ID_BYTES]);
        LayerId::from_hash(truncated)
    }

    /// Full 256-bit domain-separated digest.
    pub fn hash_full(&self, data: &[u8]) -> [u8; 32] {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        *hasher.finalize().as_bytes()
    }

    /// Verify that data produces the expected layer id.
    pub fn verify(&self, data: &[u8], expected: &LayerId) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}
