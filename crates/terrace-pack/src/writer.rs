//! Pack encoding.
//!
//! On-wire format:
//!
//! ```text
//! [4 bytes: magic "TSPK"]
//! [4 bytes: version (big-endian u32)]
//! [4 bytes: layer count (big-endian u32)]
//! per layer, parents before children:
//!   [20 bytes: layer id]
//!   [1 byte: 1 if a parent id follows, else 0]
//!   [20 bytes: parent id, if present]
//!   [varint: uncompressed size]
//!   [varint: compressed size]
//!   [4 bytes: CRC32 of compressed payload (big-endian u32)]
//!   [N bytes: zstd-compressed bincode layer record]
//! [32 bytes: BLAKE3 checksum of everything above]
//! ```
//!
//! Ids and parent links sit outside the compressed payload so a manifest can
//! be read without decompressing anything.

use std::collections::HashSet;

use terrace_crypto::ContentHasher;
use terrace_layer::LayerRecord;
use terrace_types::LayerId;

use crate::config::PackConfig;
use crate::entry::{encode_varint, PACK_MAGIC, PACK_VERSION};
use crate::error::{PackError, PackResult};

/// Builds a pack from layer records.
pub struct PackWriter {
    config: PackConfig,
    records: Vec<LayerRecord>,
    seen: HashSet<LayerId>,
}

impl PackWriter {
    pub fn new(config: PackConfig) -> Self {
        Self {
            config,
            records: Vec::new(),
            seen: HashSet::new(),
        }
    }

    /// Queue a record. Records must be added parents first; adding the same
    /// layer twice is a no-op.
    pub fn add_record(&mut self, record: LayerRecord) {
        if self.seen.insert(record.id) {
            self.records.push(record);
        }
    }

    /// Number of layers queued.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Encode the queued records into pack bytes.
    pub fn finish(self) -> PackResult<Vec<u8>> {
        let mut pack = Vec::new();
        pack.extend_from_slice(PACK_MAGIC);
        pack.extend_from_slice(&PACK_VERSION.to_be_bytes());
        pack.extend_from_slice(&(self.records.len() as u32).to_be_bytes());

        for record in &self.records {
            let encoded = record.to_bytes()?;
            let compressed = zstd::encode_all(encoded.as_slice(), self.config.compression_level)
                .map_err(|e| PackError::CompressionFailed(e.to_string()))?;

            pack.extend_from_slice(record.id.as_bytes());
            match &record.parent {
                Some(parent) => {
                    pack.push(1);
                    pack.extend_from_slice(parent.as_bytes());
                }
                None => pack.push(0),
            }
            encode_varint(&mut pack, encoded.len() as u64);
            encode_varint(&mut pack, compressed.len() as u64);
            pack.extend_from_slice(&crc32fast::hash(&compressed).to_be_bytes());
            pack.extend_from_slice(&compressed);
        }

        let checksum = ContentHasher::PACK.hash_full(&pack);
        pack.extend_from_slice(&checksum);
        Ok(pack)
    }
}

impl Default for PackWriter {
    fn default() -> Self {
        Self::new(PackConfig::default())
    }
}
