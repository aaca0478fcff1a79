use std::collections::{HashMap, HashSet};
use std::io::Read;

use terrace_crypto::ContentHasher;
use terrace_layer::LayerRecord;
use terrace_types::layer_id::LAYER_ID_BYTES;
use terrace_types::LayerId;

use crate::entry::{
    decode_varint, ManifestEntry, PACK_HEADER_SIZE, PACK_MAGIC, PACK_TRAILER_SIZE, PACK_VERSION,
};
use crate::error::{PackError, PackResult};

/// Random-access reader over pack bytes.
///
/// Construction validates the header, the trailer checksum and the manifest,
/// but decompresses nothing. Payloads are decompressed on demand by
/// [`PackReader::read_record`].
#[derive(Debug)]
pub struct PackReader<'a> {
    data: &'a [u8],
    entries: Vec<ManifestEntry>,
    by_id: HashMap<LayerId, usize>,
}

impl<'a> PackReader<'a> {
    pub fn from_bytes(data: &'a [u8]) -> PackResult<Self> {
        if data.len() < PACK_HEADER_SIZE + PACK_TRAILER_SIZE {
            return Err(PackError::CorruptEntry {
                offset: 0,
                reason: "pack data too short".into(),
            });
        }
        if &data[0..4] != PACK_MAGIC {
            return Err(PackError::InvalidMagic {
                expected: String::from_utf8_lossy(PACK_MAGIC).into(),
                actual: String::from_utf8_lossy(&data[0..4]).into(),
            });
        }
        let version = read_u32(data, 4);
        if version != PACK_VERSION {
            return Err(PackError::UnsupportedVersion(version));
        }

        let body_end = data.len() - PACK_TRAILER_SIZE;
        if ContentHasher::PACK.hash_full(&data[..body_end]) != data[body_end..] {
            return Err(PackError::ChecksumMismatch);
        }

        let count = read_u32(data, 8) as usize;
        let mut entries = Vec::with_capacity(count.min(body_end));
        let mut by_id = HashMap::with_capacity(count.min(body_end));
        let mut pos = PACK_HEADER_SIZE;
        for _ in 0..count {
            let entry = parse_entry(&data[..body_end], pos)?;
            pos = (entry.payload_offset + entry.compressed_len) as usize;
            if by_id.insert(entry.id, entries.len()).is_some() {
                return Err(PackError::CorruptEntry {
                    offset: entry.offset,
                    reason: format!("duplicate layer {}", entry.id),
                });
            }
            entries.push(entry);
        }
        for (idx, entry) in entries.iter().enumerate() {
            let parent_idx = entry.parent.and_then(|p| by_id.get(&p).copied());
            if parent_idx.is_some_and(|p| p > idx) {
                return Err(PackError::CorruptEntry {
                    offset: entry.offset,
                    reason: format!("layer {} precedes its parent", entry.id),
                });
            }
        }
        if pos != body_end {
            return Err(PackError::CorruptEntry {
                offset: pos as u64,
                reason: "trailing bytes after last entry".into(),
            });
        }
        Ok(Self {
            data,
            entries,
            by_id,
        })
    }

    /// Number of layers in the pack.
    pub fn layer_count(&self) -> usize {
        self.entries.len()
    }

    /// Manifest entries in pack order (parents before children).
    pub fn entries(&self) -> &[ManifestEntry] {
        &self.entries
    }

    pub fn contains(&self, id: &LayerId) -> bool {
        self.by_id.contains_key(id)
    }

    pub fn entry(&self, id: &LayerId) -> Option<&ManifestEntry> {
        self.by_id.get(id).map(|&idx| &self.entries[idx])
    }

    /// `(layer, parent)` pairs in pack order.
    pub fn layerids_and_parents(&self) -> Vec<(LayerId, Option<LayerId>)> {
        self.entries.iter().map(|e| (e.id, e.parent)).collect()
    }

    /// Decompress and verify one layer record.
    pub fn read_record(&self, id: &LayerId) -> PackResult<Option<LayerRecord>> {
        let Some(entry) = self.entry(id) else {
            return Ok(None);
        };
        let start = entry.payload_offset as usize;
        let compressed = &self.data[start..start + entry.compressed_len as usize];
        if crc32fast::hash(compressed) != entry.crc32 {
            return Err(PackError::CrcMismatch { id: entry.id });
        }
        // Never inflate past the declared size, whatever the frame claims.
        let mut decompressed = Vec::new();
        zstd::stream::read::Decoder::new(compressed)
            .map_err(|e| PackError::DecompressionFailed(e.to_string()))?
            .take(entry.uncompressed_len.saturating_add(1))
            .read_to_end(&mut decompressed)
            .map_err(|e| PackError::DecompressionFailed(e.to_string()))?;
        let actual = decompressed.len() as u64;
        if actual != entry.uncompressed_len {
            let reason = if actual > entry.uncompressed_len {
                format!("payload inflates past its declared {} bytes", entry.uncompressed_len)
            } else {
                format!("size mismatch: expected {}, got {actual}", entry.uncompressed_len)
            };
            return Err(PackError::CorruptEntry {
                offset: entry.offset,
                reason,
            });
        }
        let record = LayerRecord::from_bytes(&decompressed)?;
        if record.id != entry.id || record.parent != entry.parent {
            return Err(PackError::CorruptEntry {
                offset: entry.offset,
                reason: "payload does not match manifest".into(),
            });
        }
        record.verify()?;
        Ok(Some(record))
    }

    /// Ids that the pack references as parents but does not contain.
    pub fn external_parents(&self) -> HashSet<LayerId> {
        self.entries
            .iter()
            .filter_map(|e| e.parent)
            .filter(|p| !self.contains(p))
            .collect()
    }
}

fn read_u32(data: &[u8], at: usize) -> u32 {
    u32::from_be_bytes([data[at], data[at + 1], data[at + 2], data[at + 3]])
}

fn read_id(data: &[u8], at: usize) -> LayerId {
    let mut bytes = [0u8; LAYER_ID_BYTES];
    bytes.copy_from_slice(&data[at..at + LAYER_ID_BYTES]);
    LayerId::from_hash(bytes)
}

fn parse_entry(body: &[u8], offset: usize) -> PackResult<ManifestEntry> {
    let corrupt = |reason: &str| PackError::CorruptEntry {
        offset: offset as u64,
        reason: reason.to_string(),
    };
    let mut pos = offset;
    if pos + LAYER_ID_BYTES + 1 > body.len() {
        return Err(corrupt("truncated entry header"));
    }
    let id = read_id(body, pos);
    pos += LAYER_ID_BYTES;

    let parent = match body[pos] {
        0 => {
            pos += 1;
            None
        }
        1 => {
            pos += 1;
            if pos + LAYER_ID_BYTES > body.len() {
                return Err(corrupt("truncated parent id"));
            }
            let parent = read_id(body, pos);
            pos += LAYER_ID_BYTES;
            Some(parent)
        }
        _ => return Err(corrupt("invalid parent flag")),
    };

    let (uncompressed_len, consumed) =
        decode_varint(&body[pos..]).ok_or_else(|| corrupt("bad uncompressed size"))?;
    pos += consumed;
    let (compressed_len, consumed) =
        decode_varint(&body[pos..]).ok_or_else(|| corrupt("bad compressed size"))?;
    pos += consumed;

    if pos + 4 > body.len() {
        return Err(corrupt("truncated checksum"));
    }
    let crc32 = read_u32(body, pos);
    pos += 4;

    let remaining = (body.len() - pos) as u64;
    if compressed_len > remaining {
        return Err(corrupt("compressed data extends beyond pack"));
    }
    Ok(ManifestEntry {
        id,
        parent,
        offset: offset as u64,
        uncompressed_len,
        payload_offset: pos as u64,
        compressed_len,
        crc32,
    })
}

/// Read the `(layer, parent)` manifest of a pack without decompressing any
/// payload.
pub fn layerids_and_parents(pack: &[u8]) -> PackResult<Vec<(LayerId, Option<LayerId>)>> {
    Ok(PackReader::from_bytes(pack)?.layerids_and_parents())
}
