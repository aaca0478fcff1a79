use terrace_types::LayerId;

/// Pack file magic.
pub const PACK_MAGIC: &[u8; 4] = b"TSPK";

/// Current pack format version.
pub const PACK_VERSION: u32 = 1;

/// Magic + version + layer count.
pub const PACK_HEADER_SIZE: usize = 4 + 4 + 4;

/// Length of the BLAKE3 trailer.
pub const PACK_TRAILER_SIZE: usize = 32;

/// Manifest data for one layer in a pack, read without decompressing.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestEntry {
    /// Id of the packed layer.
    pub id: LayerId,
    /// Id of its parent, `None` for a base layer.
    pub parent: Option<LayerId>,
    /// Byte offset of the entry within the pack.
    pub offset: u64,
    /// Size of the encoded record before compression.
    pub uncompressed_len: u64,
    /// Byte offset of the compressed payload within the pack.
    pub payload_offset: u64,
    /// Size of the compressed payload.
    pub compressed_len: u64,
    /// CRC32 of the compressed payload.
    pub crc32: u32,
}

/// Encode a u64 as a variable-length integer.
pub(crate) fn encode_varint(buf: &mut Vec<u8>, mut value: u64) {
    loop {
        let mut byte = (value & 0x7F) as u8;
        value >>= 7;
        if value > 0 {
            byte |= 0x80;
        }
        buf.push(byte);
        if value == 0 {
            break;
        }
    }
}

/// Decode a variable-length integer. Returns `(value, bytes_consumed)`, or
/// `None` if the input is truncated or overflows.
pub(crate) fn decode_varint(data: &[u8]) -> Option<(u64, usize)> {
    let mut value: u64 = 0;
    let mut shift = 0;
    for (i, &byte) in data.iter().enumerate() {
        value |= ((byte & 0x7F) as u64) << shift;
        shift += 7;
        if byte & 0x80 == 0 {
            return Some((value, i + 1));
        }
        if shift >= 64 {
            return None;
        }
    }
    None
}
