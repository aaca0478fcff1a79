//! On-disk file framing and atomic file replacement.
//!
//! Every file a directory-backed store writes has the layout:
//!
//! ```text
//! [4 bytes: magic]
//! [1 byte:  format version]
//! [4 bytes: CRC32 of payload (little-endian u32)]
//! [8 bytes: payload length (little-endian u64)]
//! [N bytes: payload]
//! ```
//!
//! Files are written to a temporary sibling and renamed into place, so a
//! reader sees either the old file or the complete new one.

use std::fs::{self, File};
use std::io::Write;
use std::path::Path;

use tempfile::NamedTempFile;

use crate::config::SyncMode;

/// Current framing version.
pub const FRAME_VERSION: u8 = 1;

/// Magic + version + CRC + length.
pub const HEADER_SIZE: usize = 4 + 1 + 4 + 8;

/// Wrap a payload in a framed file body.
pub fn encode(magic: &[u8; 4], payload: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(HEADER_SIZE + payload.len());
    out.extend_from_slice(magic);
    out.push(FRAME_VERSION);
    out.extend_from_slice(&crc32fast::hash(payload).to_le_bytes());
    out.extend_from_slice(&(payload.len() as u64).to_le_bytes());
    out.extend_from_slice(payload);
    out
}

/// Validate a framed file body and return its payload.
pub fn decode<'a>(magic: &[u8; 4], data: &'a [u8]) -> Result<&'a [u8], String> {
    if data.len() < HEADER_SIZE {
        return Err(format!("file too short: {} bytes", data.len()));
    }
    if &data[0..4] != magic {
        return Err("bad magic".into());
    }
    if data[4] != FRAME_VERSION {
        return Err(format!("unsupported format version {}", data[4]));
    }
    let expected_crc = u32::from_le_bytes([data[5], data[6], data[7], data[8]]);
    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&data[9..HEADER_SIZE]);
    let length = u64::from_le_bytes(len_bytes);

    let payload = &data[HEADER_SIZE..];
    if payload.len() as u64 != length {
        return Err(format!(
            "length mismatch: header says {length}, found {}",
            payload.len()
        ));
    }
    let actual_crc = crc32fast::hash(payload);
    if actual_crc != expected_crc {
        return Err(format!(
            "CRC mismatch: expected {expected_crc:08x}, computed {actual_crc:08x}"
        ));
    }
    Ok(payload)
}

/// Atomically replace `path` with `contents`.
pub fn write_atomic(path: &Path, contents: &[u8], sync_mode: SyncMode) -> std::io::Result<()> {
    let dir = path.parent().unwrap_or_else(|| Path::new("."));
    fs::create_dir_all(dir)?;

    let mut tmp = NamedTempFile::new_in(dir)?;
    tmp.write_all(contents)?;
    tmp.flush()?;
    if sync_mode == SyncMode::EveryWrite {
        tmp.as_file().sync_all()?;
    }
    tmp.persist(path).map_err(|e| e.error)?;

    if sync_mode == SyncMode::EveryWrite {
        sync_dir(dir)?;
    }
    Ok(())
}

/// Remove `path`, syncing the directory afterwards if configured.
/// Returns `false` if the file did not exist.
pub fn remove(path: &Path, sync_mode: SyncMode) -> std::io::Result<bool> {
    match fs::remove_file(path) {
        Ok(()) => {}
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(false),
        Err(e) => return Err(e),
    }
    if sync_mode == SyncMode::EveryWrite {
        if let Some(dir) = path.parent() {
            sync_dir(dir)?;
        }
    }
    Ok(true)
}

#[cfg(unix)]
fn sync_dir(dir: &Path) -> std::io::Result<()> {
    File::open(dir)?.sync_all()
}

#[cfg(not(unix))]
fn sync_dir(_dir: &Path) -> std::io::Result<()> {
    Ok(())
}
