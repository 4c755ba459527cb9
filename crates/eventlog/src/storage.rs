//! .evlog snapshot format: a fixed little-endian header followed by a JSON
//! payload of records.

use std::io::{Read, Write};
use std::path::Path;

use crate::store::LogStore;
use crate::types::{EventLogError, EventLogResult, LogRecord};

/// Magic bytes: "EVLG"
const EVLOG_MAGIC: u32 = 0x4556_4C47;

/// Current format version.
const FORMAT_VERSION: u16 = 1;

/// Header size in bytes.
const HEADER_SIZE: usize = 64;

/// Writer for .evlog files.
pub struct EvlogWriter;

/// Reader for .evlog files.
pub struct EvlogReader;

impl EvlogWriter {
    /// Write a log store to a file, creating parent directories.
    pub fn write_to_file(store: &LogStore, path: &Path) -> EventLogResult<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let mut file = std::fs::File::create(path)?;
        Self::write_to(store, &mut file)
    }

    /// Write a log store to any writer.
    pub fn write_to<W: Write>(store: &LogStore, writer: &mut W) -> EventLogResult<()> {
        let payload = serde_json::to_vec(&SerializedStore {
            records: &store.records,
        })
        .map_err(|e| EventLogError::Storage(format!("Serialization failed: {e}")))?;

        let mut header = [0u8; HEADER_SIZE];
        write_u32(&mut header[0..4], EVLOG_MAGIC);
        write_u16(&mut header[4..6], FORMAT_VERSION);
        write_u16(&mut header[6..8], 0); // flags
        write_u64(&mut header[8..16], store.records.len() as u64);
        write_u64(&mut header[16..24], store.created_at);
        write_u64(&mut header[24..32], store.updated_at);
        write_u64(&mut header[32..40], payload.len() as u64);

        writer.write_all(&header)?;
        writer.write_all(&payload)?;

        tracing::debug!(records = store.records.len(), bytes = payload.len(), "wrote evlog");
        Ok(())
    }
}

impl EvlogReader {
    /// Read a log store from a file.
    pub fn read_from_file(path: &Path) -> EventLogResult<LogStore> {
        let mut file = std::fs::File::open(path)?;
        Self::read_from(&mut file)
    }

    /// Read a log store from any reader.
    pub fn read_from<R: Read>(reader: &mut R) -> EventLogResult<LogStore> {
        let mut header = [0u8; HEADER_SIZE];
        reader.read_exact(&mut header)?;

        let magic = read_u32(&header[0..4]);
        if magic != EVLOG_MAGIC {
            return Err(EventLogError::Storage(format!(
                "Invalid magic: expected 0x{EVLOG_MAGIC:08X}, got 0x{magic:08X}"
            )));
        }

        let version = read_u16(&header[4..6]);
        if version != FORMAT_VERSION {
            return Err(EventLogError::Storage(format!(
                "Unsupported version: {version}"
            )));
        }

        let record_count = read_u64(&header[8..16]);
        let created_at = read_u64(&header[16..24]);
        let updated_at = read_u64(&header[24..32]);
        let payload_len = read_u64(&header[32..40]) as usize;

        let mut payload = vec![0u8; payload_len];
        reader.read_exact(&mut payload)?;

        let serialized: DeserializedStore = serde_json::from_slice(&payload)
            .map_err(|e| EventLogError::Storage(format!("Deserialization failed: {e}")))?;

        if serialized.records.len() as u64 != record_count {
            return Err(EventLogError::Storage(format!(
                "Record count mismatch: header says {record_count}, payload has {}",
                serialized.records.len()
            )));
        }

        Ok(LogStore {
            records: serialized.records,
            created_at,
            updated_at,
        })
    }
}

#[derive(serde::Serialize)]
struct SerializedStore<'a> {
    records: &'a [LogRecord],
}

#[derive(serde::Deserialize)]
struct DeserializedStore {
    records: Vec<LogRecord>,
}

// Little-endian byte helpers
fn write_u16(buf: &mut [u8], val: u16) {
    buf[..2].copy_from_slice(&val.to_le_bytes());
}
fn write_u32(buf: &mut [u8], val: u32) {
    buf[..4].copy_from_slice(&val.to_le_bytes());
}
fn write_u64(buf: &mut [u8], val: u64) {
    buf[..8].copy_from_slice(&val.to_le_bytes());
}
fn read_u16(buf: &[u8]) -> u16 {
    u16::from_le_bytes([buf[0], buf[1]])
}
fn read_u32(buf: &[u8]) -> u32 {
    u32::from_le_bytes([buf[0], buf[1], buf[2], buf[3]])
}
fn read_u64(buf: &[u8]) -> u64 {
    u64::from_le_bytes([buf[0], buf[1], buf[2], buf[3], buf[4], buf[5], buf[6], buf[7]])
}
