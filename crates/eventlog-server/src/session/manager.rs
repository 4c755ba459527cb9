//! Log store lifecycle, snapshot I/O, and ingestion.

use std::path::PathBuf;
use std::time::{Duration, Instant};

use eventlog::{EvlogReader, EvlogWriter, LogBatch, LogStore};

use crate::types::{ServerError, ServerResult};

const DEFAULT_AUTO_SAVE_SECS: u64 = 30;

/// Owns the in-memory store and keeps its `.evlog` snapshot current.
pub struct LogSessionManager {
    store: LogStore,
    file_path: PathBuf,
    dirty: bool,
    last_save: Instant,
    auto_save_interval: Duration,
}

impl LogSessionManager {
    /// Open or create an event log file at the given path.
    pub fn open(path: &str) -> ServerResult<Self> {
        let file_path = PathBuf::from(path);

        let store = if file_path.exists() {
            tracing::info!("Opening existing event log: {}", file_path.display());
            EvlogReader::read_from_file(&file_path)
                .map_err(|e| ServerError::Storage(format!("Failed to read event log: {e}")))?
        } else {
            tracing::info!("Creating new event log: {}", file_path.display());
            if let Some(parent) = file_path.parent() {
                std::fs::create_dir_all(parent).map_err(|e| {
                    ServerError::Io(std::io::Error::other(format!(
                        "Failed to create directory {}: {e}",
                        parent.display()
                    )))
                })?;
            }
            LogStore::new()
        };

        tracing::info!("Store has {} records", store.count());

        Ok(Self {
            store,
            file_path,
            dirty: false,
            last_save: Instant::now(),
            auto_save_interval: Duration::from_secs(DEFAULT_AUTO_SAVE_SECS),
        })
    }

    /// Get the log store.
    pub fn store(&self) -> &LogStore {
        &self.store
    }

    /// Override how long changes may stay unsaved.
    pub fn set_auto_save_interval(&mut self, interval: Duration) {
        self.auto_save_interval = interval;
    }

    /// Store every entry of a batch, returning how many were added.
    pub fn ingest(&mut self, batch: LogBatch) -> ServerResult<usize> {
        let source = batch.source.clone();
        let records = batch.into_records()?;
        let added = self.store.extend(records);

        self.dirty = true;

        tracing::info!(source = %source, records = added, "ingested batch");
        Ok(added)
    }

    /// Save to file.
    pub fn save(&mut self) -> ServerResult<()> {
        if !self.dirty {
            return Ok(());
        }

        EvlogWriter::write_to_file(&self.store, &self.file_path)
            .map_err(|e| ServerError::Storage(format!("Failed to write event log: {e}")))?;

        self.dirty = false;
        self.last_save = Instant::now();
        tracing::debug!("Saved event log: {}", self.file_path.display());
        Ok(())
    }

    /// Save once the auto-save interval has passed since the last write.
    ///
    /// The snapshot is written on the blocking pool from a copy of the store,
    /// so the calling task never performs file I/O itself.
    pub async fn auto_save(&mut self) -> ServerResult<()> {
        if !self.dirty || self.last_save.elapsed() < self.auto_save_interval {
            return Ok(());
        }

        let store = self.store.clone();
        let path = self.file_path.clone();
        tokio::task::spawn_blocking(move || EvlogWriter::write_to_file(&store, &path))
            .await
            .map_err(|e| ServerError::Storage(format!("Auto-save task failed: {e}")))?
            .map_err(|e| ServerError::Storage(format!("Failed to write event log: {e}")))?;

        self.dirty = false;
        self.last_save = Instant::now();
        tracing::debug!("Auto-saved event log: {}", self.file_path.display());
        Ok(())
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn file_path(&self) -> &PathBuf {
        &self.file_path
    }
}

impl Drop for LogSessionManager {
    fn drop(&mut self) {
        if self.dirty {
            if let Err(e) = self.save() {
                tracing::error!("Failed to save on drop: {e}");
            }
        }
    }
}
