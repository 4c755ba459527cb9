//! Edge case integration tests for the event log session and snapshot file.

use std::io::Write;
use std::time::Duration;

use serde_json::json;

use eventlog::{EvlogReader, LogBatch, LogEntry, LogType};
use eventlog_server::session::LogSessionManager;
use eventlog_server::types::ServerError;

// ─────────────────────── helpers ───────────────────────

fn temp_path(dir: &tempfile::TempDir) -> String {
    dir.path().join("events.evlog").display().to_string()
}

fn batch(source: &str, tx: &str, n: usize) -> LogBatch {
    LogBatch {
        source: source.to_string(),
        transaction_id: tx.to_string(),
        logs: (0..n)
            .map(|i| LogEntry {
                payload: json!({ "request": { "index": i } }),
                tags: vec![],
                timestamp: None,
                log_type: LogType::Info,
            })
            .collect(),
    }
}

// ═══════════════════════════════════════════════════════
// FILE HANDLING
// ═══════════════════════════════════════════════════════

#[test]
fn test_missing_directory_is_created() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("a").join("b").join("events.evlog");

    let session = LogSessionManager::open(path.to_str().unwrap()).unwrap();
    assert_eq!(session.store().count(), 0);
    assert!(path.parent().unwrap().exists());
}

#[test]
fn test_empty_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir);
    std::fs::File::create(&path).unwrap();

    let result = LogSessionManager::open(&path);
    assert!(matches!(result, Err(ServerError::Storage(_))));
}

#[test]
fn test_corrupted_file_is_rejected() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir);
    let mut file = std::fs::File::create(&path).unwrap();
    file.write_all(&[0xAB; 200]).unwrap();

    match LogSessionManager::open(&path) {
        Err(ServerError::Storage(msg)) => assert!(msg.contains("Invalid magic")),
        Err(e) => panic!("unexpected error: {e}"),
        Ok(_) => panic!("corrupted file should not open"),
    }
}

// ═══════════════════════════════════════════════════════
// PERSISTENCE
// ═══════════════════════════════════════════════════════

#[test]
fn test_drop_saves_dirty_store() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir);

    {
        let mut session = LogSessionManager::open(&path).unwrap();
        assert_eq!(session.ingest(batch("happy_xavier", "t1", 3)).unwrap(), 3);
        assert!(session.is_dirty());
    }

    let reopened = LogSessionManager::open(&path).unwrap();
    assert_eq!(reopened.store().count(), 3);
    assert!(!reopened.is_dirty());
}

#[tokio::test]
async fn test_auto_save_after_interval() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir);

    let mut session = LogSessionManager::open(&path).unwrap();
    session.set_auto_save_interval(Duration::ZERO);
    session.ingest(batch("happy_xavier", "t1", 2)).unwrap();

    // Ingestion alone never touches the file.
    assert!(session.is_dirty());
    assert!(!std::path::Path::new(&path).exists());

    session.auto_save().await.unwrap();
    assert!(!session.is_dirty());
    let on_disk = EvlogReader::read_from_file(std::path::Path::new(&path)).unwrap();
    assert_eq!(on_disk.count(), 2);
}

#[tokio::test]
async fn test_auto_save_waits_for_interval() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir);

    let mut session = LogSessionManager::open(&path).unwrap();
    session.set_auto_save_interval(Duration::from_secs(3600));
    session.ingest(batch("happy_xavier", "t1", 1)).unwrap();
    session.auto_save().await.unwrap();

    assert!(session.is_dirty());
    assert!(!std::path::Path::new(&path).exists());
}

#[test]
fn test_clean_session_does_not_write() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir);

    let mut session = LogSessionManager::open(&path).unwrap();
    session.save().unwrap();
    drop(session);

    assert!(!std::path::Path::new(&path).exists());
}

// ═══════════════════════════════════════════════════════
// INGESTION BOUNDARIES
// ═══════════════════════════════════════════════════════

#[test]
fn test_missing_transaction_rejected_and_store_untouched() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = LogSessionManager::open(&temp_path(&dir)).unwrap();

    let result = session.ingest(batch("happy_xavier", "", 1));
    assert!(matches!(result, Err(ServerError::InvalidParams(_))));
    assert_eq!(session.store().count(), 0);
    assert!(!session.is_dirty());
}

#[test]
fn test_empty_batch() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = LogSessionManager::open(&temp_path(&dir)).unwrap();
    assert_eq!(session.ingest(batch("happy_xavier", "t1", 0)).unwrap(), 0);
}

#[test]
fn test_unicode_payload_roundtrip() {
    let dir = tempfile::tempdir().unwrap();
    let path = temp_path(&dir);

    {
        let mut session = LogSessionManager::open(&path).unwrap();
        let mut b = batch("quelle_source_é", "t1", 1);
        b.logs[0].payload = json!({ "speech": "こんにちは 👋" });
        session.ingest(b).unwrap();
    }

    let reopened = LogSessionManager::open(&path).unwrap();
    let record = &reopened.store().records[0];
    assert_eq!(record.source, "quelle_source_é");
    assert_eq!(record.payload["speech"], "こんにちは 👋");
}

#[test]
fn test_many_batches() {
    let dir = tempfile::tempdir().unwrap();
    let mut session = LogSessionManager::open(&temp_path(&dir)).unwrap();

    for i in 0..100 {
        session.ingest(batch("happy_xavier", &format!("t{i}"), 5)).unwrap();
    }
    assert_eq!(session.store().count(), 500);
    assert_eq!(session.store().sources().len(), 1);
}
