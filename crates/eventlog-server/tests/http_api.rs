//! HTTP API integration tests for eventlog-server.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use axum::Router;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tower::ServiceExt;

use eventlog_server::session::LogSessionManager;
use eventlog_server::transport::HttpTransport;

// ─────────────────────── helpers ───────────────────────

fn app(dir: &tempfile::TempDir) -> Router {
    let path = dir.path().join("events.evlog");
    let session = LogSessionManager::open(path.to_str().unwrap()).unwrap();
    HttpTransport::new(Arc::new(Mutex::new(session))).router()
}

async fn send(app: &Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, body.to_vec())
}

async fn get(app: &Router, uri: &str) -> (StatusCode, Value) {
    let (status, body) = send(app, Request::get(uri).body(Body::empty()).unwrap()).await;
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

async fn get_text(app: &Router, uri: &str) -> (StatusCode, String) {
    let (status, body) = send(app, Request::get(uri).body(Body::empty()).unwrap()).await;
    (status, String::from_utf8(body).unwrap())
}

async fn post(app: &Router, uri: &str, body: Value) -> (StatusCode, Value) {
    let request = Request::post(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();
    let (status, body) = send(app, request).await;
    let value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    (status, value)
}

fn alexa(intent: &str, user: &str) -> Value {
    json!({
        "request": { "intent": { "name": intent } },
        "context": { "System": { "user": { "userId": user } } }
    })
}

fn google(action: &str, user: &str) -> Value {
    json!({
        "result": { "action": action },
        "context": { "user": { "userId": user } }
    })
}

fn entry(payload: Value, timestamp: &str, log_type: &str) -> Value {
    json!({ "payload": payload, "timestamp": timestamp, "log_type": log_type })
}

/// Two sources; "happy_xavier" logs on 2017-01-14, 01-16 and 01-17.
async fn seed(app: &Router) {
    let batches = [
        json!({
            "source": "happy_xavier",
            "transaction_id": "t1",
            "logs": [
                entry(alexa("Hello", "u1"), "2017-01-14T01:00:00Z", "INFO"),
                entry(json!({ "response": {} }), "2017-01-14T01:00:01Z", "INFO"),
            ]
        }),
        json!({
            "source": "happy_xavier",
            "transaction_id": "t2",
            "logs": [
                entry(google("input.welcome", "u2"), "2017-01-16T05:00:00Z", "ERROR"),
            ]
        }),
        json!({
            "source": "happy_xavier",
            "transaction_id": "t3",
            "logs": [entry(alexa("Hello", "u1"), "2017-01-17T22:00:00Z", "DEBUG")]
        }),
        json!({
            "source": "sad_tesla",
            "transaction_id": "t4",
            "logs": [entry(alexa("Bye", "u5"), "2017-01-15T10:00:00Z", "INFO")]
        }),
    ];
    for batch in batches {
        let (status, _) = post(app, "/receive", batch).await;
        assert_eq!(status, StatusCode::OK);
    }
}

// ═══════════════════════════════════════════════════════
// INGESTION
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_receive_counts_logs() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let (status, body) = post(
        &app,
        "/receive",
        json!({
            "source": "happy_xavier",
            "transaction_id": "tx",
            "logs": [
                { "payload": "one", "log_type": "INFO" },
                { "payload": { "request": {} }, "tags": ["a"], "log_type": "WARN" }
            ]
        }),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "logs": 2 }));

    let (_, health) = get(&app, "/health").await;
    assert_eq!(health["status"], "ok");
    assert_eq!(health["records"], 2);
}

#[tokio::test]
async fn test_receive_rejects_missing_source() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let request = Request::post("/receive")
        .header("content-type", "application/json")
        .body(Body::from(
            json!({ "source": "", "transaction_id": "tx", "logs": [] }).to_string(),
        ))
        .unwrap();
    let (status, body) = send(&app, request).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(String::from_utf8(body).unwrap(), "Source is missing");
}

// ═══════════════════════════════════════════════════════
// LOG QUERIES
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_query_is_exclusive_and_newest_first() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    seed(&app).await;

    let (status, body) = get(
        &app,
        "/query?source=happy_xavier&start_time=2017-01-14T01:00:00Z",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let data = body["data"].as_array().unwrap();
    assert_eq!(data.len(), 3);
    assert_eq!(data[0]["timestamp"], "2017-01-17T22:00:00Z");
    assert_eq!(data[0]["transaction_id"], "t3");
    assert_eq!(data[2]["timestamp"], "2017-01-14T01:00:01Z");
}

#[tokio::test]
async fn test_query_requires_source_and_start() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let (status, text) = get_text(&app, "/query?start_time=2017-01-14").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text.contains("source"));

    let (status, text) = get_text(&app, "/query?source=happy_xavier").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text.contains("start_time"));
}

#[tokio::test]
async fn test_logs_returns_everything() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    seed(&app).await;

    let (status, body) = get(&app, "/logs").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 5);
}

// ═══════════════════════════════════════════════════════
// SUMMARIES
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_time_summary_fills_gaps() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    seed(&app).await;

    let (status, body) = get(
        &app,
        "/timeSummary?source=happy_xavier&date_sort=asc&fill_gaps=true\
         &start_time=2017-01-13&end_time=2017-01-18",
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let buckets = body["buckets"].as_array().unwrap();
    let dates: Vec<_> = buckets.iter().map(|b| b["date"].as_str().unwrap()).collect();
    assert_eq!(
        dates,
        [
            "2017-01-13T00:00:00Z",
            "2017-01-14T00:00:00Z",
            "2017-01-15T00:00:00Z",
            "2017-01-16T00:00:00Z",
            "2017-01-17T00:00:00Z",
            "2017-01-18T00:00:00Z",
        ]
    );
    let counts: Vec<_> = buckets.iter().map(|b| b["count"].as_u64().unwrap()).collect();
    assert_eq!(counts, [0, 1, 0, 1, 1, 0]);

    assert_eq!(body["amazonBuckets"].as_array().unwrap().len(), 6);
    assert_eq!(body["googleBuckets"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_time_summary_without_sort_is_not_filled() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    seed(&app).await;

    let (status, body) = get(
        &app,
        "/timeSummary?source=happy_xavier&fill_gaps=true&granularity=hour",
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["buckets"].as_array().unwrap().len(), 3);
    assert_eq!(body["buckets"][0]["date"], "2017-01-14T01:00:00Z");
}

#[tokio::test]
async fn test_time_summary_rejects_bad_date() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let (status, text) = get_text(&app, "/timeSummary?start_time=whenever").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text.contains("start_time"));
}

#[tokio::test]
async fn test_time_summary_rejects_oversized_fill() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let uri = "/timeSummary?start_time=0001-01-01&end_time=9999-12-31\
               &granularity=hour&date_sort=asc&fill_gaps=1";
    let (status, text) = get_text(&app, uri).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text.contains("buckets"));
}

#[tokio::test]
async fn test_time_summary_fill_at_end_of_calendar() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let uri = "/timeSummary?start_time=%2B262142-12-29&end_time=%2B262142-12-31\
               &date_sort=asc&fill_gaps=1";
    let (status, body) = get(&app, uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["buckets"].as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_intent_summary_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    seed(&app).await;

    let (status, body) = get(&app, "/intentSummary?source=happy_xavier&count_sort=desc").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({ "count": [
            { "name": "Hello", "count": 2 },
            { "name": "input.welcome", "count": 1 }
        ]})
    );
}

#[tokio::test]
async fn test_intent_summary_bounds_are_exclusive() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    seed(&app).await;

    // Hello at exactly 01-14T01:00 and 01-17T22:00 sits on both bounds.
    let uri = "/intentSummary?source=happy_xavier&start_time=2017-01-14T01:00:00Z\
               &end_time=2017-01-17T22:00:00Z";
    let (status, body) = get(&app, uri).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body, json!({ "count": [{ "name": "input.welcome", "count": 1 }] }));
}

#[tokio::test]
async fn test_source_stats() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);
    seed(&app).await;

    let (status, body) = get(&app, "/sourceStats?source=happy_xavier").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body,
        json!({
            "source": "happy_xavier",
            "stats": {
                "uniqueUsers": 2,
                "totalEvents": 3,
                "totalExceptions": 1,
                "amazonEvents": 3,
                "googleEvents": 1
            }
        })
    );

    let (status, text) = get_text(&app, "/sourceStats").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(text.contains("source"));
}

// ═══════════════════════════════════════════════════════
// SOURCE NAMES
// ═══════════════════════════════════════════════════════

#[tokio::test]
async fn test_source_names_are_unique() {
    let dir = tempfile::tempdir().unwrap();
    let app = app(&dir);

    let mut seen = std::collections::HashSet::new();
    for _ in 0..20 {
        let (status, body) = get(&app, "/source").await;
        assert_eq!(status, StatusCode::OK);
        let name = body["source"].as_str().unwrap().to_string();
        assert!(name.contains('_'));
        assert!(seen.insert(name));
    }
}
