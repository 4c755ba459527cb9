//! Response bodies for the event log HTTP API.

use serde::Serialize;

use eventlog::LogRecord;

/// Result of a batch ingestion.
#[derive(Debug, Clone, Serialize)]
pub struct ReceiveResponse {
    pub logs: usize,
}

/// A list of records, newest first.
#[derive(Debug, Clone, Serialize)]
pub struct DataResponse<'a> {
    pub data: Vec<&'a LogRecord>,
}

/// Outcome of a source name request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum SourceNameResponse {
    Assigned { source: String },
    Exhausted { info: String, error: NameError },
}

#[derive(Debug, Clone, Serialize)]
pub struct NameError {
    pub message: String,
    pub name: String,
    pub errors: serde_json::Map<String, serde_json::Value>,
}

impl SourceNameResponse {
    pub fn exhausted() -> Self {
        SourceNameResponse::Exhausted {
            info: "No more names".to_string(),
            error: NameError {
                message: "Name generation failed".to_string(),
                name: "NameError".to_string(),
                errors: serde_json::Map::new(),
            },
        }
    }
}
