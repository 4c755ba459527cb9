//! Eventlog server: HTTP ingestion, log queries and time summaries over a
//! persistent event log.

pub mod config;
pub mod session;
pub mod transport;
pub mod types;

pub use config::{resolve_addr, resolve_log_path};
pub use session::LogSessionManager;
pub use transport::HttpTransport;
