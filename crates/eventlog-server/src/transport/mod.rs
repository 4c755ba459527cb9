//! Transport layer for the event log API.

pub mod http;

pub use http::HttpTransport;
