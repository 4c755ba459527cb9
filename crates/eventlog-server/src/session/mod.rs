//! Session management for the event log store.

pub mod manager;

pub use manager::LogSessionManager;
