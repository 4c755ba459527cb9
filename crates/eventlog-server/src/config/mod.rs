//! Configuration loading and resolution.

use std::path::PathBuf;

/// Listen address used when none is configured.
pub const DEFAULT_ADDR: &str = "127.0.0.1:3000";

/// Resolve the event log file path.
pub fn resolve_log_path(explicit: Option<&str>) -> String {
    if let Some(path) = explicit {
        return path.to_string();
    }

    if let Ok(env_path) = std::env::var("EVENTLOG_FILE") {
        return env_path;
    }

    let cwd_log = PathBuf::from(".eventlog/events.evlog");
    if cwd_log.exists() {
        return cwd_log.display().to_string();
    }

    resolve_default_log_path()
}

/// Resolve the listen address.
pub fn resolve_addr(explicit: Option<&str>) -> String {
    if let Some(addr) = explicit {
        return addr.to_string();
    }

    std::env::var("EVENTLOG_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string())
}

fn resolve_default_log_path() -> String {
    let home = std::env::var("HOME")
        .or_else(|_| std::env::var("USERPROFILE"))
        .unwrap_or_else(|_| ".".to_string());

    format!("{home}/.eventlog/events.evlog")
}
