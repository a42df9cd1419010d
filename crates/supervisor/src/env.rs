// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Centralized environment variable access for the supervisor crate.

use std::path::PathBuf;
use std::time::Duration;

/// Supervisor version (from Cargo.toml)
pub const SUPERVISOR_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Base directory override for the `wave-data*` instance directories.
pub fn base_dir() -> Option<PathBuf> {
    path_var("WSUP_BASE_DIR")
}

/// Configuration directory override.
pub fn config_dir() -> Option<PathBuf> {
    path_var("WSUP_CONFIG_DIR")
}

/// Development mode selects the `waveterm-dev` platform directories.
pub fn dev_mode() -> bool {
    std::env::var("WSUP_DEV").map(|v| !v.is_empty() && v != "0").unwrap_or(false)
}

/// Backend executable override.
pub fn backend_path() -> Option<PathBuf> {
    path_var("WSUP_BACKEND_PATH")
}

/// Backend working directory override.
pub fn backend_cwd() -> Option<PathBuf> {
    path_var("WSUP_BACKEND_CWD")
}

/// Heartbeat write period override.
pub fn heartbeat_interval() -> Option<Duration> {
    millis_var("WSUP_HEARTBEAT_INTERVAL_MS")
}

/// Heartbeat staleness threshold override.
pub fn heartbeat_stale_after() -> Option<Duration> {
    millis_var("WSUP_HEARTBEAT_STALE_MS")
}

/// Handshake deadline override. `0` disables the deadline.
pub fn handshake_timeout() -> Option<Duration> {
    millis_var("WSUP_HANDSHAKE_TIMEOUT_MS")
}

fn path_var(name: &str) -> Option<PathBuf> {
    std::env::var(name).ok().filter(|s| !s.is_empty()).map(PathBuf::from)
}

fn millis_var(name: &str) -> Option<Duration> {
    std::env::var(name).ok().and_then(|s| s.parse::<u64>().ok()).map(Duration::from_millis)
}
