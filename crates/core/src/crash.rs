// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash verdict computed at startup from heartbeat, dump and breadcrumb
//! evidence. Never persisted.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::breadcrumb::Breadcrumb;
use crate::heartbeat::HeartbeatDetail;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CrashKind {
    StaleHeartbeat,
    CrashDump,
    UncleanShutdown,
}

crate::simple_display! {
    CrashKind {
        StaleHeartbeat => "stale-heartbeat",
        CrashDump => "crash-dump",
        UncleanShutdown => "unclean-shutdown",
    }
}

impl CrashKind {
    /// One-line explanation shown to the user.
    pub fn message(self) -> &'static str {
        match self {
            CrashKind::StaleHeartbeat => "Process was terminated unexpectedly",
            CrashKind::CrashDump => "Application crashed (native crash detected)",
            CrashKind::UncleanShutdown => "Application did not shut down cleanly",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashVerdict {
    #[serde(rename = "type")]
    pub kind: CrashKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub crash_dumps: Vec<PathBuf>,
    #[serde(default)]
    pub breadcrumbs: Vec<Breadcrumb>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub heartbeat_data: Option<HeartbeatDetail>,
}

impl Default for CrashVerdict {
    fn default() -> Self {
        Self {
            kind: CrashKind::UncleanShutdown,
            timestamp: None,
            crash_dumps: Vec::new(),
            breadcrumbs: Vec::new(),
            heartbeat_data: None,
        }
    }
}
