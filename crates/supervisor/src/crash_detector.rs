// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Startup crash detection.
//!
//! Evidence sources are checked independently: a failure in one never hides a
//! verdict from another. Dump evidence outranks a stale heartbeat.

use std::path::{Path, PathBuf};
use wsup_core::{format_system_time, Clock, CrashKind, CrashVerdict};

use crate::breadcrumbs::BreadcrumbRecorder;
use crate::crash_reporter::DUMP_EXTENSION;
use crate::heartbeat::HeartbeatMonitor;

/// Subdirectories of the crash directory scanned for dumps, in order.
pub const DUMP_SUBDIRS: [&str; 2] = ["completed", "reports"];

/// Outcome of deleting crash evidence.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ClearSummary {
    pub deleted: Vec<PathBuf>,
    pub failed: Vec<PathBuf>,
}

pub struct CrashDetector<'a, C: Clock> {
    heartbeat: &'a HeartbeatMonitor<C>,
    breadcrumbs: &'a BreadcrumbRecorder<C>,
    crashes_dir: PathBuf,
}

impl<'a, C: Clock> CrashDetector<'a, C> {
    pub fn new(
        heartbeat: &'a HeartbeatMonitor<C>,
        breadcrumbs: &'a BreadcrumbRecorder<C>,
        crashes_dir: PathBuf,
    ) -> Self {
        Self { heartbeat, breadcrumbs, crashes_dir }
    }

    /// Inspect the previous run's evidence. `None` when neither the heartbeat
    /// nor the dump directory indicates a crash; breadcrumbs alone never do.
    pub fn check_for_previous_crash(&self) -> Option<CrashVerdict> {
        let mut verdict = CrashVerdict::default();
        let mut found = false;

        let stale = self.heartbeat.check_for_stale_crash();
        if stale.crashed {
            found = true;
            verdict.kind = CrashKind::StaleHeartbeat;
            verdict.timestamp = stale.data.as_ref().map(|d| d.last_heartbeat.clone());
            tracing::info!(reason = %stale.reason, "previous crash detected via stale heartbeat");
            verdict.heartbeat_data = stale.data;
        }

        let dumps = scan_crash_dumps(&self.crashes_dir);
        if let Some(first) = dumps.first() {
            found = true;
            verdict.kind = CrashKind::CrashDump;
            match std::fs::metadata(first).and_then(|m| m.modified()) {
                Ok(mtime) => verdict.timestamp = Some(format_system_time(mtime)),
                Err(e) => tracing::warn!(path = %first.display(), error = %e, "failed to stat crash dump"),
            }
            tracing::info!(count = dumps.len(), "previous crash detected via crash dumps");
            verdict.crash_dumps = dumps;
        }

        verdict.breadcrumbs = self.breadcrumbs.load_from_disk();
        if !verdict.breadcrumbs.is_empty() {
            tracing::info!(count = verdict.breadcrumbs.len(), "loaded breadcrumbs from previous session");
        }

        found.then_some(verdict)
    }

    /// Delete the verdict's dumps and the persisted breadcrumbs.
    ///
    /// Each dump is removed independently; one failure does not stop the rest.
    pub fn clear_crash_data(&self, verdict: &CrashVerdict) -> ClearSummary {
        let mut summary = ClearSummary::default();
        for dump in &verdict.crash_dumps {
            match std::fs::remove_file(dump) {
                Ok(()) => {
                    tracing::info!(path = %dump.display(), "deleted crash dump");
                    summary.deleted.push(dump.clone());
                }
                Err(e) => {
                    tracing::warn!(path = %dump.display(), error = %e, "failed to delete crash dump");
                    summary.failed.push(dump.clone());
                }
            }
        }
        self.breadcrumbs.clear();
        summary
    }
}

/// Dump files under `<crashes_dir>/completed` then `<crashes_dir>/reports`,
/// each in directory-listing order.
///
/// Missing or unreadable directories contribute nothing.
pub fn scan_crash_dumps(crashes_dir: &Path) -> Vec<PathBuf> {
    let mut dumps = Vec::new();
    for sub in DUMP_SUBDIRS {
        let dir = crashes_dir.join(sub);
        let entries = match std::fs::read_dir(&dir) {
            Ok(entries) => entries,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => continue,
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "failed to scan crash dumps");
                continue;
            }
        };
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().is_some_and(|ext| ext == DUMP_EXTENSION) {
                dumps.push(path);
            }
        }
    }
    dumps
}

#[cfg(test)]
#[path = "crash_detector_tests.rs"]
mod tests;
