// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Breadcrumb recorder: a bounded in-memory event ring mirrored to
//! `crash-breadcrumbs.json`.
//!
//! Every record rewrites the whole file. Persistence is best-effort: failures
//! are logged via tracing and never reach the caller.

use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use wsup_core::{Breadcrumb, Clock, SystemClock, MAX_BREADCRUMBS};

pub struct BreadcrumbRecorder<C: Clock = SystemClock> {
    path: PathBuf,
    clock: C,
    buffer: Mutex<VecDeque<Breadcrumb>>,
}

impl<C: Clock> BreadcrumbRecorder<C> {
    pub fn new(path: PathBuf, clock: C) -> Self {
        Self { path, clock, buffer: Mutex::new(VecDeque::with_capacity(MAX_BREADCRUMBS)) }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append a breadcrumb, evict the oldest past the cap, and persist.
    pub fn record(&self, kind: impl Into<String>, data: Value) {
        let crumb = Breadcrumb::new(self.clock.epoch_ms(), kind, data);
        // The lock spans the write so the file always reflects the latest ring
        let mut buffer = self.buffer.lock();
        buffer.push_back(crumb);
        while buffer.len() > MAX_BREADCRUMBS {
            buffer.pop_front();
        }
        self.persist(buffer.make_contiguous());
    }

    /// Record with an empty object payload.
    pub fn track(&self, kind: impl Into<String>) {
        self.record(kind, Value::Object(Default::default()));
    }

    /// Snapshot of the buffer, oldest first.
    pub fn get_all(&self) -> Vec<Breadcrumb> {
        self.buffer.lock().iter().cloned().collect()
    }

    /// Empty the buffer and delete the persisted file.
    pub fn clear(&self) {
        let mut buffer = self.buffer.lock();
        buffer.clear();
        if let Err(e) = std::fs::remove_file(&self.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.path.display(), error = %e, "failed to delete breadcrumbs");
            }
        }
    }

    /// Breadcrumbs persisted by the previous session.
    pub fn load_from_disk(&self) -> Vec<Breadcrumb> {
        load_breadcrumbs(&self.path)
    }

    fn persist(&self, crumbs: &[Breadcrumb]) {
        let tmp_path = self.path.with_extension("json.tmp");
        let result = self
            .path
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|_| {
                let json = serde_json::to_string_pretty(crumbs).map_err(std::io::Error::other)?;
                std::fs::write(&tmp_path, json.as_bytes())?;
                std::fs::rename(&tmp_path, &self.path)
            });
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to persist breadcrumbs");
        }
    }
}

/// Read a breadcrumb file.
///
/// A missing file, unparsable JSON or a non-array value all yield an empty
/// list. Individual entries that fail to parse are skipped.
pub fn load_breadcrumbs(path: &Path) -> Vec<Breadcrumb> {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Vec::new(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read breadcrumbs");
            return Vec::new();
        }
    };

    let entries = match serde_json::from_str::<Value>(&text) {
        Ok(Value::Array(entries)) => entries,
        Ok(_) => {
            tracing::warn!(path = %path.display(), "breadcrumb file is not an array");
            return Vec::new();
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to parse breadcrumbs");
            return Vec::new();
        }
    };

    entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value::<Breadcrumb>(entry) {
            Ok(crumb) => Some(crumb),
            Err(e) => {
                tracing::debug!(error = %e, "skipping malformed breadcrumb");
                None
            }
        })
        .collect()
}

#[cfg(test)]
#[path = "breadcrumbs_tests.rs"]
mod tests;
