// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance directory arbitration.
//!
//! The primary `wave-data` directory is always preferred. When a live process
//! holds it, the first unlocked `wave-data-N` (N in 2..=100) is used, seeded
//! from the primary on first use.
//!
//! Locking is check-then-act: two instances started within the same instant
//! may both pick the same directory. The backend's own data-layer lock catches
//! that case and reports it as a lock conflict.

use std::path::{Path, PathBuf};
use thiserror::Error;
use wsup_adapters::{current_pid, is_process_alive};
use wsup_core::instance::{candidate_dir, lock_path};
use wsup_core::{Clock, InstanceLock, MAX_INSTANCES};

#[derive(Debug, Error)]
pub enum InstanceError {
    #[error("too many instances running (max {MAX_INSTANCES})")]
    Exhausted,

    #[error("failed to prepare {}: {source}", path.display())]
    Io { path: PathBuf, source: std::io::Error },

    #[error("failed to copy {} to {}: {source}", from.display(), to.display())]
    Copy { from: PathBuf, to: PathBuf, source: std::io::Error },
}

/// Read the lock file in `dir`, if any parses.
pub fn read_lock(dir: &Path) -> Option<InstanceLock> {
    let path = lock_path(dir);
    let text = std::fs::read_to_string(&path).ok()?;
    match serde_json::from_str(&text) {
        Ok(lock) => Some(lock),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "ignoring unparsable lock file");
            None
        }
    }
}

/// Whether a live process holds `dir`.
///
/// A missing or unparsable lock file, or one naming a dead pid, leaves the
/// directory available.
pub fn is_locked(dir: &Path) -> bool {
    read_lock(dir).is_some_and(|lock| is_process_alive(lock.pid))
}

/// Pick the data directory for this instance. Does not lock it.
pub fn find_available_data_directory(base: &Path) -> Result<PathBuf, InstanceError> {
    let primary = candidate_dir(base, 1);
    if !is_locked(&primary) {
        std::fs::create_dir_all(&primary)
            .map_err(|source| InstanceError::Io { path: primary.clone(), source })?;
        return Ok(primary);
    }
    tracing::info!(path = %primary.display(), "primary data directory is in use");

    for n in 2..=MAX_INSTANCES {
        let dir = candidate_dir(base, n);
        if is_locked(&dir) {
            continue;
        }
        if dir.exists() {
            tracing::info!(path = %dir.display(), "reusing instance data directory");
        } else {
            tracing::info!(path = %dir.display(), "creating instance data directory from primary");
            std::fs::create_dir_all(&dir)
                .map_err(|source| InstanceError::Io { path: dir.clone(), source })?;
            seed_from_primary(&primary, &dir);
        }
        return Ok(dir);
    }

    Err(InstanceError::Exhausted)
}

/// Copy the primary's contents into a fresh directory. Entries that fail to
/// copy are logged and skipped; the directory stays usable.
fn seed_from_primary(primary: &Path, dest: &Path) {
    if let Err(e) = copy_dir_recursive(primary, dest) {
        tracing::warn!(error = %e, "incomplete copy of primary data directory");
    }
}

fn copy_dir_recursive(from: &Path, to: &Path) -> Result<(), InstanceError> {
    let copy_err =
        |source| InstanceError::Copy { from: from.to_path_buf(), to: to.to_path_buf(), source };
    let mut first_error = None;

    for entry in std::fs::read_dir(from).map_err(copy_err)? {
        let entry = entry.map_err(copy_err)?;
        let src = entry.path();
        let dst = to.join(entry.file_name());
        let result = match entry.file_type() {
            Ok(ft) if ft.is_dir() => std::fs::create_dir_all(&dst)
                .map_err(|source| InstanceError::Copy { from: src.clone(), to: dst.clone(), source })
                .and_then(|_| copy_dir_recursive(&src, &dst)),
            Ok(_) => std::fs::copy(&src, &dst)
                .map(|_| ())
                .map_err(|source| InstanceError::Copy { from: src.clone(), to: dst.clone(), source }),
            Err(source) => Err(InstanceError::Copy { from: src.clone(), to: dst.clone(), source }),
        };
        if let Err(e) = result {
            tracing::warn!(error = %e, "skipping entry while seeding data directory");
            first_error.get_or_insert(e);
        }
    }

    first_error.map_or(Ok(()), Err)
}

/// Claim `dir` for this process by writing `{pid, timestamp}`.
pub fn acquire_lock(dir: &Path, clock: &impl Clock) -> Result<InstanceLock, InstanceError> {
    let lock = InstanceLock { pid: current_pid(), timestamp: clock.epoch_ms() };
    let path = lock_path(dir);
    serde_json::to_string(&lock)
        .map_err(std::io::Error::other)
        .and_then(|json| std::fs::write(&path, json))
        .map_err(|source| InstanceError::Io { path, source })?;
    tracing::info!(path = %dir.display(), pid = lock.pid, "acquired data directory lock");
    Ok(lock)
}

/// Remove `dir`'s lock file if it names this process.
pub fn release_lock(dir: &Path) {
    let Some(lock) = read_lock(dir) else {
        return;
    };
    if lock.pid != current_pid() {
        tracing::debug!(pid = lock.pid, "lock belongs to another process, leaving it");
        return;
    }
    let path = lock_path(dir);
    if let Err(e) = std::fs::remove_file(&path) {
        tracing::warn!(path = %path.display(), error = %e, "failed to release lock");
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
