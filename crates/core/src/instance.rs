// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Instance data directory naming and lock record.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Name of the primary data directory under the base directory.
pub const PRIMARY_DIR_NAME: &str = "wave-data";

/// Highest numbered candidate (`wave-data-100`). Not configurable.
pub const MAX_INSTANCES: u32 = 100;

/// Lock file written inside each claimed data directory.
pub const LOCK_FILE_NAME: &str = "lock-file";

/// Lock file contents: `{pid, timestamp}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceLock {
    pub pid: u32,
    /// Epoch milliseconds
    pub timestamp: u64,
}

/// Path of candidate `n`: 1 is the primary, 2..=100 are numbered.
pub fn candidate_dir(base: &Path, n: u32) -> PathBuf {
    if n <= 1 {
        base.join(PRIMARY_DIR_NAME)
    } else {
        base.join(format!("{PRIMARY_DIR_NAME}-{n}"))
    }
}

pub fn lock_path(dir: &Path) -> PathBuf {
    dir.join(LOCK_FILE_NAME)
}

/// The data directory this process ended up with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceInfo {
    pub data_dir: PathBuf,
    /// `None` for the primary, the slot number otherwise
    pub instance_id: Option<String>,
}

impl InstanceInfo {
    pub fn for_dir(data_dir: PathBuf) -> Self {
        let instance_id = data_dir
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(PRIMARY_DIR_NAME))
            .and_then(|suffix| suffix.strip_prefix('-'))
            .filter(|id| id.parse::<u32>().is_ok())
            .map(str::to_string);
        Self { data_dir, instance_id }
    }

    pub fn is_primary(&self) -> bool {
        self.instance_id.is_none()
    }
}

#[cfg(test)]
#[path = "instance_tests.rs"]
mod tests;
