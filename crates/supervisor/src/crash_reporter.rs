// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Crash reporter: captures panics as dump files under the crash directory.
//!
//! Dumps are JSON documents, zstd-compressed by default, written to
//! `<crashes-dir>/completed/<uuid>.dmp`. Nothing is uploaded.

use parking_lot::{Mutex, RwLock};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};
use thiserror::Error;
use wsup_core::format_utc_ms;

/// File extension of dump files.
pub const DUMP_EXTENSION: &str = "dmp";

const ZSTD_MAGIC: [u8; 4] = [0x28, 0xB5, 0x2F, 0xFD];

#[derive(Debug, Error)]
pub enum CrashReportError {
    #[error("failed to read dump {}: {source}", path.display())]
    Read { path: PathBuf, source: std::io::Error },

    #[error("failed to decode dump {}: {source}", path.display())]
    Decode { path: PathBuf, source: serde_json::Error },
}

/// Metadata stamped into every dump.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashReporterOptions {
    pub product_name: String,
    pub company_name: String,
    pub compress: bool,
    /// Global extra fields, e.g. version, platform and arch
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

impl Default for CrashReporterOptions {
    fn default() -> Self {
        Self {
            product_name: "WaveTerm".to_string(),
            company_name: "CommandLine".to_string(),
            compress: true,
            extra: BTreeMap::new(),
        }
    }
}

/// Decoded contents of a dump file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CrashDump {
    pub product_name: String,
    pub company_name: String,
    /// ISO-8601 UTC
    pub timestamp: String,
    pub pid: u32,
    #[serde(default)]
    pub thread: Option<String>,
    pub message: String,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub backtrace: String,
    #[serde(default)]
    pub extra: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CrashReporterStatus {
    pub enabled: bool,
    pub crashes_dir: PathBuf,
    pub uploads_enabled: bool,
}

/// Where the installed panic hook writes dumps.
struct DumpTarget {
    crashes_dir: PathBuf,
    options: CrashReporterOptions,
}

static HOOK_TARGET: RwLock<Option<Arc<DumpTarget>>> = RwLock::new(None);
static HOOK_INSTALLED: OnceLock<()> = OnceLock::new();

pub struct CrashReporter {
    fallback_dir: PathBuf,
    active_dir: Mutex<Option<PathBuf>>,
}

impl CrashReporter {
    /// `fallback_dir` is reported by [`crashes_directory`](Self::crashes_directory)
    /// until [`init`](Self::init) succeeds.
    pub fn new(fallback_dir: PathBuf) -> Self {
        Self { fallback_dir, active_dir: Mutex::new(None) }
    }

    /// Enable panic capture into `crashes_dir`.
    ///
    /// Returns whether capture is active. Failure is logged; the process keeps
    /// running without crash capture.
    pub fn init(&self, crashes_dir: PathBuf, options: CrashReporterOptions) -> bool {
        if let Err(e) = std::fs::create_dir_all(crashes_dir.join("completed")) {
            tracing::error!(
                path = %crashes_dir.display(),
                error = %e,
                "failed to initialize crash reporter"
            );
            return false;
        }

        *HOOK_TARGET.write() =
            Some(Arc::new(DumpTarget { crashes_dir: crashes_dir.clone(), options }));
        HOOK_INSTALLED.get_or_init(install_hook);

        tracing::info!(path = %crashes_dir.display(), "crash reporter initialized");
        *self.active_dir.lock() = Some(crashes_dir);
        true
    }

    /// The dump directory if initialized, otherwise the fallback. The fallback
    /// may not contain any dumps.
    pub fn crashes_directory(&self) -> PathBuf {
        self.active_dir.lock().clone().unwrap_or_else(|| self.fallback_dir.clone())
    }

    pub fn status(&self) -> CrashReporterStatus {
        let active = self.active_dir.lock().clone();
        CrashReporterStatus {
            enabled: active.is_some(),
            crashes_dir: active.unwrap_or_else(|| self.fallback_dir.clone()),
            uploads_enabled: false,
        }
    }
}

/// Chain a dump writer in front of whatever hook is installed.
fn install_hook() {
    let previous = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let target = HOOK_TARGET.read().clone();
        if let Some(target) = target {
            let message = if let Some(s) = info.payload().downcast_ref::<&str>() {
                (*s).to_string()
            } else if let Some(s) = info.payload().downcast_ref::<String>() {
                s.clone()
            } else {
                "Box<dyn Any>".to_string()
            };
            let dump = CrashDump {
                product_name: target.options.product_name.clone(),
                company_name: target.options.company_name.clone(),
                timestamp: format_utc_ms(epoch_ms_now()),
                pid: std::process::id(),
                thread: std::thread::current().name().map(str::to_string),
                message,
                location: info.location().map(|l| format!("{}:{}:{}", l.file(), l.line(), l.column())),
                backtrace: std::backtrace::Backtrace::force_capture().to_string(),
                extra: target.options.extra.clone(),
            };
            match write_dump(&target.crashes_dir, &dump, target.options.compress) {
                Ok(path) => tracing::error!(path = %path.display(), "panic captured"),
                Err(e) => tracing::error!(error = %e, "failed to write crash dump"),
            }
        }
        previous(info);
    }));
}

fn epoch_ms_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

/// Write `dump` to `<crashes_dir>/completed/<uuid>.dmp`.
pub fn write_dump(crashes_dir: &Path, dump: &CrashDump, compress: bool) -> std::io::Result<PathBuf> {
    let dir = crashes_dir.join("completed");
    std::fs::create_dir_all(&dir)?;
    let json = serde_json::to_vec(dump).map_err(std::io::Error::other)?;
    let bytes = if compress { zstd::encode_all(json.as_slice(), 3)? } else { json };
    let path = dir.join(format!("{}.{DUMP_EXTENSION}", uuid::Uuid::new_v4()));
    std::fs::write(&path, bytes)?;
    Ok(path)
}

/// Decode a dump written by [`write_dump`], compressed or not.
pub fn read_dump(path: &Path) -> Result<CrashDump, CrashReportError> {
    let bytes = std::fs::read(path)
        .map_err(|source| CrashReportError::Read { path: path.to_path_buf(), source })?;
    let json = if bytes.starts_with(&ZSTD_MAGIC) {
        zstd::decode_all(bytes.as_slice())
            .map_err(|source| CrashReportError::Read { path: path.to_path_buf(), source })?
    } else {
        bytes
    };
    serde_json::from_slice(&json)
        .map_err(|source| CrashReportError::Decode { path: path.to_path_buf(), source })
}

#[cfg(test)]
#[path = "crash_reporter_tests.rs"]
mod tests;
