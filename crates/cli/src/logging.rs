// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Log setup: stderr always, plus `wsup.log` once a data directory is known.

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, reload, EnvFilter, Layer, Registry};

/// Filter variable consulted before `RUST_LOG`.
pub const LOG_ENV_VAR: &str = "WSUP_LOG";

type FileLayer = Option<Box<dyn Layer<Registry> + Send + Sync>>;

/// Keeps the file writer flushing until dropped.
pub struct Logging {
    file: reload::Handle<FileLayer, Registry>,
    guard: Option<WorkerGuard>,
}

impl Logging {
    /// Install the global subscriber. `default_filter` applies when neither
    /// `WSUP_LOG` nor `RUST_LOG` is set.
    pub fn init(default_filter: &str) -> Self {
        let (file_layer, file) = reload::Layer::new(FileLayer::None);
        let stderr_layer = fmt::layer().with_writer(std::io::stderr).with_target(false);

        if let Err(e) = tracing_subscriber::registry()
            .with(file_layer)
            .with(env_filter(default_filter))
            .with(stderr_layer)
            .try_init()
        {
            eprintln!("failed to initialize logging: {e}");
        }
        Self { file, guard: None }
    }

    /// Start copying log output to `path` (ANSI-free, non-blocking).
    pub fn attach_file(&mut self, path: &Path) {
        let (Some(dir), Some(name)) = (path.parent(), path.file_name()) else {
            return;
        };
        if let Err(e) = std::fs::create_dir_all(dir) {
            tracing::warn!(path = %dir.display(), error = %e, "failed to create log directory");
            return;
        }

        let (writer, guard) = tracing_appender::non_blocking(tracing_appender::rolling::never(dir, name));
        let layer = fmt::layer().with_ansi(false).with_writer(writer).boxed();
        match self.file.modify(|slot| *slot = Some(layer)) {
            Ok(()) => {
                self.guard = Some(guard);
                tracing::info!(path = %path.display(), "logging to file");
            }
            Err(e) => tracing::warn!(error = %e, "failed to attach log file"),
        }
    }
}

/// `WSUP_LOG`, then `RUST_LOG`, then `default_filter`.
pub fn env_filter(default_filter: &str) -> EnvFilter {
    EnvFilter::try_from_env(LOG_ENV_VAR)
        .or_else(|_| EnvFilter::try_from_default_env())
        .unwrap_or_else(|_| EnvFilter::new(default_filter))
}

#[cfg(test)]
#[path = "logging_tests.rs"]
mod tests;
