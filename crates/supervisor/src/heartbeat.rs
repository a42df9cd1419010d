// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat monitor: periodically rewrites `heartbeat.json` so the next run
//! can tell whether this one ended cleanly.

use parking_lot::Mutex;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use wsup_core::{Clock, HeartbeatRecord, StaleCheck, StaleReason, SystemClock};

/// Writes heartbeat records. Shared with the tick task.
struct HeartbeatWriter<C: Clock> {
    path: PathBuf,
    clock: C,
    pid: u32,
    version: String,
}

impl<C: Clock> HeartbeatWriter<C> {
    fn write_running(&self) {
        self.write(&HeartbeatRecord::running(self.clock.epoch_ms(), self.pid, &self.version));
    }

    fn write_clean_exit(&self) {
        self.write(&HeartbeatRecord::clean_exit(self.clock.epoch_ms(), self.pid));
    }

    fn write(&self, record: &HeartbeatRecord) {
        let result = serde_json::to_string_pretty(record)
            .map_err(std::io::Error::other)
            .and_then(|json| std::fs::write(&self.path, json));
        if let Err(e) = result {
            tracing::warn!(path = %self.path.display(), error = %e, "failed to write heartbeat");
        }
    }
}

struct Ticker {
    cancel: CancellationToken,
    task: JoinHandle<()>,
}

/// Two states: stopped (`ticker` is `None`) and running.
pub struct HeartbeatMonitor<C: Clock = SystemClock> {
    writer: Arc<HeartbeatWriter<C>>,
    interval: Duration,
    stale_after: Duration,
    ticker: Mutex<Option<Ticker>>,
}

impl<C: Clock> HeartbeatMonitor<C> {
    pub fn new(
        path: PathBuf,
        clock: C,
        interval: Duration,
        stale_after: Duration,
        version: impl Into<String>,
    ) -> Self {
        Self {
            writer: Arc::new(HeartbeatWriter {
                path,
                clock,
                pid: std::process::id(),
                version: version.into(),
            }),
            interval,
            stale_after,
            ticker: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.writer.path
    }

    pub fn stale_after(&self) -> Duration {
        self.stale_after
    }

    pub fn is_running(&self) -> bool {
        self.ticker.lock().is_some()
    }

    /// Write a record now, then again every interval until [`stop`](Self::stop).
    ///
    /// Must be called inside a tokio runtime. A no-op while already running.
    pub fn start(&self) {
        let mut ticker = self.ticker.lock();
        if ticker.is_some() {
            tracing::debug!("heartbeat already running");
            return;
        }

        self.writer.write_running();

        let cancel = CancellationToken::new();
        let writer = Arc::clone(&self.writer);
        let token = cancel.clone();
        let period = self.interval;
        let task = tokio::spawn(async move {
            let mut interval = tokio::time::interval_at(tokio::time::Instant::now() + period, period);
            interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                tokio::select! {
                    _ = token.cancelled() => break,
                    _ = interval.tick() => writer.write_running(),
                }
            }
        });

        tracing::info!(
            path = %self.writer.path.display(),
            interval_ms = period.as_millis() as u64,
            "heartbeat started"
        );
        *ticker = Some(Ticker { cancel, task });
    }

    /// Cancel the ticks and write the final clean-exit record.
    ///
    /// The tick task is joined first so no running record can land after the
    /// clean-exit one. A no-op while stopped.
    pub async fn stop(&self) {
        let Some(ticker) = self.ticker.lock().take() else {
            return;
        };
        ticker.cancel.cancel();
        if let Err(e) = ticker.task.await {
            tracing::warn!(error = %e, "heartbeat task failed");
        }
        self.writer.write_clean_exit();
        tracing::info!("heartbeat stopped");
    }

    /// Read the record left by the previous run. Independent of monitor state.
    pub fn check_for_stale_crash(&self) -> StaleCheck {
        check_heartbeat(&self.writer.path, self.writer.clock.epoch_ms(), self.stale_after)
    }

    /// Delete the heartbeat file.
    pub fn clear(&self) {
        if let Err(e) = std::fs::remove_file(&self.writer.path) {
            if e.kind() != std::io::ErrorKind::NotFound {
                tracing::warn!(path = %self.writer.path.display(), error = %e, "failed to delete heartbeat");
            }
        }
    }
}

/// Classify the heartbeat file at `path` as seen at `now_ms`.
///
/// Never fails: a missing file is `no-heartbeat-file`, an unreadable or
/// unparsable one is `error-reading-heartbeat`.
pub fn check_heartbeat(path: &Path, now_ms: u64, stale_after: Duration) -> StaleCheck {
    let text = match std::fs::read_to_string(path) {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return StaleCheck::not_crashed(StaleReason::NoHeartbeatFile);
        }
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to read heartbeat");
            return StaleCheck::not_crashed(StaleReason::ErrorReadingHeartbeat);
        }
    };

    match serde_json::from_str::<HeartbeatRecord>(&text) {
        Ok(record) => record.evaluate(now_ms, stale_after),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "failed to parse heartbeat");
            StaleCheck::not_crashed(StaleReason::ErrorReadingHeartbeat)
        }
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
