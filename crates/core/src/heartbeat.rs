// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Heartbeat record and the staleness verdict derived from it.

use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::time_fmt::format_utc_ms;

/// Liveness stamp overwritten in place every tick.
///
/// Wire form: `{timestamp, pid, version?, cleanExit?}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatRecord {
    /// Epoch milliseconds
    pub timestamp: u64,
    pub pid: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub clean_exit: Option<bool>,
}

impl HeartbeatRecord {
    pub fn running(timestamp: u64, pid: u32, version: impl Into<String>) -> Self {
        Self { timestamp, pid, version: Some(version.into()), clean_exit: None }
    }

    pub fn clean_exit(timestamp: u64, pid: u32) -> Self {
        Self { timestamp, pid, version: None, clean_exit: Some(true) }
    }

    pub fn is_clean_exit(&self) -> bool {
        self.clean_exit == Some(true)
    }

    /// Classify this record as seen at `now_ms`.
    ///
    /// A clean-exit record is never a crash regardless of age. Otherwise the
    /// record is stale once strictly older than `stale_after`; a timestamp in
    /// the future counts as age zero.
    pub fn evaluate(&self, now_ms: u64, stale_after: Duration) -> StaleCheck {
        if self.is_clean_exit() {
            return StaleCheck::not_crashed(StaleReason::CleanExit);
        }

        let age_ms = now_ms.saturating_sub(self.timestamp);
        let detail = HeartbeatDetail {
            last_heartbeat: format_utc_ms(self.timestamp),
            age_seconds: age_ms / 1000,
            age_ms: None,
            pid: self.pid,
            version: None,
        };

        if u128::from(age_ms) > stale_after.as_millis() {
            StaleCheck {
                crashed: true,
                reason: StaleReason::StaleHeartbeat,
                data: Some(HeartbeatDetail {
                    age_ms: Some(age_ms),
                    version: self.version.clone(),
                    ..detail
                }),
            }
        } else {
            // Another live instance may still be writing this file
            StaleCheck { crashed: false, reason: StaleReason::FreshHeartbeat, data: Some(detail) }
        }
    }
}

/// Why the stale check reached its verdict.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum StaleReason {
    NoHeartbeatFile,
    CleanExit,
    StaleHeartbeat,
    FreshHeartbeat,
    ErrorReadingHeartbeat,
}

crate::simple_display! {
    StaleReason {
        NoHeartbeatFile => "no-heartbeat-file",
        CleanExit => "clean-exit",
        StaleHeartbeat => "stale-heartbeat",
        FreshHeartbeat => "fresh-heartbeat",
        ErrorReadingHeartbeat => "error-reading-heartbeat",
    }
}

/// Details about the heartbeat that produced a verdict.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatDetail {
    /// ISO-8601 rendering of the record's timestamp
    pub last_heartbeat: String,
    pub age_seconds: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub age_ms: Option<u64>,
    pub pid: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version: Option<String>,
}

/// Result of reading the heartbeat file at startup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StaleCheck {
    pub crashed: bool,
    pub reason: StaleReason,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<HeartbeatDetail>,
}

impl StaleCheck {
    pub fn not_crashed(reason: StaleReason) -> Self {
        Self { crashed: false, reason, data: None }
    }
}

#[cfg(test)]
#[path = "heartbeat_tests.rs"]
mod tests;
