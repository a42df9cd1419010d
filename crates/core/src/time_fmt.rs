// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Timestamp and duration rendering.

use chrono::{DateTime, SecondsFormat, Utc};
use std::time::SystemTime;

/// Render epoch milliseconds as an ISO-8601 UTC string with millisecond
/// precision, e.g. `2023-11-14T22:13:20.000Z`.
///
/// Out-of-range values render as the epoch.
pub fn format_utc_ms(epoch_ms: u64) -> String {
    let dt = i64::try_from(epoch_ms)
        .ok()
        .and_then(DateTime::<Utc>::from_timestamp_millis)
        .unwrap_or_default();
    dt.to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render a filesystem timestamp in the same ISO-8601 form.
pub fn format_system_time(time: SystemTime) -> String {
    DateTime::<Utc>::from(time).to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Render a duration in seconds as `1h 2m 3s`, `2m 3s` or `3s`.
pub fn format_uptime(secs: u64) -> String {
    let hours = secs / 3600;
    let minutes = (secs % 3600) / 60;
    let secs = secs % 60;
    if hours > 0 {
        format!("{hours}h {minutes}m {secs}s")
    } else if minutes > 0 {
        format!("{minutes}m {secs}s")
    } else {
        format!("{secs}s")
    }
}

#[cfg(test)]
#[path = "time_fmt_tests.rs"]
mod tests;
