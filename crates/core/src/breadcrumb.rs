// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Breadcrumb records: lightweight timestamped events kept for post-crash
//! diagnostics.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::time_fmt::format_utc_ms;

/// Number of breadcrumbs retained in memory and on disk.
pub const MAX_BREADCRUMBS: usize = 100;

/// One recorded event. Serialized as `{timestamp, type, data}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Breadcrumb {
    /// Epoch milliseconds
    pub timestamp: u64,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub data: Value,
}

impl Breadcrumb {
    pub fn new(timestamp: u64, kind: impl Into<String>, data: Value) -> Self {
        Self { timestamp, kind: kind.into(), data }
    }

    /// `[<iso-time>] <type>: <data>`
    pub fn display_line(&self) -> String {
        let data = match &self.data {
            Value::String(s) => s.clone(),
            other => other.to_string(),
        };
        format!("[{}] {}: {}", format_utc_ms(self.timestamp), self.kind, data)
    }
}

/// Render the last `limit` breadcrumbs (all when `None`) one per line.
pub fn format_breadcrumbs(crumbs: &[Breadcrumb], limit: Option<usize>) -> String {
    let items = match limit {
        Some(n) if n > 0 && n < crumbs.len() => &crumbs[crumbs.len() - n..],
        _ => crumbs,
    };

    if items.is_empty() {
        return "No breadcrumbs recorded".to_string();
    }

    items.iter().map(Breadcrumb::display_line).collect::<Vec<_>>().join("\n")
}

#[cfg(test)]
#[path = "breadcrumb_tests.rs"]
mod tests;
