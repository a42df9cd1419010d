// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Diagnostic report for fatal errors, and the dialog that presents it.

use serde::Serialize;
use std::fmt::Write as _;
use std::path::{Path, PathBuf};
use std::time::Duration;
use wsup_adapters::{ChoicePrompt, DialogAdapter, DialogKind};
use wsup_core::{format_breadcrumbs, format_uptime, format_utc_ms, Breadcrumb};

use crate::env::SUPERVISOR_VERSION;

pub const FATAL_TITLE: &str = "WaveTerm Encountered an Error";

/// Trailing log lines included in a report.
pub const RECENT_LOG_LINES: usize = 50;
/// Trailing breadcrumbs included in a report.
pub const RECENT_BREADCRUMBS: usize = 20;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// Session facts known when the error happened. Fields are optional because
/// a fatal error can occur before a data directory is selected.
#[derive(Debug, Clone, Default)]
pub struct FatalContext {
    pub platform: String,
    pub arch: String,
    pub backend_version: Option<String>,
    pub backend_build_time: Option<u64>,
    pub data_dir: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
    pub instance_id: Option<String>,
    pub uptime: Duration,
    pub log_file: Option<PathBuf>,
    pub breadcrumbs: Vec<Breadcrumb>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FatalReport {
    pub timestamp: String,
    pub error_name: String,
    pub error_message: String,
    /// `source()` chain below the top-level error
    pub causes: Vec<String>,
    pub platform: String,
    pub arch: String,
    pub supervisor_version: String,
    pub backend_version: Option<String>,
    pub backend_build_time: Option<u64>,
    pub data_dir: Option<PathBuf>,
    pub config_dir: Option<PathBuf>,
    pub instance_id: Option<String>,
    pub uptime_secs: u64,
    pub log_file: Option<PathBuf>,
    pub recent_logs: Vec<String>,
    pub breadcrumbs: String,
}

impl FatalReport {
    pub fn generate(
        name: &str,
        error: &(dyn std::error::Error + 'static),
        ctx: &FatalContext,
        now_ms: u64,
    ) -> Self {
        let mut causes = Vec::new();
        let mut source = error.source();
        while let Some(cause) = source {
            causes.push(cause.to_string());
            source = cause.source();
        }

        Self {
            timestamp: format_utc_ms(now_ms),
            error_name: name.to_string(),
            error_message: error.to_string(),
            causes,
            platform: ctx.platform.clone(),
            arch: ctx.arch.clone(),
            supervisor_version: SUPERVISOR_VERSION.to_string(),
            backend_version: ctx.backend_version.clone(),
            backend_build_time: ctx.backend_build_time,
            data_dir: ctx.data_dir.clone(),
            config_dir: ctx.config_dir.clone(),
            instance_id: ctx.instance_id.clone(),
            uptime_secs: ctx.uptime.as_secs(),
            log_file: ctx.log_file.clone(),
            recent_logs: ctx
                .log_file
                .as_deref()
                .map(|p| recent_log_lines(p, RECENT_LOG_LINES))
                .unwrap_or_else(|| vec!["Log file not found".to_string()]),
            breadcrumbs: format_breadcrumbs(&ctx.breadcrumbs, Some(RECENT_BREADCRUMBS)),
        }
    }

    pub fn format(&self) -> String {
        let unknown = "unknown";
        let display = |p: &Option<PathBuf>| {
            p.as_deref().map(|p| p.display().to_string()).unwrap_or_else(|| unknown.to_string())
        };

        let mut out = String::new();
        let _ = writeln!(out, "{RULE}\nWAVETERM CRASH REPORT\n{RULE}\n");
        let _ = writeln!(out, "Timestamp: {}\n", self.timestamp);

        let _ = writeln!(out, "━━━ ERROR DETAILS ━━━\n");
        let _ = writeln!(out, "Error: {}: {}", self.error_name, self.error_message);
        for cause in &self.causes {
            let _ = writeln!(out, "Caused by: {cause}");
        }
        out.push('\n');

        let _ = writeln!(out, "━━━ SYSTEM INFORMATION ━━━\n");
        let _ = writeln!(out, "Platform:         {}", self.platform);
        let _ = writeln!(out, "Architecture:     {}", self.arch);
        let _ = writeln!(out, "Supervisor:       {}", self.supervisor_version);
        let _ = writeln!(out, "Backend Version:  {}", self.backend_version.as_deref().unwrap_or(unknown));
        let build_time = self
            .backend_build_time
            .map(|t| format_utc_ms(t.saturating_mul(1000)))
            .unwrap_or_else(|| unknown.to_string());
        let _ = writeln!(out, "Build Time:       {build_time}\n");

        let _ = writeln!(out, "━━━ SESSION INFORMATION ━━━\n");
        let _ = writeln!(out, "Data Directory:   {}", display(&self.data_dir));
        let _ = writeln!(out, "Config Directory: {}", display(&self.config_dir));
        let _ = writeln!(out, "Instance ID:      {}", self.instance_id.as_deref().unwrap_or("default"));
        let _ = writeln!(out, "Uptime:           {}\n", format_uptime(self.uptime_secs));

        let _ = writeln!(out, "━━━ RECENT EVENTS ━━━\n\n{}\n", self.breadcrumbs);

        let _ = writeln!(out, "━━━ LOG FILE ━━━\n");
        let _ = writeln!(out, "Location: {}\n", display(&self.log_file));
        let _ = writeln!(out, "Recent Log Entries (last {} lines):", self.recent_logs.len());
        for line in &self.recent_logs {
            let _ = writeln!(out, "{line}");
        }
        let _ = writeln!(out, "\n{RULE}");
        out
    }
}

/// Last `n` lines of the log file, or a one-line placeholder.
pub fn recent_log_lines(path: &Path, n: usize) -> Vec<String> {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            let lines: Vec<&str> = content.lines().collect();
            lines[lines.len().saturating_sub(n)..].iter().map(|s| s.to_string()).collect()
        }
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => vec!["Log file not found".to_string()],
        Err(e) => vec![format!("Error reading log file: {e}")],
    }
}

/// What the user chose in the fatal dialog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FatalAction {
    Copied(PathBuf),
    ViewedLogs,
    Closed,
}

/// Log the report and let the user save it or locate the log.
///
/// `report_path` receives the report text on "Copy to Clipboard".
pub async fn show_fatal_dialog<D: DialogAdapter>(
    dialog: &D,
    report: &FatalReport,
    report_path: &Path,
) -> FatalAction {
    let text = report.format();
    tracing::error!("fatal error report:\n{text}");

    let log_location = report
        .log_file
        .as_deref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "not available".to_string());
    let prompt = ChoicePrompt::new(
        DialogKind::Error,
        FATAL_TITLE,
        "WaveTerm has stopped due to an unexpected error.",
    )
    .detail(format!(
        "{}: {}\n\nChoose \"Copy to Clipboard\" to save full details for reporting this issue.\n\nLog file: {log_location}",
        report.error_name, report.error_message
    ))
    .options(["Copy to Clipboard", "View Logs", "Close"])
    .default_option(2);

    let choice = match dialog.present_choice(&prompt).await {
        Ok(choice) => choice,
        Err(e) => {
            tracing::warn!(error = %e, "failed to show fatal error dialog");
            return FatalAction::Closed;
        }
    };

    match choice {
        0 => {
            if let Err(e) = std::fs::write(report_path, &text) {
                tracing::warn!(path = %report_path.display(), error = %e, "failed to save fatal report");
            }
            info_dialog(dialog, "Copied", format!("Report saved to {}", report_path.display())).await;
            FatalAction::Copied(report_path.to_path_buf())
        }
        1 => {
            info_dialog(dialog, "Log File", format!("Logs are written to {log_location}")).await;
            FatalAction::ViewedLogs
        }
        _ => FatalAction::Closed,
    }
}

async fn info_dialog<D: DialogAdapter>(dialog: &D, title: &str, message: String) {
    if let Err(e) = dialog.present_choice(&ChoicePrompt::new(DialogKind::Info, title, message)).await {
        tracing::warn!(error = %e, "failed to show dialog");
    }
}

#[cfg(test)]
#[path = "fatal_report_tests.rs"]
mod tests;
