// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Post-crash recovery prompt and the crash report it can save.

use std::fmt::Write as _;
use std::path::PathBuf;
use wsup_adapters::{ChoicePrompt, DialogAdapter, DialogKind};
use wsup_core::{format_breadcrumbs, Clock, CrashVerdict};

use crate::crash_detector::{ClearSummary, CrashDetector};

pub const RECOVERY_TITLE: &str = "WaveTerm Recovered from Crash";
pub const ISSUES_URL: &str = "https://github.com/a5af/waveterm/issues/new";

/// Breadcrumbs included in a crash report.
pub const REPORT_BREADCRUMBS: usize = 20;

const OPTION_COPY: usize = 0;
const OPTION_CLEAR: usize = 1;
const OPTION_CONTINUE: usize = 2;

const RULE: &str = "━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━";

/// What the user chose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecoveryAction {
    /// Report written to this path
    Copied(PathBuf),
    Cleared(ClearSummary),
    Continued,
}

pub struct RecoveryPrompt<D: DialogAdapter> {
    dialog: D,
    report_path: PathBuf,
}

impl<D: DialogAdapter> RecoveryPrompt<D> {
    /// `report_path` receives the report when the user picks "Copy Crash Info".
    pub fn new(dialog: D, report_path: PathBuf) -> Self {
        Self { dialog, report_path }
    }

    /// Ask the user what to do about `verdict`.
    ///
    /// Never fails: a dialog error counts as "Continue", which leaves all
    /// evidence on disk.
    pub async fn present<C: Clock>(
        &self,
        verdict: &CrashVerdict,
        detector: &CrashDetector<'_, C>,
    ) -> RecoveryAction {
        let choice = match self.dialog.present_choice(&recovery_prompt(verdict)).await {
            Ok(choice) => choice,
            Err(e) => {
                tracing::warn!(error = %e, "failed to show recovery dialog");
                OPTION_CONTINUE
            }
        };

        match choice {
            OPTION_COPY => {
                let report = format_recovery_report(verdict);
                tracing::info!("crash report:\n{report}");
                if let Err(e) = std::fs::write(&self.report_path, &report) {
                    tracing::warn!(path = %self.report_path.display(), error = %e, "failed to save crash report");
                }
                self.confirm(
                    "Copied",
                    "Crash information saved",
                    format!(
                        "The report was written to {}. Attach it when reporting the issue.",
                        self.report_path.display()
                    ),
                )
                .await;
                RecoveryAction::Copied(self.report_path.clone())
            }
            OPTION_CLEAR => {
                let summary = detector.clear_crash_data(verdict);
                tracing::info!(deleted = summary.deleted.len(), "crash data cleared by user");
                self.confirm("Cleared", "Crash data has been cleared.", String::new()).await;
                RecoveryAction::Cleared(summary)
            }
            _ => {
                tracing::info!("continuing without clearing crash data");
                RecoveryAction::Continued
            }
        }
    }

    async fn confirm(&self, title: &str, message: &str, detail: String) {
        let prompt = ChoicePrompt::new(DialogKind::Info, title, message).detail(detail);
        if let Err(e) = self.dialog.present_choice(&prompt).await {
            tracing::warn!(error = %e, "failed to show confirmation dialog");
        }
    }
}

/// The three-way recovery prompt for `verdict`. Dismissal means "Continue".
pub fn recovery_prompt(verdict: &CrashVerdict) -> ChoicePrompt {
    let mut detail =
        format!("Last activity: {}\n\n", verdict.timestamp.as_deref().unwrap_or("Unknown"));
    if !verdict.crash_dumps.is_empty() {
        let _ = writeln!(detail, "Crash dumps found: {}", verdict.crash_dumps.len());
    }
    if !verdict.breadcrumbs.is_empty() {
        let _ = writeln!(detail, "Recent actions: {} events", verdict.breadcrumbs.len());
    }
    detail.push_str("\nChoose \"Copy Crash Info\" to save details for a bug report.");

    ChoicePrompt::new(
        DialogKind::Warning,
        RECOVERY_TITLE,
        format!("WaveTerm recovered from a previous crash.\n\n{}", verdict.kind.message()),
    )
    .detail(detail)
    .options(["Copy Crash Info", "Clear Crashes", "Continue"])
    .default_option(OPTION_CONTINUE)
}

/// Plain-text crash report suitable for pasting into an issue.
pub fn format_recovery_report(verdict: &CrashVerdict) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "{RULE}\nWAVETERM CRASH RECOVERY REPORT\n{RULE}\n");
    let _ = writeln!(out, "Crash Type: {}", verdict.kind);
    let _ = writeln!(out, "Timestamp: {}\n", verdict.timestamp.as_deref().unwrap_or("Unknown"));

    if let Some(hb) = &verdict.heartbeat_data {
        let _ = writeln!(out, "━━━ HEARTBEAT DATA ━━━\n");
        let _ = writeln!(out, "Last Heartbeat: {}", hb.last_heartbeat);
        let _ = writeln!(out, "Age: {}s", hb.age_seconds);
        let _ = writeln!(out, "Process ID: {}", hb.pid);
        let _ = writeln!(out, "Version: {}\n", hb.version.as_deref().unwrap_or("unknown"));
    }

    if !verdict.crash_dumps.is_empty() {
        let _ = writeln!(out, "━━━ CRASH DUMPS ━━━\n");
        let _ = writeln!(out, "Found {} crash dump(s):", verdict.crash_dumps.len());
        for dump in &verdict.crash_dumps {
            let _ = writeln!(out, "  - {}", dump.display());
        }
        out.push('\n');
    }

    if !verdict.breadcrumbs.is_empty() {
        let shown = verdict.breadcrumbs.len().min(REPORT_BREADCRUMBS);
        let _ = writeln!(out, "━━━ RECENT EVENTS (Last {shown}) ━━━\n");
        let _ = writeln!(out, "{}\n", format_breadcrumbs(&verdict.breadcrumbs, Some(REPORT_BREADCRUMBS)));
    }

    let _ = write!(
        out,
        "{RULE}\n\nTo report this crash:\n\
         1. Save this information (\"Copy Crash Info\" writes it to a file)\n\
         2. Go to {ISSUES_URL}\n\
         3. Paste the crash information\n\
         4. Describe what you were doing before the crash\n\n{RULE}"
    );
    out
}

#[cfg(test)]
#[path = "recovery_tests.rs"]
mod tests;
